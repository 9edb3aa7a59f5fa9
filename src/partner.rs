//! Partner API prober.
//!
//! Issues register, login, and an authenticated get in that fixed order and
//! prints each raw response body. Status codes are reported in logs only and
//! never change the sequence.

use std::io::Write;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{
    DEFAULT_COUNTRY, DEFAULT_LOGIN, DEFAULT_MAIN_WALLET, DEFAULT_PARTNER_NAME, DEFAULT_PASSWORD,
    DEFAULT_TRAFFIC_SOURCE, DEFAULT_USERS_AMOUNT_A_MONTH, PartnerProbeConfig,
};
use crate::error::ProbeError;

/// Body of `POST /partner/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterPartner {
    pub country: String,
    pub main_wallet: String,
    pub name: String,
    pub traffic_source: String,
    pub users_amount_a_month: i64,
    pub login: String,
    pub password: String,
}

impl Default for RegisterPartner {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_owned(),
            main_wallet: DEFAULT_MAIN_WALLET.to_owned(),
            name: DEFAULT_PARTNER_NAME.to_owned(),
            traffic_source: DEFAULT_TRAFFIC_SOURCE.to_owned(),
            users_amount_a_month: DEFAULT_USERS_AMOUNT_A_MONTH,
            login: DEFAULT_LOGIN.to_owned(),
            password: DEFAULT_PASSWORD.to_owned(),
        }
    }
}

/// Body of `POST /partner/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN.to_owned(),
            password: DEFAULT_PASSWORD.to_owned(),
        }
    }
}

/// Where the bearer token for `/partner/get` comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// A pre-obtained token; the login response is never inspected.
    Static(String),
    /// The `token` field of the login response body.
    FromLogin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone, Debug)]
pub struct PartnerClient {
    base_url: String,
    http_client: Client,
}

impl PartnerClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ProbeError> {
        let builder = Client::builder();
        let builder = match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client: builder.build()?,
        })
    }

    /// # Errors
    ///
    /// Transport failures only; any status code is returned as a response.
    pub async fn register(&self, partner: &RegisterPartner) -> Result<ProbeResponse, ProbeError> {
        let request = self.http_client.post(self.url("/partner/register")).json(partner);
        send(request, "/partner/register").await
    }

    /// # Errors
    ///
    /// Transport failures only; any status code is returned as a response.
    pub async fn login(&self, credentials: &Credentials) -> Result<ProbeResponse, ProbeError> {
        let request = self.http_client.post(self.url("/partner/login")).json(credentials);
        send(request, "/partner/login").await
    }

    /// # Errors
    ///
    /// Transport failures only; any status code is returned as a response.
    pub async fn get_partner(&self, token: &str) -> Result<ProbeResponse, ProbeError> {
        let request = self.http_client.get(self.url("/partner/get")).bearer_auth(token);
        send(request, "/partner/get").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn send(request: reqwest::RequestBuilder, path: &str) -> Result<ProbeResponse, ProbeError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        debug!(%path, status = status.as_u16(), "http: response");
    } else {
        warn!(%path, status = status.as_u16(), "http: non-success response");
    }
    Ok(ProbeResponse { status, body })
}

/// Run register, login, and get in order, writing each body to `out`.
///
/// # Errors
///
/// Transport or output failures, or a login body without `token` when
/// [`TokenSource::FromLogin`] is configured.
pub async fn run_partner_probe<W: Write>(
    config: &PartnerProbeConfig,
    out: &mut W,
) -> Result<[ProbeResponse; 3], ProbeError> {
    let client = PartnerClient::new(&config.base_url, config.timeout)?;
    info!(base_url = %config.base_url, "http: probing partner api");

    let registered = client.register(&config.registration).await?;
    print_body(out, &registered)?;

    let logged_in = client.login(&config.credentials).await?;
    print_body(out, &logged_in)?;

    let token = match &config.token {
        TokenSource::Static(token) => token.clone(),
        TokenSource::FromLogin => token_from_login(&logged_in)?,
    };
    let fetched = client.get_partner(&token).await?;
    print_body(out, &fetched)?;

    Ok([registered, logged_in, fetched])
}

fn token_from_login(response: &ProbeResponse) -> Result<String, ProbeError> {
    let body = serde_json::from_str::<Value>(&response.body)?;
    body.get("token")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or(ProbeError::MissingField("token"))
}

fn print_body<W: Write>(out: &mut W, response: &ProbeResponse) -> Result<(), ProbeError> {
    writeln!(out, "{}", response.body)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "partner_test.rs"]
mod tests;
