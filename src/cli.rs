//! Command-line surface. Every option also reads a `PROBE_*` environment variable.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::*;
use crate::error::ProbeError;
use crate::partner::{Credentials, RegisterPartner, TokenSource, run_partner_probe};
use crate::protocol::Subscription;
use crate::subscriber::run_subscriber;

#[derive(Parser, Debug)]
#[command(name = "probe", about = "Smoke probes for the update streams and the partner API")]
pub struct Cli {
    /// Log filter directive, e.g. `info` or `service_probes=debug`. Falls back to `RUST_LOG`.
    #[arg(long, env = "PROBE_LOG", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Subscribe to `/updates` by id and print every frame.
    Updates(UpdatesArgs),
    /// Subscribe to `/api/updates` by topic and print every frame.
    ApiUpdates(ApiUpdatesArgs),
    /// Register, log in, and fetch a partner, printing each response body.
    Partner(PartnerArgs),
}

#[derive(Args, Debug)]
pub struct UpdatesArgs {
    #[arg(long, env = "PROBE_UPDATES_URL", default_value = DEFAULT_UPDATES_URL)]
    pub url: String,

    #[arg(
        long = "id",
        env = "PROBE_UPDATES_IDS",
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_values_t = [DEFAULT_SUBSCRIBE_ID]
    )]
    pub ids: Vec<i64>,

    #[arg(long, env = "PROBE_MAX_FRAMES", help = "Exit after this many frames")]
    pub max_frames: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ApiUpdatesArgs {
    #[arg(long, env = "PROBE_API_UPDATES_URL", default_value = DEFAULT_API_UPDATES_URL)]
    pub url: String,

    #[arg(long = "topic", env = "PROBE_API_UPDATES_TOPICS", value_delimiter = ',', default_value = DEFAULT_SUBSCRIBE_TOPIC)]
    pub topics: Vec<String>,

    #[arg(long, env = "PROBE_MAX_FRAMES", help = "Exit after this many frames")]
    pub max_frames: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PartnerArgs {
    #[arg(long, env = "PROBE_PARTNER_BASE_URL", default_value = DEFAULT_PARTNER_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "PROBE_BEARER_TOKEN", default_value = DEFAULT_BEARER_TOKEN, hide_env_values = true)]
    pub bearer_token: String,

    /// Use the `token` field of the login response instead of `--bearer-token`.
    #[arg(long, default_value_t = false)]
    pub token_from_login: bool,

    #[arg(long, env = "PROBE_TIMEOUT_SECS", help = "Per-request timeout; waits forever when unset")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "PROBE_COUNTRY", default_value = DEFAULT_COUNTRY)]
    pub country: String,

    #[arg(long, env = "PROBE_MAIN_WALLET", default_value = DEFAULT_MAIN_WALLET)]
    pub main_wallet: String,

    #[arg(long, env = "PROBE_PARTNER_NAME", default_value = DEFAULT_PARTNER_NAME)]
    pub name: String,

    #[arg(long, env = "PROBE_TRAFFIC_SOURCE", default_value = DEFAULT_TRAFFIC_SOURCE)]
    pub traffic_source: String,

    #[arg(long, env = "PROBE_USERS_AMOUNT_A_MONTH", default_value_t = DEFAULT_USERS_AMOUNT_A_MONTH)]
    pub users_amount_a_month: i64,

    #[arg(long, env = "PROBE_LOGIN", default_value = DEFAULT_LOGIN)]
    pub login: String,

    #[arg(long, env = "PROBE_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,
}

impl UpdatesArgs {
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidUrl`] for a non-websocket URL.
    pub fn into_parts(self) -> Result<(SubscriberConfig, Subscription), ProbeError> {
        let config = SubscriberConfig::new(self.url, self.max_frames)?;
        Ok((config, Subscription::updates(self.ids)))
    }
}

impl ApiUpdatesArgs {
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidUrl`] for a non-websocket URL.
    pub fn into_parts(self) -> Result<(SubscriberConfig, Subscription), ProbeError> {
        let config = SubscriberConfig::new(self.url, self.max_frames)?;
        Ok((config, Subscription::api_updates(self.topics)))
    }
}

impl PartnerArgs {
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidUrl`] for a non-HTTP base URL.
    pub fn into_config(self) -> Result<PartnerProbeConfig, ProbeError> {
        let token = if self.token_from_login {
            TokenSource::FromLogin
        } else {
            TokenSource::Static(self.bearer_token)
        };
        let credentials = Credentials {
            login: self.login.clone(),
            password: self.password.clone(),
        };
        let registration = RegisterPartner {
            country: self.country,
            main_wallet: self.main_wallet,
            name: self.name,
            traffic_source: self.traffic_source,
            users_amount_a_month: self.users_amount_a_month,
            login: self.login,
            password: self.password,
        };
        PartnerProbeConfig::new(
            &self.base_url,
            registration,
            credentials,
            token,
            self.timeout_secs.map(Duration::from_secs),
        )
    }
}

/// Execute the selected probe, writing its output to stdout.
///
/// # Errors
///
/// Propagates every probe failure unchanged.
pub async fn run(command: Command) -> Result<(), ProbeError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Updates(args) => {
            let (config, subscription) = args.into_parts()?;
            run_subscriber(&config, &subscription, &mut out).await?;
        }
        Command::ApiUpdates(args) => {
            let (config, subscription) = args.into_parts()?;
            run_subscriber(&config, &subscription, &mut out).await?;
        }
        Command::Partner(args) => {
            let config = args.into_config()?;
            let responses = run_partner_probe(&config, &mut out).await?;
            let statuses = responses.map(|response| response.status.as_u16());
            info!(?statuses, "http: partner probe complete");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
