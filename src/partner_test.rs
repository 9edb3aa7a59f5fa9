use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri, header::AUTHORIZATION};

use super::*;

#[derive(Debug, Clone)]
struct Hit {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: String,
}

#[derive(Clone)]
struct MockApi {
    hits: Arc<Mutex<Vec<Hit>>>,
    register: (StatusCode, &'static str),
    login: (StatusCode, &'static str),
}

async fn record(
    State(api): State<MockApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    api.hits.lock().unwrap().push(Hit {
        method,
        path: uri.path().to_owned(),
        authorization,
        body,
    });

    let (status, body) = match uri.path() {
        "/partner/register" => api.register,
        "/partner/login" => api.login,
        "/partner/get" => (StatusCode::OK, r#"{"data":[]}"#),
        _ => (StatusCode::NOT_FOUND, "not found"),
    };
    (status, body.to_owned())
}

async fn spawn_partner_api(
    register: (StatusCode, &'static str),
    login: (StatusCode, &'static str),
) -> (String, Arc<Mutex<Vec<Hit>>>) {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let api = MockApi {
        hits: Arc::clone(&hits),
        register,
        login,
    };
    let app = Router::new().fallback(record).with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("http://{addr}"), hits)
}

fn probe_config(base_url: &str, token: TokenSource) -> PartnerProbeConfig {
    PartnerProbeConfig::new(
        base_url,
        RegisterPartner::default(),
        Credentials::default(),
        token,
        Some(Duration::from_secs(5)),
    )
    .unwrap()
}

const OK_REGISTER: (StatusCode, &str) = (StatusCode::OK, r#"{"status":"ok"}"#);
const OK_LOGIN: (StatusCode, &str) = (StatusCode::OK, r#"{"token":"abc"}"#);

#[tokio::test]
async fn prints_raw_bodies_in_call_order() {
    let (base_url, hits) = spawn_partner_api(OK_REGISTER, OK_LOGIN).await;
    let config = probe_config(&base_url, TokenSource::Static("static-token".into()));
    let mut out = Vec::new();

    let responses = run_partner_probe(&config, &mut out).await.unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"status\":\"ok\"}\n{\"token\":\"abc\"}\n{\"data\":[]}\n"
    );
    assert!(responses.iter().all(|response| response.status == StatusCode::OK));

    let hits = hits.lock().unwrap();
    let calls = hits
        .iter()
        .map(|hit| (hit.method.clone(), hit.path.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        calls,
        vec![
            (Method::POST, "/partner/register"),
            (Method::POST, "/partner/login"),
            (Method::GET, "/partner/get"),
        ]
    );
}

#[tokio::test]
async fn static_token_is_not_chained_from_login() {
    let (base_url, hits) = spawn_partner_api(OK_REGISTER, OK_LOGIN).await;
    let config = probe_config(&base_url, TokenSource::Static("static-token".into()));
    let mut out = Vec::new();

    run_partner_probe(&config, &mut out).await.unwrap();

    let hits = hits.lock().unwrap();
    assert_eq!(hits[0].authorization, None);
    assert_eq!(hits[1].authorization, None);
    assert_eq!(hits[2].authorization.as_deref(), Some("Bearer static-token"));
}

#[tokio::test]
async fn request_bodies_carry_partner_fields() {
    let (base_url, hits) = spawn_partner_api(OK_REGISTER, OK_LOGIN).await;
    let config = probe_config(&base_url, TokenSource::Static("t".into()));
    let mut out = Vec::new();

    run_partner_probe(&config, &mut out).await.unwrap();

    let hits = hits.lock().unwrap();
    let register = serde_json::from_str::<Value>(&hits[0].body).unwrap();
    let fields = register.as_object().unwrap();
    for key in [
        "country",
        "main_wallet",
        "name",
        "traffic_source",
        "users_amount_a_month",
        "login",
        "password",
    ] {
        assert!(fields.contains_key(key), "register body missing {key}");
    }
    assert_eq!(fields.len(), 7);
    assert!(register["users_amount_a_month"].is_i64());

    let login = serde_json::from_str::<Value>(&hits[1].body).unwrap();
    assert_eq!(login, serde_json::json!({ "login": DEFAULT_LOGIN, "password": DEFAULT_PASSWORD }));
    assert!(hits[2].body.is_empty());
}

#[tokio::test]
async fn error_statuses_do_not_change_the_sequence() {
    let (base_url, hits) = spawn_partner_api(
        (StatusCode::CONFLICT, r#"{"error":"partner exists"}"#),
        (StatusCode::UNAUTHORIZED, r#"{"error":"bad password"}"#),
    )
    .await;
    let config = probe_config(&base_url, TokenSource::Static("t".into()));
    let mut out = Vec::new();

    let [registered, logged_in, fetched] = run_partner_probe(&config, &mut out).await.unwrap();

    assert_eq!(registered.status, StatusCode::CONFLICT);
    assert_eq!(logged_in.status, StatusCode::UNAUTHORIZED);
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"error\":\"partner exists\"}\n{\"error\":\"bad password\"}\n{\"data\":[]}\n"
    );
    assert_eq!(hits.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn from_login_uses_token_from_login_body() {
    let (base_url, hits) = spawn_partner_api(OK_REGISTER, OK_LOGIN).await;
    let config = probe_config(&base_url, TokenSource::FromLogin);
    let mut out = Vec::new();

    run_partner_probe(&config, &mut out).await.unwrap();

    let hits = hits.lock().unwrap();
    assert_eq!(hits[2].authorization.as_deref(), Some("Bearer abc"));
}

#[tokio::test]
async fn from_login_without_token_fails_after_printing_login() {
    let (base_url, hits) = spawn_partner_api(OK_REGISTER, (StatusCode::OK, r#"{"status":"ok"}"#)).await;
    let config = probe_config(&base_url, TokenSource::FromLogin);
    let mut out = Vec::new();

    let result = run_partner_probe(&config, &mut out).await;

    assert!(matches!(result, Err(ProbeError::MissingField("token"))));
    assert_eq!(String::from_utf8(out).unwrap(), "{\"status\":\"ok\"}\n{\"status\":\"ok\"}\n");
    assert_eq!(hits.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn refused_connection_is_an_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = probe_config(&format!("http://{addr}"), TokenSource::Static("t".into()));
    let mut out = Vec::new();

    let result = run_partner_probe(&config, &mut out).await;

    assert!(matches!(result, Err(ProbeError::Http(_))));
    assert!(out.is_empty());
}

#[tokio::test]
async fn client_joins_paths_without_double_slash() {
    let (base_url, hits) = spawn_partner_api(OK_REGISTER, OK_LOGIN).await;
    let client = PartnerClient::new(&format!("{base_url}/"), None).unwrap();

    let response = client.get_partner("tok").await.unwrap();

    assert_eq!(response.body, r#"{"data":[]}"#);
    assert_eq!(hits.lock().unwrap()[0].path, "/partner/get");
}
