use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use p256::ecdsa::{signature::Verifier, Signature, SigningKey, VerifyingKey};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use wallet_inspector::auth::resolve_primary_address;
use wallet_inspector::error::InspectorError;
use wallet_inspector::executor::QueryExecutor;
use wallet_inspector::warehouse::{TokenSigner, WarehouseClient};

const KEY_NAME: &str = "organizations/o/apiKeys/k";
const PRIMARY: &str = "0xAbC0000000000000000000000000000000000dEf";

/// Authorization header and JSON body of every query the stub received.
#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn run_query(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.requests.lock().push((auth, body.clone()));

    match body["sql"].as_str().unwrap_or_default() {
        "SELECT fail" => (StatusCode::BAD_GATEWAY, "boom").into_response(),
        "SELECT empty" => StatusCode::OK.into_response(),
        _ => Json(json!({ "data": [{ "n": 1 }, { "n": 2 }] })).into_response(),
    }
}

#[derive(Deserialize)]
struct Lookup {
    fid: u64,
    protocol: String,
}

async fn primary_address(Query(lookup): Query<Lookup>) -> Response {
    if lookup.protocol != "ethereum" {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match lookup.fid {
        1 => Json(json!({ "result": { "address": { "fid": 1, "protocol": "ethereum", "address": PRIMARY } } }))
            .into_response(),
        2 => StatusCode::NOT_FOUND.into_response(),
        _ => Json(json!({ "result": { "address": { "address": "0x1234" } } })).into_response(),
    }
}

async fn spawn_stub() -> (String, Seen, JoinHandle<()>) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/query", post(run_query))
        .route("/fc/primary-address", get(primary_address))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), seen, handle)
}

fn test_key() -> SigningKey {
    SigningKey::from_slice(&[7u8; 32]).unwrap()
}

fn client_for(base_url: &str) -> WarehouseClient {
    WarehouseClient::with_signer(
        reqwest::Client::new(),
        format!("{}/query", base_url),
        TokenSigner::new(KEY_NAME, test_key()),
    )
}

#[tokio::test]
async fn queries_are_signed_and_unwrap_data() {
    let (base_url, seen, handle) = spawn_stub().await;
    let client = client_for(&base_url);

    let rows = client.execute("SELECT n", Some("0xabc")).await.unwrap();
    assert_eq!(rows, vec![json!({ "n": 1 }), json!({ "n": 2 })]);

    let requests = seen.requests.lock().clone();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(body, &json!({ "sql": "SELECT n" }));

    let token = auth.strip_prefix("Bearer ").unwrap();
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);
    let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    assert_eq!(claims["sub"], KEY_NAME);
    assert_eq!(claims["aud"], "https://api.cdp.coinbase.com");

    let signature = Signature::from_slice(&URL_SAFE_NO_PAD.decode(parts[2]).unwrap()).unwrap();
    let message = format!("{}.{}", parts[0], parts[1]);
    assert!(VerifyingKey::from(&test_key())
        .verify(message.as_bytes(), &signature)
        .is_ok());

    handle.abort();
}

#[tokio::test]
async fn upstream_failures_carry_status_and_text() {
    let (base_url, _, handle) = spawn_stub().await;
    let err = client_for(&base_url)
        .execute("SELECT fail", None)
        .await
        .unwrap_err();
    assert!(
        matches!(err, InspectorError::UpstreamQuery(ref m) if m == "CDP API error: 502 - boom"),
        "{err:?}"
    );
    handle.abort();
}

#[tokio::test]
async fn empty_body_means_no_rows() {
    let (base_url, _, handle) = spawn_stub().await;
    let rows = client_for(&base_url)
        .execute("SELECT empty", None)
        .await
        .unwrap();
    assert!(rows.is_empty());
    handle.abort();
}

#[tokio::test]
async fn primary_address_is_normalized() {
    let (base_url, _, handle) = spawn_stub().await;
    let http = reqwest::Client::new();
    assert_eq!(
        resolve_primary_address(&http, &base_url, 1).await.as_deref(),
        Some(PRIMARY.to_ascii_lowercase().as_str())
    );
    handle.abort();
}

#[tokio::test]
async fn primary_address_failures_resolve_to_none() {
    let (base_url, _, handle) = spawn_stub().await;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    // non-2xx
    assert_eq!(resolve_primary_address(&http, &base_url, 2).await, None);
    // malformed address
    assert_eq!(resolve_primary_address(&http, &base_url, 3).await, None);

    handle.abort();
    // nothing listening
    assert_eq!(resolve_primary_address(&http, "http://127.0.0.1:9", 1).await, None);
}
