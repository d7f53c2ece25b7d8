//! Router tests
//!
//! Drive the full request/response cycle through the axum router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use brb_core::{Address, Keypair};
use brb_treasury_server::{config::ServerConfig, create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_router(config: &ServerConfig) -> Router {
    create_router(Arc::new(AppState::new(config).unwrap()))
}

fn who(name: &str) -> Address {
    Keypair::from_label(name).address()
}

async fn json_request(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    let body = match body {
        Some(json_body) => Body::from(serde_json::to_vec(&json_body).unwrap()),
        None => Body::empty(),
    };

    let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!(null));

    (status, json)
}

/// Initialized treasury with `user` holding 250 USDC
async fn funded(router: &Router) {
    let (status, _) = json_request(
        router,
        "POST",
        "/v1/treasury/init",
        Some(json!({"admin": who("admin").to_hex()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = json_request(
        router,
        "POST",
        "/v1/faucet",
        Some(json!({"to": who("user").to_hex(), "amount": 250_000_000u64})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let router = create_test_router(&ServerConfig::development());
    let (status, json) = json_request(&router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_treasury_before_init() {
    let router = create_test_router(&ServerConfig::development());
    let (status, json) = json_request(&router, "GET", "/v1/treasury", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], true);
    assert_eq!(json["code"], "not_initialized");
}

#[tokio::test]
async fn test_end_to_end_flow() {
    let router = create_test_router(&ServerConfig::development());
    funded(&router).await;
    let user = who("user").to_hex();
    let admin = who("admin").to_hex();

    let (status, json) = json_request(&router, "GET", "/v1/treasury", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_collateral"], 0);
    assert_eq!(json["total_issued_supply"], 0);
    assert_eq!(json["is_paused"], false);

    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/mint",
        Some(json!({"caller": user, "amount": 100_000_000u64})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["treasury"]["total_collateral"], 100_000_000u64);
    assert_eq!(json["treasury"]["total_issued_supply"], 100_000_000u64);
    assert_eq!(json["balances"]["issued"], 100_000_000u64);
    assert_eq!(json["balances"]["reserve"], 150_000_000u64);

    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/pause",
        Some(json!({"caller": admin, "paused": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["treasury"]["is_paused"], true);

    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/mint",
        Some(json!({"caller": user, "amount": 50_000_000u64})),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(json["code"], "treasury_paused");

    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/burn",
        Some(json!({"caller": user, "amount": 100_000_000u64})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["treasury"]["total_collateral"], 0);
    assert_eq!(json["balances"]["reserve"], 250_000_000u64);

    let uri = format!("/v1/ledger/entries/{}?limit=2", user);
    let (status, json) = json_request(&router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_error_statuses() {
    let router = create_test_router(&ServerConfig::development());
    funded(&router).await;
    let user = who("user").to_hex();

    // Double init
    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/init",
        Some(json!({"admin": user})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "already_initialized");

    // Non-admin pause
    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/pause",
        Some(json!({"caller": user, "paused": true})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "unauthorized");

    // Zero amount
    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/mint",
        Some(json!({"caller": user, "amount": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_amount");

    // More than held
    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/treasury/mint",
        Some(json!({"caller": user, "amount": 999_000_000u64})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "insufficient_funds");

    // Bad account in path
    let (status, json) = json_request(&router, "GET", "/v1/ledger/balance/nothex", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn test_balance() {
    let router = create_test_router(&ServerConfig::development());
    funded(&router).await;

    let uri = format!("/v1/ledger/balance/{}", who("user").to_hex());
    let (status, json) = json_request(&router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["balances"]["USDC"], 250_000_000u64);

    let uri = format!("/v1/ledger/balance/{}", who("stranger").to_hex());
    let (status, json) = json_request(&router, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["balances"], json!({}));
}

#[tokio::test]
async fn test_faucet_disabled_by_default() {
    let router = create_test_router(&ServerConfig::default());
    let (status, json) = json_request(
        &router,
        "POST",
        "/v1/faucet",
        Some(json!({"to": who("user").to_hex(), "amount": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "faucet_disabled");
}

#[tokio::test]
async fn test_state_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        state_file: Some(dir.path().join("state.json")),
        ..ServerConfig::development()
    };

    let router = create_test_router(&config);
    funded(&router).await;
    let (status, _) = json_request(
        &router,
        "POST",
        "/v1/treasury/mint",
        Some(json!({"caller": who("user").to_hex(), "amount": 40_000_000u64})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let restarted = create_test_router(&config);
    let (status, json) = json_request(&restarted, "GET", "/v1/treasury", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_collateral"], 40_000_000u64);
    assert_eq!(json["admin"], who("admin").to_hex());
}

#[tokio::test]
async fn test_failed_save_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        state_file: Some(dir.path().join("missing").join("state.json")),
        ..ServerConfig::development()
    };
    let router = create_test_router(&config);
    let init = json!({"admin": who("admin").to_hex()});

    let (status, json) = json_request(&router, "POST", "/v1/treasury/init", Some(init.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "store_error");

    let (status, _) = json_request(&router, "GET", "/v1/treasury", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing was kept, so a retry fails on the save again rather than as a double init.
    let (status, json) = json_request(&router, "POST", "/v1/treasury/init", Some(init)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "store_error");

    let (status, _) = json_request(
        &router,
        "POST",
        "/v1/faucet",
        Some(json!({"to": who("user").to_hex(), "amount": 5u64})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let uri = format!("/v1/ledger/balance/{}", who("user").to_hex());
    let (_, json) = json_request(&router, "GET", &uri, None).await;
    assert_eq!(json["balances"], json!({}));
}
