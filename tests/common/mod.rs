//! Test utilities and fixtures for Runway integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};

pub use runway::db::{init_db, queries, AppState};
pub use runway::models::*;
pub use runway::payments::{StripeClient, StripeConfig};

/// Webhook secret shared by the test state and the signing helper.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test123secret456";

/// Create an in-memory test database with schema initialized.
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState backed by a shared in-memory database.
///
/// Uses a named shared-cache memory database so every pooled connection
/// sees the same data.
pub fn create_test_app_state() -> AppState {
    create_test_app_state_with_stripe("http://127.0.0.1:1")
}

/// Like `create_test_app_state` but pointing the Stripe client at the given
/// API base (a mockito server in tests that exercise outbound calls).
pub fn create_test_app_state_with_stripe(api_base: &str) -> AppState {
    let db_name = format!(
        "file:runway_test_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().as_simple()
    );
    let manager = SqliteConnectionManager::file(&db_name).with_flags(
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI,
    );
    let pool = Pool::builder().max_size(4).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    let stripe = StripeClient::new(&StripeConfig {
        secret_key: "sk_test_xxx".to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        api_base: api_base.to_string(),
    });

    AppState {
        db: pool,
        stripe: Arc::new(stripe),
        base_url: "http://localhost:3000".to_string(),
        outbox: Arc::new(tokio::sync::Notify::new()),
    }
}

/// Create a Router with the full application surface, mirroring main.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(runway::handlers::public::router())
        .merge(runway::handlers::webhooks::router())
        .merge(runway::handlers::account::router(state.clone()))
        .merge(runway::handlers::feedback::router(state.clone()))
        .merge(runway::handlers::orgs::router(state.clone()))
        .merge(runway::handlers::billing::router(state.clone()))
        .merge(runway::handlers::admin::router(state.clone()))
        .with_state(state)
}

/// Create a test account, returning it with its bearer token.
pub fn create_test_account(conn: &Connection, email: &str, role: AccountRole) -> (Account, String) {
    let input = Signup {
        email: email.to_string(),
        name: format!("Test {}", email),
    };
    queries::create_account(conn, &input, role).expect("Failed to create test account")
}

/// Create a test organization owned by the given account.
pub fn create_test_org(
    conn: &mut Connection,
    name: &str,
    email: &str,
    owner_account_id: &str,
) -> Organization {
    queries::create_organization_with_owner(conn, name, email, owner_account_id)
        .expect("Failed to create test organization")
}

/// Create a Stripe customer -> org mapping.
pub fn create_test_mapping(conn: &Connection, stripe_id: &str, org_id: &str) {
    queries::insert_stripe_customer(conn, stripe_id, org_id, Some("billing@example.com"))
        .expect("Failed to create test customer mapping");
}

/// Get the current timestamp.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Compute a Stripe signature header for a payload.
pub fn stripe_signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Build a webhook POST with a valid signature over the exact body bytes.
pub fn signed_webhook_request(body: &str) -> Request<Body> {
    let signature = stripe_signature_header(body.as_bytes(), TEST_WEBHOOK_SECRET, now());
    Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("stripe-signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a JSON request, optionally authenticated.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// Assert a response status, consuming the response and returning its JSON.
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status, "unexpected response status");
    body_json(response).await
}
