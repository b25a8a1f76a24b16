//! Webhook signature verification and ingestion tests.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use common::*;

fn create_stripe_test_client() -> StripeClient {
    StripeClient::new(&StripeConfig {
        secret_key: "sk_test_xxx".to_string(),
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        api_base: "http://127.0.0.1:1".to_string(),
    })
}

/// A minimal but well-formed subscription event body.
fn subscription_event_body(event_id: &str, sub_id: &str, status: &str, created: i64) -> String {
    serde_json::json!({
        "id": event_id,
        "type": "customer.subscription.updated",
        "created": created,
        "data": {
            "object": {
                "id": sub_id,
                "customer": "cus_1",
                "status": status,
                "items": {"data": [{"id": "si_1", "price": {"id": "price_123"}}]},
                "current_period_start": 1_700_000_000,
                "current_period_end": 1_702_592_000,
                "cancel_at_period_end": false
            }
        }
    })
    .to_string()
}

// ============ Signature Verification ============

#[test]
fn test_valid_signature() {
    let client = create_stripe_test_client();
    let payload = b"{\"type\":\"customer.subscription.updated\"}";
    let header = stripe_signature_header(payload, TEST_WEBHOOK_SECRET, now());

    let result = client
        .verify_webhook_signature(payload, &header)
        .expect("Verification should not error");

    assert!(result, "Valid signature should be accepted");
}

#[test]
fn test_invalid_signature() {
    let client = create_stripe_test_client();
    let payload = b"{\"type\":\"customer.subscription.updated\"}";
    let header = stripe_signature_header(payload, "wrong_secret", now());

    let result = client
        .verify_webhook_signature(payload, &header)
        .expect("Verification should not error");

    assert!(!result, "Invalid signature should be rejected");
}

#[test]
fn test_modified_payload() {
    let client = create_stripe_test_client();
    let original = b"{\"type\":\"customer.subscription.updated\"}";
    let modified = b"{\"type\":\"customer.subscription.updated\",\"hacked\":true}";
    let header = stripe_signature_header(original, TEST_WEBHOOK_SECRET, now());

    let result = client
        .verify_webhook_signature(modified, &header)
        .expect("Verification should not error");

    assert!(!result, "Modified payload should be rejected");
}

#[test]
fn test_old_timestamp_fails_verification() {
    let client = create_stripe_test_client();
    let payload = b"{\"type\":\"customer.subscription.updated\"}";
    // 10 minutes ago - beyond the 5-minute tolerance
    let header = stripe_signature_header(payload, TEST_WEBHOOK_SECRET, now() - 600);

    let result = client
        .verify_webhook_signature(payload, &header)
        .expect("Verification should not error");

    assert!(!result, "Old timestamp should be rejected");
}

#[test]
fn test_future_timestamp_fails_verification() {
    let client = create_stripe_test_client();
    let payload = b"{\"type\":\"customer.subscription.updated\"}";
    let header = stripe_signature_header(payload, TEST_WEBHOOK_SECRET, now() + 600);

    let result = client
        .verify_webhook_signature(payload, &header)
        .expect("Verification should not error");

    assert!(!result, "Future timestamp should be rejected");
}

#[test]
fn test_missing_timestamp_errors() {
    let client = create_stripe_test_client();
    let result = client.verify_webhook_signature(b"{}", "v1=somesignature");
    assert!(result.is_err(), "Missing timestamp should error");
}

#[test]
fn test_missing_v1_errors() {
    let client = create_stripe_test_client();
    let result = client.verify_webhook_signature(b"{}", "t=1234567890");
    assert!(result.is_err(), "Missing signature should error");
}

#[test]
fn test_malformed_header_errors() {
    let client = create_stripe_test_client();
    let result = client.verify_webhook_signature(b"{}", "garbage");
    assert!(result.is_err(), "Malformed header should error");
}

// ============ Webhook Endpoint ============

#[tokio::test]
async fn test_valid_event_returns_200_and_stores_unprocessed_row() {
    let state = create_test_app_state();
    let app = app(state.clone());

    let body = subscription_event_body("evt_100", "sub_100", "active", now());
    let response = app.oneshot(signed_webhook_request(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The row exists and is unprocessed before any handler runs - the
    // endpoint only stores and acknowledges.
    let conn = state.db.get().unwrap();
    let pending = queries::count_unprocessed_events(&conn).unwrap();
    assert_eq!(pending, 1);

    let event = queries::next_unprocessed_event(&conn).unwrap().unwrap();
    assert_eq!(event.event_name, "customer.subscription.updated");
    assert_eq!(event.stripe_event_id, "evt_100");
    assert!(!event.processed);
    assert!(event.processing_error.is_empty());
}

#[tokio::test]
async fn test_bad_signature_returns_400_and_stores_nothing() {
    let state = create_test_app_state();
    let app = app(state.clone());

    let body = subscription_event_body("evt_101", "sub_101", "active", now());
    let signature = stripe_signature_header(body.as_bytes(), "wrong_secret", now());
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("stripe-signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let conn = state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM webhook_events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0, "No event row should be created on signature failure");
}

#[tokio::test]
async fn test_missing_signature_header_returns_400() {
    let state = create_test_app_state();
    let app = app(state);

    let body = subscription_event_body("evt_102", "sub_102", "active", now());
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/stripe")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_event_shape_returns_400() {
    let state = create_test_app_state();
    let app = app(state.clone());

    // Validly signed, but not a Stripe event shape (no type/data)
    let body = r#"{"hello": "world"}"#;
    let response = app.oneshot(signed_webhook_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let conn = state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM webhook_events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_replayed_event_id_fails_the_store_write() {
    let state = create_test_app_state();
    let app = app(state.clone());

    let body = subscription_event_body("evt_103", "sub_103", "active", now());

    let response = app
        .clone()
        .oneshot(signed_webhook_request(&body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same provider event id again: the unique column rejects the insert and
    // the delivery fails, leaving redelivery to Stripe's retry policy.
    let response = app.oneshot(signed_webhook_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let conn = state.db.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM webhook_events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}
