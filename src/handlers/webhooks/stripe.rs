//! Stripe webhook ingestion.
//!
//! The endpoint does the minimum on the request path: verify the signature
//! against the raw bytes, sanity-check the event shape, store the event
//! durably, and nudge the outbox worker. Reconciliation happens off the
//! request path; Stripe sees 200 as soon as the event is on disk.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::payments::StripeEvent;

/// Result type for webhook responses.
pub type WebhookResult = (StatusCode, &'static str);

pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<WebhookResult, AppError> {
    let signature = match headers.get("stripe-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => return Ok((StatusCode::BAD_REQUEST, "Missing stripe-signature header")),
    };

    // Signature is computed over the exact bytes received; verification must
    // happen before any parsing touches the payload.
    match state.stripe.verify_webhook_signature(&body, signature) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Stripe webhook signature verification failed");
            return Ok((StatusCode::BAD_REQUEST, "Webhook signature verification failed"));
        }
        Err(e) => {
            tracing::warn!("Stripe webhook signature rejected: {}", e);
            return Ok((StatusCode::BAD_REQUEST, "Webhook signature verification failed"));
        }
    }

    let event: StripeEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!("Malformed Stripe event payload: {}", e);
            return Ok((StatusCode::BAD_REQUEST, "Invalid Stripe event data"));
        }
    };

    let body_json: serde_json::Value = serde_json::from_slice(&body)?;

    // Durable write before anything is scheduled: a crash after this point
    // loses nothing, the outbox worker picks the event up later. A store
    // failure propagates as a 500 and Stripe redelivers.
    let stored_id = {
        let conn = state.db.get()?;
        queries::store_webhook_event(&conn, &event.event_type, &body_json, &event.id)?
    };

    tracing::debug!(
        "Stored Stripe event {} ({}) as {}",
        event.id,
        event.event_type,
        stored_id
    );

    state.outbox.notify_one();

    Ok((StatusCode::OK, "OK"))
}
