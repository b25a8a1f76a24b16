use serde::{Deserialize, Serialize};

/// A received Stripe event, stored before processing.
///
/// Rows are created on receipt (processed = false) and flipped exactly once
/// to processed = true after the dispatcher attempts them. Handler failures
/// land in `processing_error`; never retried automatically, never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event_name: String,
    pub stripe_event_id: String,
    /// Raw event payload as delivered
    pub body: serde_json::Value,
    pub processed: bool,
    pub processing_error: String,
    pub created_at: i64,
}

/// Mapping from a Stripe customer id to the owning tenant.
///
/// At most one row per `stripe_id`; a lost insert race is success.
#[derive(Debug, Clone, Serialize)]
pub struct StripeCustomer {
    pub stripe_id: String,
    pub org_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: i64,
}

/// Local mirror of a Stripe subscription, upserted on webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: String,
    pub stripe_id: String,
    pub org_id: String,
    pub status: String,
    pub price_id: String,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    /// Provider event timestamp of the last applied sync; older events
    /// are rejected by the upsert.
    pub synced_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Data for a subscription upsert, extracted from a provider event or a
/// live API response.
#[derive(Debug, Clone)]
pub struct UpsertSubscription {
    pub stripe_id: String,
    pub org_id: String,
    pub status: String,
    pub price_id: String,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
    pub synced_at: i64,
}

/// Local mirror of a paid Stripe invoice. Inserted once, never updated.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: String,
    pub stripe_id: String,
    pub org_id: String,
    pub amount_paid: i64,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub stripe_id: String,
    pub org_id: String,
    pub amount_paid: i64,
    pub status: String,
    pub subscription_id: Option<String>,
    pub created_at: i64,
}

/// Request body for checkout and plan changes.
#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub price_id: String,
}

/// Response carrying a provider-hosted redirect URL (checkout, portal).
#[derive(Debug, Serialize)]
pub struct RedirectUrl {
    pub url: String,
}
