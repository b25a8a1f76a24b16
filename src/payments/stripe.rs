use std::collections::HashMap;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Stripe API credentials and endpoint.
///
/// `api_base` is overridable so tests can point the client at a local mock
/// server; production leaves it at the default.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
}

/// Thin Stripe REST client.
///
/// Constructed once in `main` and carried in `AppState` - handlers receive
/// it rather than reaching for a global, so tests can substitute a fake.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    webhook_secret: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Maximum age of a webhook timestamp before it's rejected (in seconds).
    /// Stripe recommends 300 seconds (5 minutes).
    const WEBHOOK_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

    /// Verify a Stripe webhook signature header against the raw body.
    ///
    /// The HMAC is computed over `"{timestamp}.{raw_body}"`, so this must be
    /// called with the exact bytes received - a re-serialized payload would
    /// not verify.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        // Stripe signature format: t=timestamp,v1=signature
        let parts: Vec<&str> = signature.split(',').collect();

        let mut timestamp = None;
        let mut sig_v1 = None;

        for part in parts {
            if let Some(t) = part.strip_prefix("t=") {
                timestamp = Some(t);
            } else if let Some(s) = part.strip_prefix("v1=") {
                sig_v1 = Some(s);
            }
        }

        let timestamp_str =
            timestamp.ok_or_else(|| AppError::BadRequest("Invalid signature format".into()))?;
        let sig_v1 =
            sig_v1.ok_or_else(|| AppError::BadRequest("Invalid signature format".into()))?;

        // Reject webhooks outside the tolerance window to limit replay.
        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid timestamp in signature".into()))?;

        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS {
            tracing::warn!(
                "Stripe webhook rejected: timestamp too old (age={}s, max={}s)",
                age,
                Self::WEBHOOK_TIMESTAMP_TOLERANCE_SECS
            );
            return Ok(false);
        }

        // Clock skew tolerance for timestamps from the future: 60 seconds
        if age < -60 {
            tracing::warn!("Stripe webhook rejected: timestamp in the future (age={}s)", age);
            return Ok(false);
        }

        let signed_payload = format!("{}.{}", timestamp_str, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Constant-time comparison to prevent timing attacks.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = sig_v1.as_bytes();

        // Length check is not constant-time, but signature length is not
        // secret (always 64 hex chars for SHA-256).
        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Stripe(format!("{} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Stripe(format!("{}: {}", path, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Stripe(format!("Failed to parse {} response: {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Stripe(format!("{} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Stripe(format!("{}: {}", path, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Stripe(format!("Failed to parse {} response: {}", path, e)))
    }

    pub async fn retrieve_customer(&self, customer_id: &str) -> Result<StripeCustomerObject> {
        self.get_json(&format!("/v1/customers/{}", customer_id)).await
    }

    /// Write the tenant id into the Stripe customer's metadata so future
    /// resolutions hit the fast path.
    pub async fn update_customer_org(&self, customer_id: &str, org_id: &str) -> Result<()> {
        let form = vec![("metadata[org_id]".to_string(), org_id.to_string())];
        let _: StripeCustomerObject = self
            .post_form(&format!("/v1/customers/{}", customer_id), &form)
            .await?;
        Ok(())
    }

    pub async fn create_customer(&self, email: &str, org_id: &str) -> Result<StripeCustomerObject> {
        let form = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[org_id]".to_string(), org_id.to_string()),
        ];
        self.post_form("/v1/customers", &form).await
    }

    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription> {
        self.get_json(&format!("/v1/subscriptions/{}", subscription_id))
            .await
    }

    /// Swap the subscription's first item to a new price, invoicing the
    /// proration immediately.
    pub async fn change_subscription_price(
        &self,
        subscription_id: &str,
        item_id: &str,
        price_id: &str,
    ) -> Result<StripeSubscription> {
        let form = vec![
            ("items[0][id]".to_string(), item_id.to_string()),
            ("items[0][price]".to_string(), price_id.to_string()),
            ("proration_behavior".to_string(), "always_invoice".to_string()),
        ];
        self.post_form(&format!("/v1/subscriptions/{}", subscription_id), &form)
            .await
    }

    pub async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<StripeSubscription> {
        let form = vec![("cancel_at_period_end".to_string(), cancel.to_string())];
        self.post_form(&format!("/v1/subscriptions/{}", subscription_id), &form)
            .await
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        let response = self
            .client
            .delete(format!("{}/v1/subscriptions/{}", self.api_base, subscription_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::Stripe(format!("cancel subscription failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Stripe(format!("cancel subscription: {}", error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Stripe(format!("Failed to parse cancel response: {}", e)))
    }

    /// Create a subscription-mode Checkout session carrying the tenant id in
    /// both metadata and client_reference_id.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        org_id: &str,
        customer_email: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<StripeCheckoutSession> {
        let form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("success_url".to_string(), success_url.to_string()),
            ("cancel_url".to_string(), cancel_url.to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("customer_email".to_string(), customer_email.to_string()),
            ("client_reference_id".to_string(), org_id.to_string()),
            ("metadata[org_id]".to_string(), org_id.to_string()),
        ];
        self.post_form("/v1/checkout/sessions", &form).await
    }

    pub async fn create_billing_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<StripePortalSession> {
        let form = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        self.post_form("/v1/billing_portal/sessions", &form).await
    }
}

// ============ Wire types ============

/// Generic Stripe webhook event - object is parsed based on event type.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Provider-side event timestamp (epoch seconds); carried into the
    /// subscription upsert for ordering.
    #[serde(default)]
    pub created: i64,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomerObject {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: Option<serde_json::Value>,
    pub status: String,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
    #[serde(default)]
    pub current_period_start: i64,
    #[serde(default)]
    pub current_period_end: i64,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

impl StripeSubscription {
    /// Customer reference as a plain id; Stripe may deliver either a bare
    /// string or an expanded object.
    pub fn customer_id(&self) -> Option<String> {
        customer_ref_to_id(self.customer.as_ref())
    }

    /// First price-item id, empty when items are absent.
    pub fn first_price_id(&self) -> String {
        self.items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|p| p.id.clone())
            .unwrap_or_default()
    }

    pub fn first_item_id(&self) -> Option<String> {
        self.items.data.first().map(|item| item.id.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: Option<StripePrice>,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeInvoice {
    pub id: String,
    pub customer: Option<serde_json::Value>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created: i64,
}

impl StripeInvoice {
    pub fn customer_id(&self) -> Option<String> {
        customer_ref_to_id(self.customer.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripePortalSession {
    pub url: String,
}

/// A customer reference is either `"cus_..."` or an expanded object with an
/// `id` field.
fn customer_ref_to_id(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    }
}
