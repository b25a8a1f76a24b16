//! Webhook event dispatch and subscription reconciliation.
//!
//! `dispatch` takes a stored event to its terminal state: branch on the
//! event type, reconcile the local billing mirrors, then flip `processed`
//! exactly once with any handler error recorded as text. Failed events are
//! not retried automatically; recovery is an operator inspecting
//! `processing_error` and re-triggering.

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{CreateInvoice, UpsertSubscription};
use crate::payments::{StripeEvent, StripeInvoice, StripeSubscription};

/// Process a stored webhook event by id.
///
/// Returns an error only for infrastructure failures (missing row, database
/// unavailable) - those leave the event unprocessed for the outbox to retry.
/// Handler-level failures are captured in `processing_error` and the event
/// still reaches `processed = true`.
pub async fn dispatch(state: &AppState, event_id: &str) -> Result<()> {
    let event = {
        let conn = state.db.get()?;
        queries::get_webhook_event(&conn, event_id)?
    };

    let Some(event) = event else {
        // The caller handed us an id it just stored; a missing row is a bug
        // or a race, not a recoverable condition.
        tracing::error!("Webhook event {} not found in the database", event_id);
        return Err(AppError::NotFound(format!(
            "Webhook event {} not found",
            event_id
        )));
    };

    let mut processing_error = String::new();

    match serde_json::from_value::<StripeEvent>(event.body.clone()) {
        Ok(stripe_event) => {
            let outcome = match stripe_event.event_type.as_str() {
                "customer.subscription.created"
                | "customer.subscription.updated"
                | "customer.subscription.deleted" => {
                    handle_subscription_event(state, &stripe_event).await
                }
                "invoice.payment_succeeded" => handle_invoice_paid(state, &stripe_event).await,
                "customer.updated" => handle_customer_updated(state, &stripe_event).await,
                other => {
                    tracing::info!("Unhandled event type: {}", other);
                    Ok(())
                }
            };

            if let Err(e) = outcome {
                tracing::error!("Error processing event {}: {}", event.id, e);
                processing_error = format!("Error processing event: {}", e);
            }
        }
        Err(_) => {
            tracing::error!("Event body is invalid: {}", event.id);
            processing_error = "Event body is invalid or missing required fields.".to_string();
        }
    }

    let conn = state.db.get()?;
    queries::mark_webhook_event_processed(&conn, &event.id, &processing_error)?;
    Ok(())
}

/// Mirror a subscription event into the local `subscriptions` row.
///
/// An unresolvable tenant abandons the sync (logged, no error recorded);
/// the upsert itself rejects events older than what is already stored.
async fn handle_subscription_event(state: &AppState, event: &StripeEvent) -> Result<()> {
    let subscription: StripeSubscription =
        serde_json::from_value(event.data.object.clone())
            .map_err(|e| AppError::BadRequest(format!("Invalid subscription object: {}", e)))?;

    let Some(customer_id) = subscription.customer_id() else {
        return Err(AppError::BadRequest(format!(
            "Subscription {} has no customer reference",
            subscription.id
        )));
    };

    let Some(org_id) = resolve_org(state, &customer_id).await? else {
        tracing::error!(
            "Unable to process subscription: org not found for customer {}",
            customer_id
        );
        return Ok(());
    };

    let conn = state.db.get()?;
    queries::upsert_subscription(
        &conn,
        &UpsertSubscription {
            stripe_id: subscription.id.clone(),
            org_id,
            status: subscription.status.clone(),
            price_id: subscription.first_price_id(),
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
            synced_at: event.created,
        },
    )?;

    tracing::info!("Successfully upserted subscription: {}", subscription.id);
    Ok(())
}

/// Record a paid invoice against its tenant. Insert-only; a replayed event
/// hits the unique constraint and records nothing new.
async fn handle_invoice_paid(state: &AppState, event: &StripeEvent) -> Result<()> {
    let invoice: StripeInvoice = serde_json::from_value(event.data.object.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid invoice object: {}", e)))?;

    tracing::info!("Processing invoice payment succeeded: {}", invoice.id);

    let Some(customer_id) = invoice.customer_id() else {
        tracing::error!("Invoice has no associated customer: {}", invoice.id);
        return Ok(());
    };

    let Some(org_id) = resolve_org(state, &customer_id).await? else {
        tracing::error!(
            "Unable to process invoice: org not found for customer {}",
            customer_id
        );
        return Ok(());
    };

    let conn = state.db.get()?;
    let inserted = queries::insert_invoice(
        &conn,
        &CreateInvoice {
            stripe_id: invoice.id.clone(),
            org_id,
            amount_paid: invoice.amount_paid,
            status: invoice.status.clone().unwrap_or_else(|| "paid".to_string()),
            subscription_id: invoice.subscription.clone(),
            created_at: invoice.created,
        },
    )?;

    if inserted {
        tracing::info!("Successfully inserted invoice: {}", invoice.id);
    } else {
        tracing::info!("Invoice already recorded, skipping: {}", invoice.id);
    }
    Ok(())
}

/// Refresh the customer mapping when Stripe reports a customer change.
async fn handle_customer_updated(state: &AppState, event: &StripeEvent) -> Result<()> {
    let customer_id = event
        .data
        .object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::BadRequest("Customer object has no id".into()))?;

    let org_id = resolve_org(state, customer_id).await?;
    tracing::info!("Customer updated: {}, org: {:?}", customer_id, org_id);
    Ok(())
}

/// Map a Stripe customer id to a tenant, creating the mapping lazily.
///
/// On a mapping miss the customer is fetched from Stripe: the tenant comes
/// from `metadata.org_id` when present, otherwise from matching the
/// customer's email against organizations (in which case the id is written
/// back into the Stripe metadata for next time). Returns `None` when no
/// tenant can be determined - callers abandon, they don't error.
///
/// The mapping insert tolerates a concurrent duplicate: the unique
/// constraint on `stripe_id` is the only concurrency guard in this flow.
pub async fn resolve_org(state: &AppState, customer_id: &str) -> Result<Option<String>> {
    {
        let conn = state.db.get()?;
        if let Some(mapping) = queries::get_stripe_customer(&conn, customer_id)? {
            return Ok(Some(mapping.org_id));
        }
    }

    // A failed retrieve is a handler error (recorded in processing_error),
    // not an abandonment - the provider may just be unreachable.
    let customer = state.stripe.retrieve_customer(customer_id).await?;

    if customer.deleted {
        tracing::error!("Customer has been deleted in Stripe: {}", customer_id);
        return Ok(None);
    }

    let org_id = match customer.metadata.get("org_id") {
        Some(org_id) => org_id.clone(),
        None => {
            tracing::info!(
                "No org_id in customer metadata for {}, matching by email",
                customer_id
            );

            let Some(email) = customer.email.as_deref() else {
                tracing::error!("Unable to find organization for customer: {}", customer_id);
                return Ok(None);
            };

            let org = {
                let conn = state.db.get()?;
                queries::get_organization_by_email(&conn, email)?
            };

            let Some(org) = org else {
                tracing::error!("Unable to find organization for customer: {}", customer_id);
                return Ok(None);
            };

            // Write the tenant id back so future lookups skip the email match.
            state.stripe.update_customer_org(customer_id, &org.id).await?;
            tracing::info!("Updated Stripe customer {} metadata with org {}", customer_id, org.id);
            org.id
        }
    };

    let conn = state.db.get()?;
    queries::insert_stripe_customer(&conn, customer_id, &org_id, customer.email.as_deref())?;

    Ok(Some(org_id))
}
