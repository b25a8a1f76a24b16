//! Org-scoped billing endpoints.
//!
//! Reads are served from the locally mirrored rows that the webhook flow
//! maintains; mutations call Stripe synchronously and mirror the response
//! so the billing page doesn't wait on the next webhook delivery.

use axum::{
    extract::{Extension, State},
    middleware,
    routing::{get, post},
    Router,
};
use chrono::Utc;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{account_auth, require_org_billing_role, require_org_member, AuthContext};
use crate::models::{Invoice, PriceRequest, RedirectUrl, Subscription, UpsertSubscription};
use crate::payments::StripeSubscription;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/orgs/{org_id}/billing/subscription", get(get_subscription))
        .route("/orgs/{org_id}/billing/invoices", get(list_invoices))
        .route("/orgs/{org_id}/billing/checkout", post(create_checkout))
        .route("/orgs/{org_id}/billing/portal", post(create_portal))
        .route("/orgs/{org_id}/billing/change-plan", post(change_plan))
        .route("/orgs/{org_id}/billing/cancel", post(cancel_plan))
        .route("/orgs/{org_id}/billing/pause", post(pause_plan))
        .route("/orgs/{org_id}/billing/resume", post(resume_plan))
        .layer(middleware::from_fn_with_state(state, account_auth))
}

/// The org's mirrored subscription, or null when it has never subscribed.
pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Option<Subscription>>> {
    let conn = state.db.get()?;
    require_org_member(&conn, &org_id, &ctx.account.id)?;

    let subscription = queries::get_subscription_for_org(&conn, &org_id)?;
    Ok(Json(subscription))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<Invoice>>> {
    let conn = state.db.get()?;
    require_org_member(&conn, &org_id, &ctx.account.id)?;

    let invoices = queries::list_invoices_for_org(&conn, &org_id)?;
    Ok(Json(invoices))
}

pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(input): Json<PriceRequest>,
) -> Result<Json<RedirectUrl>> {
    let org = {
        let conn = state.db.get()?;
        require_org_billing_role(&conn, &org_id, &ctx.account.id)?;
        queries::get_organization_by_id(&conn, &org_id)?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))?
    };

    let return_url = format!("{}/billing", state.base_url);
    let session = state
        .stripe
        .create_checkout_session(&input.price_id, &org.id, &org.email, &return_url, &return_url)
        .await?;

    Ok(Json(RedirectUrl { url: session.url }))
}

/// Billing-portal session for the org's Stripe customer, creating the
/// customer and its mapping on first use.
pub async fn create_portal(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<RedirectUrl>> {
    let (org, existing) = {
        let conn = state.db.get()?;
        require_org_billing_role(&conn, &org_id, &ctx.account.id)?;
        let org = queries::get_organization_by_id(&conn, &org_id)?
            .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
        let existing = queries::get_stripe_customer_for_org(&conn, &org_id)?;
        (org, existing)
    };

    let customer_id = match existing {
        Some(mapping) => mapping.stripe_id,
        None => {
            let customer = state.stripe.create_customer(&org.email, &org.id).await?;
            let conn = state.db.get()?;
            queries::insert_stripe_customer(&conn, &customer.id, &org.id, customer.email.as_deref())?;
            customer.id
        }
    };

    let return_url = format!("{}/billing", state.base_url);
    let session = state
        .stripe
        .create_billing_portal_session(&customer_id, &return_url)
        .await?;

    Ok(Json(RedirectUrl { url: session.url }))
}

/// Mirror a live subscription response into the local row.
fn mirror_subscription(
    state: &AppState,
    org_id: &str,
    subscription: &StripeSubscription,
) -> Result<Subscription> {
    let conn = state.db.get()?;
    queries::upsert_subscription(
        &conn,
        &UpsertSubscription {
            stripe_id: subscription.id.clone(),
            org_id: org_id.to_string(),
            status: subscription.status.clone(),
            price_id: subscription.first_price_id(),
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
            synced_at: Utc::now().timestamp(),
        },
    )?;
    queries::get_subscription_by_stripe_id(&conn, &subscription.id)?
        .ok_or_else(|| AppError::Internal("Subscription missing after upsert".into()))
}

/// The org's mirrored subscription, required for plan mutations.
fn required_subscription(state: &AppState, org_id: &str) -> Result<Subscription> {
    let conn = state.db.get()?;
    queries::get_subscription_for_org(&conn, org_id)?
        .ok_or_else(|| AppError::NotFound("No subscription found".into()))
}

pub async fn change_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(input): Json<PriceRequest>,
) -> Result<Json<Subscription>> {
    {
        let conn = state.db.get()?;
        require_org_billing_role(&conn, &org_id, &ctx.account.id)?;
    }
    let local = required_subscription(&state, &org_id)?;

    let live = state.stripe.retrieve_subscription(&local.stripe_id).await?;
    let item_id = live
        .first_item_id()
        .ok_or_else(|| AppError::Internal("Subscription has no items".into()))?;

    let updated = state
        .stripe
        .change_subscription_price(&local.stripe_id, &item_id, &input.price_id)
        .await?;

    Ok(Json(mirror_subscription(&state, &org_id, &updated)?))
}

pub async fn cancel_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Subscription>> {
    {
        let conn = state.db.get()?;
        require_org_billing_role(&conn, &org_id, &ctx.account.id)?;
    }
    let local = required_subscription(&state, &org_id)?;

    let canceled = state.stripe.cancel_subscription(&local.stripe_id).await?;

    let conn = state.db.get()?;
    queries::update_subscription_flags(
        &conn,
        &local.stripe_id,
        &canceled.status,
        canceled.cancel_at_period_end,
    )?;
    let subscription = queries::get_subscription_by_stripe_id(&conn, &local.stripe_id)?
        .ok_or_else(|| AppError::Internal("Subscription missing after update".into()))?;

    Ok(Json(subscription))
}

/// Stripe has no native pause; this flags cancellation at period end and
/// marks the local row paused.
pub async fn pause_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Subscription>> {
    {
        let conn = state.db.get()?;
        require_org_billing_role(&conn, &org_id, &ctx.account.id)?;
    }
    let local = required_subscription(&state, &org_id)?;

    state
        .stripe
        .set_cancel_at_period_end(&local.stripe_id, true)
        .await?;

    let conn = state.db.get()?;
    queries::update_subscription_flags(&conn, &local.stripe_id, "paused", true)?;
    let subscription = queries::get_subscription_by_stripe_id(&conn, &local.stripe_id)?
        .ok_or_else(|| AppError::Internal("Subscription missing after update".into()))?;

    Ok(Json(subscription))
}

pub async fn resume_plan(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Subscription>> {
    {
        let conn = state.db.get()?;
        require_org_billing_role(&conn, &org_id, &ctx.account.id)?;
    }
    let local = required_subscription(&state, &org_id)?;

    let resumed = state
        .stripe
        .set_cancel_at_period_end(&local.stripe_id, false)
        .await?;

    let conn = state.db.get()?;
    queries::update_subscription_flags(&conn, &local.stripe_id, &resumed.status, false)?;
    let subscription = queries::get_subscription_by_stripe_id(&conn, &local.stripe_id)?
        .ok_or_else(|| AppError::Internal("Subscription missing after update".into()))?;

    Ok(Json(subscription))
}
