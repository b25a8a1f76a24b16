//! Profile endpoints for the authenticated account.

use axum::{
    extract::{Extension, State},
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::middleware::{account_auth, AuthContext};
use crate::models::{Account, UpdateAccountImage, UpdateAccountName};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/account/name", put(update_name))
        .route("/account/image", put(update_image))
        .route("/account/complete-setup", post(complete_setup))
        .layer(middleware::from_fn_with_state(state, account_auth))
}

pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<Account> {
    Json(ctx.account)
}

pub async fn update_name(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<UpdateAccountName>,
) -> Result<Json<Account>> {
    input.validate()?;

    let conn = state.db.get()?;
    queries::update_account_name(&conn, &ctx.account.id, &input.name)?;

    let account = queries::get_account_by_id(&conn, &ctx.account.id)?
        .ok_or_else(|| AppError::Internal("Account missing after update".into()))?;
    Ok(Json(account))
}

pub async fn update_image(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<UpdateAccountImage>,
) -> Result<Json<Account>> {
    input.validate()?;

    let conn = state.db.get()?;
    queries::update_account_image(&conn, &ctx.account.id, input.image.as_deref())?;

    let account = queries::get_account_by_id(&conn, &ctx.account.id)?
        .ok_or_else(|| AppError::Internal("Account missing after update".into()))?;
    Ok(Json(account))
}

/// Mark the onboarding flow as finished.
pub async fn complete_setup(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    queries::complete_new_user_setup(&conn, &ctx.account.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
