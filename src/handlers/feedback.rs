//! Feedback endpoints for regular users. Admin triage lives under /admin.

use axum::{
    extract::{Extension, State},
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::{account_auth, AuthContext};
use crate::models::{CreateFeedback, Feedback};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/feedback", post(create_feedback))
        .route("/feedback", get(list_my_feedback))
        .route("/feedback/{id}", delete(delete_my_feedback))
        .layer(middleware::from_fn_with_state(state, account_auth))
}

pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<CreateFeedback>,
) -> Result<Json<Feedback>> {
    input.validate()?;

    let conn = state.db.get()?;
    let feedback = queries::create_feedback(&conn, &ctx.account.id, &input)?;

    Ok(Json(feedback))
}

pub async fn list_my_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<Feedback>>> {
    let conn = state.db.get()?;
    let items = queries::list_feedback_for_account(&conn, &ctx.account.id)?;
    Ok(Json(items))
}

/// Delete own feedback. Another user's entry is indistinguishable from a
/// missing one.
pub async fn delete_my_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let deleted = queries::delete_feedback_for_account(&conn, &id, &ctx.account.id)?;

    if !deleted {
        return Err(AppError::NotFound("Feedback not found".into()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
