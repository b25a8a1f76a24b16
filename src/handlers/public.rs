//! Unauthenticated endpoints: signup and the waitlist.

use axum::{extract::State, routing::post, Router};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{Account, AccountRole, JoinWaitlist, Signup, WaitlistUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/waitlist", post(join_waitlist))
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub account: Account,
    /// Bearer token for subsequent requests. Shown exactly once; only a
    /// hash is stored.
    pub token: String,
}

/// Create an account and issue its bearer token.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<Signup>,
) -> Result<Json<SignupResponse>> {
    input.validate()?;

    let conn = state.db.get()?;

    if queries::get_account_by_email(&conn, &input.email)?.is_some() {
        return Err(AppError::BadRequest("Email already exists".into()));
    }

    let (account, token) = queries::create_account(&conn, &input, AccountRole::User)?;

    tracing::info!("Account created: {} ({})", account.id, account.email);

    Ok(Json(SignupResponse { account, token }))
}

/// Join the waitlist. Idempotent per email: re-joining refreshes the name.
pub async fn join_waitlist(
    State(state): State<AppState>,
    Json(input): Json<JoinWaitlist>,
) -> Result<Json<WaitlistUser>> {
    input.validate()?;

    let conn = state.db.get()?;
    let entry = queries::upsert_waitlist_user(&conn, &input)?;

    Ok(Json(entry))
}
