//! Admin waitlist management.

use axum::extract::State;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::WaitlistUser;
use crate::pagination::{PageQuery, Paginated};

#[derive(Debug, Default, Deserialize)]
pub struct WaitlistQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Substring match on email
    pub email: Option<String>,
}

pub async fn list_waitlist(
    State(state): State<AppState>,
    Query(query): Query<WaitlistQuery>,
) -> Result<Json<Paginated<WaitlistUser>>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };

    let conn = state.db.get()?;
    let (items, total) = queries::list_waitlist_paginated(
        &conn,
        query.email.as_deref(),
        page.per_page(),
        page.offset(),
    )?;

    Ok(Json(Paginated::new(items, total, page.per_page())))
}

pub async fn delete_waitlist_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    if !queries::delete_waitlist_user(&conn, &id)? {
        return Err(AppError::NotFound("Waitlist entry not found".into()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
