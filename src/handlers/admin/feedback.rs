//! Admin feedback triage.

use axum::extract::State;
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::{
    Feedback, FeedbackFilters, FeedbackLabel, FeedbackStatus, FeedbackWithAccount, UpdateFeedback,
};
use crate::pagination::{PageQuery, Paginated};

#[derive(Debug, Default, Deserialize)]
pub struct AdminFeedbackQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Substring match on title
    pub title: Option<String>,
    pub label: Option<FeedbackLabel>,
    pub status: Option<FeedbackStatus>,
}

pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<AdminFeedbackQuery>,
) -> Result<Json<Paginated<FeedbackWithAccount>>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let filters = FeedbackFilters {
        title: query.title,
        label: query.label,
        status: query.status,
    };

    let conn = state.db.get()?;
    let (items, total) =
        queries::list_feedback_paginated(&conn, &filters, page.per_page(), page.offset())?;

    Ok(Json(Paginated::new(items, total, page.per_page())))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateFeedback>,
) -> Result<Json<Feedback>> {
    let conn = state.db.get()?;

    let feedback = queries::update_feedback(&conn, &id, &input)?
        .ok_or_else(|| AppError::NotFound("Feedback not found".into()))?;

    Ok(Json(feedback))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;

    if !queries::delete_feedback(&conn, &id)? {
        return Err(AppError::NotFound("Feedback not found".into()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
