//! Admin user management.

use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::middleware::AuthContext;
use crate::models::{Account, AccountRole, UpdateAccountRole};
use crate::pagination::{PageQuery, Paginated};

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Substring match on email
    pub email: Option<String>,
    pub role: Option<AccountRole>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Paginated<Account>>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };

    let conn = state.db.get()?;
    let (items, total) = queries::list_accounts_paginated(
        &conn,
        query.email.as_deref(),
        query.role,
        page.per_page(),
        page.offset(),
    )?;

    Ok(Json(Paginated::new(items, total, page.per_page())))
}

/// Change an account's role. Super-admin only.
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(input): Json<UpdateAccountRole>,
) -> Result<Json<Account>> {
    ctx.require_super_admin()
        .map_err(|_| AppError::Forbidden("Requires the super admin role".into()))?;

    let conn = state.db.get()?;

    if !queries::update_account_role(&conn, &id, input.role)? {
        return Err(AppError::NotFound("User not found".into()));
    }

    let account = queries::get_account_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    tracing::info!(
        "Role of {} changed to {} by {}",
        id,
        input.role.as_str(),
        ctx.account.id
    );

    Ok(Json(account))
}

/// Delete an account and everything hanging off it. Super-admin only.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    ctx.require_super_admin()
        .map_err(|_| AppError::Forbidden("Requires the super admin role".into()))?;

    if id == ctx.account.id {
        return Err(AppError::BadRequest("Cannot delete yourself".into()));
    }

    let conn = state.db.get()?;
    if !queries::delete_account(&conn, &id)? {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::warn!("Account {} deleted by {}", id, ctx.account.id);

    Ok(Json(serde_json::json!({ "success": true })))
}
