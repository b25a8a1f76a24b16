use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::{queries, AppState};
use crate::models::{Account, OrgRole};
use crate::util::extract_bearer_token;

/// Authenticated request context, inserted as a request extension by
/// `account_auth`.
#[derive(Clone)]
pub struct AuthContext {
    pub account: Account,
}

impl AuthContext {
    pub fn require_admin(&self) -> Result<(), StatusCode> {
        if self.account.role.is_admin() {
            Ok(())
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }

    pub fn require_super_admin(&self) -> Result<(), StatusCode> {
        if matches!(self.account.role, crate::models::AccountRole::SuperAdmin) {
            Ok(())
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// Resolve the bearer token to an account and attach the `AuthContext`.
pub async fn account_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let conn = state.db.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let account = queries::get_account_by_token(&conn, token)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthContext { account });

    Ok(next.run(request).await)
}

/// Like `account_auth` but additionally requires an admin role.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let conn = state.db.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let account = queries::get_account_by_token(&conn, token)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !account.role.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AuthContext { account });

    Ok(next.run(request).await)
}

/// Look up the caller's membership in an org, or 403.
///
/// Org-scoped handlers call this after extracting the org id from the path;
/// membership is the access boundary for everything tenant-scoped.
pub fn require_org_member(
    conn: &rusqlite::Connection,
    org_id: &str,
    account_id: &str,
) -> crate::error::Result<crate::models::OrgMember> {
    queries::get_org_member(conn, org_id, account_id)?
        .ok_or_else(|| crate::error::AppError::Forbidden("Not a member of this organization".into()))
}

/// Membership with a billing-capable role (owner or admin), or 403.
pub fn require_org_billing_role(
    conn: &rusqlite::Connection,
    org_id: &str,
    account_id: &str,
) -> crate::error::Result<crate::models::OrgMember> {
    let member = require_org_member(conn, org_id, account_id)?;
    if !member.role.can_manage_billing() {
        return Err(crate::error::AppError::Forbidden(
            "Requires an owner or admin role".into(),
        ));
    }
    Ok(member)
}

/// Membership with the member-management role (owner), or 403.
pub fn require_org_owner(
    conn: &rusqlite::Connection,
    org_id: &str,
    account_id: &str,
) -> crate::error::Result<crate::models::OrgMember> {
    let member = require_org_member(conn, org_id, account_id)?;
    if !matches!(member.role, OrgRole::Owner) {
        return Err(crate::error::AppError::Forbidden("Requires the owner role".into()));
    }
    Ok(member)
}
