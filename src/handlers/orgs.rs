//! Organization management for authenticated accounts.
//!
//! Membership is the tenant boundary: every org-scoped handler resolves the
//! caller's membership first and 403s non-members.

use axum::{
    extract::{Extension, State},
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, OrgResourcePath, Path};
use crate::middleware::{account_auth, require_org_member, require_org_owner, AuthContext};
use crate::models::{
    CreateOrgMember, CreateOrganization, OrgMember, OrgMemberWithAccount, Organization,
    UpdateOrganization,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/orgs", post(create_org))
        .route("/orgs", get(list_my_orgs))
        .route("/orgs/{org_id}", get(get_org))
        .route("/orgs/{org_id}", put(update_org))
        .route("/orgs/{org_id}/members", post(add_member))
        .route("/orgs/{org_id}/members", get(list_members))
        .route("/orgs/{org_id}/members/{id}", delete(remove_member))
        .layer(middleware::from_fn_with_state(state, account_auth))
}

pub async fn create_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<CreateOrganization>,
) -> Result<Json<Organization>> {
    input.validate()?;

    let email = input
        .email
        .clone()
        .unwrap_or_else(|| ctx.account.email.clone());

    let mut conn = state.db.get()?;
    let org =
        queries::create_organization_with_owner(&mut conn, &input.name, &email, &ctx.account.id)?;

    tracing::info!("Organization created: {} by {}", org.id, ctx.account.id);

    Ok(Json(org))
}

pub async fn list_my_orgs(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<Organization>>> {
    let conn = state.db.get()?;
    let orgs = queries::list_orgs_for_account(&conn, &ctx.account.id)?;
    Ok(Json(orgs))
}

pub async fn get_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Organization>> {
    let conn = state.db.get()?;
    require_org_member(&conn, &org_id, &ctx.account.id)?;

    let org = queries::get_organization_by_id(&conn, &org_id)?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    Ok(Json(org))
}

pub async fn update_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(input): Json<UpdateOrganization>,
) -> Result<Json<Organization>> {
    input.validate()?;

    let conn = state.db.get()?;
    let member = require_org_member(&conn, &org_id, &ctx.account.id)?;
    if !member.role.can_manage_billing() {
        return Err(AppError::Forbidden("Requires an owner or admin role".into()));
    }

    let org = queries::update_organization(&conn, &org_id, &input)?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    Ok(Json(org))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(input): Json<CreateOrgMember>,
) -> Result<Json<OrgMember>> {
    input.validate()?;

    let conn = state.db.get()?;
    require_org_owner(&conn, &org_id, &ctx.account.id)?;

    let account = queries::get_account_by_email(&conn, &input.email)?
        .ok_or_else(|| AppError::NotFound("No account with that email".into()))?;

    let member = queries::create_org_member(&conn, &org_id, &account.id, input.role)?;
    Ok(Json(member))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<OrgMemberWithAccount>>> {
    let conn = state.db.get()?;
    require_org_member(&conn, &org_id, &ctx.account.id)?;

    let members = queries::list_org_members(&conn, &org_id)?;
    Ok(Json(members))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(path): Path<OrgResourcePath>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let caller = require_org_owner(&conn, &path.org_id, &ctx.account.id)?;

    if caller.id == path.id {
        return Err(AppError::BadRequest("Owners cannot remove themselves".into()));
    }

    let deleted = queries::delete_org_member(&conn, &path.org_id, &path.id)?;
    if !deleted {
        return Err(AppError::NotFound("Member not found".into()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
