mod feedback;
mod stats;
mod users;
mod waitlist;

pub use feedback::*;
pub use stats::*;
pub use users::*;
pub use waitlist::*;

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/role", put(update_user_role))
        .route("/admin/users/{id}", delete(delete_user))
        .route("/admin/feedback", get(list_feedback))
        .route("/admin/feedback/{id}", put(update_feedback))
        .route("/admin/feedback/{id}", delete(delete_feedback))
        .route("/admin/waitlist", get(list_waitlist))
        .route("/admin/waitlist/{id}", delete(delete_waitlist_user))
        .route("/admin/stats", get(get_stats))
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
