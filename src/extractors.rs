//! Custom extractors that return JSON errors instead of plain text.
//!
//! These wrap Axum's built-in extractors via the derive machinery so that
//! all rejection responses share the `AppError` JSON format.

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use crate::error::AppError;

/// JSON extractor that rejects with `AppError`.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: serde::Serialize> axum::response::IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

/// Query extractor that rejects with `AppError`.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path extractor that rejects with `AppError`.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Path parameters for org-scoped routes with a nested resource id.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgResourcePath {
    pub org_id: String,
    pub id: String,
}
