use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::validate_email_format;

#[derive(Debug, Clone, Serialize)]
pub struct WaitlistUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinWaitlist {
    pub name: String,
    pub email: String,
}

impl JoinWaitlist {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".into()));
        }
        validate_email_format(&self.email)
    }
}
