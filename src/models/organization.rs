use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::validate_email_format;

/// The billing-owning tenant. Distinct from individual accounts; the email
/// is the billing contact and is what the customer resolver matches against
/// when a Stripe customer carries no tenant metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    /// Billing contact; defaults to the creating account's email
    pub email: Option<String>,
}

impl CreateOrganization {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".into()));
        }
        if let Some(ref email) = self.email {
            validate_email_format(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateOrganization {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest("Name cannot be empty".into()));
            }
        }
        if let Some(ref email) = self.email {
            validate_email_format(email)?;
        }
        Ok(())
    }
}

/// Role of an account within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn can_manage_members(&self) -> bool {
        matches!(self, Self::Owner)
    }

    pub fn can_manage_billing(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl std::str::FromStr for OrgRole {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgMember {
    pub id: String,
    pub account_id: String,
    pub org_id: String,
    pub role: OrgRole,
    pub created_at: i64,
}

/// Membership row joined with the member's account for listing.
#[derive(Debug, Clone, Serialize)]
pub struct OrgMemberWithAccount {
    pub id: String,
    pub account_id: String,
    pub email: String,
    pub name: String,
    pub org_id: String,
    pub role: OrgRole,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrgMember {
    /// Email of an existing account to add
    pub email: String,
    pub role: OrgRole,
}

impl CreateOrgMember {
    pub fn validate(&self) -> Result<()> {
        validate_email_format(&self.email)
    }
}
