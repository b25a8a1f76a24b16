//! Prefixed ID generation for Runway entities.
//!
//! All IDs use an `rw_` brand prefix to guarantee collision avoidance with
//! payment provider IDs (Stripe's `cus_`, `sub_`, `in_`, `price_`, etc.).
//!
//! Format: `rw_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &[
    "rw_acct_",
    "rw_org_",
    "rw_mem_",
    "rw_fb_",
    "rw_wl_",
    "rw_evt_",
    "rw_sub_",
    "rw_inv_",
];

/// Validate that a string is a valid Runway prefixed ID.
///
/// This is a cheap check to reject garbage before hitting the database.
/// Validates format: `rw_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Runway.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Account,
    Organization,
    OrgMember,
    Feedback,
    WaitlistUser,
    WebhookEvent,
    Subscription,
    Invoice,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Account => "rw_acct",
            Self::Organization => "rw_org",
            Self::OrgMember => "rw_mem",
            Self::Feedback => "rw_fb",
            Self::WaitlistUser => "rw_wl",
            Self::WebhookEvent => "rw_evt",
            Self::Subscription => "rw_sub",
            Self::Invoice => "rw_inv",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

/// Generate a bearer token with an rw_ prefix.
///
/// Returned to the caller exactly once at account creation; only its
/// salted hash is stored.
pub fn generate_token() -> String {
    format!("rw_{}", Uuid::new_v4().as_simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Account.gen_id();
        assert!(id.starts_with("rw_acct_"));
        // rw_acct_ (8 chars) + 32 hex chars = 40 chars total
        assert_eq!(id.len(), 40);
    }

    #[test]
    fn test_all_prefixes_unique() {
        let prefixes: Vec<&str> = vec![
            EntityType::Account.prefix(),
            EntityType::Organization.prefix(),
            EntityType::OrgMember.prefix(),
            EntityType::Feedback.prefix(),
            EntityType::WaitlistUser.prefix(),
            EntityType::WebhookEvent.prefix(),
            EntityType::Subscription.prefix(),
            EntityType::Invoice.prefix(),
        ];

        let mut seen = std::collections::HashSet::new();
        for prefix in prefixes {
            assert!(seen.insert(prefix), "Duplicate prefix found: {}", prefix);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let id1 = EntityType::Account.gen_id();
        let id2 = EntityType::Account.gen_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_is_valid_prefixed_id() {
        assert!(is_valid_prefixed_id("rw_acct_a1b2c3d4e5f6789012345678901234ab"));
        assert!(is_valid_prefixed_id("rw_org_00000000000000000000000000000000"));
        assert!(is_valid_prefixed_id(&EntityType::Feedback.gen_id()));
        assert!(is_valid_prefixed_id(&EntityType::Subscription.gen_id()));

        assert!(!is_valid_prefixed_id("")); // empty
        assert!(!is_valid_prefixed_id("a1b2c3d4-e5f6-7890-1234-567890123456")); // plain UUID
        assert!(!is_valid_prefixed_id("rw_unknown_a1b2c3d4e5f6789012345678901234ab")); // unknown prefix
        assert!(!is_valid_prefixed_id("rw_acct_a1b2c3d4")); // too short
        assert!(!is_valid_prefixed_id("rw_acct_a1b2c3d4e5f6789012345678901234gg")); // non-hex
        assert!(!is_valid_prefixed_id("cus_a1b2c3d4e5f6789012345678901234ab")); // missing rw_
    }

    #[test]
    fn test_token_format() {
        let token = generate_token();
        assert!(token.starts_with("rw_"));
        assert_ne!(token, generate_token());
    }
}
