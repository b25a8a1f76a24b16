//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on unexpected database values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const ACCOUNT_COLS: &str =
    "id, email, name, image, role, is_new_user, token_hash, created_at, updated_at";

pub const ORGANIZATION_COLS: &str = "id, name, email, created_at, updated_at";

pub const ORG_MEMBER_COLS: &str = "id, account_id, org_id, role, created_at";

pub const ORG_MEMBER_WITH_ACCOUNT_COLS: &str =
    "m.id, m.account_id, a.email, a.name, m.org_id, m.role, m.created_at";

pub const FEEDBACK_COLS: &str = "id, account_id, title, message, label, status, created_at";

pub const FEEDBACK_WITH_ACCOUNT_COLS: &str =
    "f.id, f.account_id, a.name, a.email, f.title, f.message, f.label, f.status, f.created_at";

pub const WAITLIST_COLS: &str = "id, name, email, created_at";

pub const WEBHOOK_EVENT_COLS: &str =
    "id, event_name, stripe_event_id, body, processed, processing_error, created_at";

pub const STRIPE_CUSTOMER_COLS: &str = "stripe_id, org_id, email, created_at";

pub const SUBSCRIPTION_COLS: &str = "id, stripe_id, org_id, status, price_id, current_period_start, current_period_end, cancel_at_period_end, synced_at, created_at, updated_at";

pub const INVOICE_COLS: &str =
    "id, stripe_id, org_id, amount_paid, status, subscription_id, created_at";

// ============ FromRow Implementations ============

impl FromRow for Account {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Account {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            image: row.get(3)?,
            role: parse_enum(row, 4, "role")?,
            is_new_user: row.get::<_, i32>(5)? != 0,
            token_hash: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl FromRow for Organization {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Organization {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl FromRow for OrgMember {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrgMember {
            id: row.get(0)?,
            account_id: row.get(1)?,
            org_id: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for OrgMemberWithAccount {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrgMemberWithAccount {
            id: row.get(0)?,
            account_id: row.get(1)?,
            email: row.get(2)?,
            name: row.get(3)?,
            org_id: row.get(4)?,
            role: parse_enum(row, 5, "role")?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for Feedback {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Feedback {
            id: row.get(0)?,
            account_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            label: parse_enum(row, 4, "label")?,
            status: parse_enum(row, 5, "status")?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for FeedbackWithAccount {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(FeedbackWithAccount {
            id: row.get(0)?,
            account_id: row.get(1)?,
            account_name: row.get(2)?,
            account_email: row.get(3)?,
            title: row.get(4)?,
            message: row.get(5)?,
            label: parse_enum(row, 6, "label")?,
            status: parse_enum(row, 7, "status")?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for WaitlistUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WaitlistUser {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for WebhookEvent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let body_str: String = row.get(3)?;
        Ok(WebhookEvent {
            id: row.get(0)?,
            event_name: row.get(1)?,
            stripe_event_id: row.get(2)?,
            body: serde_json::from_str(&body_str).unwrap_or(serde_json::Value::Null),
            processed: row.get::<_, i32>(4)? != 0,
            processing_error: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for StripeCustomer {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(StripeCustomer {
            stripe_id: row.get(0)?,
            org_id: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            stripe_id: row.get(1)?,
            org_id: row.get(2)?,
            status: row.get(3)?,
            price_id: row.get(4)?,
            current_period_start: row.get(5)?,
            current_period_end: row.get(6)?,
            cancel_at_period_end: row.get::<_, i32>(7)? != 0,
            synced_at: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl FromRow for Invoice {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Invoice {
            id: row.get(0)?,
            stripe_id: row.get(1)?,
            org_id: row.get(2)?,
            amount_paid: row.get(3)?,
            status: row.get(4)?,
            subscription_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
