use chrono::Utc;
use rusqlite::{params, types::Value, Connection};

use crate::error::{AppError, Result};
use crate::id::{generate_token, EntityType};
use crate::models::*;
use crate::util::hash_secret;

use super::from_row::{
    query_all, query_one, FromRow, ACCOUNT_COLS, FEEDBACK_COLS, FEEDBACK_WITH_ACCOUNT_COLS,
    INVOICE_COLS, ORGANIZATION_COLS, ORG_MEMBER_COLS, ORG_MEMBER_WITH_ACCOUNT_COLS,
    STRIPE_CUSTOMER_COLS, SUBSCRIPTION_COLS, WAITLIST_COLS, WEBHOOK_EVENT_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Accounts ============

/// Create an account and issue its bearer token.
///
/// The plaintext token is returned exactly once; only the hash is stored.
pub fn create_account(conn: &Connection, input: &Signup, role: AccountRole) -> Result<(Account, String)> {
    let id = EntityType::Account.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let token = generate_token();
    let token_hash = hash_secret(&token);

    conn.execute(
        "INSERT INTO accounts (id, email, name, role, is_new_user, token_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7)",
        params![&id, &email, &input.name, role.as_str(), &token_hash, now, now],
    )?;

    let account = Account {
        id,
        email,
        name: input.name.clone(),
        image: None,
        role,
        is_new_user: true,
        token_hash,
        created_at: now,
        updated_at: now,
    };
    Ok((account, token))
}

pub fn get_account_by_id(conn: &Connection, id: &str) -> Result<Option<Account>> {
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLS),
        &[&id],
    )
}

pub fn get_account_by_email(conn: &Connection, email: &str) -> Result<Option<Account>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE email = ?1", ACCOUNT_COLS),
        &[&email],
    )
}

/// Resolve a bearer token to its account.
pub fn get_account_by_token(conn: &Connection, token: &str) -> Result<Option<Account>> {
    let hash = hash_secret(token);
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE token_hash = ?1", ACCOUNT_COLS),
        &[&hash],
    )
}

/// Paginated account listing with optional email substring and role filters.
pub fn list_accounts_paginated(
    conn: &Connection,
    email: Option<&str>,
    role: Option<AccountRole>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Account>, i64)> {
    let mut wheres: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(email) = email {
        wheres.push(format!("email LIKE ?{}", values.len() + 1));
        values.push(format!("%{}%", email.trim().to_lowercase()).into());
    }
    if let Some(role) = role {
        wheres.push(format!("role = ?{}", values.len() + 1));
        values.push(role.as_str().to_string().into());
    }

    let where_clause = if wheres.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", wheres.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM accounts {}", where_clause),
        rusqlite::params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    values.push(limit.into());
    values.push(offset.into());
    let sql = format!(
        "SELECT {} FROM accounts {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
        ACCOUNT_COLS,
        where_clause,
        values.len() - 1,
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), Account::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((items, total))
}

pub fn update_account_name(conn: &Connection, id: &str, name: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![name, now(), id],
    )?;
    Ok(affected > 0)
}

pub fn update_account_image(conn: &Connection, id: &str, image: Option<&str>) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET image = ?1, updated_at = ?2 WHERE id = ?3",
        params![image, now(), id],
    )?;
    Ok(affected > 0)
}

/// Clear the onboarding flag.
pub fn complete_new_user_setup(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET is_new_user = 0, updated_at = ?1 WHERE id = ?2",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

pub fn update_account_role(conn: &Connection, id: &str, role: AccountRole) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE accounts SET role = ?1, updated_at = ?2 WHERE id = ?3",
        params![role.as_str(), now(), id],
    )?;
    Ok(affected > 0)
}

pub fn delete_account(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE role IN ('admin', 'super_admin')",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Organizations ============

/// Create an organization with its owner membership, atomically.
pub fn create_organization_with_owner(
    conn: &mut Connection,
    name: &str,
    email: &str,
    owner_account_id: &str,
) -> Result<Organization> {
    let org_id = EntityType::Organization.gen_id();
    let member_id = EntityType::OrgMember.gen_id();
    let now = now();
    let email = email.trim().to_lowercase();

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO organizations (id, name, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&org_id, name, &email, now, now],
    )?;
    tx.execute(
        "INSERT INTO org_members (id, account_id, org_id, role, created_at)
         VALUES (?1, ?2, ?3, 'owner', ?4)",
        params![&member_id, owner_account_id, &org_id, now],
    )?;
    tx.commit()?;

    Ok(Organization {
        id: org_id,
        name: name.to_string(),
        email,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_organization_by_id(conn: &Connection, id: &str) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!("SELECT {} FROM organizations WHERE id = ?1", ORGANIZATION_COLS),
        &[&id],
    )
}

/// Look up a tenant by billing contact email (customer resolver fallback).
pub fn get_organization_by_email(conn: &Connection, email: &str) -> Result<Option<Organization>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!(
            "SELECT {} FROM organizations WHERE email = ?1 ORDER BY created_at LIMIT 1",
            ORGANIZATION_COLS
        ),
        &[&email],
    )
}

pub fn update_organization(
    conn: &Connection,
    id: &str,
    input: &UpdateOrganization,
) -> Result<Option<Organization>> {
    if let Some(ref name) = input.name {
        conn.execute(
            "UPDATE organizations SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, now(), id],
        )?;
    }
    if let Some(ref email) = input.email {
        let email = email.trim().to_lowercase();
        conn.execute(
            "UPDATE organizations SET email = ?1, updated_at = ?2 WHERE id = ?3",
            params![&email, now(), id],
        )?;
    }
    get_organization_by_id(conn, id)
}

pub fn list_orgs_for_account(conn: &Connection, account_id: &str) -> Result<Vec<Organization>> {
    query_all(
        conn,
        "SELECT o.id, o.name, o.email, o.created_at, o.updated_at
         FROM organizations o
         JOIN org_members m ON m.org_id = o.id
         WHERE m.account_id = ?1
         ORDER BY o.created_at",
        &[&account_id],
    )
}

// ============ Org Members ============

pub fn create_org_member(
    conn: &Connection,
    org_id: &str,
    account_id: &str,
    role: OrgRole,
) -> Result<OrgMember> {
    let id = EntityType::OrgMember.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO org_members (id, account_id, org_id, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, account_id, org_id, role.as_str(), now],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::Conflict("Account is already a member of this organization".into())
        }
        other => other.into(),
    })?;

    Ok(OrgMember {
        id,
        account_id: account_id.to_string(),
        org_id: org_id.to_string(),
        role,
        created_at: now,
    })
}

pub fn get_org_member(
    conn: &Connection,
    org_id: &str,
    account_id: &str,
) -> Result<Option<OrgMember>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM org_members WHERE org_id = ?1 AND account_id = ?2",
            ORG_MEMBER_COLS
        ),
        &[&org_id, &account_id],
    )
}

pub fn list_org_members(conn: &Connection, org_id: &str) -> Result<Vec<OrgMemberWithAccount>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM org_members m JOIN accounts a ON a.id = m.account_id
             WHERE m.org_id = ?1 ORDER BY m.created_at",
            ORG_MEMBER_WITH_ACCOUNT_COLS
        ),
        &[&org_id],
    )
}

pub fn delete_org_member(conn: &Connection, org_id: &str, member_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM org_members WHERE id = ?1 AND org_id = ?2",
        params![member_id, org_id],
    )?;
    Ok(deleted > 0)
}

// ============ Feedback ============

pub fn create_feedback(
    conn: &Connection,
    account_id: &str,
    input: &CreateFeedback,
) -> Result<Feedback> {
    let id = EntityType::Feedback.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO feedback (id, account_id, title, message, label, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'open', ?6)",
        params![&id, account_id, &input.title, &input.message, input.label.as_str(), now],
    )?;

    Ok(Feedback {
        id,
        account_id: account_id.to_string(),
        title: input.title.clone(),
        message: input.message.clone(),
        label: input.label,
        status: FeedbackStatus::Open,
        created_at: now,
    })
}

pub fn list_feedback_for_account(conn: &Connection, account_id: &str) -> Result<Vec<Feedback>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM feedback WHERE account_id = ?1 ORDER BY created_at DESC",
            FEEDBACK_COLS
        ),
        &[&account_id],
    )
}

/// Delete a feedback entry owned by the given account.
pub fn delete_feedback_for_account(conn: &Connection, id: &str, account_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM feedback WHERE id = ?1 AND account_id = ?2",
        params![id, account_id],
    )?;
    Ok(deleted > 0)
}

pub fn get_feedback_by_id(conn: &Connection, id: &str) -> Result<Option<Feedback>> {
    query_one(
        conn,
        &format!("SELECT {} FROM feedback WHERE id = ?1", FEEDBACK_COLS),
        &[&id],
    )
}

pub fn update_feedback(
    conn: &Connection,
    id: &str,
    input: &UpdateFeedback,
) -> Result<Option<Feedback>> {
    conn.execute(
        "UPDATE feedback SET status = ?1, label = ?2 WHERE id = ?3",
        params![input.status.as_str(), input.label.as_str(), id],
    )?;
    get_feedback_by_id(conn, id)
}

pub fn delete_feedback(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM feedback WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

/// Paginated feedback listing for the admin table, with optional filters.
pub fn list_feedback_paginated(
    conn: &Connection,
    filters: &FeedbackFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<FeedbackWithAccount>, i64)> {
    let mut wheres: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(ref title) = filters.title {
        wheres.push(format!("f.title LIKE ?{}", values.len() + 1));
        values.push(format!("%{}%", title).into());
    }
    if let Some(label) = filters.label {
        wheres.push(format!("f.label = ?{}", values.len() + 1));
        values.push(label.as_str().to_string().into());
    }
    if let Some(status) = filters.status {
        wheres.push(format!("f.status = ?{}", values.len() + 1));
        values.push(status.as_str().to_string().into());
    }

    let where_clause = if wheres.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", wheres.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM feedback f {}", where_clause),
        rusqlite::params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    values.push(limit.into());
    values.push(offset.into());
    let sql = format!(
        "SELECT {} FROM feedback f JOIN accounts a ON a.id = f.account_id {}
         ORDER BY f.created_at DESC LIMIT ?{} OFFSET ?{}",
        FEEDBACK_WITH_ACCOUNT_COLS,
        where_clause,
        values.len() - 1,
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            rusqlite::params_from_iter(values.iter()),
            FeedbackWithAccount::from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((items, total))
}

// ============ Waitlist ============

/// Join the waitlist. Re-joining with the same email refreshes the name
/// instead of erroring.
pub fn upsert_waitlist_user(conn: &Connection, input: &JoinWaitlist) -> Result<WaitlistUser> {
    let id = EntityType::WaitlistUser.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO waitlist_users (id, name, email, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(email) DO UPDATE SET name = excluded.name",
        params![&id, &input.name, &email, now],
    )?;

    query_one(
        conn,
        &format!("SELECT {} FROM waitlist_users WHERE email = ?1", WAITLIST_COLS),
        &[&email],
    )?
    .ok_or_else(|| AppError::Internal("Waitlist row missing after upsert".into()))
}

pub fn list_waitlist_paginated(
    conn: &Connection,
    email: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<WaitlistUser>, i64)> {
    let mut wheres: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(email) = email {
        wheres.push(format!("email LIKE ?{}", values.len() + 1));
        values.push(format!("%{}%", email.trim().to_lowercase()).into());
    }

    let where_clause = if wheres.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", wheres.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM waitlist_users {}", where_clause),
        rusqlite::params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    values.push(limit.into());
    values.push(offset.into());
    let sql = format!(
        "SELECT {} FROM waitlist_users {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
        WAITLIST_COLS,
        where_clause,
        values.len() - 1,
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(
            rusqlite::params_from_iter(values.iter()),
            WaitlistUser::from_row,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((items, total))
}

pub fn delete_waitlist_user(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM waitlist_users WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Webhook Events ============

/// Durably record a received event before any processing is scheduled.
///
/// A duplicate `stripe_event_id` fails the insert; the resulting request
/// failure leaves redelivery to the provider's own retry policy.
pub fn store_webhook_event(
    conn: &Connection,
    event_name: &str,
    body: &serde_json::Value,
    stripe_event_id: &str,
) -> Result<String> {
    let id = EntityType::WebhookEvent.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO webhook_events (id, event_name, stripe_event_id, body, processed, processing_error, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, '', ?5)",
        params![&id, event_name, stripe_event_id, body.to_string(), now],
    )?;

    Ok(id)
}

pub fn get_webhook_event(conn: &Connection, id: &str) -> Result<Option<WebhookEvent>> {
    query_one(
        conn,
        &format!("SELECT {} FROM webhook_events WHERE id = ?1", WEBHOOK_EVENT_COLS),
        &[&id],
    )
}

/// Oldest event that has not yet reached its terminal state.
pub fn next_unprocessed_event(conn: &Connection) -> Result<Option<WebhookEvent>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM webhook_events WHERE processed = 0 ORDER BY created_at, id LIMIT 1",
            WEBHOOK_EVENT_COLS
        ),
        &[],
    )
}

/// Flip an event to its terminal state, recording any handler error.
pub fn mark_webhook_event_processed(
    conn: &Connection,
    id: &str,
    processing_error: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE webhook_events SET processed = 1, processing_error = ?1 WHERE id = ?2",
        params![processing_error, id],
    )?;
    Ok(affected > 0)
}

pub fn count_unprocessed_events(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM webhook_events WHERE processed = 0",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Stripe Customers ============

pub fn get_stripe_customer(conn: &Connection, stripe_id: &str) -> Result<Option<StripeCustomer>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM stripe_customers WHERE stripe_id = ?1",
            STRIPE_CUSTOMER_COLS
        ),
        &[&stripe_id],
    )
}

/// Insert a customer mapping. A concurrent insert of the same `stripe_id`
/// is not an error: the unique constraint is the only concurrency guard
/// here, and losing the race means the mapping already exists.
pub fn insert_stripe_customer(
    conn: &Connection,
    stripe_id: &str,
    org_id: &str,
    email: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO stripe_customers (stripe_id, org_id, email, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(stripe_id) DO NOTHING",
        params![stripe_id, org_id, email, now()],
    )?;
    Ok(())
}

pub fn get_stripe_customer_for_org(
    conn: &Connection,
    org_id: &str,
) -> Result<Option<StripeCustomer>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM stripe_customers WHERE org_id = ?1 ORDER BY created_at LIMIT 1",
            STRIPE_CUSTOMER_COLS
        ),
        &[&org_id],
    )
}

// ============ Subscriptions ============

/// Upsert the local mirror of a subscription, keyed on the Stripe id.
///
/// The update only applies when the incoming event is at least as new as
/// the stored row (`synced_at`), so out-of-order delivery cannot regress
/// subscription state.
pub fn upsert_subscription(conn: &Connection, input: &UpsertSubscription) -> Result<()> {
    let id = EntityType::Subscription.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO subscriptions (id, stripe_id, org_id, status, price_id, current_period_start,
                                    current_period_end, cancel_at_period_end, synced_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
         ON CONFLICT(stripe_id) DO UPDATE SET
             org_id = excluded.org_id,
             status = excluded.status,
             price_id = excluded.price_id,
             current_period_start = excluded.current_period_start,
             current_period_end = excluded.current_period_end,
             cancel_at_period_end = excluded.cancel_at_period_end,
             synced_at = excluded.synced_at,
             updated_at = excluded.updated_at
         WHERE excluded.synced_at >= subscriptions.synced_at",
        params![
            &id,
            &input.stripe_id,
            &input.org_id,
            &input.status,
            &input.price_id,
            input.current_period_start,
            input.current_period_end,
            input.cancel_at_period_end as i32,
            input.synced_at,
            now,
        ],
    )?;
    Ok(())
}

pub fn get_subscription_by_stripe_id(
    conn: &Connection,
    stripe_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE stripe_id = ?1",
            SUBSCRIPTION_COLS
        ),
        &[&stripe_id],
    )
}

pub fn get_subscription_for_org(conn: &Connection, org_id: &str) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE org_id = ?1 ORDER BY updated_at DESC LIMIT 1",
            SUBSCRIPTION_COLS
        ),
        &[&org_id],
    )
}

/// Partial status update for billing actions that don't carry full
/// subscription data (pause, cancel).
pub fn update_subscription_flags(
    conn: &Connection,
    stripe_id: &str,
    status: &str,
    cancel_at_period_end: bool,
) -> Result<bool> {
    let now = now();
    let affected = conn.execute(
        "UPDATE subscriptions SET status = ?1, cancel_at_period_end = ?2, synced_at = ?3, updated_at = ?3
         WHERE stripe_id = ?4",
        params![status, cancel_at_period_end as i32, now, stripe_id],
    )?;
    Ok(affected > 0)
}

// ============ Invoices ============

/// Record a paid invoice. Returns false when the invoice was already
/// recorded (replayed event), which is not an error.
pub fn insert_invoice(conn: &Connection, input: &CreateInvoice) -> Result<bool> {
    let id = EntityType::Invoice.gen_id();
    let inserted = conn.execute(
        "INSERT INTO stripe_invoices (id, stripe_id, org_id, amount_paid, status, subscription_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(stripe_id) DO NOTHING",
        params![
            &id,
            &input.stripe_id,
            &input.org_id,
            input.amount_paid,
            &input.status,
            &input.subscription_id,
            input.created_at,
        ],
    )?;
    Ok(inserted > 0)
}

pub fn list_invoices_for_org(conn: &Connection, org_id: &str) -> Result<Vec<Invoice>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM stripe_invoices WHERE org_id = ?1 ORDER BY created_at DESC",
            INVOICE_COLS
        ),
        &[&org_id],
    )
}

// ============ Stats ============

/// Creation timestamps of accounts newer than `since` (bucketed in the
/// stats handler).
pub fn account_created_since(conn: &Connection, since: i64) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT created_at FROM accounts WHERE created_at >= ?1 ORDER BY created_at")?;
    let rows = stmt
        .query_map(params![since], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_accounts(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
        .map_err(Into::into)
}

pub fn subscription_created_since(conn: &Connection, since: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT created_at FROM subscriptions WHERE created_at >= ?1 ORDER BY created_at")?;
    let rows = stmt
        .query_map(params![since], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count_subscriptions(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM subscriptions", [], |row| row.get(0))
        .map_err(Into::into)
}

/// (created_at, amount_paid) of paid invoices newer than `since`.
pub fn paid_invoices_since(conn: &Connection, since: i64) -> Result<Vec<(i64, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, amount_paid FROM stripe_invoices
         WHERE status = 'paid' AND created_at >= ?1 ORDER BY created_at",
    )?;
    let rows = stmt
        .query_map(params![since], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn total_paid_revenue(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount_paid), 0) FROM stripe_invoices WHERE status = 'paid'",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
