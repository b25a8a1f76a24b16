use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Accounts (identity - source of truth for name/email/role)
        -- token_hash: salted SHA-256 of the bearer token issued at signup
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            image TEXT,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin', 'super_admin')),
            is_new_user INTEGER NOT NULL DEFAULT 1,
            token_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email);
        CREATE INDEX IF NOT EXISTS idx_accounts_token ON accounts(token_hash);
        CREATE INDEX IF NOT EXISTS idx_accounts_created ON accounts(created_at);

        -- Organizations (tenants - the billing-owning entity)
        -- email is the billing contact matched by the customer resolver
        CREATE TABLE IF NOT EXISTS organizations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_organizations_email ON organizations(email);

        -- Organization members
        CREATE TABLE IF NOT EXISTS org_members (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'member')),
            created_at INTEGER NOT NULL,
            UNIQUE(account_id, org_id)
        );
        CREATE INDEX IF NOT EXISTS idx_org_members_org ON org_members(org_id);
        CREATE INDEX IF NOT EXISTS idx_org_members_account ON org_members(account_id);

        -- User feedback
        CREATE TABLE IF NOT EXISTS feedback (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            label TEXT NOT NULL CHECK (label IN ('issue', 'idea', 'question', 'complaint', 'feature_request', 'other')),
            status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'in_progress', 'closed')),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_feedback_account ON feedback(account_id);
        CREATE INDEX IF NOT EXISTS idx_feedback_created ON feedback(created_at DESC);

        -- Waitlist signups (upserted on email)
        CREATE TABLE IF NOT EXISTS waitlist_users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );

        -- Received Stripe events. Stored durably before any processing;
        -- flipped to processed exactly once after the dispatch attempt.
        CREATE TABLE IF NOT EXISTS webhook_events (
            id TEXT PRIMARY KEY,
            event_name TEXT NOT NULL,
            stripe_event_id TEXT NOT NULL UNIQUE,
            body TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            processing_error TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webhook_events_pending ON webhook_events(created_at) WHERE processed = 0;

        -- Stripe customer -> tenant mapping, created lazily by the resolver.
        -- The UNIQUE constraint is the concurrency guard: a lost insert race
        -- is treated as success.
        CREATE TABLE IF NOT EXISTS stripe_customers (
            stripe_id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            email TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_stripe_customers_org ON stripe_customers(org_id);

        -- Local mirror of Stripe subscriptions, upserted keyed on stripe_id.
        -- synced_at carries the provider event timestamp; older events lose.
        CREATE TABLE IF NOT EXISTS subscriptions (
            id TEXT PRIMARY KEY,
            stripe_id TEXT NOT NULL UNIQUE,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            price_id TEXT NOT NULL,
            current_period_start INTEGER NOT NULL,
            current_period_end INTEGER NOT NULL,
            cancel_at_period_end INTEGER NOT NULL DEFAULT 0,
            synced_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_org ON subscriptions(org_id);

        -- Local mirror of paid Stripe invoices. Insert-only; the unique
        -- stripe_id makes replayed payment events idempotent.
        CREATE TABLE IF NOT EXISTS stripe_invoices (
            id TEXT PRIMARY KEY,
            stripe_id TEXT NOT NULL UNIQUE,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            amount_paid INTEGER NOT NULL,
            status TEXT NOT NULL,
            subscription_id TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_stripe_invoices_org ON stripe_invoices(org_id);
        CREATE INDEX IF NOT EXISTS idx_stripe_invoices_created ON stripe_invoices(created_at);
        "#,
    )?;
    Ok(())
}
