mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::Notify;

use crate::payments::StripeClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool, the injected Stripe client,
/// and the outbox wakeup handle.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub stripe: Arc<StripeClient>,
    /// Base URL for provider redirects (checkout success/cancel, portal return)
    pub base_url: String,
    /// Nudged after every stored webhook event so the outbox worker drains
    /// without waiting for its poll interval.
    pub outbox: Arc<Notify>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
