//! Outbox worker for stored webhook events.
//!
//! The webhook endpoint only writes the event and nudges this worker; the
//! worker drains unprocessed events oldest-first. Because the pending state
//! lives in the database, events received before a crash are picked up on
//! the next poll after restart - nothing rides on an in-flight task.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::handlers::webhooks::process;

pub fn spawn_outbox_worker(state: AppState, poll_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "Outbox worker started (poll interval: {}s)",
            poll_interval.as_secs()
        );
        loop {
            if let Err(e) = drain(&state).await {
                // Infrastructure failure: the event stays unprocessed and is
                // retried on the next wakeup instead of hot-looping here.
                tracing::error!("Outbox drain failed: {}", e);
            }

            tokio::select! {
                _ = state.outbox.notified() => {}
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    })
}

/// Dispatch every unprocessed event, oldest first, until none remain.
///
/// Also callable directly (tests, operator re-trigger) without the worker.
pub async fn drain(state: &AppState) -> Result<()> {
    loop {
        let next = {
            let conn = state.db.get()?;
            queries::next_unprocessed_event(&conn)?
        };

        let Some(event) = next else {
            return Ok(());
        };

        process::dispatch(state, &event.id).await?;
    }
}
