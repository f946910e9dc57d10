//! Periodic expiry sweep.
//!
//! Eagerly moves overdue pending intents to `expired`. Cadence does not
//! affect correctness — expiry is also enforced lazily on read and on event
//! application — so the loop just keeps the store tidy and the logs honest.

use std::time::Duration;

use crate::metrics;
use crate::store::IntentStore;

/// Run one sweep pass. Used at startup and by the interval loop.
pub fn sweep_once(store: &IntentStore) {
    let now = chrono::Utc::now().timestamp();
    match store.expire_overdue(now) {
        Ok(0) => {}
        Ok(n) => {
            metrics::INTENTS_EXPIRED.inc_by(n as u64);
            tracing::info!(expired = n, "expired overdue payment intents");
        }
        Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
    }
}

/// Spawn the background sweep loop. Fire-and-forget; lives for the process.
pub fn spawn(store: IntentStore, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick fires immediately; startup already swept.
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep_once(&store);
        }
    });
}
