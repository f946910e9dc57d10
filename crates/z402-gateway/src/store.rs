use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use z402::intent::{merge, EventType, PaymentIntent, PaymentStatus, Transition};

use crate::error::GatewayError;

/// Result of feeding one webhook event through the store.
///
/// Every variant except a store failure is acknowledged to the sender —
/// duplicates, stale arrivals, and unknown types are expected traffic under
/// at-least-once delivery, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Status advanced.
    Applied {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    /// Recognized event with no state change (e.g. `payment.created`).
    NoOp,
    /// Same `(type, intent)` key already fully applied.
    Duplicate,
    /// Stale or inapplicable for the intent's current status.
    Ignored { status: PaymentStatus },
    /// No intent with the referenced id.
    UnknownIntent,
    /// Event type outside the known catalog.
    UnknownEvent,
}

impl ReconcileOutcome {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::NoOp => "noop",
            Self::Duplicate => "duplicate",
            Self::Ignored { .. } => "ignored",
            Self::UnknownIntent => "unknown_intent",
            Self::UnknownEvent => "unknown_event",
        }
    }
}

/// SQLite-backed intent store.
///
/// The single shared connection serializes writers; each reconciliation is
/// additionally wrapped in a transaction so the status update and its dedup
/// marker commit together or not at all.
#[derive(Clone)]
pub struct IntentStore {
    conn: Arc<Mutex<Connection>>,
}

impl IntentStore {
    pub fn open(path: &str) -> Result<Self, GatewayError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, GatewayError> {
        self.conn
            .lock()
            .map_err(|_| GatewayError::Internal("intent store lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), GatewayError> {
        let conn = self.lock()?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS payment_intents (
                id TEXT PRIMARY KEY,
                resource_url TEXT NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                payment_address TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_intents_resource ON payment_intents(resource_url, status)",
            [],
        )?;

        // Dedup ledger for at-least-once webhook delivery. One row per fully
        // applied (type, intent) pair.
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS processed_events (
                event_type TEXT NOT NULL,
                intent_id TEXT NOT NULL,
                applied_at INTEGER NOT NULL,
                PRIMARY KEY (event_type, intent_id)
            )
            "#,
            [],
        )?;

        Ok(())
    }

    pub fn insert_intent(&self, intent: &PaymentIntent) -> Result<(), GatewayError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO payment_intents
                (id, resource_url, amount, currency, payment_address, status, created_at, expires_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                intent.id,
                intent.resource_url,
                intent.amount,
                intent.currency,
                intent.payment_address,
                intent.status.as_str(),
                intent.created_at,
                intent.expires_at,
                intent.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_intent(&self, id: &str) -> Result<Option<PaymentIntent>, GatewayError> {
        let conn = self.lock()?;
        let intent = conn
            .query_row(
                r#"
                SELECT id, resource_url, amount, currency, payment_address, status, created_at, expires_at, updated_at
                FROM payment_intents
                WHERE id = ?1
                "#,
                params![id],
                row_to_intent,
            )
            .optional()?;
        Ok(intent)
    }

    /// Most recent live intent for a resource, reusable instead of minting a
    /// new one. An optimization against intent proliferation, not a
    /// correctness requirement.
    ///
    /// Keyed on the resource alone: the challenged request carries no
    /// credential to derive a client identity from, and access is bound to
    /// the intent by the authorization token, not by who was challenged.
    pub fn find_reusable_intent(
        &self,
        resource_url: &str,
        now: i64,
    ) -> Result<Option<PaymentIntent>, GatewayError> {
        let conn = self.lock()?;
        let intent = conn
            .query_row(
                r#"
                SELECT id, resource_url, amount, currency, payment_address, status, created_at, expires_at, updated_at
                FROM payment_intents
                WHERE resource_url = ?1
                  AND status IN ('pending', 'verified')
                  AND expires_at > ?2
                ORDER BY created_at DESC
                LIMIT 1
                "#,
                params![resource_url, now],
                row_to_intent,
            )
            .optional()?;
        Ok(intent)
    }

    /// Apply one authenticated webhook event to its intent.
    ///
    /// The dedup check, status transition, and dedup marker all happen in
    /// one transaction under the connection lock, so a duplicate concurrent
    /// delivery applies its effect exactly once, and two different events
    /// for the same intent merge deterministically regardless of order.
    ///
    /// `event_type` is the raw wire string — the dedup key must match what
    /// the sender retries with, including types we do not recognize.
    pub fn apply_event(
        &self,
        event_type: &str,
        intent_id: &str,
        now: i64,
    ) -> Result<ReconcileOutcome, GatewayError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let already_applied: bool = tx
            .query_row(
                "SELECT 1 FROM processed_events WHERE event_type = ?1 AND intent_id = ?2",
                params![event_type, intent_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if already_applied {
            return Ok(ReconcileOutcome::Duplicate);
        }

        let event = EventType::parse(event_type);

        let row: Option<(String, i64)> = tx
            .query_row(
                "SELECT status, expires_at FROM payment_intents WHERE id = ?1",
                params![intent_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let outcome = match row {
            None => ReconcileOutcome::UnknownIntent,
            Some((status_str, expires_at)) => {
                let mut current = PaymentStatus::parse(&status_str).ok_or_else(|| {
                    GatewayError::Internal(format!(
                        "corrupt status '{}' for intent {}",
                        status_str, intent_id
                    ))
                })?;

                // Expiry is an absolute deadline: an overdue pending intent
                // is expired before the event is considered, making the
                // arrival late-for-terminal.
                if current == PaymentStatus::Pending && now >= expires_at {
                    tx.execute(
                        "UPDATE payment_intents SET status = 'expired', updated_at = ?1 WHERE id = ?2",
                        params![now, intent_id],
                    )?;
                    current = PaymentStatus::Expired;
                }

                if let EventType::Other(_) = event {
                    ReconcileOutcome::UnknownEvent
                } else {
                    match merge(current, &event) {
                        Transition::Advance(next) => {
                            tx.execute(
                                "UPDATE payment_intents SET status = ?1, updated_at = ?2 WHERE id = ?3",
                                params![next.as_str(), now, intent_id],
                            )?;
                            ReconcileOutcome::Applied {
                                from: current,
                                to: next,
                            }
                        }
                        Transition::NoOp => ReconcileOutcome::NoOp,
                        Transition::Ignored => ReconcileOutcome::Ignored { status: current },
                    }
                }
            }
        };

        tx.execute(
            "INSERT INTO processed_events (event_type, intent_id, applied_at) VALUES (?1, ?2, ?3)",
            params![event_type, intent_id, now],
        )?;

        tx.commit()?;
        Ok(outcome)
    }

    /// Bulk-expire overdue pending intents. Returns the number expired.
    /// Expiry is also enforced lazily on read and on event application, so
    /// sweep cadence never affects correctness.
    pub fn expire_overdue(&self, now: i64) -> Result<usize, GatewayError> {
        let conn = self.lock()?;
        let expired = conn.execute(
            "UPDATE payment_intents SET status = 'expired', updated_at = ?1
             WHERE status = 'pending' AND expires_at <= ?1",
            params![now],
        )?;
        Ok(expired)
    }
}

fn row_to_intent(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaymentIntent> {
    let status_str: String = row.get(5)?;
    let status = PaymentStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unrecognized status '{}'", status_str).into(),
        )
    })?;
    Ok(PaymentIntent {
        id: row.get(0)?,
        resource_url: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        payment_address: row.get(4)?,
        status,
        created_at: row.get(6)?,
        expires_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
