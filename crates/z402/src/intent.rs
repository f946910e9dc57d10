use serde::{Deserialize, Serialize};

/// Lifecycle state of a payment intent.
///
/// The success path is a lattice, not a sequence: webhook delivery is
/// at-least-once and unordered, so later states absorb earlier ones
/// (`settled` arriving before `verified` still lands on `Settled`).
/// `Failed`, `Expired`, and `Refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Settled,
    Failed,
    Expired,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Expired | Self::Refunded)
    }

    /// True while an authorization token bound to this intent may be honored.
    pub fn grants_access(self) -> bool {
        matches!(self, Self::Verified | Self::Settled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Settled => "settled",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "settled" => Some(Self::Settled),
            "failed" => Some(Self::Failed),
            "expired" => Some(Self::Expired),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to pay for access to a resource.
///
/// Owned exclusively by the intent store; status changes only through the
/// reconciler's atomic transition or the expiry sweep. All timestamps are
/// unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub resource_url: String,
    pub amount: String,
    pub currency: String,
    /// Shielded address the payer sends funds to.
    pub payment_address: String,
    pub status: PaymentStatus,
    pub created_at: i64,
    pub expires_at: i64,
    pub updated_at: i64,
}

impl PaymentIntent {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Event type reported by the payment backend.
///
/// The catalog is open: the backend ships new types on its own cadence, so
/// unrecognized tags are carried through [`EventType::Other`] and must route
/// to a log-and-acknowledge branch, never to a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Created,
    Verified,
    Settled,
    Failed,
    Refunded,
    Other(String),
}

impl EventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "payment.created" => Self::Created,
            "payment.verified" => Self::Verified,
            "payment.settled" => Self::Settled,
            "payment.failed" => Self::Failed,
            "payment.refunded" => Self::Refunded,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "payment.created",
            Self::Verified => "payment.verified",
            Self::Settled => "payment.settled",
            Self::Failed => "payment.failed",
            Self::Refunded => "payment.refunded",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Webhook delivery payload: `{ "type": "...", "data": { "id": "..." } }`.
///
/// The envelope carries no reliable per-delivery id; the dedup key is
/// `(type, data.id)`. The signature travels in the `x-z402-signature`
/// header, outside the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub id: String,
}

/// Result of merging one event into an intent's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status moves forward to the given state.
    Advance(PaymentStatus),
    /// Recognized and consistent, but carries no state change
    /// (e.g. `payment.created` for a pending intent).
    NoOp,
    /// Stale or inapplicable for the current state: late arrival after a
    /// terminal state, or an event the current state already subsumes.
    /// Logged and dropped, never an error.
    Ignored,
}

/// Pure monotone-merge transition function.
///
/// Progress order is `Pending < Verified < Settled < Refunded`; an event
/// implying a later state than the current one jumps straight there
/// (settlement implies verification, refund implies settlement), and an
/// event for an already-passed state is ignored. `Failed` is only reachable
/// before settlement. Terminal states absorb everything.
pub fn merge(current: PaymentStatus, event: &EventType) -> Transition {
    use PaymentStatus::*;

    if current.is_terminal() {
        return Transition::Ignored;
    }

    match event {
        EventType::Created => Transition::NoOp,
        EventType::Verified => match current {
            Pending => Transition::Advance(Verified),
            _ => Transition::Ignored,
        },
        EventType::Settled => match current {
            Pending | Verified => Transition::Advance(Settled),
            _ => Transition::Ignored,
        },
        EventType::Failed => match current {
            Pending | Verified => Transition::Advance(Failed),
            _ => Transition::Ignored,
        },
        EventType::Refunded => match current {
            Pending | Verified | Settled => Transition::Advance(Refunded),
            _ => Transition::Ignored,
        },
        EventType::Other(_) => Transition::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentStatus::*;

    #[test]
    fn happy_path_advances_in_order() {
        assert_eq!(merge(Pending, &EventType::Verified), Transition::Advance(Verified));
        assert_eq!(merge(Verified, &EventType::Settled), Transition::Advance(Settled));
        assert_eq!(merge(Settled, &EventType::Refunded), Transition::Advance(Refunded));
    }

    #[test]
    fn created_is_informational() {
        assert_eq!(merge(Pending, &EventType::Created), Transition::NoOp);
        assert_eq!(merge(Verified, &EventType::Created), Transition::NoOp);
    }

    #[test]
    fn settled_merges_directly_from_pending() {
        // Out-of-order delivery: settlement implies verification.
        assert_eq!(merge(Pending, &EventType::Settled), Transition::Advance(Settled));
    }

    #[test]
    fn refunded_merges_forward_from_any_live_state() {
        assert_eq!(merge(Pending, &EventType::Refunded), Transition::Advance(Refunded));
        assert_eq!(merge(Verified, &EventType::Refunded), Transition::Advance(Refunded));
    }

    #[test]
    fn verified_after_settled_is_ignored() {
        assert_eq!(merge(Settled, &EventType::Verified), Transition::Ignored);
    }

    #[test]
    fn failed_is_unreachable_after_settlement() {
        assert_eq!(merge(Settled, &EventType::Failed), Transition::Ignored);
    }

    #[test]
    fn terminal_states_absorb_everything() {
        for terminal in [Failed, Expired, Refunded] {
            for event in [
                EventType::Created,
                EventType::Verified,
                EventType::Settled,
                EventType::Failed,
                EventType::Refunded,
            ] {
                assert_eq!(merge(terminal, &event), Transition::Ignored);
            }
        }
    }

    #[test]
    fn unknown_event_types_parse_and_are_ignored() {
        let event = EventType::parse("payment.disputed");
        assert_eq!(event, EventType::Other("payment.disputed".to_string()));
        assert_eq!(merge(Pending, &event), Transition::Ignored);
    }

    #[test]
    fn status_roundtrips_through_text() {
        for status in [Pending, Verified, Settled, Failed, Expired, Refunded] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("paid"), None);
    }

    #[test]
    fn event_wire_shape_deserializes() {
        let event: WebhookEvent =
            serde_json::from_str(r#"{"type":"payment.verified","data":{"id":"pi_1","extra":1}}"#)
                .unwrap();
        assert_eq!(event.event_type, "payment.verified");
        assert_eq!(event.data.id, "pi_1");
    }
}
