//! Read-path access decisions.
//!
//! Verifies a bearer authorization token against its bound intent: the
//! token's seal and expiry (delegated to the [`TokenVerifier`] black box),
//! the intent's settlement state, and the intent's own deadline. Purely a
//! read; the only errors are malformed input and store failure — every
//! "not paid yet" condition is a [`Denial`] value.

use std::sync::Arc;

use z402::intent::{PaymentIntent, PaymentStatus};
use z402::token::{TokenOutcome, TokenVerifier};

use crate::error::GatewayError;
use crate::store::IntentStore;

/// Why access was denied. Distinguishes invalid from expired where
/// derivable, per-cause in logs even when the wire status coincides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Token seal does not verify, or references no known intent.
    InvalidToken,
    /// Token seal is authentic but the token's validity window has passed.
    TokenExpired,
    /// The bound intent is past its deadline, whatever its stored status.
    PaymentExpired,
    /// The bound intent exists but is not in a state that grants access.
    PaymentNotSettled(PaymentStatus),
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::PaymentExpired => "payment_expired",
            Self::PaymentNotSettled(_) => "payment_not_settled",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidToken => "The provided payment token is invalid".to_string(),
            Self::TokenExpired => "The provided payment token has expired".to_string(),
            Self::PaymentExpired => "The payment for this token has expired".to_string(),
            Self::PaymentNotSettled(status) => {
                format!("The payment is not in an access-granting state ({})", status)
            }
        }
    }
}

#[derive(Debug)]
pub enum AccessDecision {
    Granted(Box<PaymentIntent>),
    Denied(Denial),
}

/// Authorization verifier wired to the intent store and a token backend.
#[derive(Clone)]
pub struct AccessVerifier {
    store: IntentStore,
    tokens: Arc<dyn TokenVerifier>,
}

impl AccessVerifier {
    pub fn new(store: IntentStore, tokens: Arc<dyn TokenVerifier>) -> Self {
        Self { store, tokens }
    }

    /// Decide whether a raw bearer token unlocks its resource at `now`.
    ///
    /// Malformed token shape surfaces as a validation error; everything
    /// else resolves to a decision. Store failure propagates so the caller
    /// can degrade to denial without crashing.
    pub fn check(&self, raw_token: &str, now: i64) -> Result<AccessDecision, GatewayError> {
        let claims = match self.tokens.verify(raw_token, now)? {
            TokenOutcome::Valid(claims) => claims,
            TokenOutcome::Expired(_) => return Ok(AccessDecision::Denied(Denial::TokenExpired)),
            TokenOutcome::Invalid => return Ok(AccessDecision::Denied(Denial::InvalidToken)),
        };

        let intent = match self.store.get_intent(&claims.intent_id)? {
            Some(intent) => intent,
            // A sealed token for an unknown intent reads as invalid to the
            // client; the distinction stays in the logs.
            None => {
                tracing::warn!(intent_id = %claims.intent_id, "token references unknown intent");
                return Ok(AccessDecision::Denied(Denial::InvalidToken));
            }
        };

        // Intent expiry is checked by deadline regardless of stored status;
        // the sweep may not have run yet.
        if intent.is_expired(now) {
            return Ok(AccessDecision::Denied(Denial::PaymentExpired));
        }

        if !intent.status.grants_access() {
            return Ok(AccessDecision::Denied(Denial::PaymentNotSettled(
                intent.status,
            )));
        }

        Ok(AccessDecision::Granted(Box::new(intent)))
    }
}
