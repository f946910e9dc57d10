//! z402-gateway — payment-gated access to HTTP resources.
//!
//! Wraps a protected resource in the z402 challenge/response protocol:
//! unauthorized requests receive a 402 with a payment intent descriptor,
//! the payment backend reports settlement progress through signed webhooks
//! reconciled idempotently into the SQLite intent store, and requests
//! presenting a valid authorization token are served while the bound intent
//! is verified or settled and unexpired.
//!
//! # Modules
//!
//! - [`routes`] — HTTP surface (protected resource, webhook receiver,
//!   health, metrics)
//! - [`store`] — SQLite intent store and the atomic event reconciler
//! - [`intents`] — intent creation for the challenge path
//! - [`verifier`] — read-path access decisions
//! - [`config`] — environment-driven configuration
//! - [`sweep`] — background expiry sweep

pub mod config;
pub mod cors;
pub mod error;
pub mod intents;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod store;
pub mod sweep;
pub mod verifier;

pub use config::{GatewayConfig, Network};
pub use error::GatewayError;
pub use state::AppState;
pub use store::{IntentStore, ReconcileOutcome};
pub use verifier::{AccessDecision, AccessVerifier, Denial};
