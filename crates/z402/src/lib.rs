//! Core types for the z402 payment-gated access protocol.
//!
//! A client requesting a protected resource without proof of payment is
//! challenged with a 402 carrying a [`PaymentIntent`] descriptor. The payer
//! settles out-of-band; the payment backend reports progress through signed,
//! at-least-once webhook deliveries which are merged into the intent record.
//! The client then presents an authorization token bound to the intent.
//!
//! This crate holds the protocol pieces with no I/O attached:
//!
//! - [`intent`] — intent record, status lattice, event types, and the pure
//!   monotone transition function
//! - [`webhook`] — `t=<ts>,v1=<hex>` HMAC-SHA256 signature scheme for
//!   webhook deliveries
//! - [`token`] — authorization token sealing and the [`TokenVerifier`] seam
//! - [`error`] — error taxonomy shared with the gateway
//!
//! Storage and HTTP live in the `z402-gateway` crate.

pub mod error;
pub mod intent;
pub mod security;
pub mod token;
pub mod webhook;

pub use error::Z402Error;
pub use intent::{EventType, PaymentIntent, PaymentStatus, Transition, WebhookEvent};
pub use token::{MacTokenSigner, TokenClaims, TokenOutcome, TokenVerifier};
