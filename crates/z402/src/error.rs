use thiserror::Error;

/// Errors returned by z402 operations.
///
/// Expected "not yet paid" conditions are not errors — verification
/// predicates report those as plain outcomes ([`crate::token::TokenOutcome`],
/// the boolean webhook verdict). Only malformed input and failed
/// authentication travel through this type.
#[derive(Debug, Error)]
pub enum Z402Error {
    /// Malformed caller input (bad amount, bad token shape). Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Webhook signature missing or invalid.
    #[error("authentication error: {0}")]
    Authentication(String),
}
