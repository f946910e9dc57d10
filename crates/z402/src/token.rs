//! Authorization tokens.
//!
//! A token is the client-held proof of a payment claim: opaque to the
//! client, bound to exactly one intent, carrying its own expiry independent
//! of the intent's. The payment backend seals tokens; the gateway only
//! verifies them, so verification sits behind the [`TokenVerifier`] trait.
//! [`MacTokenSigner`] is the bundled keyed-MAC implementation standing in
//! for the backend's sealing scheme (and the test vector factory).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::Z402Error;

type HmacSha256 = Hmac<Sha256>;

/// Claims recovered from a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub intent_id: String,
    pub expires_at: i64,
}

/// Outcome of token verification. Invalid and expired are distinguished so
/// the gateway can report a reason; both are expected conditions, not
/// errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Valid(TokenClaims),
    /// Authentic seal, but the token's own validity window has passed.
    Expired(TokenClaims),
    /// Well-formed but the seal does not check out.
    Invalid,
}

/// Black-box verification predicate over a bearer token.
///
/// `Err(Validation)` is reserved for input that is not even token-shaped.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, raw: &str, now: i64) -> Result<TokenOutcome, Z402Error>;
}

/// HMAC-sealed tokens: `<intent_id>.<expires_at>.<hex mac>`, MAC over
/// `"{intent_id}.{expires_at}"`.
pub struct MacTokenSigner {
    key: Vec<u8>,
}

impl MacTokenSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Seal a token for an intent. Only the payment backend issues tokens
    /// in production; the gateway uses this in tests.
    pub fn issue(&self, intent_id: &str, expires_at: i64) -> String {
        format!("{}.{}.{}", intent_id, expires_at, self.mac_hex(intent_id, expires_at))
    }

    fn mac_hex(&self, intent_id: &str, expires_at: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(intent_id.as_bytes());
        mac.update(b".");
        mac.update(expires_at.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl TokenVerifier for MacTokenSigner {
    fn verify(&self, raw: &str, now: i64) -> Result<TokenOutcome, Z402Error> {
        let mut parts = raw.splitn(3, '.');
        let (intent_id, expires_str, provided) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c)) if !a.is_empty() => (a, b, c),
            _ => return Err(Z402Error::Validation("malformed authorization token".to_string())),
        };
        let expires_at: i64 = expires_str
            .parse()
            .map_err(|_| Z402Error::Validation("malformed token expiry".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(intent_id.as_bytes());
        mac.update(b".");
        mac.update(expires_at.to_string().as_bytes());
        let expected = hex::decode(provided).unwrap_or_else(|_| vec![0u8; 32]);
        if mac.verify_slice(&expected).is_err() {
            return Ok(TokenOutcome::Invalid);
        }

        let claims = TokenClaims {
            intent_id: intent_id.to_string(),
            expires_at,
        };
        if now >= expires_at {
            return Ok(TokenOutcome::Expired(claims));
        }
        Ok(TokenOutcome::Valid(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> MacTokenSigner {
        MacTokenSigner::new(b"sk_test_key".to_vec())
    }

    #[test]
    fn issued_token_verifies() {
        let token = signer().issue("pi_abc", 2_000_000_000);
        match signer().verify(&token, 1_700_000_000).unwrap() {
            TokenOutcome::Valid(claims) => {
                assert_eq!(claims.intent_id, "pi_abc");
                assert_eq!(claims.expires_at, 2_000_000_000);
            }
            other => panic!("expected valid token, got {:?}", other),
        }
    }

    #[test]
    fn expired_token_is_reported_not_an_error() {
        let token = signer().issue("pi_abc", 1_000);
        assert!(matches!(
            signer().verify(&token, 1_000).unwrap(),
            TokenOutcome::Expired(_)
        ));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let token = signer().issue("pi_abc", 2_000_000_000);
        let other = MacTokenSigner::new(b"sk_other".to_vec());
        assert_eq!(
            other.verify(&token, 1_700_000_000).unwrap(),
            TokenOutcome::Invalid
        );
    }

    #[test]
    fn rebinding_to_another_intent_breaks_the_seal() {
        let token = signer().issue("pi_abc", 2_000_000_000);
        let forged = token.replacen("pi_abc", "pi_xyz", 1);
        assert_eq!(
            signer().verify(&forged, 1_700_000_000).unwrap(),
            TokenOutcome::Invalid
        );
    }

    #[test]
    fn malformed_shapes_are_validation_errors() {
        for raw in ["", "pi_abc", "pi_abc.123", ".123.deadbeef", "pi_abc.notanumber.deadbeef"] {
            assert!(matches!(
                signer().verify(raw, 0),
                Err(Z402Error::Validation(_))
            ));
        }
    }
}
