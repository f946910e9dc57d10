//! Webhook delivery authentication.
//!
//! Deliveries carry an `x-z402-signature` header of the form
//! `t=<unix-ts>,v1=<hex>` where the MAC is HMAC-SHA256 over
//! `"{t}.{raw body}"` with the shared webhook secret. Verification must
//! happen on the raw body before any event parsing — the system never
//! branches on contents of an unauthenticated payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-z402-signature";

/// Maximum accepted age of a signature, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

fn mac_hex(secret: &[u8], timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Compute a signature header value for a payload. Used by webhook senders
/// and by tests constructing authentic deliveries.
pub fn sign(secret: &[u8], payload: &[u8], timestamp: i64) -> String {
    format!("t={},v1={}", timestamp, mac_hex(secret, timestamp, payload))
}

/// Verify a signature header against the raw payload.
///
/// Returns `false` for any mismatch, malformed header, or timestamp outside
/// `tolerance_secs` of `now`. The MAC comparison is constant-time; a
/// non-hex signature is compared against zeros rather than short-circuiting.
pub fn verify(secret: &[u8], payload: &[u8], signature: &str, now: i64, tolerance_secs: i64) -> bool {
    let mut timestamp: Option<i64> = None;
    let mut provided: Option<&str> = None;
    for part in signature.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t.parse().ok();
        } else if let Some(v) = part.strip_prefix("v1=") {
            provided = Some(v);
        }
    }
    let (timestamp, provided) = match (timestamp, provided) {
        (Some(t), Some(v)) => (t, v),
        _ => return false,
    };

    if (now - timestamp).abs() > tolerance_secs {
        return false;
    }

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Invalid hex decodes to zeros so the comparison still runs.
    let expected = hex::decode(provided).unwrap_or_else(|_| vec![0u8; 32]);

    // hmac's verify_slice is constant-time.
    mac.verify_slice(&expected).is_ok()
}
