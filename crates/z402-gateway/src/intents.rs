//! Intent creation for the 402 challenge path.

use uuid::Uuid;
use z402::intent::{PaymentIntent, PaymentStatus};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::store::IntentStore;

/// Amount must be a plain positive decimal ("0.01", "3"). No exponents,
/// signs, or empty fractions.
pub fn validate_amount(amount: &str) -> Result<(), GatewayError> {
    let mut parts = amount.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next();
    let digits_ok = !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    let nonzero = amount.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if !digits_ok || !nonzero || amount.len() > 32 {
        return Err(GatewayError::Validation(format!(
            "invalid amount: {:?}",
            amount
        )));
    }
    Ok(())
}

/// Currency codes are short uppercase ASCII ("ZEC").
pub fn validate_currency(currency: &str) -> Result<(), GatewayError> {
    if currency.len() < 2
        || currency.len() > 6
        || !currency.bytes().all(|b| b.is_ascii_uppercase())
    {
        return Err(GatewayError::Validation(format!(
            "invalid currency: {:?}",
            currency
        )));
    }
    Ok(())
}

/// Create (or reuse) a payment intent for a resource and return it with its
/// discovery URL.
///
/// Reusing an existing live intent for the resource is an optimization
/// against intent proliferation — a fresh insert per unauthorized request
/// would be equally correct. Fails only on malformed terms or store failure;
/// "no prior intent" is the normal case, not an error.
pub fn create_intent(
    store: &IntentStore,
    config: &GatewayConfig,
    resource_url: &str,
    now: i64,
) -> Result<(PaymentIntent, String), GatewayError> {
    validate_amount(&config.resource_price)?;
    validate_currency(&config.resource_currency)?;

    if let Some(existing) = store.find_reusable_intent(resource_url, now)? {
        let payment_url = config.payment_url(&existing.id);
        return Ok((existing, payment_url));
    }

    let intent = PaymentIntent {
        id: format!("pi_{}", Uuid::new_v4().simple()),
        resource_url: resource_url.to_string(),
        amount: config.resource_price.clone(),
        currency: config.resource_currency.clone(),
        payment_address: config.payment_address.clone(),
        status: PaymentStatus::Pending,
        created_at: now,
        expires_at: now + config.intent_ttl_secs,
        updated_at: now,
    };
    store.insert_intent(&intent)?;

    let payment_url = config.payment_url(&intent.id);
    Ok((intent, payment_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    const NOW: i64 = 1_700_000_000;

    fn config() -> GatewayConfig {
        GatewayConfig {
            api_key: b"sk_test".to_vec(),
            webhook_secret: b"whsec_test".to_vec(),
            network: Network::Testnet,
            resource_price: "0.01".to_string(),
            resource_currency: "ZEC".to_string(),
            payment_address: "ztestsapling1demo".to_string(),
            intent_ttl_secs: 3600,
            db_path: ":memory:".to_string(),
            port: 4021,
            allowed_origins: vec![],
            rate_limit_rpm: 60,
            metrics_token: None,
            sweep_interval_secs: 60,
        }
    }

    #[test]
    fn creates_pending_intent_with_validity_window() {
        let store = IntentStore::open(":memory:").unwrap();
        let (intent, payment_url) = create_intent(&store, &config(), "/api/premium", NOW).unwrap();

        assert_eq!(intent.status, PaymentStatus::Pending);
        assert_eq!(intent.resource_url, "/api/premium");
        assert_eq!(intent.expires_at, NOW + 3600);
        assert!(intent.id.starts_with("pi_"));
        assert_eq!(payment_url, format!("https://pay.z402.io/testnet/{}", intent.id));

        assert!(store.get_intent(&intent.id).unwrap().is_some());
    }

    #[test]
    fn reuses_live_intent_for_same_resource() {
        let store = IntentStore::open(":memory:").unwrap();
        let (first, _) = create_intent(&store, &config(), "/api/premium", NOW).unwrap();
        let (second, _) = create_intent(&store, &config(), "/api/premium", NOW + 10).unwrap();
        assert_eq!(first.id, second.id);

        // A different resource gets its own intent.
        let (other, _) = create_intent(&store, &config(), "/api/other", NOW + 10).unwrap();
        assert_ne!(other.id, first.id);
    }

    #[test]
    fn new_intent_after_expiry() {
        let store = IntentStore::open(":memory:").unwrap();
        let (first, _) = create_intent(&store, &config(), "/api/premium", NOW).unwrap();
        let (second, _) =
            create_intent(&store, &config(), "/api/premium", NOW + 3600).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn malformed_terms_are_rejected() {
        for amount in ["", "-1", "0", "0.0", "1e5", "1.", ".5", "1.2.3", "abc"] {
            assert!(validate_amount(amount).is_err(), "amount {:?}", amount);
        }
        for amount in ["0.01", "1", "3.50", "0.00000001"] {
            assert!(validate_amount(amount).is_ok(), "amount {:?}", amount);
        }

        assert!(validate_currency("ZEC").is_ok());
        assert!(validate_currency("zec").is_err());
        assert!(validate_currency("Z").is_err());
        assert!(validate_currency("TOOLONGX").is_err());
    }
}
