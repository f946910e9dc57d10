use std::env;

const DEFAULT_PORT: u16 = 4021;
const DEFAULT_DB_PATH: &str = "./z402-gateway.db";
const DEFAULT_PRICE: &str = "0.01";
const DEFAULT_CURRENCY: &str = "ZEC";
const DEFAULT_INTENT_TTL_SECS: i64 = 3600;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_TESTNET_ADDRESS: &str = "ztestsapling1z402gatewaydev";

/// Payment network the backend settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "testnet" => Some(Self::Testnet),
            "mainnet" => Some(Self::Mainnet),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct GatewayConfig {
    /// API secret for the payment backend; also keys the token verifier.
    pub api_key: Vec<u8>,
    /// Shared secret authenticating inbound webhook deliveries.
    pub webhook_secret: Vec<u8>,
    pub network: Network,
    /// Price of the protected resource (decimal string).
    pub resource_price: String,
    pub resource_currency: String,
    /// Address payers send funds to, stamped onto new intents.
    pub payment_address: String,
    /// Validity window for freshly created intents, in seconds.
    pub intent_ttl_secs: i64,
    pub db_path: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub rate_limit_rpm: u32,
    /// Bearer token required for /metrics (None = denied unless opted public).
    pub metrics_token: Option<String>,
    pub sweep_interval_secs: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("network", &self.network)
            .field("resource_price", &self.resource_price)
            .field("resource_currency", &self.resource_currency)
            .field("payment_address", &self.payment_address)
            .field("intent_ttl_secs", &self.intent_ttl_secs)
            .field("db_path", &self.db_path)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .finish()
    }
}

impl GatewayConfig {
    /// Read configuration from the environment. Missing required secrets
    /// fail here, at startup — never per-request.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("Z402_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .map(String::into_bytes)
            .ok_or(ConfigError::MissingRequired("Z402_API_KEY"))?;

        let webhook_secret = env::var("Z402_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(String::into_bytes)
            .ok_or(ConfigError::MissingRequired("Z402_WEBHOOK_SECRET"))?;

        if webhook_secret.len() < 32 {
            tracing::warn!(
                "Z402_WEBHOOK_SECRET is short ({} bytes, 32 recommended) — \
                 use `openssl rand -hex 32` to generate a secure secret",
                webhook_secret.len()
            );
        }

        let network_str = env::var("Z402_NETWORK").unwrap_or_else(|_| "testnet".to_string());
        let network =
            Network::parse(&network_str).ok_or(ConfigError::InvalidNetwork(network_str))?;

        let resource_price =
            env::var("RESOURCE_PRICE").unwrap_or_else(|_| DEFAULT_PRICE.to_string());
        let resource_currency =
            env::var("RESOURCE_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());

        let payment_address = env::var("Z402_PAYMENT_ADDRESS")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TESTNET_ADDRESS.to_string());
        if network == Network::Mainnet && payment_address == DEFAULT_TESTNET_ADDRESS {
            return Err(ConfigError::MissingRequired("Z402_PAYMENT_ADDRESS"));
        }

        let intent_ttl_secs = env::var("INTENT_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INTENT_TTL_SECS);
        if intent_ttl_secs <= 0 {
            return Err(ConfigError::InvalidTtl(intent_ttl_secs));
        }

        let db_path = env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics requires Z402_PUBLIC_METRICS=true");
        }

        let sweep_interval_secs = env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

        Ok(Self {
            api_key,
            webhook_secret,
            network,
            resource_price,
            resource_currency,
            payment_address,
            intent_ttl_secs,
            db_path,
            port,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
            sweep_interval_secs,
        })
    }

    /// Discovery URL the client uses to complete payment out-of-band.
    pub fn payment_url(&self, intent_id: &str) -> String {
        format!("https://pay.z402.io/{}/{}", self.network.as_str(), intent_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid Z402_NETWORK (expected testnet|mainnet): {0}")]
    InvalidNetwork(String),

    #[error("INTENT_TTL_SECS must be positive, got {0}")]
    InvalidTtl(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_parses_known_values_only() {
        assert_eq!(Network::parse("testnet"), Some(Network::Testnet));
        assert_eq!(Network::parse("mainnet"), Some(Network::Mainnet));
        assert_eq!(Network::parse("devnet"), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = GatewayConfig {
            api_key: b"sk_live_secret".to_vec(),
            webhook_secret: b"whsec_secret".to_vec(),
            network: Network::Testnet,
            resource_price: "0.01".to_string(),
            resource_currency: "ZEC".to_string(),
            payment_address: "ztestsapling1demo".to_string(),
            intent_ttl_secs: 3600,
            db_path: ":memory:".to_string(),
            port: 4021,
            allowed_origins: vec![],
            rate_limit_rpm: 60,
            metrics_token: Some("mt_secret".to_string()),
            sweep_interval_secs: 60,
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk_live_secret"));
        assert!(!rendered.contains("whsec_secret"));
        assert!(!rendered.contains("mt_secret"));
    }

    #[test]
    fn payment_url_embeds_network_and_id() {
        let config = GatewayConfig {
            api_key: b"k".to_vec(),
            webhook_secret: b"s".to_vec(),
            network: Network::Mainnet,
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
        };
        assert_eq!(config.payment_url("pi_1"), "https://pay.z402.io/mainnet/pi_1");
    }
}
