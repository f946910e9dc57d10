use std::sync::Arc;

use z402::token::TokenVerifier;
use z402::MacTokenSigner;

use crate::config::GatewayConfig;
use crate::store::IntentStore;
use crate::verifier::AccessVerifier;

/// Shared application state, constructed once at startup and injected into
/// handlers. No module-level singletons — lifecycle follows the process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub store: IntentStore,
    pub verifier: AccessVerifier,
}

impl AppState {
    /// Wire the state with the bundled keyed-MAC token backend.
    pub fn new(config: GatewayConfig, store: IntentStore) -> Self {
        let tokens: Arc<dyn TokenVerifier> =
            Arc::new(MacTokenSigner::new(config.api_key.clone()));
        Self::with_token_verifier(config, store, tokens)
    }

    /// Wire the state with an explicit token backend (tests, alternate
    /// sealing schemes).
    pub fn with_token_verifier(
        config: GatewayConfig,
        store: IntentStore,
        tokens: Arc<dyn TokenVerifier>,
    ) -> Self {
        let verifier = AccessVerifier::new(store.clone(), tokens);
        Self {
            config: Arc::new(config),
            store,
            verifier,
        }
    }
}
