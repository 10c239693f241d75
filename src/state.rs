use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::DocumentStore;

/// Shared application state passed to all handlers
///
/// Everything is behind an `Arc`; cloning per request is cheap. Nothing here
/// is mutated by handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: AppConfig, verifier: TokenVerifier, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            store,
        }
    }
}
