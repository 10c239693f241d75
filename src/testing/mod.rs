use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::database::{
    CardRepository, DatabaseError, DocumentStore, StrategyRepository, ThreadRepository,
};
use crate::middleware::AuthUser;
use crate::models::{Card, Strategy, Thread};
use crate::state::AppState;
use crate::types::SubjectId;

/// App state for handler tests: NextAuth verifier over `store`
pub fn test_state(store: Arc<dyn DocumentStore>) -> AppState {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_CLOUD_PROJECT" => Some("vibe-trade-test".to_string()),
        "STORE_BACKEND" => Some("memory".to_string()),
        "AUTH_PROVIDER" => Some("nextauth".to_string()),
        "NEXTAUTH_SECRET" => Some("secret".to_string()),
        _ => None,
    })
    .expect("test config");
    let verifier = TokenVerifier::from_config(&config.auth).expect("test verifier");
    AppState::new(config, verifier, store)
}

/// An authenticated caller as `require_auth` would inject it
pub fn test_user(subject: &str) -> AuthUser {
    AuthUser {
        subject: SubjectId::new(subject),
        provider: crate::config::AuthProvider::NextAuth,
        claims: serde_json::Map::new(),
    }
}

/// A store whose every call fails, like a database that went away
pub struct UnreachableStore;

fn unreachable() -> DatabaseError {
    DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ThreadRepository for UnreachableStore {
    async fn create_thread(&self, _: &Thread) -> Result<(), DatabaseError> {
        Err(unreachable())
    }

    async fn get_thread(&self, _: &SubjectId, _: &str) -> Result<Option<Thread>, DatabaseError> {
        Err(unreachable())
    }

    async fn list_threads(&self, _: &SubjectId) -> Result<Vec<Thread>, DatabaseError> {
        Err(unreachable())
    }
}

#[async_trait]
impl StrategyRepository for UnreachableStore {
    async fn get_strategy(&self, _: &SubjectId, _: &str) -> Result<Option<Strategy>, DatabaseError> {
        Err(unreachable())
    }

    async fn list_strategies(&self, _: &SubjectId) -> Result<Vec<Strategy>, DatabaseError> {
        Err(unreachable())
    }

    async fn get_strategy_by_thread(
        &self,
        _: &SubjectId,
        _: &str,
    ) -> Result<Option<Strategy>, DatabaseError> {
        Err(unreachable())
    }
}

#[async_trait]
impl CardRepository for UnreachableStore {
    async fn get_card(&self, _: &str) -> Result<Option<Card>, DatabaseError> {
        Err(unreachable())
    }
}

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Err(unreachable())
    }

    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
}
