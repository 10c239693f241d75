pub mod manager;
pub mod memory;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use repository::{CardRepository, DocumentStore, StrategyRepository, ThreadRepository};

/// Open the configured document store.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(config).await?;
            Ok(Arc::new(PostgresStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
