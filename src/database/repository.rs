use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::models::{Card, Strategy, Thread};
use crate::types::SubjectId;

/// Thread documents. Every read is scoped to an owner.
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    async fn create_thread(&self, thread: &Thread) -> Result<(), DatabaseError>;

    /// `None` when the thread is absent or belongs to someone else.
    async fn get_thread(&self, owner: &SubjectId, id: &str) -> Result<Option<Thread>, DatabaseError>;

    /// The owner's threads, most recently updated first.
    async fn list_threads(&self, owner: &SubjectId) -> Result<Vec<Thread>, DatabaseError>;
}

/// Strategy documents, written by the agent and read here.
#[async_trait]
pub trait StrategyRepository: Send + Sync {
    async fn get_strategy(&self, owner: &SubjectId, id: &str) -> Result<Option<Strategy>, DatabaseError>;

    /// The owner's strategies, most recently updated first.
    async fn list_strategies(&self, owner: &SubjectId) -> Result<Vec<Strategy>, DatabaseError>;

    /// The owner's most recently updated strategy linked to `thread_id`.
    async fn get_strategy_by_thread(
        &self,
        owner: &SubjectId,
        thread_id: &str,
    ) -> Result<Option<Strategy>, DatabaseError>;
}

/// Card documents. Cards carry no owner; they are only reached through an
/// owned strategy's attachments.
#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn get_card(&self, id: &str) -> Result<Option<Card>, DatabaseError>;
}

/// A complete backing store for the API.
#[async_trait]
pub trait DocumentStore: ThreadRepository + StrategyRepository + CardRepository {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), DatabaseError>;

    fn backend_name(&self) -> &'static str;
}
