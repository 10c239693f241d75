use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::repository::{CardRepository, DocumentStore, StrategyRepository, ThreadRepository};
use crate::models::{strategy, thread, Card, Strategy, Thread};
use crate::types::{owned_by, Owned, SubjectId};

/// Process-local document store for tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    threads: RwLock<HashMap<String, Thread>>,
    strategies: RwLock<HashMap<String, Strategy>>,
    cards: RwLock<HashMap<String, Card>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a thread as-is, keeping whatever owner it carries.
    pub async fn insert_thread(&self, thread: Thread) {
        self.threads.write().await.insert(thread.id.clone(), thread);
    }

    /// Seed a strategy the way the agent process would write it.
    pub async fn insert_strategy(&self, strategy: Strategy) {
        self.strategies.write().await.insert(strategy.id.clone(), strategy);
    }

    pub async fn insert_card(&self, card: Card) {
        self.cards.write().await.insert(card.id.clone(), card);
    }
}

#[async_trait]
impl ThreadRepository for MemoryStore {
    async fn create_thread(&self, thread: &Thread) -> Result<(), DatabaseError> {
        self.threads.write().await.insert(thread.id.clone(), thread.clone());
        Ok(())
    }

    async fn get_thread(&self, owner: &SubjectId, id: &str) -> Result<Option<Thread>, DatabaseError> {
        let threads = self.threads.read().await;
        Ok(owned_by(threads.get(id).cloned(), owner))
    }

    async fn list_threads(&self, owner: &SubjectId) -> Result<Vec<Thread>, DatabaseError> {
        let mut found: Vec<Thread> = self
            .threads
            .read()
            .await
            .values()
            .filter(|t| t.is_owned_by(owner))
            .cloned()
            .collect();
        thread::sort_by_recency(&mut found);
        Ok(found)
    }
}

#[async_trait]
impl StrategyRepository for MemoryStore {
    async fn get_strategy(&self, owner: &SubjectId, id: &str) -> Result<Option<Strategy>, DatabaseError> {
        let strategies = self.strategies.read().await;
        Ok(owned_by(strategies.get(id).cloned(), owner))
    }

    async fn list_strategies(&self, owner: &SubjectId) -> Result<Vec<Strategy>, DatabaseError> {
        let mut found: Vec<Strategy> = self
            .strategies
            .read()
            .await
            .values()
            .filter(|s| s.is_owned_by(owner))
            .cloned()
            .collect();
        strategy::sort_by_recency(&mut found);
        Ok(found)
    }

    async fn get_strategy_by_thread(
        &self,
        owner: &SubjectId,
        thread_id: &str,
    ) -> Result<Option<Strategy>, DatabaseError> {
        Ok(self
            .list_strategies(owner)
            .await?
            .into_iter()
            .find(|s| s.thread_id.as_deref() == Some(thread_id)))
    }
}

#[async_trait]
impl CardRepository for MemoryStore {
    async fn get_card(&self, id: &str) -> Result<Option<Card>, DatabaseError> {
        Ok(self.cards.read().await.get(id).cloned())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
