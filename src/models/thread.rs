use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::types::{Owned, SubjectId};

/// A persistent conversation between a user and the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub strategy_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Conversational state kept by the agent.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Thread {
    /// New thread owned by `owner`. The owner never comes from the request body.
    pub fn new(owner: &SubjectId, strategy_id: Option<String>, metadata: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: owner.as_str().to_string(),
            strategy_id,
            created_at: now,
            updated_at: now,
            metadata,
        }
    }
}

impl Owned for Thread {
    fn owner(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

/// Threads most recently updated first; ties broken by creation time.
pub fn sort_by_recency(threads: &mut [Thread]) {
    threads.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
