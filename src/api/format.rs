//! Response shapes for the thread and strategy endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::models::{AttachedCard, Strategy, Thread};

/// A thread plus a summary of its linked strategy. All strategy fields come
/// from the resolved strategy, never from a dangling link on the thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub thread_id: String,
    pub strategy_id: Option<String>,
    pub strategy_name: Option<String>,
    pub strategy_status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl ThreadView {
    pub fn new(thread: &Thread, strategy: Option<&Strategy>) -> Self {
        Self {
            thread_id: thread.id.clone(),
            strategy_id: strategy.map(|s| s.id.clone()),
            strategy_name: strategy.map(|s| s.name.clone()),
            strategy_status: strategy.map(|s| s.status.clone()),
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            metadata: thread.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyWithCards {
    pub strategy: Strategy,
    pub cards: Vec<AttachedCard>,
    pub card_count: usize,
}

impl StrategyWithCards {
    pub fn new(strategy: Strategy, cards: Vec<AttachedCard>) -> Self {
        Self {
            card_count: cards.len(),
            strategy,
            cards,
        }
    }
}

/// `GET /api/strategies` answers with a list, or with one strategy and its
/// cards when filtered by thread.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StrategyListing {
    All(Vec<Strategy>),
    ForThread(StrategyWithCards),
}

/// Lookup tables for pairing threads with strategies in one pass.
///
/// `strategies` must already be sorted most recent first, so the first
/// strategy seen for a thread id is the one kept.
pub struct StrategyIndex<'a> {
    by_id: HashMap<&'a str, &'a Strategy>,
    by_thread: HashMap<&'a str, &'a Strategy>,
}

impl<'a> StrategyIndex<'a> {
    pub fn new(strategies: &'a [Strategy]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_thread = HashMap::new();
        for strategy in strategies {
            by_id.insert(strategy.id.as_str(), strategy);
            if let Some(thread_id) = strategy.thread_id.as_deref() {
                by_thread.entry(thread_id).or_insert(strategy);
            }
        }
        Self { by_id, by_thread }
    }

    /// Explicit link first, then the most recent strategy pointing at the thread.
    pub fn linked(&self, thread: &Thread) -> Option<&'a Strategy> {
        thread
            .strategy_id
            .as_deref()
            .and_then(|id| self.by_id.get(id).copied())
            .or_else(|| self.by_thread.get(thread.id.as_str()).copied())
    }
}
