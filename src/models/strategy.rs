use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Owned;

/// A card attached to a strategy, with per-strategy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub card_id: String,
    pub role: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub overrides: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

/// A trading strategy written by the agent process. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub universe: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default = "default_version")]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> i64 {
    1
}

impl Owned for Strategy {
    fn owner(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }
}

/// Most recently updated first.
pub fn sort_by_recency(strategies: &mut [Strategy]) {
    strategies.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
