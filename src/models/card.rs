use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::strategy::Attachment;

/// Building block of a strategy (entry rule, exit rule, filter, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default)]
    pub slots: Value,
    #[serde(default)]
    pub schema_etag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A card as seen through one strategy's attachment.
#[derive(Debug, Clone, Serialize)]
pub struct AttachedCard {
    #[serde(flatten)]
    pub card: Card,
    pub role: String,
    pub enabled: bool,
    pub overrides: Map<String, Value>,
}

impl AttachedCard {
    pub fn new(card: Card, attachment: &Attachment) -> Self {
        Self {
            card,
            role: attachment.role.clone(),
            enabled: attachment.enabled,
            overrides: attachment.overrides.clone(),
        }
    }
}
