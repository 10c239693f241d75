#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{Map, Value};

use vibe_trade_api::app::build_router;
use vibe_trade_api::auth::{issue_shared_secret_token, TokenVerifier};
use vibe_trade_api::config::AppConfig;
use vibe_trade_api::database::MemoryStore;
use vibe_trade_api::models::{Attachment, Card, Strategy, Thread};
use vibe_trade_api::state::AppState;

pub const SECRET: &str = "integration-test-secret";

/// An in-process server on its own port, backed by a fresh in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    /// NextAuth (shared secret) deployment.
    pub async fn spawn() -> Result<Self> {
        let config = test_config(&[("AUTH_PROVIDER", "nextauth"), ("NEXTAUTH_SECRET", SECRET)])?;
        let verifier = TokenVerifier::from_config(&config.auth)?;
        Self::spawn_with(config, verifier).await
    }

    pub async fn spawn_with(config: AppConfig, verifier: TokenVerifier) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(config, verifier, store.clone()));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            store,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await?).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Result<(StatusCode, Value)> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await?).await
    }
}

async fn read(resp: reqwest::Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let text = resp.text().await?;
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).with_context(|| format!("non-JSON body: {}", text))?
    };
    Ok((status, body))
}

/// Config for tests: memory store plus the given overrides.
pub fn test_config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("GOOGLE_CLOUD_PROJECT".to_string(), "vibe-trade-test".to_string()),
        ("STORE_BACKEND".to_string(), "memory".to_string()),
    ]);
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Ok(AppConfig::from_lookup(|key| vars.get(key).cloned())?)
}

/// Valid HS256 token for `subject`.
pub fn token_for(subject: &str) -> String {
    issue_shared_secret_token(SECRET.as_bytes(), subject, chrono::Duration::hours(1))
        .expect("failed to sign test token")
}

pub fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn thread(id: &str, owner: &str, strategy_id: Option<&str>, updated: i64) -> Thread {
    Thread {
        id: id.to_string(),
        user_id: owner.to_string(),
        strategy_id: strategy_id.map(str::to_string),
        created_at: at(0),
        updated_at: at(updated),
        metadata: Map::new(),
    }
}

pub fn strategy(id: &str, owner: Option<&str>, thread_id: Option<&str>, card_ids: &[&str], updated: i64) -> Strategy {
    Strategy {
        id: id.to_string(),
        owner_id: owner.map(str::to_string),
        thread_id: thread_id.map(str::to_string),
        name: format!("Strategy {}", id),
        status: "draft".to_string(),
        universe: vec!["BTC-USD".to_string()],
        attachments: card_ids
            .iter()
            .map(|card_id| Attachment {
                card_id: card_id.to_string(),
                role: "entry".to_string(),
                enabled: true,
                overrides: Map::new(),
            })
            .collect(),
        version: 1,
        created_at: at(0),
        updated_at: at(updated),
    }
}

pub fn card(id: &str) -> Card {
    Card {
        id: id.to_string(),
        card_type: "entry.rule_trigger".to_string(),
        slots: serde_json::json!({"threshold": 30}),
        schema_etag: Some("etag-1".to_string()),
        created_at: at(0),
        updated_at: at(0),
    }
}
