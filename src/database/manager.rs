use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{StoreConfig, DEFAULT_DATABASE};

/// Errors from the document store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection setup and schema bootstrap for the Postgres document store
pub struct DatabaseManager;

impl DatabaseManager {
    /// Tables holding one JSONB document per row, with the fields we filter
    /// on lifted into indexed columns.
    const SCHEMA: &'static [&'static str] = &[
        r#"CREATE TABLE IF NOT EXISTS threads (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            strategy_id TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            doc JSONB NOT NULL
        )"#,
        "CREATE INDEX IF NOT EXISTS threads_user_recency_idx ON threads (user_id, updated_at DESC, created_at DESC)",
        r#"CREATE TABLE IF NOT EXISTS strategies (
            id TEXT PRIMARY KEY,
            owner_id TEXT,
            thread_id TEXT,
            updated_at TIMESTAMPTZ NOT NULL,
            doc JSONB NOT NULL
        )"#,
        "CREATE INDEX IF NOT EXISTS strategies_owner_recency_idx ON strategies (owner_id, updated_at DESC)",
        "CREATE INDEX IF NOT EXISTS strategies_thread_idx ON strategies (thread_id)",
        r#"CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            doc JSONB NOT NULL
        )"#,
    ];

    /// Open a pool for the configured database and make sure the tables exist
    pub async fn connect(config: &StoreConfig) -> Result<PgPool, DatabaseError> {
        let base = config
            .database_url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let connection_string = Self::build_connection_string(base, config.database.as_deref())?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&connection_string)
            .await?;

        Self::ensure_schema(&pool).await?;

        info!(
            "Created database pool for project {} (database: {})",
            config.project,
            config.database.as_deref().unwrap_or(DEFAULT_DATABASE)
        );
        Ok(pool)
    }

    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in Self::SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Swap the database name into the DATABASE_URL path. `None` keeps the
    /// database the URL already names.
    fn build_connection_string(base: &str, database: Option<&str>) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if let Some(name) = database {
            if !Self::is_valid_db_name(name) {
                return Err(DatabaseError::InvalidDatabaseName(name.to_string()));
            }
            url.set_path(&format!("/{}", name));
        }
        Ok(url.into())
    }

    /// Postgres identifiers: letters, digits, `_` and `-`, at most 63 bytes.
    fn is_valid_db_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}
