use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::repository::{CardRepository, DocumentStore, StrategyRepository, ThreadRepository};
use crate::models::{Card, Strategy, Thread};
use crate::types::SubjectId;

/// Document store on Postgres: one JSONB document per row.
///
/// Owner filters are part of every user-scoped query, so a foreign document
/// never leaves the database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreadRepository for PostgresStore {
    async fn create_thread(&self, thread: &Thread) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO threads (id, user_id, strategy_id, created_at, updated_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&thread.id)
        .bind(&thread.user_id)
        .bind(&thread.strategy_id)
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .bind(Json(thread))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_thread(&self, owner: &SubjectId, id: &str) -> Result<Option<Thread>, DatabaseError> {
        let row: Option<Json<Thread>> =
            sqlx::query_scalar("SELECT doc FROM threads WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(owner.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(thread)| thread))
    }

    async fn list_threads(&self, owner: &SubjectId) -> Result<Vec<Thread>, DatabaseError> {
        let rows: Vec<Json<Thread>> = sqlx::query_scalar(
            "SELECT doc FROM threads WHERE user_id = $1 ORDER BY updated_at DESC, created_at DESC",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(thread)| thread).collect())
    }
}

#[async_trait]
impl StrategyRepository for PostgresStore {
    async fn get_strategy(&self, owner: &SubjectId, id: &str) -> Result<Option<Strategy>, DatabaseError> {
        let row: Option<Json<Strategy>> =
            sqlx::query_scalar("SELECT doc FROM strategies WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(strategy)| strategy))
    }

    async fn list_strategies(&self, owner: &SubjectId) -> Result<Vec<Strategy>, DatabaseError> {
        let rows: Vec<Json<Strategy>> = sqlx::query_scalar(
            "SELECT doc FROM strategies WHERE owner_id = $1 ORDER BY updated_at DESC",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(strategy)| strategy).collect())
    }

    async fn get_strategy_by_thread(
        &self,
        owner: &SubjectId,
        thread_id: &str,
    ) -> Result<Option<Strategy>, DatabaseError> {
        let row: Option<Json<Strategy>> = sqlx::query_scalar(
            "SELECT doc FROM strategies WHERE thread_id = $1 AND owner_id = $2 \
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(thread_id)
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(strategy)| strategy))
    }
}

#[async_trait]
impl CardRepository for PostgresStore {
    async fn get_card(&self, id: &str) -> Result<Option<Card>, DatabaseError> {
        let row: Option<Json<Card>> = sqlx::query_scalar("SELECT doc FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(card)| card))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
