use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{linked_strategy, strategy_not_found, thread_not_found};
use crate::api::{StrategyIndex, ThreadView};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::Thread;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub strategy_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Accepted so older clients keep working, never used: the owner is the
    /// authenticated caller.
    #[serde(default, alias = "owner_id")]
    pub user_id: Option<Value>,
}

/// POST /api/threads - create a thread owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateThreadRequest>, JsonRejection>,
) -> ApiResult<ThreadView> {
    let Json(request) = payload?;

    if let Some(claimed) = &request.user_id {
        if claimed.as_str() != Some(user.subject.as_str()) {
            tracing::warn!("Ignoring client-supplied owner {} for caller {}", claimed, user.subject);
        }
    }

    let strategy = match request.strategy_id.as_deref() {
        Some("") => return Err(ApiError::validation_error("strategy_id must not be empty")),
        Some(strategy_id) => Some(
            state
                .store
                .get_strategy(&user.subject, strategy_id)
                .await?
                .ok_or_else(|| strategy_not_found(strategy_id))?,
        ),
        None => None,
    };

    let thread = Thread::new(&user.subject, request.strategy_id, request.metadata);
    state.store.create_thread(&thread).await?;

    tracing::info!("Created thread {} for user {}", thread.id, user.subject);

    Ok(ApiResponse::created(ThreadView::new(&thread, strategy.as_ref())))
}

/// GET /api/threads - the caller's threads, most recently updated first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<ThreadView>> {
    let threads = state.store.list_threads(&user.subject).await?;
    let strategies = state.store.list_strategies(&user.subject).await?;
    let index = StrategyIndex::new(&strategies);

    let views: Vec<ThreadView> = threads
        .iter()
        .map(|thread| ThreadView::new(thread, index.linked(thread)))
        .collect();

    tracing::info!("Found {} threads for user {}", views.len(), user.subject);

    Ok(ApiResponse::success(views))
}

/// GET /api/threads/:thread_id - one thread, if the caller owns it
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<ThreadView> {
    let Path(thread_id) = path?;
    let thread = state
        .store
        .get_thread(&user.subject, &thread_id)
        .await?
        .ok_or_else(|| thread_not_found(&thread_id))?;

    let strategy = linked_strategy(state.store.as_ref(), &user.subject, &thread).await?;

    Ok(ApiResponse::success(ThreadView::new(&thread, strategy.as_ref())))
}
