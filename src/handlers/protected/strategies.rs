use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension,
};
use serde::Deserialize;

use super::{linked_strategy, strategy_not_found, thread_not_found, with_cards};
use crate::api::{StrategyListing, StrategyWithCards};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub thread_id: Option<String>,
}

/// GET /api/strategies[?thread_id=...] - the caller's strategies
///
/// With `thread_id`, answers like `GET /api/strategies/threads/:thread_id/strategy`.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<StrategyListing> {
    let Query(query) = query?;
    if let Some(thread_id) = query.thread_id.filter(|t| !t.is_empty()) {
        let found = resolve_by_thread(&state, &user, &thread_id).await?;
        return Ok(ApiResponse::success(StrategyListing::ForThread(found)));
    }

    let strategies = state.store.list_strategies(&user.subject).await?;
    tracing::info!("Found {} strategies for user {}", strategies.len(), user.subject);

    Ok(ApiResponse::success(StrategyListing::All(strategies)))
}

/// GET /api/strategies/:strategy_id - one strategy with its cards
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StrategyWithCards> {
    let Path(strategy_id) = path?;
    let strategy = state
        .store
        .get_strategy(&user.subject, &strategy_id)
        .await?
        .ok_or_else(|| strategy_not_found(&strategy_id))?;

    Ok(ApiResponse::success(with_cards(state.store.as_ref(), strategy).await?))
}

/// GET /api/strategies/threads/:thread_id/strategy - the strategy behind an owned thread
pub async fn get_by_thread(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StrategyWithCards> {
    let Path(thread_id) = path?;
    Ok(ApiResponse::success(resolve_by_thread(&state, &user, &thread_id).await?))
}

/// Thread first, with its ownership check, then the strategy with its own.
async fn resolve_by_thread(
    state: &AppState,
    user: &AuthUser,
    thread_id: &str,
) -> Result<StrategyWithCards, ApiError> {
    let thread = state
        .store
        .get_thread(&user.subject, thread_id)
        .await?
        .ok_or_else(|| thread_not_found(thread_id))?;

    let strategy = linked_strategy(state.store.as_ref(), &user.subject, &thread)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No strategy found for thread: {}", thread_id)))?;

    with_cards(state.store.as_ref(), strategy).await
}
