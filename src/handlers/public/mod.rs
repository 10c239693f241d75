// handlers/public/mod.rs - Public handlers (no authentication)

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service index
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Vibe Trade API",
            "version": env!("CARGO_PKG_VERSION"),
            "auth_provider": state.verifier.provider(),
            "endpoints": {
                "health": "/health (public - liveness)",
                "ready": "/ready (public - document store readiness)",
                "threads": "/api/threads[/:thread_id] (bearer token)",
                "strategies": "/api/strategies[/:strategy_id] (bearer token)",
                "strategy_by_thread": "/api/strategies/threads/:thread_id/strategy (bearer token)",
            }
        }
    }))
}

/// GET /health - liveness, never touches dependencies
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// GET /ready - readiness, pings the document store
pub async fn ready(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let backend = state.store.backend_name();

    state.store.ping().await.map_err(|e| {
        tracing::error!("Readiness check failed ({}): {}", backend, e);
        ApiError::service_unavailable("Document store unavailable")
    })?;

    Ok(Json(json!({
        "status": "ready",
        "timestamp": chrono::Utc::now(),
        "store": backend
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};
    use std::sync::Arc;

    use crate::database::MemoryStore;
    use crate::testing::{test_state, UnreachableStore};

    #[tokio::test]
    async fn test_ready_reports_unavailable_store() {
        let response = ready(State(test_state(Arc::new(UnreachableStore))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_with_memory_store() {
        let Json(body) = ready(State(test_state(Arc::new(MemoryStore::new()))))
            .await
            .unwrap();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_health_is_static() {
        let Json(body) = health().await;
        assert_eq!(body, json!({"status": "healthy"}));
    }
}
