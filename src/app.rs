use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;
use crate::state::AppState;

/// Build the full router: public routes plus the bearer-token `/api` tree.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/ready", get(public::ready))
        // Protected API
        .merge(api_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    use protected::{strategies, threads};

    Router::new()
        .route("/api/threads", get(threads::list).post(threads::create))
        .route("/api/threads/:thread_id", get(threads::get))
        .route("/api/strategies", get(strategies::list))
        .route("/api/strategies/:strategy_id", get(strategies::get))
        .route(
            "/api/strategies/threads/:thread_id/strategy",
            get(strategies::get_by_thread),
        )
        // Unmatched paths fall through to 404 without touching auth
        .route_layer(from_fn_with_state(state, require_auth))
}

/// `*` allows any origin without credentials; an explicit list allows
/// credentials and echoes the requested methods and headers.
pub fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
