//! HTTP router: routes, authentication boundary and cross-cutting layers.

use std::time::Duration;

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use tower::{ServiceBuilder, timeout::{TimeoutLayer, error::Elapsed}};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    error::AppError,
    handlers::{api_keys, health, metrics, users},
    middleware::{
        auth::require_api_key, cors::cors_layer, logging::log_requests, metrics::track_metrics,
    },
    state::AppState,
};

async fn route_not_found() -> AppError {
    AppError::not_found("route not found")
}

async fn handle_layer_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(format!("unhandled layer error: {err}"))
    }
}

/// Cap request handling time. Overruns answer 408 with the usual JSON error body.
fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_layer_error))
            .layer(TimeoutLayer::new(timeout)),
    )
}

/// Build the application router.
///
/// Public: health, metrics and user reads. Everything else requires an API key.
pub fn router(state: AppState, config: &Config) -> Router {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::render_metrics))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user));

    // route_layer only wraps the methods registered here, so the public GETs
    // on the same paths stay open after the merge
    let protected = Router::new()
        .route("/users", post(users::create_user))
        .route(
            "/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/api-keys",
            post(api_keys::create_api_key).get(api_keys::list_api_keys),
        )
        .route(
            "/api-keys/{id}",
            get(api_keys::get_api_key)
                .put(api_keys::update_api_key)
                .delete(api_keys::delete_api_key),
        )
        .route_layer(from_fn_with_state(state.clone(), require_api_key));

    let routes = Router::new()
        .nest("/api/v1", public.merge(protected))
        .fallback(route_not_found);

    with_request_timeout(routes, config.request_timeout())
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .layer(from_fn(log_requests))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
