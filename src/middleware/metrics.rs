//! HTTP metrics middleware for recording request/response metrics.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Endpoint label for requests no route matched.
const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Route template, or a single shared label for unrouted paths.
fn endpoint_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string())
}

/// Track in-flight requests, latency and status counts per route template.
pub async fn track_metrics(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_string();
    let endpoint = endpoint_label(&request);

    state.metrics.request_started(&method, &endpoint);
    let response = next.run(request).await;
    state.metrics.request_finished(
        &method,
        &endpoint,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}
