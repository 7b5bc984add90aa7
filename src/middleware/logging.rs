//! Request logging middleware.
//!
//! Emits one `info!` line per request once the response is ready. Spans come
//! from `TraceLayer`; this middleware does not open its own.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::header::USER_AGENT,
    middleware::Next,
    response::Response,
};

/// Route template when the router matched one, raw path otherwise.
fn request_path(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request_path(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        path = %path,
        user_agent = %user_agent,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{self, StatusCode},
        middleware::from_fn,
        routing::get,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn passes_response_through() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(from_fn(log_requests));

        let response = app
            .oneshot(http::Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn falls_back_to_raw_path() {
        let request = http::Request::builder()
            .uri("/not/routed?x=1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(request_path(&request), "/not/routed");
    }
}
