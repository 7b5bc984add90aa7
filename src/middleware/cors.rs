//! CORS policy.

use axum::http::{
    HeaderName, HeaderValue, Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");
const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");

/// Build the CORS layer.
///
/// With no configured origins the request's `Origin` is mirrored back, which
/// keeps credentialed requests working from any site. Origins that are not
/// valid header values are skipped with a warning.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ORIGIN,
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
            X_REQUESTED_WITH,
            X_API_KEY,
        ])
        .expose_headers([CONTENT_LENGTH, CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{self, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    async fn preflight(allowed: &[String], origin: &str) -> axum::response::Response {
        let app = Router::new()
            .route("/users", get(|| async { "ok" }))
            .layer(cors_layer(allowed));

        app.oneshot(
            http::Request::builder()
                .method(Method::OPTIONS)
                .uri("/users")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-api-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn mirrors_origin_when_unconfigured() {
        let response = preflight(&[], "https://app.example").await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
                .to_str()
                .unwrap()
                .contains("x-api-key")
        );
    }

    #[tokio::test]
    async fn unlisted_origin_gets_no_allow_header() {
        let allowed = vec!["https://app.example".to_string()];

        let listed = preflight(&allowed, "https://app.example").await;
        assert_eq!(
            listed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );

        let other = preflight(&allowed, "https://evil.example").await;
        assert!(
            other
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
