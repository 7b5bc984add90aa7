//! Prometheus metrics collector.
//!
//! `Metrics` owns its own `PrometheusRecorder` instead of installing a global
//! one. Every recording call runs under `metrics::with_local_recorder`, so two
//! collectors never share state and tests can inspect an isolated instance.

use std::sync::Arc;
use std::time::Duration;

use ::metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusRecorder};

const AGE_BUCKETS: [f64; 13] = [
    0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0,
];

const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Outcome label values for `api_key_validations_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Missing,
    Invalid,
}

impl ValidationOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ValidationOutcome::Valid => "valid",
            ValidationOutcome::Missing => "missing",
            ValidationOutcome::Invalid => "invalid",
        }
    }
}

/// Explicitly constructed metrics collector shared by middleware and services.
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
}

impl Metrics {
    /// Build a collector with its own registry and register metric descriptions.
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full("user_age_distribution".to_string()),
                &AGE_BUCKETS,
            )?
            .set_buckets_for_metric(
                Matcher::Full("http_request_duration_seconds".to_string()),
                &DURATION_BUCKETS,
            )?
            .build_recorder();

        let metrics = Self {
            recorder: Arc::new(recorder),
        };
        metrics.describe();

        tracing::info!("Prometheus metrics initialized");
        Ok(metrics)
    }

    fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        ::metrics::with_local_recorder(self.recorder.as_ref(), f)
    }

    fn describe(&self) {
        self.record(|| {
            describe_counter!("http_requests_total", "Total number of HTTP requests");
            describe_histogram!(
                "http_request_duration_seconds",
                "HTTP request duration in seconds"
            );
            describe_gauge!(
                "http_requests_in_flight",
                "Current number of HTTP requests being processed"
            );
            describe_counter!("user_creation_total", "Total number of users created");
            describe_counter!("user_update_total", "Total number of user updates");
            describe_counter!("user_deletion_total", "Total number of users deleted");
            describe_gauge!("active_users_total", "Total number of active users");
            describe_histogram!("user_age_distribution", "Distribution of user ages");
            describe_counter!("api_keys_created_total", "Total number of API keys created");
            describe_counter!(
                "api_key_validations_total",
                "API key validation attempts by outcome"
            );
        });
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.recorder.handle().render()
    }

    pub fn request_started(&self, method: &str, endpoint: &str) {
        let labels = [
            ("method", method.to_string()),
            ("endpoint", endpoint.to_string()),
        ];
        self.record(|| gauge!("http_requests_in_flight", &labels).increment(1.0));
    }

    pub fn request_finished(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let labels = [
            ("method", method.to_string()),
            ("endpoint", endpoint.to_string()),
        ];
        let status_labels = [
            ("method", method.to_string()),
            ("endpoint", endpoint.to_string()),
            ("status", status.to_string()),
        ];

        self.record(|| {
            gauge!("http_requests_in_flight", &labels).decrement(1.0);
            histogram!("http_request_duration_seconds", &labels).record(elapsed.as_secs_f64());
            counter!("http_requests_total", &status_labels).increment(1);
        });

        tracing::debug!(
            method,
            endpoint,
            status,
            duration_seconds = elapsed.as_secs_f64(),
            "Request metrics recorded"
        );
    }

    pub fn record_user_creation(&self) {
        self.record(|| counter!("user_creation_total").increment(1));
    }

    pub fn record_user_update(&self) {
        self.record(|| counter!("user_update_total").increment(1));
    }

    pub fn record_user_deletion(&self) {
        self.record(|| counter!("user_deletion_total").increment(1));
    }

    pub fn set_active_users(&self, count: i64) {
        self.record(|| gauge!("active_users_total").set(count as f64));
    }

    pub fn record_user_age(&self, age: i32) {
        self.record(|| histogram!("user_age_distribution").record(f64::from(age)));
    }

    pub fn record_api_key_created(&self) {
        self.record(|| counter!("api_keys_created_total").increment(1));
    }

    pub fn record_validation(&self, outcome: ValidationOutcome) {
        self.record(|| {
            counter!("api_key_validations_total", "outcome" => outcome.as_str()).increment(1)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collectors_are_isolated() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();

        first.record_user_creation();

        assert!(first.render().contains("user_creation_total 1"));
        assert!(!second.render().contains("user_creation_total 1"));
    }

    #[test]
    fn http_request_is_counted_with_labels() {
        let metrics = Metrics::new().unwrap();

        metrics.request_started("GET", "/test-metrics");
        metrics.request_finished("GET", "/test-metrics", 200, Duration::from_millis(3));

        let rendered = metrics.render();
        let line = rendered
            .lines()
            .find(|l| l.starts_with("http_requests_total{"))
            .expect("counter rendered");
        assert!(line.contains(r#"endpoint="/test-metrics""#));
        assert!(line.contains(r#"method="GET""#));
        assert!(line.contains(r#"status="200""#));
        assert!(line.ends_with(" 1"));
        assert!(rendered.contains("http_request_duration_seconds_bucket"));
    }

    #[test]
    fn user_metrics_are_rendered() {
        let metrics = Metrics::new().unwrap();

        metrics.record_user_age(30);
        metrics.set_active_users(4);
        metrics.record_user_deletion();

        let rendered = metrics.render();
        assert!(rendered.contains("user_age_distribution_bucket"));
        assert!(rendered.contains("active_users_total 4"));
        assert!(rendered.contains("user_deletion_total 1"));
    }

    #[test]
    fn validation_outcomes_are_labelled() {
        let metrics = Metrics::new().unwrap();

        metrics.record_validation(ValidationOutcome::Invalid);
        metrics.record_validation(ValidationOutcome::Invalid);
        metrics.record_validation(ValidationOutcome::Valid);

        let rendered = metrics.render();
        assert!(rendered.contains(r#"api_key_validations_total{outcome="invalid"} 2"#));
        assert!(rendered.contains(r#"api_key_validations_total{outcome="valid"} 1"#));
    }
}
