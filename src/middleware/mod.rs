//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Log requests
//! - Record metrics
//! - Short-circuit requests (reject unauthorized)

/// API key authentication middleware
pub mod auth;

/// CORS policy
pub mod cors;

/// Per-request logging
pub mod logging;

/// Per-request Prometheus metrics
pub mod metrics;
