//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate input, talk to the stores and record business metrics.

/// API key lifecycle and validation
pub mod api_key_service;

/// Secret generation and hashing
pub mod key_material;

/// User management
pub mod user_service;

pub use api_key_service::ApiKeyService;
pub use user_service::UserService;
