//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request and response bodies built from them.

/// API key authentication model
pub mod api_key;
/// User model
pub mod user;
