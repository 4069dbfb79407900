//! HTTP middleware for request processing.
//!
//! Provides authentication, page caching and observability middleware.

pub mod auth;
pub mod page_cache;
pub mod tracing;
