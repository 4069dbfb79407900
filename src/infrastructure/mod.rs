//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer and the
//! application services, providing concrete implementations for persistence,
//! caching, background work, media storage and outbound notifications.
//!
//! # Modules
//!
//! - [`cache`] - Response cache (Redis and no-op implementations)
//! - [`media`] - Preview image storage
//! - [`notify`] - Notification queueing and delivery transports
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`queue`] - Job chain queue

pub mod cache;
pub mod media;
pub mod notify;
pub mod persistence;
pub mod queue;
