//! Application layer: workflows over the domain.
//!
//! Services orchestrate repositories and infrastructure collaborators. The
//! two state transitions live in their own actions so that every entry point
//! (HTTP, admin CLI, the save hook) goes through the same idempotent code.
//!
//! # Available Services
//!
//! - [`services::PostService`] - Post authoring, save hook and read queries
//! - [`services::PublishPostAction`] - The publish transition
//! - [`services::LinkService`] - Link submission and moderation
//! - [`services::ApproveLinkAction`] - The approval transition
//! - [`services::FeedService`] - Atom feeds
//! - [`services::AuthService`] - Admin API token authentication
//!
//! Background work is executed by [`jobs::JobRunner`] under
//! [`jobs::run_job_worker`].

pub mod formatting;
pub mod jobs;
pub mod page;
pub mod preview_image;
pub mod services;
