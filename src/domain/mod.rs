//! Domain layer: entities, value rules and repository contracts.
//!
//! Nothing in here touches the database, the cache or the network.
//!
//! - [`entities`] - Posts and link submissions
//! - [`repositories`] - Data access traits implemented in `crate::infrastructure::persistence`
//! - [`tags`] - Tag list parsing
//! - [`jobs`] - Background job descriptors and chains
//! - [`notification`] - Messages queued for asynchronous delivery
//!
//! # Publication Flow
//!
//! 1. An editor creates or updates a [`entities::Post`]
//! 2. The post service persists the change and runs its save hook
//! 3. Published posts go through the publish action; drafts get a
//!    [`jobs::JobChain`] (preview image, then cache flush)
//! 4. The job worker executes chains in order and aborts a chain on failure

pub mod entities;
pub mod jobs;
pub mod notification;
pub mod repositories;
pub mod tags;
