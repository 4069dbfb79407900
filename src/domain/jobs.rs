//! Background job descriptors.
//!
//! Jobs reference posts by id only; the worker reloads whatever it needs.
//! Chains are stored as JSON in the `job_chains` table, so the serialized
//! shape is a storage format: add variants, never rename them.

use serde::{Deserialize, Serialize};

use crate::domain::notification::Notification;

/// A single unit of background work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", content = "args", rename_all = "snake_case")]
pub enum Job {
    /// Render the preview card of a post and store it in the media store.
    GeneratePreviewImage { post_id: i64 },
    /// Flush the whole response cache.
    ClearResponseCache,
    /// Deliver a queued notification.
    Deliver(Notification),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::GeneratePreviewImage { .. } => "generate_preview_image",
            Job::ClearResponseCache => "clear_response_cache",
            Job::Deliver(_) => "deliver_notification",
        }
    }
}

/// Ordered list of jobs. A step only starts after its predecessor succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobChain {
    jobs: Vec<Job>,
}

impl JobChain {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    pub fn single(job: Job) -> Self {
        Self { jobs: vec![job] }
    }

    /// Chain dispatched after a post is saved without being published.
    pub fn after_draft_save(post_id: i64) -> Self {
        Self::new(vec![
            Job::GeneratePreviewImage { post_id },
            Job::ClearResponseCache,
        ])
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl IntoIterator for JobChain {
    type Item = Job;
    type IntoIter = std::vec::IntoIter<Job>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}
