//! Body of `GET /health`.

use serde::Serialize;

use crate::infrastructure::queue::QueueBacklog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceState,
    pub version: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ComponentCheck,
    pub page_cache: ComponentCheck,
    pub job_queue: JobQueueCheck,
}

impl HealthChecks {
    pub fn all_ok(&self) -> bool {
        self.database.status == CheckState::Ok
            && self.page_cache.status == CheckState::Ok
            && self.job_queue.status == CheckState::Ok
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: CheckState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Chain counts of the publication job queue. Failed chains wait for
/// `admin jobs retry` and do not degrade the service.
#[derive(Debug, Serialize)]
pub struct JobQueueCheck {
    pub status: CheckState,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub backlog: Option<QueueBacklog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
