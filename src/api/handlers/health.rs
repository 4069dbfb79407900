//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{
    CheckState, ComponentCheck, HealthChecks, HealthResponse, JobQueueCheck, ServiceState,
};
use crate::state::AppState;

/// Reports the database, the page cache and the job queue backlog.
///
/// `GET /health` answers 200 when every check passes and 503 otherwise.
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok" },
///     "page_cache": { "status": "ok" },
///     "job_queue": { "status": "ok", "pending": 2, "running": 1, "failed": 0 }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let checks = HealthChecks {
        database: check_database(&state).await,
        page_cache: check_page_cache(&state).await,
        job_queue: check_job_queue(&state).await,
    };

    let (code, status) = if checks.all_ok() {
        (StatusCode::OK, ServiceState::Healthy)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ServiceState::Degraded)
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks,
        }),
    )
}

async fn check_database(state: &AppState) -> ComponentCheck {
    match sqlx::query("SELECT 1").execute(state.pool.as_ref()).await {
        Ok(_) => ComponentCheck {
            status: CheckState::Ok,
            message: None,
        },
        Err(e) => ComponentCheck {
            status: CheckState::Error,
            message: Some(e.to_string()),
        },
    }
}

async fn check_page_cache(state: &AppState) -> ComponentCheck {
    if state.page_cache.health_check().await {
        ComponentCheck {
            status: CheckState::Ok,
            message: None,
        }
    } else {
        ComponentCheck {
            status: CheckState::Error,
            message: Some("Cache backend unreachable".to_string()),
        }
    }
}

async fn check_job_queue(state: &AppState) -> JobQueueCheck {
    match state.job_queue.backlog().await {
        Ok(backlog) => JobQueueCheck {
            status: CheckState::Ok,
            backlog: Some(backlog),
            message: None,
        },
        Err(e) => JobQueueCheck {
            status: CheckState::Error,
            backlog: None,
            message: Some(e.to_string()),
        },
    }
}
