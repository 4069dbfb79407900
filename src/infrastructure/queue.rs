//! Durable job queue for background side effects.
//!
//! Chains are rows of the `job_chains` table. A worker claims one row at a
//! time with `FOR UPDATE SKIP LOCKED` and holds it under a lease. After every
//! successful step the row records the next step index, and the row is
//! deleted once the last step succeeds. A worker that dies mid-chain leaves
//! its lease to expire; the next claim resumes the chain at the recorded
//! step, so every job runs at least once.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::domain::jobs::{Job, JobChain};
use crate::error::AppError;

/// Accepts ordered job chains for asynchronous execution.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Stores a chain for the worker. Jobs of one chain run in order.
    ///
    /// Returns as soon as the chain is stored; it never waits for a worker.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the chain cannot be stored.
    async fn dispatch(&self, chain: JobChain) -> Result<(), AppError>;
}

/// A chain held by a worker, with the index of the next step to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedChain {
    pub id: i64,
    pub next_step: usize,
    pub chain: JobChain,
}

/// Worker side of the queue: taking chains and recording their progress.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainLedger: Send + Sync {
    /// Takes the oldest runnable chain, if any: pending ones and running
    /// ones whose lease has expired.
    async fn claim(&self) -> Result<Option<ClaimedChain>, AppError>;

    /// Records that steps before `next_step` are done and renews the lease.
    async fn advance(&self, id: i64, next_step: usize) -> Result<(), AppError>;

    /// Removes a chain whose last step succeeded.
    async fn complete(&self, id: i64) -> Result<(), AppError>;

    /// Parks a chain whose `step` failed for good. It is not claimed again
    /// until requeued.
    async fn fail(&self, id: i64, step: usize, error: &str) -> Result<(), AppError>;
}

/// Chain counts by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueBacklog {
    pub pending: i64,
    pub running: i64,
    pub failed: i64,
}

#[derive(sqlx::FromRow)]
struct ChainRow {
    id: i64,
    step: i32,
    jobs: Json<JobChain>,
}

/// PostgreSQL-backed [`JobQueue`] and [`ChainLedger`].
pub struct PgJobQueue {
    pool: Arc<PgPool>,
    lease: Duration,
    wake: Arc<Notify>,
}

impl PgJobQueue {
    /// `lease` is how long a claimed chain stays invisible to other workers
    /// without progress.
    pub fn new(pool: Arc<PgPool>, lease: Duration) -> Self {
        Self {
            pool,
            lease,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Signalled on every dispatch so an idle worker skips its poll delay.
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn backlog(&self) -> Result<QueueBacklog, AppError> {
        let (pending, running, failed): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'running'),
                COUNT(*) FILTER (WHERE status = 'failed')
            FROM job_chains
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(QueueBacklog {
            pending,
            running,
            failed,
        })
    }

    /// Puts failed chains back in line, resuming at the step that failed.
    /// Returns how many were requeued.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn retry_failed(&self) -> Result<u64, AppError> {
        let requeued = sqlx::query(
            r#"
            UPDATE job_chains
            SET status = 'pending', last_error = NULL, updated_at = NOW()
            WHERE status = 'failed'
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(requeued.rows_affected())
    }

    fn lease_seconds(&self) -> f64 {
        self.lease.as_secs_f64()
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn dispatch(&self, chain: JobChain) -> Result<(), AppError> {
        let names: Vec<&'static str> = chain.jobs().iter().map(Job::name).collect();

        let id: i64 = sqlx::query_scalar("INSERT INTO job_chains (jobs) VALUES ($1) RETURNING id")
            .bind(Json(&chain))
            .fetch_one(self.pool.as_ref())
            .await?;

        self.wake.notify_one();
        debug!(chain_id = id, jobs = ?names, "Job chain queued");
        Ok(())
    }
}

#[async_trait]
impl ChainLedger for PgJobQueue {
    async fn claim(&self) -> Result<Option<ClaimedChain>, AppError> {
        let row = sqlx::query_as::<_, ChainRow>(
            r#"
            WITH next_chain AS (
                SELECT id
                FROM job_chains
                WHERE status = 'pending'
                   OR (status = 'running' AND locked_until < NOW())
                ORDER BY id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE job_chains
            SET status = 'running',
                locked_until = NOW() + make_interval(secs => $1),
                updated_at = NOW()
            WHERE id IN (SELECT id FROM next_chain)
            RETURNING id, step, jobs
            "#,
        )
        .bind(self.lease_seconds())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| {
            if r.step > 0 {
                warn!(chain_id = r.id, step = r.step, "Resuming interrupted job chain");
            }
            ClaimedChain {
                id: r.id,
                next_step: usize::try_from(r.step).unwrap_or_default(),
                chain: r.jobs.0,
            }
        }))
    }

    async fn advance(&self, id: i64, next_step: usize) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE job_chains
            SET step = $2,
                locked_until = NOW() + make_interval(secs => $3),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(i32::try_from(next_step).unwrap_or(i32::MAX))
        .bind(self.lease_seconds())
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn complete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM job_chains WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn fail(&self, id: i64, step: usize, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE job_chains
            SET status = 'failed',
                step = $2,
                last_error = $3,
                locked_until = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(i32::try_from(step).unwrap_or(i32::MAX))
        .bind(error)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}
