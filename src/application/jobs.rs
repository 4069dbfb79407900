//! Background job execution.
//!
//! [`run_job_worker`] claims chains from the job queue. Each chain runs inside
//! its own task, step after step; independent chains run concurrently up to
//! the configured limit. A step is retried with exponential backoff and the
//! first step that still fails parks the rest of its chain.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, Semaphore, watch};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::application::preview_image::render_preview_image;
use crate::domain::jobs::{Job, JobChain};
use crate::domain::repositories::PostRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheError, CacheInvalidator};
use crate::infrastructure::media::{MediaError, MediaStore};
use crate::infrastructure::notify::{DeliveryError, NotificationTransport};
use crate::infrastructure::queue::{ChainLedger, ClaimedChain};

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("post {0} does not exist")]
    PostMissing(i64),
    #[error("storage error: {0}")]
    Storage(#[from] AppError),
    #[error("preview rendering failed: {0}")]
    Render(#[from] askama::Error),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("cache clear failed: {0}")]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl JobError {
    /// Failures that cannot succeed on a later attempt are not retried.
    pub fn is_transient(&self) -> bool {
        !matches!(self, JobError::PostMissing(_) | JobError::Render(_))
    }
}

/// Executes jobs against the injected collaborators.
pub struct JobRunner<P: PostRepository> {
    posts: Arc<P>,
    media: Arc<dyn MediaStore>,
    invalidator: Arc<dyn CacheInvalidator>,
    transport: Arc<dyn NotificationTransport>,
    site: String,
    max_attempts: usize,
}

impl<P: PostRepository> JobRunner<P> {
    pub fn new(
        posts: Arc<P>,
        media: Arc<dyn MediaStore>,
        invalidator: Arc<dyn CacheInvalidator>,
        transport: Arc<dyn NotificationTransport>,
        site: impl Into<String>,
        max_attempts: usize,
    ) -> Self {
        Self {
            posts,
            media,
            invalidator,
            transport,
            site: site.into(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Runs the remaining jobs of a claimed chain in order and records each
    /// finished step in `ledger`, so an interrupted chain resumes where it
    /// stopped.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step; later steps are never started.
    /// Ledger errors are returned as [`JobError::Storage`] and leave the
    /// chain to be reclaimed once its lease expires.
    pub async fn run_chain(
        &self,
        ledger: &dyn ChainLedger,
        claimed: ClaimedChain,
    ) -> Result<(), JobError> {
        let ClaimedChain {
            id,
            next_step,
            chain,
        } = claimed;
        let total = chain.len();

        for (step, job) in chain.into_iter().enumerate().skip(next_step) {
            let name = job.name();

            if let Err(e) = self.run_with_retry(&job).await {
                metrics::counter!("jobs_failed_total", "job" => name).increment(1);
                if step + 1 < total {
                    metrics::counter!("job_chains_aborted_total").increment(1);
                    warn!(chain_id = id, job = name, skipped = total - step - 1, "Aborting job chain");
                }
                if let Err(ledger_error) = ledger.fail(id, step, &e.to_string()).await {
                    error!(chain_id = id, error = %ledger_error, "Failed to park job chain");
                }
                return Err(e);
            }

            metrics::counter!("jobs_completed_total", "job" => name).increment(1);
            if step + 1 < total {
                ledger.advance(id, step + 1).await?;
            }
        }

        ledger.complete(id).await?;
        Ok(())
    }

    async fn run_with_retry(&self, job: &Job) -> Result<(), JobError> {
        let strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_attempts - 1);

        RetryIf::spawn(
            strategy,
            || async {
                let result = self.run_job(job).await;
                if let Err(e) = &result {
                    warn!(job = job.name(), error = %e, "Job attempt failed");
                }
                result
            },
            JobError::is_transient,
        )
        .await
    }

    /// Executes a single job once.
    pub async fn run_job(&self, job: &Job) -> Result<(), JobError> {
        match job {
            Job::GeneratePreviewImage { post_id } => {
                let post = self
                    .posts
                    .find(*post_id)
                    .await?
                    .ok_or(JobError::PostMissing(*post_id))?;

                let svg = render_preview_image(&post, &self.site)?;
                let path = self.media.store(post.id, svg).await?;
                debug!(post_id, %path, "Preview image generated");
            }
            Job::ClearResponseCache => {
                self.invalidator.clear().await?;
            }
            Job::Deliver(notification) => {
                self.transport.deliver(notification).await?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerOptions {
    /// Chains running at the same time.
    pub concurrency: usize,
    /// Delay between claims while the queue is empty and nothing was dispatched.
    pub poll_interval: Duration,
}

/// Claims and runs chains until `shutdown` turns true (or its sender goes
/// away). Once asked to stop, the worker keeps claiming until the queue is
/// empty and then waits for in-flight chains.
pub async fn run_job_worker<P>(
    ledger: Arc<dyn ChainLedger>,
    wake: Arc<Notify>,
    runner: Arc<JobRunner<P>>,
    options: WorkerOptions,
    mut shutdown: watch::Receiver<bool>,
) where
    P: PostRepository + 'static,
{
    let concurrency = options.concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));
    info!(concurrency, "Job worker started");

    loop {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let draining = *shutdown.borrow() || shutdown.has_changed().is_err();

        match ledger.claim().await {
            Ok(Some(claimed)) => {
                let runner = runner.clone();
                let ledger = ledger.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    let chain_id = claimed.id;
                    if let Err(e) = runner.run_chain(ledger.as_ref(), claimed).await {
                        error!(chain_id, error = %e, "Job chain failed");
                    }
                });
                continue;
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "Failed to claim job chain"),
        }
        drop(permit);

        if draining {
            break;
        }

        tokio::select! {
            _ = wake.notified() => {}
            _ = tokio::time::sleep(options.poll_interval) => {}
            _ = shutdown.changed() => {}
        }
    }

    // Every permit back means every spawned chain has finished.
    let _ = permits.acquire_many(concurrency as u32).await;
    info!("Job worker stopped");
}
