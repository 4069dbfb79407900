//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, job worker spawning, and Axum
//! server lifecycle.

use crate::application::jobs::{JobRunner, WorkerOptions, run_job_worker};
use crate::config::Config;
use crate::infrastructure::cache::{CacheInvalidator, NullCache, RedisCache, ResponseCache};
use crate::infrastructure::media::{FsMediaStore, MediaStore};
use crate::infrastructure::notify::{LogTransport, NotificationTransport, WebhookTransport};
use crate::infrastructure::persistence::PgPostRepository;
use crate::infrastructure::queue::{ChainLedger, PgJobQueue};
use crate::routes::app_router;
use crate::state::{AppState, Settings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long the worker gets to empty the queue after the server stops.
/// Chains still stored after that are picked up on the next start.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Connects the PostgreSQL pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis page cache (or NullCache fallback)
/// - Background job worker
/// - Axum HTTP server
///
/// On Ctrl+C or SIGTERM the server stops accepting requests and the job
/// worker is asked to finish the queued chains before returning.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - The notification webhook client cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let Runtime { state, worker } = start(&config, pool).await?;

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    worker.stop().await;

    Ok(())
}

/// Application state plus the background worker consuming its job queue.
pub struct Runtime {
    pub state: AppState,
    pub worker: JobWorker,
}

impl Runtime {
    /// Stops the worker once the queue is empty.
    pub async fn shutdown(self) {
        self.worker.stop().await;
    }
}

/// Handle on the spawned job worker.
pub struct JobWorker {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl JobWorker {
    /// Asks the worker to drain and waits for it, up to [`WORKER_DRAIN_TIMEOUT`].
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);

        match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, self.handle).await {
            Ok(Ok(())) => tracing::info!("Job queue drained"),
            Ok(Err(e)) => tracing::error!(error = %e, "Job worker panicked"),
            Err(_) => tracing::warn!("Job queue not drained before timeout"),
        }
    }
}

/// Builds caches, transports and services on an open pool and spawns the
/// job worker.
///
/// # Errors
///
/// Returns an error if the notification webhook client cannot be built.
pub async fn start(config: &Config, pool: PgPool) -> Result<Runtime> {
    let (invalidator, page_cache) = build_cache(config).await;

    let transport: Arc<dyn NotificationTransport> = match &config.notify_webhook_url {
        Some(url) => Arc::new(
            WebhookTransport::new(url.as_str()).context("Failed to build webhook client")?,
        ),
        None => Arc::new(LogTransport),
    };
    let media: Arc<dyn MediaStore> = Arc::new(FsMediaStore::new(&config.media_root));

    let pool = Arc::new(pool);
    let job_queue = Arc::new(PgJobQueue::new(
        pool.clone(),
        Duration::from_secs(config.job_lease_seconds),
    ));

    let runner = Arc::new(JobRunner::new(
        Arc::new(PgPostRepository::new(pool.clone())),
        media,
        invalidator.clone(),
        transport,
        config.site_name(),
        config.job_max_attempts,
    ));
    let ledger: Arc<dyn ChainLedger> = job_queue.clone();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(run_job_worker(
        ledger,
        job_queue.wake_handle(),
        runner,
        WorkerOptions {
            concurrency: config.job_worker_concurrency,
            poll_interval: Duration::from_millis(config.job_poll_interval_ms),
        },
        shutdown_rx,
    ));

    let state = AppState::new(
        pool,
        invalidator,
        page_cache,
        job_queue,
        Settings::from(config),
    );

    Ok(Runtime {
        state,
        worker: JobWorker { handle, shutdown },
    })
}

/// Redis when configured and reachable, NullCache otherwise.
async fn build_cache(config: &Config) -> (Arc<dyn CacheInvalidator>, Arc<dyn ResponseCache>) {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Page cache enabled (Redis)");
                let redis = Arc::new(redis);
                return (redis.clone(), redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            }
        }
    } else {
        tracing::info!("Page cache disabled (NullCache)");
    }

    let null = Arc::new(NullCache::new());
    (null.clone(), null)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
