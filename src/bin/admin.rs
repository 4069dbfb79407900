//! CLI administration tool for blog-publisher.
//!
//! Provides commands for managing API tokens, publishing posts, moderating
//! link submissions and performing database operations without requiring
//! HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Create a new API token
//! cargo run --bin admin -- token create
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token
//! cargo run --bin admin -- token revoke "Editor laptop"
//!
//! # Publish a post now
//! cargo run --bin admin -- post publish 42
//!
//! # Publish scheduled posts whose date has passed (run from cron)
//! cargo run --bin admin -- post publish-due
//!
//! # Approve a link submission
//! cargo run --bin admin -- link approve 7
//!
//! # Requeue job chains that failed
//! cargo run --bin admin -- jobs retry
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server. `DATABASE_URL` and `TOKEN_SIGNING_SECRET` are required.
//!
//! Post and link commands run the same publish and approve actions as the
//! API, including notifications and cache invalidation. The job worker runs
//! while they do and empties the queue before the command exits.

use blog_publisher::application::services::AuthService;
use blog_publisher::config::{self, Config};
use blog_publisher::domain::entities::LinkStatus;
use blog_publisher::domain::repositories::TokenSelector;
use blog_publisher::infrastructure::persistence::PgTokenRepository;
use blog_publisher::infrastructure::queue::PgJobQueue;
use blog_publisher::server::{self, Runtime};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing blog-publisher.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Publish posts
    Post {
        #[command(subcommand)]
        action: PostAction,
    },

    /// Moderate link submissions
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Inspect the background job queue
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Show content counts
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token
    Create {
        /// Token name (e.g., "Editor laptop", "Deploy hook")
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (optional, auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

#[derive(Subcommand)]
enum PostAction {
    /// Publish a post now
    Publish { id: i64 },

    /// Publish scheduled posts whose publish date has passed
    PublishDue,

    /// List scheduled posts
    Scheduled,
}

#[derive(Subcommand)]
enum LinkAction {
    /// Approve a pending link and notify its submitter
    Approve { id: i64 },

    /// List pending links
    Pending,
}

#[derive(Subcommand)]
enum JobsAction {
    /// Pending, running and failed chain counts
    Status,

    /// Requeue failed chains; they resume at the step that failed
    Retry,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;

    let pool = server::connect_pool(&config).await?;

    match cli.command {
        Commands::Token { action } => handle_token_action(action, &config, &pool).await?,
        Commands::Post { action } => handle_post_action(action, &config, pool).await?,
        Commands::Link { action } => handle_link_action(action, &config, pool).await?,
        Commands::Jobs { action } => handle_jobs_action(action, &config, pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

type Auth = AuthService<PgTokenRepository>;

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, config: &Config, pool: &PgPool) -> Result<()> {
    let auth = AuthService::new(
        Arc::new(PgTokenRepository::new(Arc::new(pool.clone()))),
        config.token_signing_secret.clone(),
    );

    match action {
        TokenAction::Create { name, token, yes } => create_token(&auth, name, token, yes).await?,
        TokenAction::List => list_tokens(&auth).await?,
        TokenAction::Revoke { name_or_id } => revoke_token(&auth, &name_or_id).await?,
    }

    Ok(())
}

/// Issues a token. The raw value is printed once and cannot be shown again.
async fn create_token(
    auth: &Auth,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Editor")
            .interact_text()?,
    };

    if token.is_some() {
        println!("{}", "⚠️  Using provided token value".yellow());
    }

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Create token '{token_name}'?"))
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let issued = auth
        .issue(&token_name, token)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token created".green().bold());
    println!("  ID:    {}", issued.token.id.to_string().bright_black());
    println!("  Name:  {}", issued.token.name.cyan());
    println!("  Token: {}", issued.raw.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  Save this token now, it is not stored and cannot be shown again."
            .red()
            .bold()
    );
    println!();
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        issued.raw.bright_yellow()
    );
    println!();

    Ok(())
}

async fn list_tokens(auth: &Auth) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let tokens = auth
        .tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens yet. Create one with: admin token create".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<30} {:<17} {:<17} {}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );

    for token in &tokens {
        let status = if token.is_revoked() {
            "revoked".red()
        } else {
            "active".green()
        };
        let last_used = token
            .last_used_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<5} {:<30} {:<17} {:<17} {}",
            token.id.to_string().bright_black(),
            token.name.cyan(),
            token.created_at.format("%Y-%m-%d %H:%M").to_string(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    Ok(())
}

/// Numeric input selects by id, anything else by name (newest first).
async fn revoke_token(auth: &Auth, name_or_id: &str) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    let token = auth
        .find(&TokenSelector::parse(name_or_id))
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Token not found")?;

    if token.is_revoked() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {} ({})", token.name.cyan(), token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    auth.revoke(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!("{}", "✅ Token revoked".green().bold());
    println!();

    Ok(())
}

/// Runs post commands through the same publish action as the API.
async fn handle_post_action(action: PostAction, config: &Config, pool: PgPool) -> Result<()> {
    let runtime = server::start(config, pool).await?;
    let result = run_post_action(action, &runtime, &config.base_url).await;
    runtime.shutdown().await;
    result
}

async fn run_post_action(action: PostAction, runtime: &Runtime, base_url: &str) -> Result<()> {
    let posts = &runtime.state.post_service;

    match action {
        PostAction::Publish { id } => {
            println!("{}", "🚀 Publish Post".bright_blue().bold());
            println!();

            let post = posts
                .publish(id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to publish post: {}", e))?;

            println!("  Title: {}", post.title.cyan());
            println!("  URL:   {}", post.url(base_url).bright_white());
            println!();
            println!("{}", "✅ Post is published".green().bold());
        }
        PostAction::PublishDue => {
            println!("{}", "⏰ Publish Due Posts".bright_blue().bold());
            println!();

            let published = posts
                .publish_due(Utc::now())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to publish scheduled posts: {}", e))?;

            if published.is_empty() {
                println!("{}", "  Nothing due".yellow());
            }
            for post in &published {
                println!(
                    "  {} {}",
                    post.id.to_string().bright_black(),
                    post.title.cyan()
                );
            }
            println!();
            println!(
                "  Published: {}",
                published.len().to_string().bright_green().bold()
            );
        }
        PostAction::Scheduled => {
            println!("{}", "📅 Scheduled Posts".bright_blue().bold());
            println!();

            let scheduled = posts
                .scheduled()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list scheduled posts: {}", e))?;

            if scheduled.is_empty() {
                println!("{}", "  No scheduled posts".yellow());
            }
            for post in &scheduled {
                let date = post
                    .publish_date
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "  {:<5} {:<20} {}",
                    post.id.to_string().bright_black(),
                    date.bright_white(),
                    post.title.cyan()
                );
            }
        }
    }

    println!();
    Ok(())
}

/// Runs link commands through the same approve action as the API.
async fn handle_link_action(action: LinkAction, config: &Config, pool: PgPool) -> Result<()> {
    let runtime = server::start(config, pool).await?;
    let result = run_link_action(action, &runtime).await;
    runtime.shutdown().await;
    result
}

async fn run_link_action(action: LinkAction, runtime: &Runtime) -> Result<()> {
    let links = &runtime.state.link_service;

    match action {
        LinkAction::Approve { id } => {
            println!("{}", "👍 Approve Link".bright_blue().bold());
            println!();

            let link = links
                .approve(id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to approve link: {}", e))?;

            println!("  Title: {}", link.title.cyan());
            println!("  URL:   {}", link.url.bright_white());
            println!();
            println!("{}", "✅ Link approved".green().bold());
        }
        LinkAction::Pending => {
            println!("{}", "📥 Pending Links".bright_blue().bold());
            println!();

            let page = links
                .list(Some(LinkStatus::Pending), 1, 100)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

            if page.items.is_empty() {
                println!("{}", "  No pending links".yellow());
            }
            for link in &page.items {
                println!(
                    "  {:<5} {:<40} {}",
                    link.id.to_string().bright_black(),
                    link.title.cyan(),
                    link.url.bright_white()
                );
            }
            if page.has_more {
                println!("  {}", "…more".bright_black());
            }
        }
    }

    println!();
    Ok(())
}

/// Queue inspection works on the table directly; no worker is started.
async fn handle_jobs_action(action: JobsAction, config: &Config, pool: PgPool) -> Result<()> {
    let queue = PgJobQueue::new(
        Arc::new(pool),
        Duration::from_secs(config.job_lease_seconds),
    );

    match action {
        JobsAction::Status => {
            println!("{}", "⚙️  Job Queue".bright_blue().bold());
            println!();

            let backlog = queue
                .backlog()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read job queue: {}", e))?;

            println!("  Pending: {}", backlog.pending.to_string().bright_green().bold());
            println!("  Running: {}", backlog.running.to_string().bright_green().bold());
            let failed = backlog.failed.to_string();
            if backlog.failed > 0 {
                println!("  Failed:  {}", failed.red().bold());
                println!();
                println!("  Requeue with: {}", "admin jobs retry".bright_cyan());
            } else {
                println!("  Failed:  {}", failed.bright_green().bold());
            }
        }
        JobsAction::Retry => {
            let requeued = queue
                .retry_failed()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to requeue chains: {}", e))?;

            println!(
                "{} {}",
                "✅ Requeued chains:".green().bold(),
                requeued.to_string().bright_white()
            );
        }
    }

    println!();
    Ok(())
}

/// Displays content counts.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let published: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE published")
        .fetch_one(pool)
        .await?;

    let drafts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE NOT published")
        .fetch_one(pool)
        .await?;

    let pending_links: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE status = 'pending'")
            .fetch_one(pool)
            .await?;

    let tokens_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(pool)
            .await?;

    println!(
        "  Published posts: {}",
        published.to_string().bright_green().bold()
    );
    println!("  Drafts:          {}", drafts.to_string().bright_green().bold());
    println!(
        "  Pending links:   {}",
        pending_links.to_string().bright_green().bold()
    );
    println!(
        "  Active tokens:   {}",
        tokens_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
