#![forbid(unsafe_code)]

//! `taskdesk` — task queue and AI-dispatch MCP server binary.
//!
//! Bootstraps configuration, connects the store, starts the Slack
//! Socket Mode integration and the dispatch worker, then serves MCP
//! over stdio until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use taskdesk::config::GlobalConfig;
use taskdesk::dispatch::orchestrator::Orchestrator;
use taskdesk::mcp::handler::AppState;
use taskdesk::mcp::transport;
use taskdesk::persistence::db;
use taskdesk::persistence::state_repo::StateRepo;
use taskdesk::slack::{ListenerState, SlackService};
use taskdesk::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "taskdesk", about = "Task queue and AI-dispatch MCP server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the database file path from the config.
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("taskdesk server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(db_path) = args.db {
        config.db_path = db_path;
    }

    // Load Slack credentials from keyring / env vars.
    config.load_credentials().await;
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let pool = Arc::new(db::connect(&config.db_path).await?);
    StateRepo::new(Arc::clone(&pool))
        .ensure_seeded(&config.goal.goal, &config.goal.goal_metric)
        .await?;
    info!(db_path = %config.db_path.display(), "database connected");

    let ct = CancellationToken::new();

    // ── Start Slack client if configured ────────────────
    let (slack, _slack_queue_task) = if config.slack_enabled() {
        let (service, queue_task) = SlackService::start(&config.slack)?;
        info!("slack service started");
        (Some(service), Some(queue_task))
    } else {
        info!("slack not configured; running in local-only mode");
        (None, None)
    };

    // ── Start dispatch orchestration ────────────────────
    let (orchestrator, _dispatch_runtime) = Orchestrator::start(
        Arc::clone(&pool),
        config.clone(),
        slack.clone(),
        ct.clone(),
    );
    info!("dispatch worker started");

    // ── Wire the Slack command listener ─────────────────
    let _socket_task = slack.as_ref().map(|service| {
        let listener = Arc::new(ListenerState {
            orchestrator: Arc::clone(&orchestrator),
            slack: Arc::clone(service),
        });
        service.spawn_socket_mode(listener)
    });

    // ── Build shared application state ──────────────────
    let state = Arc::new(AppState {
        config: Arc::new(config),
        db: pool,
        slack,
        orchestrator,
    });

    // ── Serve MCP over stdio ────────────────────────────
    let stdio_ct = ct.clone();
    let stdio_state = Arc::clone(&state);
    let stdio_handle = tokio::spawn(async move {
        if let Err(err) = transport::serve_stdio(stdio_state, stdio_ct).await {
            error!(%err, "stdio transport failed");
        }
    });

    info!("taskdesk server ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = stdio_handle.await;
    info!("taskdesk shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the MCP stdio transport; logs must go to stderr.
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
