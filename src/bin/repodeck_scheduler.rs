//! Runs the deferred push scheduler as a long-lived daemon.
//!
//! Usage:
//!
//! ```text
//! repodeck-scheduler <config-path>
//! ```
//!
//! The JSON document at `config-path` is described in [`repodeck::config`].
//! On startup the daemon connects to `PostgreSQL`, creates the scheduling
//! tables when missing, registers the configured repositories, and recovers
//! pending tasks: overdue ones run immediately, the rest get timers. It then
//! holds those timers until interrupted. Log verbosity follows `RUST_LOG`
//! (default `info`).

use camino::Utf8PathBuf;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use repodeck::config::{ConfigError, DaemonConfig};
use repodeck::schedule::{
    adapters::{
        git_cli::GitCliProvider,
        postgres::{CREATE_SCHEDULE_TABLES_SQL, PostgresScheduledTaskRepository, SchedulePgPool},
    },
    services::{PushSchedulerService, ScheduleServiceError},
};
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop the daemon.
#[derive(Debug, Error)]
enum DaemonError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("database setup failed: {0}")]
    Database(#[source] BoxError),
    #[error(transparent)]
    Scheduler(#[from] ScheduleServiceError),
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let config_path = parse_args(env::args())?;
    let config = DaemonConfig::load(&config_path).map_err(DaemonError::from)?;
    let runtime = build_runtime()?;
    runtime.block_on(run(config)).map_err(|err| {
        error!(error = %err, "scheduler daemon stopped");
        err.into()
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Utf8PathBuf, DaemonError> {
    let _program = args.next();
    let config_path = args
        .next()
        .ok_or_else(|| DaemonError::InvalidArgs("missing config path argument".into()))?;
    if let Some(extra) = args.next() {
        return Err(DaemonError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(Utf8PathBuf::from(config_path))
}

// Timers fire on the same thread as everything else, one at a time.
fn build_runtime() -> Result<tokio::runtime::Runtime, DaemonError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::RuntimeInit)
}

async fn connect(config: &DaemonConfig) -> Result<SchedulePgPool, DaemonError> {
    let url = config.database_url.clone();
    let max_connections = config.max_connections;
    tokio::task::spawn_blocking(move || -> Result<SchedulePgPool, BoxError> {
        let manager = ConnectionManager::<PgConnection>::new(url);
        let pool = Pool::builder().max_size(max_connections).build(manager)?;
        pool.get()?.batch_execute(CREATE_SCHEDULE_TABLES_SQL)?;
        Ok(pool)
    })
    .await
    .map_err(|err| DaemonError::Database(Box::new(err)))?
    .map_err(DaemonError::Database)
}

async fn run(config: DaemonConfig) -> Result<(), DaemonError> {
    let pool = connect(&config).await?;
    let store = Arc::new(PostgresScheduledTaskRepository::new(pool));
    let unbounded = PushSchedulerService::new(
        store,
        Arc::new(GitCliProvider::new()),
        Arc::new(DefaultClock),
    )
    .without_execution_timeout();
    let service = match config.execution_timeout() {
        Some(limit) => unbounded.with_execution_timeout(limit),
        None => unbounded,
    };

    for repository in config.repository_records()? {
        service.register_repository(&repository).await?;
        info!(repository_id = %repository.id(), name = repository.name(), "registered repository");
    }

    let report = service.recover_pending_tasks().await?;
    info!(
        executed = report.executed.len(),
        armed = report.armed.len(),
        "recovery complete; waiting for timers"
    );

    tokio::signal::ctrl_c().await.map_err(DaemonError::Signal)?;
    let disarmed = service.shutdown();
    info!(disarmed, "scheduler daemon exiting");
    Ok(())
}
