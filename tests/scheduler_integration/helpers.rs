//! Shared test helpers for scheduler integration tests.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;
use repodeck::schedule::{
    adapters::memory::{InMemoryScheduledTaskRepository, InMemoryVersionControl},
    domain::{
        PersistedScheduledTaskData, RepositoryId, RepositoryRecord, ScheduledTask,
        ScheduledTaskId, TaskKind, TaskStatus, TaskTarget,
    },
    ports::{ScheduledTaskRepository, VersionControlProvider},
    services::PushSchedulerService,
};
use rstest::fixture;
use tokio::runtime::Runtime;

/// Boxed error used by fallible helpers.
pub type TestError = Box<dyn std::error::Error + Send + Sync>;

/// Scheduler wired to the in-memory store and recording adapter.
pub type MemoryScheduler =
    PushSchedulerService<InMemoryScheduledTaskRepository, InMemoryVersionControl, DefaultClock>;

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Provides a fresh in-memory store for each test.
#[fixture]
pub fn store() -> Arc<InMemoryScheduledTaskRepository> {
    Arc::new(InMemoryScheduledTaskRepository::new())
}

/// Provides a fresh recording adapter for each test.
#[fixture]
pub fn vcs() -> Arc<InMemoryVersionControl> {
    Arc::new(InMemoryVersionControl::new())
}

/// Builds a scheduler over `store` using `provider`.
pub fn scheduler<P: VersionControlProvider + 'static>(
    store: &Arc<InMemoryScheduledTaskRepository>,
    provider: &Arc<P>,
) -> PushSchedulerService<InMemoryScheduledTaskRepository, P, DefaultClock> {
    PushSchedulerService::new(Arc::clone(store), Arc::clone(provider), Arc::new(DefaultClock))
}

/// Builds and registers a repository record.
///
/// # Errors
///
/// Returns an error if the record is invalid or registration fails.
pub fn register<P: VersionControlProvider + 'static>(
    rt: &Runtime,
    service: &PushSchedulerService<InMemoryScheduledTaskRepository, P, DefaultClock>,
    name: &str,
    path: &str,
) -> Result<RepositoryRecord, TestError> {
    let record = RepositoryRecord::new(RepositoryId::new(), name, path)?;
    rt.block_on(service.register_repository(&record))?;
    Ok(record)
}

/// Writes a pending task straight into the store.
///
/// # Errors
///
/// Returns an error if the target is blank or the store rejects the task.
pub fn persist_pending(
    rt: &Runtime,
    store: &InMemoryScheduledTaskRepository,
    repository_id: RepositoryId,
    kind: TaskKind,
    target: Option<&str>,
    scheduled_time: DateTime<Utc>,
) -> Result<ScheduledTask, TestError> {
    let created_at = scheduled_time - Duration::days(1);
    let task = ScheduledTask::from_persisted(PersistedScheduledTaskData {
        id: ScheduledTaskId::new(),
        repository_id,
        kind,
        target: target.map(TaskTarget::new).transpose()?,
        scheduled_time,
        status: TaskStatus::Pending,
        log: String::new(),
        created_at,
        updated_at: created_at,
    });
    rt.block_on(store.store(&task))?;
    Ok(task)
}

/// Loads a task, failing when it is missing.
///
/// # Errors
///
/// Returns an error if the lookup fails or the task does not exist.
pub fn load(
    rt: &Runtime,
    store: &InMemoryScheduledTaskRepository,
    id: ScheduledTaskId,
) -> Result<ScheduledTask, TestError> {
    rt.block_on(store.find_by_id(id))?
        .ok_or_else(|| format!("task {id} is missing").into())
}
