//! Task store and repository catalog ports.

use crate::schedule::domain::{
    ExecutableTask, RepositoryId, RepositoryRecord, ScheduledTask, ScheduledTaskId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Durable record of every scheduled task and its outcome.
///
/// Only the scheduler service mutates task rows.
#[async_trait]
pub trait ScheduledTaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier is
    /// already present.
    async fn store(&self, task: &ScheduledTask) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: ScheduledTaskId)
    -> TaskRepositoryResult<Option<ScheduledTask>>;

    /// Finds a task by identifier, scoped to its owning repository.
    async fn find_for_repository(
        &self,
        id: ScheduledTaskId,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<Option<ScheduledTask>>;

    /// Finds a task together with its owning repository record.
    async fn find_executable(
        &self,
        id: ScheduledTaskId,
    ) -> TaskRepositoryResult<Option<ExecutableTask>>;

    /// Returns every pending task with its repository, earliest first.
    async fn find_pending(&self) -> TaskRepositoryResult<Vec<ExecutableTask>>;

    /// Returns a repository's tasks ordered by scheduled time, latest first.
    async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<Vec<ScheduledTask>>;

    /// Writes the task's terminal status and log.
    ///
    /// The write applies only while the stored row is still pending. Returns
    /// `false` when the row is missing or already terminal.
    async fn record_outcome(&self, task: &ScheduledTask) -> TaskRepositoryResult<bool>;

    /// Hard-deletes a pending task owned by `repository_id`.
    ///
    /// Returns `false` when no pending row matched.
    async fn delete_pending(
        &self,
        id: ScheduledTaskId,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<bool>;
}

/// Lookup of repositories that tasks may target.
#[async_trait]
pub trait RepositoryCatalog: Send + Sync {
    /// Inserts or replaces a repository record.
    async fn register(&self, repository: &RepositoryRecord) -> TaskRepositoryResult<()>;

    /// Finds a repository record by identifier.
    async fn find_repository(
        &self,
        id: RepositoryId,
    ) -> TaskRepositoryResult<Option<RepositoryRecord>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate scheduled task identifier: {0}")]
    DuplicateTask(ScheduledTaskId),

    /// The task references a repository that is not registered.
    #[error("repository not found: {0}")]
    RepositoryNotFound(RepositoryId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
