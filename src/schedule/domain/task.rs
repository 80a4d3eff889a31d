//! Scheduled task aggregate root.

use super::{RepositoryId, ScheduleDomainError, ScheduledTaskId, TaskKind, TaskStatus, TaskTarget};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A push action deferred until `scheduled_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    id: ScheduledTaskId,
    repository_id: RepositoryId,
    kind: TaskKind,
    target: Option<TaskTarget>,
    scheduled_time: DateTime<Utc>,
    status: TaskStatus,
    log: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedScheduledTaskData {
    /// Persisted task identifier.
    pub id: ScheduledTaskId,
    /// Owning repository.
    pub repository_id: RepositoryId,
    /// Persisted push action kind.
    pub kind: TaskKind,
    /// Persisted target, if any.
    pub target: Option<TaskTarget>,
    /// Persisted execution time.
    pub scheduled_time: DateTime<Utc>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted outcome log.
    pub log: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ScheduledTask {
    /// Creates a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::ScheduleTimeNotInFuture`] when
    /// `scheduled_time` is not strictly after the clock's current time,
    /// [`ScheduleDomainError::MissingTarget`] when a targeted kind has no
    /// target, and [`ScheduleDomainError::UnexpectedTarget`] when an
    /// untargeted kind has one.
    pub fn schedule(
        repository_id: RepositoryId,
        kind: TaskKind,
        target: Option<TaskTarget>,
        scheduled_time: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<Self, ScheduleDomainError> {
        let now = clock.utc();
        if scheduled_time <= now {
            return Err(ScheduleDomainError::ScheduleTimeNotInFuture);
        }
        match (kind.requires_target(), target.is_some()) {
            (true, false) => return Err(ScheduleDomainError::MissingTarget(kind)),
            (false, true) => return Err(ScheduleDomainError::UnexpectedTarget(kind)),
            _ => {}
        }

        Ok(Self {
            id: ScheduledTaskId::new(),
            repository_id,
            kind,
            target,
            scheduled_time,
            status: TaskStatus::Pending,
            log: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedScheduledTaskData) -> Self {
        Self {
            id: data.id,
            repository_id: data.repository_id,
            kind: data.kind,
            target: data.target,
            scheduled_time: data.scheduled_time,
            status: data.status,
            log: data.log,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> ScheduledTaskId {
        self.id
    }

    /// Returns the owning repository identifier.
    #[must_use]
    pub const fn repository_id(&self) -> RepositoryId {
        self.repository_id
    }

    /// Returns the push action kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the tag name or commit identifier, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&TaskTarget> {
        self.target.as_ref()
    }

    /// Returns the time after which the task may run.
    #[must_use]
    pub const fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the outcome log; empty while pending.
    #[must_use]
    pub fn log(&self) -> &str {
        &self.log
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` while the task awaits execution.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Returns `true` when the scheduled time is at or before `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time <= now
    }

    /// Marks the task as completed and stamps the success log.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::InvalidStatusTransition`] when the task
    /// is not pending.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), ScheduleDomainError> {
        let now = clock.utc();
        self.finish(
            TaskStatus::Completed,
            format!("Executed successfully at {}", now.to_rfc3339()),
            now,
        )
    }

    /// Marks the task as failed with the given reason.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::InvalidStatusTransition`] when the task
    /// is not pending.
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ScheduleDomainError> {
        self.finish(TaskStatus::Failed, reason.into(), clock.utc())
    }

    fn finish(
        &mut self,
        to: TaskStatus,
        log: String,
        at: DateTime<Utc>,
    ) -> Result<(), ScheduleDomainError> {
        if self.status != TaskStatus::Pending {
            return Err(ScheduleDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.log = log;
        self.updated_at = at;
        Ok(())
    }
}
