//! Service layer for deferred push scheduling.
//!
//! [`PushSchedulerService`] is the single authority over scheduled task
//! lifecycle. It keeps the durable task store and the in-memory
//! [`TimerRegistry`] consistent: scheduling persists a row and arms a timer,
//! cancelling disarms the timer and deletes the row, and
//! [`PushSchedulerService::recover_pending_tasks`] rebuilds timers after a
//! restart.

use super::timers::{TimerHandle, TimerRegistry};
use crate::schedule::{
    domain::{
        ExecutableTask, RepositoryId, RepositoryRecord, ScheduleDomainError, ScheduledTask,
        ScheduledTaskId, TaskKind, TaskStatus, TaskTarget,
    },
    ports::{
        RepositoryCatalog, ScheduledTaskRepository, TaskRepositoryError, VersionControlProvider,
    },
    strategies::{StrategyError, StrategyRegistry},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

/// Longest a single strategy run may take before the task is failed.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestedTime {
    At(DateTime<Utc>),
    Text(String),
}

/// Request payload for scheduling a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTaskRequest {
    repository_id: RepositoryId,
    kind: String,
    scheduled_time: RequestedTime,
    target: Option<String>,
}

impl ScheduleTaskRequest {
    /// Creates a request for `kind` at `scheduled_time`.
    #[must_use]
    pub fn new(
        repository_id: RepositoryId,
        kind: impl Into<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            repository_id,
            kind: kind.into(),
            scheduled_time: RequestedTime::At(scheduled_time),
            target: None,
        }
    }

    /// Creates a request whose time is an RFC 3339 string, parsed on
    /// scheduling.
    #[must_use]
    pub fn from_rfc3339(
        repository_id: RepositoryId,
        kind: impl Into<String>,
        scheduled_time: impl Into<String>,
    ) -> Self {
        Self {
            repository_id,
            kind: kind.into(),
            scheduled_time: RequestedTime::Text(scheduled_time.into()),
            target: None,
        }
    }

    /// Sets the tag name or commit identifier.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Service-level errors for scheduling and cancellation.
#[derive(Debug, Error)]
pub enum ScheduleServiceError {
    /// The request failed validation; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ScheduleDomainError),

    /// No task with this identifier belongs to the repository.
    #[error("scheduled task {task_id} not found for repository {repository_id}")]
    NotFound {
        /// Requested task.
        task_id: ScheduledTaskId,
        /// Repository the lookup was scoped to.
        repository_id: RepositoryId,
    },

    /// The task already reached a terminal status.
    #[error("only pending tasks can be cancelled (task {task_id} is {status})")]
    InvalidState {
        /// Requested task.
        task_id: ScheduledTaskId,
        /// Its current status.
        status: TaskStatus,
    },

    /// The repository is not registered.
    #[error("repository {0} is not registered")]
    RepositoryNotRegistered(RepositoryId),

    /// Task store operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for scheduler service operations.
pub type ScheduleServiceResult<T> = Result<T, ScheduleServiceError>;

/// What a call to [`PushSchedulerService::execute_task`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The task was missing or no longer pending; nothing changed.
    Skipped,
    /// The push succeeded and the task was recorded as completed.
    Completed(ScheduledTask),
    /// The push failed and the task was recorded as failed.
    Failed(ScheduledTask),
    /// The task store could not be read or written.
    Unrecorded {
        /// Store error text.
        reason: String,
    },
}

impl ExecutionOutcome {
    /// Returns the task in its terminal state, if one was recorded.
    #[must_use]
    pub const fn task(&self) -> Option<&ScheduledTask> {
        match self {
            Self::Completed(task) | Self::Failed(task) => Some(task),
            Self::Skipped | Self::Unrecorded { .. } => None,
        }
    }

    /// Returns `true` when execution left every state untouched.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Tasks handled by [`PushSchedulerService::recover_pending_tasks`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Overdue tasks executed immediately.
    pub executed: Vec<ScheduledTaskId>,
    /// Future tasks whose timers were re-armed.
    pub armed: Vec<ScheduledTaskId>,
}

#[derive(Debug, Error)]
enum ExecutionError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("execution timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Orchestrates creation, cancellation, execution and recovery of
/// scheduled pushes.
pub struct PushSchedulerService<R, P, C>
where
    R: ScheduledTaskRepository + RepositoryCatalog + 'static,
    P: VersionControlProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    provider: Arc<P>,
    clock: Arc<C>,
    strategies: Arc<StrategyRegistry>,
    timers: TimerRegistry,
    execution_gate: Arc<Mutex<()>>,
    execution_timeout: Option<Duration>,
}

impl<R, P, C> Clone for PushSchedulerService<R, P, C>
where
    R: ScheduledTaskRepository + RepositoryCatalog + 'static,
    P: VersionControlProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            provider: Arc::clone(&self.provider),
            clock: Arc::clone(&self.clock),
            strategies: Arc::clone(&self.strategies),
            timers: self.timers.clone(),
            execution_gate: Arc::clone(&self.execution_gate),
            execution_timeout: self.execution_timeout,
        }
    }
}

impl<R, P, C> PushSchedulerService<R, P, C>
where
    R: ScheduledTaskRepository + RepositoryCatalog + 'static,
    P: VersionControlProvider + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a scheduler with the default strategies and execution timeout
    /// and an empty timer registry.
    #[must_use]
    pub fn new(repository: Arc<R>, provider: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            repository,
            provider,
            clock,
            strategies: Arc::new(StrategyRegistry::with_defaults()),
            timers: TimerRegistry::new(),
            execution_gate: Arc::new(Mutex::new(())),
            execution_timeout: Some(DEFAULT_EXECUTION_TIMEOUT),
        }
    }

    /// Replaces the strategy lookup table.
    #[must_use]
    pub fn with_strategies(mut self, strategies: StrategyRegistry) -> Self {
        self.strategies = Arc::new(strategies);
        self
    }

    /// Sets the per-execution timeout.
    #[must_use]
    pub const fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }

    /// Lets strategy runs take as long as the adapter needs.
    #[must_use]
    pub const fn without_execution_timeout(mut self) -> Self {
        self.execution_timeout = None;
        self
    }

    /// Returns the timer registry owned by this service.
    #[must_use]
    pub const fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Registers or updates a repository that tasks may target.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::Repository`] when persistence fails.
    pub async fn register_repository(
        &self,
        repository: &RepositoryRecord,
    ) -> ScheduleServiceResult<()> {
        self.repository.register(repository).await?;
        Ok(())
    }

    /// Persists a pending task and arms its timer.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::Validation`] when the kind is unknown,
    /// the time is unparsable or not in the future, or the target does not
    /// fit the kind; [`ScheduleServiceError::RepositoryNotRegistered`] when
    /// the repository is unknown; and store errors. No timer is armed on
    /// failure.
    #[instrument(
        skip_all,
        fields(repository_id = %request.repository_id, kind = %request.kind)
    )]
    pub async fn schedule(
        &self,
        request: ScheduleTaskRequest,
    ) -> ScheduleServiceResult<ScheduledTask> {
        let ScheduleTaskRequest {
            repository_id,
            kind: requested_kind,
            scheduled_time: requested_time,
            target: requested_target,
        } = request;

        let kind = TaskKind::try_from(requested_kind.as_str())
            .map_err(|err| ScheduleDomainError::UnsupportedTaskKind(err.0))?;
        let scheduled_time = match requested_time {
            RequestedTime::At(time) => time,
            RequestedTime::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|time| time.with_timezone(&Utc))
                .map_err(|_| ScheduleDomainError::InvalidScheduleTime(text))?,
        };
        let target = requested_target.map(TaskTarget::new).transpose()?;
        let task =
            ScheduledTask::schedule(repository_id, kind, target, scheduled_time, &*self.clock)?;

        if self
            .repository
            .find_repository(repository_id)
            .await?
            .is_none()
        {
            return Err(ScheduleServiceError::RepositoryNotRegistered(repository_id));
        }
        self.repository.store(&task).await?;
        self.arm(&task);

        info!(task_id = %task.id(), scheduled_time = %task.scheduled_time(), "scheduled task");
        Ok(task)
    }

    /// Cancels a pending task: disarms its timer and deletes its row.
    ///
    /// A missing timer is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleServiceError::NotFound`] when the repository has no
    /// such task, [`ScheduleServiceError::InvalidState`] when the task is no
    /// longer pending, and store errors.
    #[instrument(skip_all, fields(%repository_id, %task_id))]
    pub async fn cancel(
        &self,
        repository_id: RepositoryId,
        task_id: ScheduledTaskId,
    ) -> ScheduleServiceResult<()> {
        let task = self.find_owned(repository_id, task_id).await?;
        if !task.is_pending() {
            return Err(ScheduleServiceError::InvalidState {
                task_id,
                status: task.status(),
            });
        }

        if !self.timers.disarm(task_id) {
            debug!("no live timer for task");
        }

        if !self.repository.delete_pending(task_id, repository_id).await? {
            // Lost the race against an execution that recorded its outcome.
            let current = self.find_owned(repository_id, task_id).await?;
            return Err(ScheduleServiceError::InvalidState {
                task_id,
                status: current.status(),
            });
        }

        info!("cancelled scheduled task");
        Ok(())
    }

    /// Runs a pending task and records its terminal status.
    ///
    /// Missing or non-pending tasks are skipped silently. Strategy and
    /// adapter failures become `failed` tasks; nothing is returned as an
    /// error.
    #[instrument(skip_all, fields(%task_id))]
    pub async fn execute_task(&self, task_id: ScheduledTaskId) -> ExecutionOutcome {
        let _serialized = self.execution_gate.lock().await;

        let ExecutableTask {
            mut task,
            repository,
        } = match self.repository.find_executable(task_id).await {
            Ok(Some(executable)) => executable,
            Ok(None) => {
                debug!("task no longer exists; skipping");
                return ExecutionOutcome::Skipped;
            }
            Err(err) => {
                error!(error = %err, "failed to load scheduled task");
                return ExecutionOutcome::Unrecorded {
                    reason: err.to_string(),
                };
            }
        };
        if !task.is_pending() {
            debug!(status = %task.status(), "task is not pending; skipping");
            return ExecutionOutcome::Skipped;
        }

        let transition = match self.run_strategy(&repository, &task).await {
            Ok(()) => task.complete(&*self.clock),
            Err(err) => {
                warn!(error = %err, kind = %task.kind(), "scheduled task failed");
                task.fail(err.to_string(), &*self.clock)
            }
        };
        if let Err(err) = transition {
            error!(error = %err, "rejected terminal transition");
            return ExecutionOutcome::Skipped;
        }

        match self.repository.record_outcome(&task).await {
            Ok(true) if task.status() == TaskStatus::Completed => {
                info!("scheduled task executed successfully");
                ExecutionOutcome::Completed(task)
            }
            Ok(true) => ExecutionOutcome::Failed(task),
            Ok(false) => {
                info!("task was cancelled or finished concurrently; outcome discarded");
                ExecutionOutcome::Skipped
            }
            Err(err) => {
                error!(error = %err, "failed to record task outcome");
                ExecutionOutcome::Unrecorded {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Reconciles the empty timer registry with persisted pending tasks.
    ///
    /// Overdue tasks run immediately, one after another; the rest get timers
    /// for their remaining delay. Call once at startup.
    ///
    /// # Errors
    ///
    /// Returns store errors when pending tasks cannot be loaded.
    #[instrument(skip(self))]
    pub async fn recover_pending_tasks(&self) -> ScheduleServiceResult<RecoveryReport> {
        let pending = self.repository.find_pending().await?;
        info!(count = pending.len(), "reloading pending tasks");

        let now = self.clock.utc();
        let mut report = RecoveryReport::default();
        for ExecutableTask { task, .. } in pending {
            if task.is_due(now) {
                info!(task_id = %task.id(), "executing missed task");
                self.execute_task(task.id()).await;
                report.executed.push(task.id());
            } else {
                self.arm(&task);
                report.armed.push(task.id());
            }
        }
        Ok(report)
    }

    /// Returns a repository's task history, latest scheduled time first.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn list_tasks(
        &self,
        repository_id: RepositoryId,
    ) -> ScheduleServiceResult<Vec<ScheduledTask>> {
        Ok(self.repository.list_for_repository(repository_id).await?)
    }

    /// Cancels every armed timer. Persisted tasks stay pending for the next
    /// recovery. Returns how many timers were disarmed.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let disarmed = self.timers.shutdown();
        info!(disarmed, "scheduler shut down");
        disarmed
    }

    fn arm(&self, task: &ScheduledTask) -> TimerHandle {
        let delay = (task.scheduled_time() - self.clock.utc())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let service = self.clone();
        let task_id = task.id();
        debug!(%task_id, delay_secs = delay.as_secs(), "arming timer");
        self.timers.arm(task_id, delay, async move {
            service.execute_task(task_id).await;
        })
    }

    async fn find_owned(
        &self,
        repository_id: RepositoryId,
        task_id: ScheduledTaskId,
    ) -> ScheduleServiceResult<ScheduledTask> {
        self.repository
            .find_for_repository(task_id, repository_id)
            .await?
            .ok_or(ScheduleServiceError::NotFound {
                task_id,
                repository_id,
            })
    }

    async fn run_strategy(
        &self,
        repository: &RepositoryRecord,
        task: &ScheduledTask,
    ) -> Result<(), ExecutionError> {
        let strategy = self.strategies.resolve(task.kind())?;
        let vcs = self.provider.open(repository).map_err(StrategyError::from)?;
        let run = strategy.execute(vcs.as_ref(), task);
        match self.execution_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| ExecutionError::TimedOut(limit))?
                .map_err(ExecutionError::from),
            None => run.await.map_err(ExecutionError::from),
        }
    }
}
