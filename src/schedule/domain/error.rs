//! Error types for scheduled task validation and parsing.

use super::{ScheduledTaskId, TaskKind, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning scheduled tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleDomainError {
    /// The requested execution time is not strictly after the current time.
    #[error("schedule time must be in the future")]
    ScheduleTimeNotInFuture,

    /// The scheduled time could not be parsed as an RFC 3339 timestamp.
    #[error("invalid schedule time '{0}', expected an RFC 3339 timestamp")]
    InvalidScheduleTime(String),

    /// The task kind is not one of the supported push actions.
    #[error("unsupported task type: {0}")]
    UnsupportedTaskKind(String),

    /// The task kind needs a target but none was supplied.
    #[error("task type {0} requires a target")]
    MissingTarget(TaskKind),

    /// A target was supplied for a task kind that does not use one.
    #[error("task type {0} does not accept a target")]
    UnexpectedTarget(TaskKind),

    /// The target is empty after trimming.
    #[error("task target must not be empty")]
    EmptyTarget,

    /// The target cannot be passed to git as a tag name or commit.
    #[error("invalid task target '{target}': {reason}")]
    InvalidTarget {
        /// Offending target, trimmed.
        target: String,
        /// Rule the target breaks.
        reason: &'static str,
    },

    /// The target exceeds the stored column width.
    #[error("task target must be at most {max} characters")]
    TargetTooLong {
        /// Maximum length in characters.
        max: usize,
    },

    /// The repository name is empty after trimming.
    #[error("repository name must not be empty")]
    EmptyRepositoryName,

    /// The repository name exceeds the stored column width.
    #[error("repository name must be at most {max} characters")]
    RepositoryNameTooLong {
        /// Maximum length in characters.
        max: usize,
    },

    /// A terminal transition was attempted on a task that is not pending.
    #[error("scheduled task {task_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Task being transitioned.
        task_id: ScheduledTaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

/// Error returned while parsing a task kind identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task type: {0}")]
pub struct ParseTaskKindError(pub String);

/// Error returned while parsing a task status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
