//! Push strategies and the resolver that dispatches on task kind.
//!
//! Each strategy is stateless and translates one [`TaskKind`] into a call
//! sequence on a [`VersionControl`] adapter. Adding a kind means adding a
//! variant, a strategy, and one registration in
//! [`StrategyRegistry::with_defaults`].

mod push;
mod registry;

pub use push::{PushCommitStrategy, PushStrategy, PushTagSingleStrategy, PushTagsStrategy};
pub use registry::StrategyRegistry;

use crate::schedule::{
    domain::{ScheduledTask, ScheduledTaskId, TaskKind},
    ports::{VersionControl, VersionControlError},
};
use async_trait::async_trait;
use thiserror::Error;

/// Remote every scheduled push targets.
pub const DEFAULT_REMOTE: &str = "origin";

/// Executes one kind of scheduled push.
#[async_trait]
pub trait TaskStrategy: Send + Sync {
    /// Task kind this strategy handles.
    fn kind(&self) -> TaskKind;

    /// Runs the push for `task` against `vcs`.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError`] when the adapter fails or the task lacks
    /// data the strategy needs.
    async fn execute(
        &self,
        vcs: &dyn VersionControl,
        task: &ScheduledTask,
    ) -> Result<(), StrategyError>;
}

/// Errors raised while resolving or running a strategy.
#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    /// No strategy is registered for the task type.
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    /// A targeted task reached execution without a target.
    #[error("task {task_id} of type {kind} has no target")]
    MissingTarget {
        /// Task being executed.
        task_id: ScheduledTaskId,
        /// Its kind.
        kind: TaskKind,
    },

    /// The adapter failed; its message is kept verbatim.
    #[error(transparent)]
    VersionControl(#[from] VersionControlError),
}
