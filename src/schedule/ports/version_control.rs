//! Version-control adapter port.

use crate::schedule::domain::RepositoryRecord;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control operations.
pub type VersionControlResult<T> = Result<T, VersionControlError>;

/// Local branches of a working copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchSummary {
    /// Currently checked-out branch.
    pub current: String,
    /// Every local branch name.
    pub all: Vec<String>,
}

/// Primitive push operations against one working copy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Pushes the current branch to its upstream.
    async fn push(&self) -> VersionControlResult<()>;

    /// Pushes every local tag.
    async fn push_tags(&self) -> VersionControlResult<()>;

    /// Pushes `refspec` to the named remote.
    async fn push_to_remote(&self, remote: &str, refspec: &str) -> VersionControlResult<()>;

    /// Lists local branches and the current branch.
    async fn local_branches(&self) -> VersionControlResult<BranchSummary>;
}

/// Binds a [`VersionControl`] adapter to a repository working copy.
pub trait VersionControlProvider: Send + Sync {
    /// Opens the working copy described by `repository`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionControlError`] when the working copy cannot be used.
    fn open(&self, repository: &RepositoryRecord)
    -> VersionControlResult<Arc<dyn VersionControl>>;
}

/// Errors raised by version-control adapters.
///
/// The display text is recorded verbatim as a failed task's log.
#[derive(Debug, Clone, Error)]
pub enum VersionControlError {
    /// The tool reported a failure.
    #[error("{0}")]
    Command(String),

    /// The working copy does not exist or is not a repository.
    #[error("not a git working copy: {0}")]
    NotARepository(String),

    /// HEAD is detached, so there is no current branch.
    #[error("no branch is currently checked out")]
    DetachedHead,

    /// The tool could not be started.
    #[error("failed to run git: {0}")]
    Spawn(Arc<std::io::Error>),
}

impl VersionControlError {
    /// Creates a command failure carrying the tool's message.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }
}
