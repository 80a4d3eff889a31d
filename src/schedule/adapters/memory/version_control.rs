//! Recording version-control adapter.
//!
//! Models push operations without touching a working copy: every call is
//! appended to a shared log, and failures or latency can be injected per
//! operation. Suitable for unit and integration tests and for dry runs of
//! the scheduler.

use crate::schedule::{
    domain::{RepositoryId, RepositoryRecord},
    ports::{
        BranchSummary, VersionControl, VersionControlError, VersionControlProvider,
        VersionControlResult,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Operation exposed by the version-control port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionControlOperation {
    /// [`VersionControl::push`].
    Push,
    /// [`VersionControl::push_tags`].
    PushTags,
    /// [`VersionControl::push_to_remote`].
    PushToRemote,
    /// [`VersionControl::local_branches`].
    LocalBranches,
}

/// A call observed by [`InMemoryVersionControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionControlCall {
    /// Plain push.
    Push,
    /// Push of all tags.
    PushTags,
    /// Push of a refspec to a remote.
    PushToRemote {
        /// Remote name.
        remote: String,
        /// Refspec pushed.
        refspec: String,
    },
    /// Branch listing.
    LocalBranches,
}

/// In-memory adapter that records every call.
#[derive(Debug, Clone)]
pub struct InMemoryVersionControl {
    state: Arc<RwLock<RecordingState>>,
}

#[derive(Debug)]
struct RecordingState {
    calls: Vec<VersionControlCall>,
    opened: Vec<RepositoryId>,
    failures: HashMap<VersionControlOperation, String>,
    delay: Option<Duration>,
    current_branch: String,
}

impl Default for InMemoryVersionControl {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVersionControl {
    /// Creates an adapter whose current branch is `main`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RecordingState {
                calls: Vec::new(),
                opened: Vec::new(),
                failures: HashMap::new(),
                delay: None,
                current_branch: "main".to_owned(),
            })),
        }
    }

    /// Makes `operation` fail with `message` until cleared.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn fail_with(
        &self,
        operation: VersionControlOperation,
        message: impl Into<String>,
    ) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failures.insert(operation, message.into());
        Ok(())
    }

    /// Clears every injected failure.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn clear_failures(&self) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failures.clear();
        Ok(())
    }

    /// Delays every operation by `delay` before it resolves.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn set_delay(&self, delay: Duration) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.delay = Some(delay);
        Ok(())
    }

    /// Checks out `branch` in the simulated working copy.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn set_current_branch(&self, branch: impl Into<String>) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.current_branch = branch.into();
        Ok(())
    }

    /// Returns the calls observed so far.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn calls(&self) -> VersionControlResult<Vec<VersionControlCall>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.calls.clone())
    }

    /// Returns the repositories opened through the provider, in order.
    ///
    /// # Errors
    ///
    /// Returns an error when lock acquisition fails.
    pub fn opened_repositories(&self) -> VersionControlResult<Vec<RepositoryId>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.opened.clone())
    }

    async fn record(
        &self,
        operation: VersionControlOperation,
        call: VersionControlCall,
    ) -> VersionControlResult<()> {
        let delay = {
            let mut state = self.state.write().map_err(lock_error)?;
            state.calls.push(call);
            state.delay
        };
        if let Some(duration) = delay {
            tokio::time::sleep(duration).await;
        }
        let state = self.state.read().map_err(lock_error)?;
        match state.failures.get(&operation) {
            Some(message) => Err(VersionControlError::command(message.clone())),
            None => Ok(()),
        }
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> VersionControlError {
    VersionControlError::Spawn(Arc::new(std::io::Error::other(err.to_string())))
}

#[async_trait]
impl VersionControl for InMemoryVersionControl {
    async fn push(&self) -> VersionControlResult<()> {
        self.record(VersionControlOperation::Push, VersionControlCall::Push)
            .await
    }

    async fn push_tags(&self) -> VersionControlResult<()> {
        self.record(
            VersionControlOperation::PushTags,
            VersionControlCall::PushTags,
        )
        .await
    }

    async fn push_to_remote(&self, remote: &str, refspec: &str) -> VersionControlResult<()> {
        self.record(
            VersionControlOperation::PushToRemote,
            VersionControlCall::PushToRemote {
                remote: remote.to_owned(),
                refspec: refspec.to_owned(),
            },
        )
        .await
    }

    async fn local_branches(&self) -> VersionControlResult<BranchSummary> {
        self.record(
            VersionControlOperation::LocalBranches,
            VersionControlCall::LocalBranches,
        )
        .await?;
        let state = self.state.read().map_err(lock_error)?;
        Ok(BranchSummary {
            current: state.current_branch.clone(),
            all: vec![state.current_branch.clone()],
        })
    }
}

impl VersionControlProvider for InMemoryVersionControl {
    fn open(
        &self,
        repository: &RepositoryRecord,
    ) -> VersionControlResult<Arc<dyn VersionControl>> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.opened.push(repository.id());
        Ok(Arc::new(self.clone()))
    }
}
