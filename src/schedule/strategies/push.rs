//! Strategies for the four scheduled push kinds.

use super::{DEFAULT_REMOTE, StrategyError, TaskStrategy};
use crate::schedule::{
    domain::{ScheduledTask, TaskKind, TaskTarget},
    ports::{VersionControl, VersionControlError},
};
use async_trait::async_trait;

/// Plain push of the current branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushStrategy;

#[async_trait]
impl TaskStrategy for PushStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::Push
    }

    async fn execute(
        &self,
        vcs: &dyn VersionControl,
        _task: &ScheduledTask,
    ) -> Result<(), StrategyError> {
        vcs.push().await?;
        Ok(())
    }
}

/// Pushes all local tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushTagsStrategy;

#[async_trait]
impl TaskStrategy for PushTagsStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::PushTags
    }

    async fn execute(
        &self,
        vcs: &dyn VersionControl,
        _task: &ScheduledTask,
    ) -> Result<(), StrategyError> {
        vcs.push_tags().await?;
        Ok(())
    }
}

/// Pushes the tag named by the task target.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushTagSingleStrategy;

#[async_trait]
impl TaskStrategy for PushTagSingleStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::PushTagSingle
    }

    async fn execute(
        &self,
        vcs: &dyn VersionControl,
        task: &ScheduledTask,
    ) -> Result<(), StrategyError> {
        let tag = required_target(task)?;
        vcs.push_to_remote(DEFAULT_REMOTE, tag.as_str()).await?;
        Ok(())
    }
}

/// Pushes the target commit onto the branch checked out when the task runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushCommitStrategy;

#[async_trait]
impl TaskStrategy for PushCommitStrategy {
    fn kind(&self) -> TaskKind {
        TaskKind::PushCommit
    }

    async fn execute(
        &self,
        vcs: &dyn VersionControl,
        task: &ScheduledTask,
    ) -> Result<(), StrategyError> {
        let commit = required_target(task)?;
        let branches = vcs.local_branches().await?;
        if branches.current.trim().is_empty() {
            return Err(VersionControlError::DetachedHead.into());
        }
        let refspec = format!("{commit}:{}", branches.current);
        vcs.push_to_remote(DEFAULT_REMOTE, &refspec).await?;
        Ok(())
    }
}

fn required_target(task: &ScheduledTask) -> Result<&TaskTarget, StrategyError> {
    task.target().ok_or(StrategyError::MissingTarget {
        task_id: task.id(),
        kind: task.kind(),
    })
}
