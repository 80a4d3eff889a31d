//! In-memory task store for tests and local dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::schedule::{
    domain::{
        ExecutableTask, RepositoryId, RepositoryRecord, ScheduledTask, ScheduledTaskId, TaskStatus,
    },
    ports::{
        RepositoryCatalog, ScheduledTaskRepository, TaskRepositoryError, TaskRepositoryResult,
    },
};

/// Thread-safe in-memory task store and repository catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScheduledTaskRepository {
    state: Arc<RwLock<InMemoryScheduleState>>,
}

#[derive(Debug, Default)]
struct InMemoryScheduleState {
    tasks: HashMap<ScheduledTaskId, ScheduledTask>,
    repositories: HashMap<RepositoryId, RepositoryRecord>,
}

impl InMemoryScheduledTaskRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks in any status.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn task_count(&self) -> TaskRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.len())
    }
}

fn lock_error<E: std::fmt::Display>(err: E) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn attach_repository(state: &InMemoryScheduleState, task: &ScheduledTask) -> Option<ExecutableTask> {
    state
        .repositories
        .get(&task.repository_id())
        .map(|repository| ExecutableTask {
            task: task.clone(),
            repository: repository.clone(),
        })
}

#[async_trait]
impl ScheduledTaskRepository for InMemoryScheduledTaskRepository {
    async fn store(&self, task: &ScheduledTask) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        if !state.repositories.contains_key(&task.repository_id()) {
            return Err(TaskRepositoryError::RepositoryNotFound(
                task.repository_id(),
            ));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ScheduledTaskId,
    ) -> TaskRepositoryResult<Option<ScheduledTask>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_for_repository(
        &self,
        id: ScheduledTaskId,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<Option<ScheduledTask>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .tasks
            .get(&id)
            .filter(|task| task.repository_id() == repository_id)
            .cloned())
    }

    async fn find_executable(
        &self,
        id: ScheduledTaskId,
    ) -> TaskRepositoryResult<Option<ExecutableTask>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .tasks
            .get(&id)
            .and_then(|task| attach_repository(&state, task)))
    }

    async fn find_pending(&self) -> TaskRepositoryResult<Vec<ExecutableTask>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut pending: Vec<ExecutableTask> = state
            .tasks
            .values()
            .filter(|task| task.is_pending())
            .filter_map(|task| attach_repository(&state, task))
            .collect();
        pending.sort_by_key(|entry| entry.task.scheduled_time());
        Ok(pending)
    }

    async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<Vec<ScheduledTask>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<ScheduledTask> = state
            .tasks
            .values()
            .filter(|task| task.repository_id() == repository_id)
            .cloned()
            .collect();
        tasks.sort_by(|left, right| right.scheduled_time().cmp(&left.scheduled_time()));
        Ok(tasks)
    }

    async fn record_outcome(&self, task: &ScheduledTask) -> TaskRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        match state.tasks.get_mut(&task.id()) {
            Some(stored) if stored.status() == TaskStatus::Pending => {
                *stored = task.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_pending(
        &self,
        id: ScheduledTaskId,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let deletable = state
            .tasks
            .get(&id)
            .is_some_and(|task| task.repository_id() == repository_id && task.is_pending());
        if deletable {
            state.tasks.remove(&id);
        }
        Ok(deletable)
    }
}

#[async_trait]
impl RepositoryCatalog for InMemoryScheduledTaskRepository {
    async fn register(&self, repository: &RepositoryRecord) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state
            .repositories
            .insert(repository.id(), repository.clone());
        Ok(())
    }

    async fn find_repository(
        &self,
        id: RepositoryId,
    ) -> TaskRepositoryResult<Option<RepositoryRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.repositories.get(&id).cloned())
    }
}
