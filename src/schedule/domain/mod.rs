//! Domain model for deferred push scheduling.
//!
//! A scheduled task names a repository, a push action kind, an optional
//! target and the time after which it may run. Infrastructure concerns
//! (storage, timers, the git binary) stay outside this boundary.

mod error;
mod ids;
mod kind;
mod repository;
mod status;
mod task;

pub use error::{ParseTaskKindError, ParseTaskStatusError, ScheduleDomainError};
pub use ids::{RepositoryId, ScheduledTaskId};
pub use kind::{MAX_TARGET_LEN, TaskKind, TaskTarget};
pub use repository::{ExecutableTask, MAX_REPOSITORY_NAME_LEN, RepositoryRecord};
pub use status::TaskStatus;
pub use task::{PersistedScheduledTaskData, ScheduledTask};
