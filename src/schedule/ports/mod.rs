//! Port contracts for deferred push scheduling.
//!
//! Ports define infrastructure-agnostic interfaces used by the scheduler
//! service.

pub mod repository;
pub mod version_control;

pub use repository::{
    RepositoryCatalog, ScheduledTaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
pub use version_control::{
    BranchSummary, VersionControl, VersionControlError, VersionControlProvider,
    VersionControlResult,
};

#[cfg(test)]
pub use version_control::MockVersionControl;
