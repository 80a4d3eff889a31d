//! In-memory adapters for the scheduling ports.

mod store;
mod version_control;

pub use store::InMemoryScheduledTaskRepository;
pub use version_control::{InMemoryVersionControl, VersionControlCall, VersionControlOperation};
