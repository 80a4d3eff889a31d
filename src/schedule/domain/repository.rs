//! Repository working copies that scheduled pushes run against.

use super::{RepositoryId, ScheduleDomainError, ScheduledTask};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Longest accepted repository name, matching the `name` column width.
pub const MAX_REPOSITORY_NAME_LEN: usize = 255;

/// Registered repository and the location of its working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    id: RepositoryId,
    name: String,
    working_copy: Utf8PathBuf,
}

impl RepositoryRecord {
    /// Creates a repository record.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyRepositoryName`] when the name is
    /// blank and [`ScheduleDomainError::RepositoryNameTooLong`] past
    /// [`MAX_REPOSITORY_NAME_LEN`] characters.
    pub fn new(
        id: RepositoryId,
        name: impl Into<String>,
        working_copy: impl Into<Utf8PathBuf>,
    ) -> Result<Self, ScheduleDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScheduleDomainError::EmptyRepositoryName);
        }
        if trimmed.chars().count() > MAX_REPOSITORY_NAME_LEN {
            return Err(ScheduleDomainError::RepositoryNameTooLong {
                max: MAX_REPOSITORY_NAME_LEN,
            });
        }
        Ok(Self {
            id,
            name: trimmed.to_owned(),
            working_copy: working_copy.into(),
        })
    }

    /// Returns the repository identifier.
    #[must_use]
    pub const fn id(&self) -> RepositoryId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the working copy path.
    #[must_use]
    pub fn working_copy(&self) -> &Utf8Path {
        &self.working_copy
    }
}

/// A scheduled task paired with the repository it pushes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableTask {
    /// The scheduled task.
    pub task: ScheduledTask,
    /// Owning repository, eagerly loaded.
    pub repository: RepositoryRecord,
}
