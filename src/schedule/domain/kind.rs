//! Push action kinds and their optional targets.

use super::{ParseTaskKindError, ScheduleDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of deferred push actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Plain push of the current branch.
    Push,
    /// Push every local tag.
    PushTags,
    /// Push one named tag to `origin`.
    PushTagSingle,
    /// Push one commit onto the branch checked out at execution time.
    PushCommit,
}

impl TaskKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Push,
        Self::PushTags,
        Self::PushTagSingle,
        Self::PushCommit,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PushTags => "push-tags",
            Self::PushTagSingle => "push-tag-single",
            Self::PushCommit => "push-commit",
        }
    }

    /// Returns `true` when tasks of this kind must carry a target.
    #[must_use]
    pub const fn requires_target(self) -> bool {
        matches!(self, Self::PushTagSingle | Self::PushCommit)
    }
}

impl TryFrom<&str> for TaskKind {
    type Error = ParseTaskKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "push" => Ok(Self::Push),
            "push-tags" => Ok(Self::PushTags),
            "push-tag-single" => Ok(Self::PushTagSingle),
            "push-commit" => Ok(Self::PushCommit),
            _ => Err(ParseTaskKindError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Longest accepted target, matching the `target` column width.
pub const MAX_TARGET_LEN: usize = 255;

/// Tag name or commit identifier a targeted push acts on.
///
/// Targets are handed to `git push` as a refspec, so they must read as a
/// plain ref name: no leading `-` or `+`, no whitespace, nothing
/// `git check-ref-format` refuses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTarget(String);

impl TaskTarget {
    /// Creates a validated target.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleDomainError::EmptyTarget`] when the value is empty
    /// after trimming, [`ScheduleDomainError::TargetTooLong`] past
    /// [`MAX_TARGET_LEN`] characters, and
    /// [`ScheduleDomainError::InvalidTarget`] when it is not a usable ref
    /// name.
    pub fn new(value: impl Into<String>) -> Result<Self, ScheduleDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ScheduleDomainError::EmptyTarget);
        }
        if trimmed.chars().count() > MAX_TARGET_LEN {
            return Err(ScheduleDomainError::TargetTooLong {
                max: MAX_TARGET_LEN,
            });
        }
        if let Some(reason) = ref_name_violation(trimmed) {
            return Err(ScheduleDomainError::InvalidTarget {
                target: trimmed.to_owned(),
                reason,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the target as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskTarget {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const FORBIDDEN_REF_CHARS: [char; 7] = ['~', '^', ':', '?', '*', '[', '\\'];

fn ref_name_violation(value: &str) -> Option<&'static str> {
    if value.starts_with(['-', '+']) {
        return Some("must not start with '-' or '+'");
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Some("must not contain whitespace or control characters");
    }
    if value.contains(FORBIDDEN_REF_CHARS) {
        return Some("must not contain any of ~ ^ : ? * [ \\");
    }
    if value.contains("..") || value.contains("@{") || value == "@" {
        return Some("must not contain '..' or '@{' or be '@'");
    }
    if value.starts_with('/') || value.ends_with('/') || value.contains("//") {
        return Some("must not have empty path components");
    }
    if value.ends_with('.') {
        return Some("must not end with '.'");
    }
    if value
        .split('/')
        .any(|component| component.starts_with('.') || component.ends_with(".lock"))
    {
        return Some("path components must not start with '.' or end with '.lock'");
    }
    None
}
