//! Version-control adapter that shells out to the system `git` binary.
//!
//! Every operation runs `git -C <working copy> ...` through
//! [`tokio::process::Command`] with terminal prompts disabled. The child is
//! killed if the calling future is dropped, so an execution timeout also
//! stops the underlying push.

use crate::schedule::{
    domain::RepositoryRecord,
    ports::{
        BranchSummary, VersionControl, VersionControlError, VersionControlProvider,
        VersionControlResult,
    },
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, instrument};

/// `git` adapter bound to one working copy.
#[derive(Debug, Clone)]
pub struct GitCli {
    working_copy: Utf8PathBuf,
    program: String,
}

impl GitCli {
    /// Creates an adapter for `working_copy` using `git` from `PATH`.
    #[must_use]
    pub fn new(working_copy: impl Into<Utf8PathBuf>) -> Self {
        Self {
            working_copy: working_copy.into(),
            program: "git".to_owned(),
        }
    }

    /// Overrides the executable used instead of `git`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Returns the working copy this adapter operates on.
    #[must_use]
    pub fn working_copy(&self) -> &Utf8Path {
        &self.working_copy
    }

    async fn run(&self, args: &[&str]) -> VersionControlResult<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C")
            .arg(self.working_copy.as_std_path())
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(?args, "spawning git");

        let output = cmd
            .output()
            .await
            .map_err(|err| VersionControlError::Spawn(Arc::new(err)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let subcommand = args.first().copied().unwrap_or_default();
            return Err(VersionControlError::command(format!(
                "git {subcommand} failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl VersionControl for GitCli {
    #[instrument(skip(self), fields(repo = %self.working_copy))]
    async fn push(&self) -> VersionControlResult<()> {
        self.run(&["push"]).await.map(drop)
    }

    #[instrument(skip(self), fields(repo = %self.working_copy))]
    async fn push_tags(&self) -> VersionControlResult<()> {
        self.run(&["push", "--tags"]).await.map(drop)
    }

    #[instrument(skip(self), fields(repo = %self.working_copy))]
    async fn push_to_remote(&self, remote: &str, refspec: &str) -> VersionControlResult<()> {
        // `--` keeps git from reading either operand as an option.
        self.run(&["push", "--", remote, refspec]).await.map(drop)
    }

    #[instrument(skip(self), fields(repo = %self.working_copy))]
    async fn local_branches(&self) -> VersionControlResult<BranchSummary> {
        let listing = self
            .run(&["for-each-ref", "--format=%(HEAD) %(refname:short)", "refs/heads"])
            .await?;
        Ok(parse_branch_listing(&listing))
    }
}

/// Parses `for-each-ref --format='%(HEAD) %(refname:short)'` output.
///
/// The checked-out branch is prefixed with `*`; every other line starts with
/// a space. `current` stays empty when HEAD is detached.
#[must_use]
pub fn parse_branch_listing(listing: &str) -> BranchSummary {
    let mut summary = BranchSummary::default();
    for line in listing.lines() {
        let (marker, name) = line.split_at_checked(1).unwrap_or(("", line));
        let branch = name.trim();
        if branch.is_empty() {
            continue;
        }
        if marker == "*" {
            branch.clone_into(&mut summary.current);
        }
        summary.all.push(branch.to_owned());
    }
    summary
}

/// Opens [`GitCli`] adapters for registered repositories.
#[derive(Debug, Clone, Default)]
pub struct GitCliProvider {
    program: Option<String>,
}

impl GitCliProvider {
    /// Creates a provider that uses `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the executable used instead of `git`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }
}

impl VersionControlProvider for GitCliProvider {
    fn open(
        &self,
        repository: &RepositoryRecord,
    ) -> VersionControlResult<Arc<dyn VersionControl>> {
        let working_copy = repository.working_copy();
        if !working_copy.is_dir() {
            return Err(VersionControlError::NotARepository(
                working_copy.to_string(),
            ));
        }
        let mut git = GitCli::new(working_copy);
        if let Some(program) = &self.program {
            git = git.with_program(program.clone());
        }
        Ok(Arc::new(git))
    }
}
