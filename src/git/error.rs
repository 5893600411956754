//! Error types for the shadow repository.
//!
//! Every failure that can happen while driving the `git` binary is defined
//! here. We use `thiserror` for ergonomic error definition and better error
//! messages.

use std::path::PathBuf;

use thiserror::Error;

/// the main error type for repository operations
#[derive(Debug, Error)]
pub enum GitError {
    /// one of the clone setup steps failed; the repository is unusable
    #[error("repository setup failed at `{step}`: {source}")]
    Setup {
        step: &'static str,
        #[source]
        source: Box<GitError>,
    },

    /// the git binary could not be started at all
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// git ran and exited nonzero
    #[error("`git {command}` failed ({}): {stderr}", describe_status(.status))]
    Command {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// the remote has no branches we could track
    #[error("no branches found on remote")]
    NoBranches,

    /// the requested branch is not among the remote-tracking refs
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// `refs/remotes/origin/HEAD` didn't point where we expected
    #[error("cannot resolve HEAD: {0}")]
    UnresolvedHead(String),

    /// unknown object type tag
    #[error("invalid object kind: {0:?} (expected commit, tree or blob)")]
    InvalidObjectKind(String),

    /// not a hex object hash
    #[error("invalid object id: {0:?}")]
    InvalidObjectId(String),

    /// git printed something we could not parse
    #[error("malformed output from `git {command}`: {reason}")]
    MalformedOutput { command: String, reason: String },

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// git output or blob content was not UTF-8
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "killed by signal".to_string(),
    }
}

impl GitError {
    pub(crate) fn setup(step: &'static str, source: GitError) -> Self {
        GitError::Setup {
            step,
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        GitError::MalformedOutput {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::NoBranches | GitError::BranchNotFound(_) | GitError::UnresolvedHead(_)
        )
    }

    /// check if this error was raised before touching the store
    ///
    /// these are caller mistakes, not remote state
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GitError::InvalidObjectKind(_) | GitError::InvalidObjectId(_)
        )
    }

    /// check if this error came from running the external tool
    pub fn is_execution(&self) -> bool {
        match self {
            GitError::Command { .. } | GitError::Spawn { .. } => true,
            GitError::Setup { source, .. } => source.is_execution(),
            _ => false,
        }
    }

    /// the diagnostic output git printed, if this is an execution failure
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::Command { stderr, .. } => Some(stderr),
            GitError::Setup { source, .. } => source.stderr(),
            _ => None,
        }
    }
}

/// result type alias for repository operations
pub type GitResult<T> = Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = GitError::BranchNotFound("main".to_string());
        assert!(missing.is_not_found());
        assert!(!missing.is_execution());

        let kind = GitError::InvalidObjectKind("tag".to_string());
        assert!(kind.is_validation());
        assert!(!kind.is_execution());

        let failed = GitError::Command {
            command: "cat-file blob deadbeef".to_string(),
            status: Some(128),
            stderr: "fatal: Not a valid object name deadbeef".to_string(),
        };
        assert!(failed.is_execution());
        assert!(!failed.is_validation());
        assert_eq!(failed.stderr(), Some("fatal: Not a valid object name deadbeef"));
    }

    #[test]
    fn test_setup_wraps_source() {
        let err = GitError::setup(
            "fetch",
            GitError::Command {
                command: "fetch origin --no-tags --depth 1".to_string(),
                status: Some(128),
                stderr: "fatal: repository not found".to_string(),
            },
        );
        assert!(err.is_execution());
        assert_eq!(err.stderr(), Some("fatal: repository not found"));

        let message = err.to_string();
        assert!(message.contains("`fetch`"));
        assert!(message.contains("exit code 128"));
    }

    #[test]
    fn test_command_display_without_status() {
        let err = GitError::Command {
            command: "push origin".to_string(),
            status: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("killed by signal"));
    }
}
