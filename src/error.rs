//! Service error types.
//!
//! Defines `GitError` for every failure the git-data layer can surface. Benign
//! tool failures never reach this type: the runner converts them to empty
//! output. What remains is either an unexpected tool failure, an I/O problem
//! spawning the tool, or a caller mistake (bad path, bad revision).
//!
//! Shared in-flight queries hand the same failure to every awaiting caller, so
//! errors travel as `Arc<GitError>` inside the cache and are wrapped back into
//! `GitError::Shared` at the public boundary.

use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Unable to find git: {0}")]
    GitNotFound(String),

    #[error("git {args} failed in {cwd}: {message}")]
    CommandFailed {
        args: String,
        cwd: String,
        message: String,
    },

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid revision: {0}")]
    InvalidRevision(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Shared(Arc<GitError>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GitError {
    /// Unwraps any number of `Shared` layers down to the original failure.
    pub fn root(&self) -> &GitError {
        match self {
            GitError::Shared(inner) => inner.root(),
            other => other,
        }
    }

    /// Convert for storage in a shared query without stacking `Shared` layers
    pub fn into_shared(self) -> Arc<GitError> {
        match self {
            GitError::Shared(inner) => inner,
            other => Arc::new(other),
        }
    }
}

impl From<Arc<GitError>> for GitError {
    fn from(err: Arc<GitError>) -> Self {
        GitError::Shared(err)
    }
}

pub type Result<T> = std::result::Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display_includes_context() {
        let err = GitError::CommandFailed {
            args: "blame --root -- a.rs".to_string(),
            cwd: "/repo".to_string(),
            message: "fatal: something broke".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("blame --root"));
        assert!(text.contains("/repo"));
        assert!(text.contains("something broke"));
    }

    #[test]
    fn shared_error_is_transparent() {
        let inner = Arc::new(GitError::PathNotFound("src/x.rs".to_string()));
        let err = GitError::from(inner);
        assert_eq!(err.to_string(), "Path not found: src/x.rs");
        assert!(matches!(err.root(), GitError::PathNotFound(_)));
    }

    #[test]
    fn into_shared_does_not_nest() {
        let inner = Arc::new(GitError::InvalidRevision("nope".to_string()));
        let shared = GitError::Shared(inner.clone()).into_shared();
        assert!(Arc::ptr_eq(&shared, &inner));
    }
}
