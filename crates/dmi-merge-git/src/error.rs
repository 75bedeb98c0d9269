//! Error types for conflict-stage access.
//!
//! [`GitError`] is the single error type returned by all
//! [`ConflictStore`](crate::ConflictStore) methods. Missing stages get their
//! own variant so callers can tell "the other side deleted this file" apart
//! from a broken repository.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Stage;

/// Errors returned by [`ConflictStore`](crate::ConflictStore) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The directory is not inside a git repository, or the repository could
    /// not be opened.
    #[error("not a git repository ({}): {message}", path.display())]
    NotARepository {
        /// The directory discovery started from.
        path: PathBuf,
        /// Backend detail.
        message: String,
    },

    /// The repository has no working tree, so paths cannot be resolved.
    #[error("repository at {} has no working tree", path.display())]
    BareRepository {
        /// The git directory.
        path: PathBuf,
    },

    /// The requested path resolves outside the repository's working tree.
    #[error("{} is outside the working tree {}", path.display(), workdir.display())]
    OutsideWorkdir {
        /// The path as given by the caller.
        path: PathBuf,
        /// The working tree root.
        workdir: PathBuf,
    },

    /// The path has no conflict entries in the index at all.
    #[error("{path} is not in a conflicted state (no stage 1-3 entries in the index)")]
    NotConflicted {
        /// Repository-relative path.
        path: String,
    },

    /// The path is conflicted but the requested stage is absent, typically
    /// because one side added or deleted the file.
    #[error("{path} has no {stage} in the index (added or deleted on one side?)")]
    StageMissing {
        /// Repository-relative path.
        path: String,
        /// The stage that was requested.
        stage: Stage,
    },

    /// A `git` invocation exited with a non-zero status.
    #[error("`{command}` failed (exit {exit_code}): {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// The process exit code (`-1` if killed by a signal).
        exit_code: i32,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// An I/O error occurred (file system, process spawn, etc.).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The underlying backend returned an unclassified error.
    #[error("git backend error: {message}")]
    BackendError {
        /// Freeform error description from the backend.
        message: String,
    },
}
