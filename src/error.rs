//! Pipeline error types.
//!
//! Every [`PipelineError`] names the [`Step`] that failed, so the CLI can
//! say which part of the workflow to fix before re-running. Underlying
//! causes are attached as `source` and printed as a chain.

use std::fmt;
use std::path::PathBuf;

use dmi_merge_git::{GitError, Stage};
use thiserror::Error;

use crate::tools::{CodecOp, ToolError};

/// The pipeline steps, in workflow order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Pulling the three stages out of the index.
    Extract,
    /// Running the codec over the extracted artifacts.
    Expand,
    /// Copying the `ours` dumps to `merged`.
    Seed,
    /// Encoding the merged dump back into a container.
    Finish,
    /// Racing the two compressors.
    Optimize,
    /// Removing derived files.
    Clean,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Extract => "stage extraction",
            Self::Expand => "format expansion",
            Self::Seed => "merge-basis seeding",
            Self::Finish => "finish",
            Self::Optimize => "compression selection",
            Self::Clean => "clean",
        };
        f.write_str(s)
    }
}

/// Errors from the staging and optimisation pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The conflict path cannot name a file.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Reading a conflict stage from version control failed.
    #[error("{}: could not read {stage} of {}", Step::Extract, path.display())]
    Extract {
        /// The conflicted path.
        path: PathBuf,
        /// The stage being read.
        stage: Stage,
        /// Underlying store error (e.g. [`GitError::StageMissing`]).
        #[source]
        source: GitError,
    },

    /// A codec invocation failed or produced nothing.
    #[error("{step}: {operation} of {} failed", input.display())]
    Codec {
        /// The step that invoked the codec.
        step: Step,
        /// Which codec operation.
        operation: CodecOp,
        /// The file given to the codec.
        input: PathBuf,
        /// Underlying tool error.
        #[source]
        source: ToolError,
    },

    /// A file an earlier step should have produced does not exist.
    #[error("{step}: {} does not exist (did the previous step run?)", file.display())]
    MissingPrerequisite {
        /// The step that needed the file.
        step: Step,
        /// The missing file.
        file: PathBuf,
    },

    /// A compressor failed or produced nothing.
    #[error("{}: compressor `{compressor}` failed on {}", Step::Optimize, input.display())]
    Compress {
        /// Compressor name.
        compressor: String,
        /// The artifact being compressed.
        input: PathBuf,
        /// Underlying tool error.
        #[source]
        source: ToolError,
    },

    /// A filesystem operation failed.
    #[error("{step}: I/O error on {}", path.display())]
    Io {
        /// The step doing the I/O.
        step: Step,
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// The step that failed, if the error belongs to one.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::InvalidPath { .. } => None,
            Self::Extract { .. } => Some(Step::Extract),
            Self::Compress { .. } => Some(Step::Optimize),
            Self::Codec { step, .. }
            | Self::MissingPrerequisite { step, .. }
            | Self::Io { step, .. } => Some(*step),
        }
    }
}
