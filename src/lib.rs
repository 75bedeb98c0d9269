//! dmi-merge library crate.
//!
//! Stages a conflicted `.dmi` icon for a hand-driven three-way merge and
//! picks the smaller of two lossless recompressions of a finished icon.
//! The `dmi-merge` binary in `crates/dmi-merge-cli` is the primary
//! interface; the modules are public so integration tests can drive each
//! step with in-process fakes.

pub mod config;
pub mod error;
pub mod expand;
pub mod layout;
pub mod optimize;
pub mod pipeline;
pub mod seed;
pub mod stage;
pub mod tools;

pub use error::{PipelineError, Step};
pub use layout::{ConflictPath, DumpKind, PipelineState, Variant};
pub use optimize::{OptimizeReport, Winner, optimize, select};
pub use pipeline::{StageReport, StatusReport, clean, finish, stage_and_expand, status};
