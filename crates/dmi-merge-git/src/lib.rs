//! Conflict-stage access for dmi-merge.
//!
//! This crate defines the [`ConflictStore`] trait: the single interface
//! through which dmi-merge reads the three versions git keeps for a path in
//! an unresolved three-way merge. Nothing else in the workspace touches gix
//! or shells out to git for index data.
//!
//! # Crate layout
//!
//! - [`store`]: the [`ConflictStore`] trait definition.
//! - [`types`]: [`Stage`] and [`ConflictEntry`].
//! - [`error`]: the [`GitError`] enum returned by all trait methods.
//! - [`GixStore`]: reads the index in-process via gix (default).
//! - [`GitCliStore`]: reads the index through `git ls-files -u` / `git cat-file`.

pub mod error;
pub mod store;
pub mod types;

mod cli_store;
mod gix_store;
mod paths;

pub use cli_store::GitCliStore;
pub use gix_store::GixStore;

pub use error::GitError;
pub use store::ConflictStore;
pub use types::{ConflictEntry, Stage};
