//! The [`ConflictStore`] trait: the abstraction boundary between dmi-merge
//! and git's index.
//!
//! | Method         | Replaces                                   |
//! |----------------|--------------------------------------------|
//! | `read_stage`   | `git show :<n>:<path>`                     |
//! | `conflicts`    | `git ls-files --unmerged`                  |
//! | `workdir`      | `git rev-parse --show-toplevel`            |

use std::path::Path;

use crate::error::GitError;
use crate::types::{ConflictEntry, Stage};

/// Read access to the conflict stages of an unresolved merge.
///
/// Implementations may be backed by gix, the git CLI, or a test double.
/// The trait is object-safe; callers hold `&dyn ConflictStore` or
/// `Box<dyn ConflictStore>`.
pub trait ConflictStore {
    /// Return the exact blob bytes stored for `path` at `stage`.
    ///
    /// `path` is a filesystem path as the user typed it: relative to the
    /// current directory, or absolute.
    ///
    /// # Errors
    /// [`GitError::NotConflicted`] if the path has no stage 1-3 entries,
    /// [`GitError::StageMissing`] if it is conflicted but lacks `stage`.
    fn read_stage(&self, path: &Path, stage: Stage) -> Result<Vec<u8>, GitError>;

    /// List every unmerged path in the index with the stages it holds,
    /// sorted by path.
    ///
    /// # Errors
    /// Returns an error if the index cannot be read.
    fn conflicts(&self) -> Result<Vec<ConflictEntry>, GitError>;

    /// The working tree root.
    fn workdir(&self) -> &Path;
}
