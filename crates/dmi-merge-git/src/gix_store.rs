//! The gix-backed implementation of [`ConflictStore`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gix::bstr::ByteSlice;
use tracing::{debug, instrument};

use crate::error::GitError;
use crate::paths::repo_relative;
use crate::store::ConflictStore;
use crate::types::{ConflictEntry, Stage};

/// A [`ConflictStore`] that reads the index in-process with
/// [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixStore::discover`] or [`GixStore::open`].
pub struct GixStore {
    repo: gix::Repository,
    workdir: PathBuf,
}

impl GixStore {
    /// Open the git repository containing `start`, searching upwards.
    ///
    /// # Errors
    /// [`GitError::NotARepository`] if no repository is found,
    /// [`GitError::BareRepository`] if it has no working tree.
    pub fn discover(start: &Path) -> Result<Self, GitError> {
        let repo = gix::discover(start).map_err(|e| GitError::NotARepository {
            path: start.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_repo(repo)
    }

    /// Open a git repository at exactly `path` (no parent discovery).
    ///
    /// # Errors
    /// Same as [`GixStore::discover`].
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open(path).map_err(|e| GitError::NotARepository {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_repo(repo)
    }

    fn from_repo(repo: gix::Repository) -> Result<Self, GitError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository {
                path: repo.git_dir().to_path_buf(),
            })?
            .canonicalize()?;
        Ok(Self { repo, workdir })
    }

    /// Stage numbers and blob ids recorded for `rel`, in index order.
    fn staged_blobs(&self, rel: &str) -> Result<Vec<(Stage, gix::ObjectId)>, GitError> {
        let index = self.repo.open_index().map_err(|e| GitError::BackendError {
            message: format!("failed to open index: {e}"),
        })?;

        let found = index
            .entries()
            .iter()
            .filter(|entry| {
                let path: &[u8] = entry.path(&index);
                path == rel.as_bytes()
            })
            .filter_map(|entry| Stage::from_number(entry.stage_raw()).map(|s| (s, entry.id)))
            .collect();
        Ok(found)
    }
}

impl ConflictStore for GixStore {
    #[instrument(skip(self), fields(path = %path.display(), stage = stage.number()))]
    fn read_stage(&self, path: &Path, stage: Stage) -> Result<Vec<u8>, GitError> {
        let rel = repo_relative(&self.workdir, path)?;
        let staged = self.staged_blobs(&rel)?;
        if staged.is_empty() {
            return Err(GitError::NotConflicted { path: rel });
        }

        let Some((_, id)) = staged.iter().find(|(s, _)| *s == stage) else {
            return Err(GitError::StageMissing { path: rel, stage });
        };

        let mut blob = self.repo.find_blob(*id).map_err(|e| GitError::BackendError {
            message: format!("blob {id} for {rel} at {stage}: {e}"),
        })?;
        let data = blob.take_data();
        debug!(%id, bytes = data.len(), "read conflict stage");
        Ok(data)
    }

    fn conflicts(&self) -> Result<Vec<ConflictEntry>, GitError> {
        let index = self.repo.open_index().map_err(|e| GitError::BackendError {
            message: format!("failed to open index: {e}"),
        })?;

        let mut by_path: BTreeMap<String, Vec<Stage>> = BTreeMap::new();
        for entry in index.entries() {
            let Some(stage) = Stage::from_number(entry.stage_raw()) else {
                continue;
            };
            let path = entry.path(&index).to_str_lossy().into_owned();
            by_path.entry(path).or_default().push(stage);
        }

        Ok(by_path
            .into_iter()
            .map(|(path, mut stages)| {
                stages.sort();
                stages.dedup();
                ConflictEntry { path, stages }
            })
            .collect())
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}
