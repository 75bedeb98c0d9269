//! End-to-end operations over one conflicted path.
//!
//! [`stage_and_expand`] is the main workflow: extract, expand, seed, in that
//! order, stopping at the first failure. The rest support the steps around
//! it: [`finish`] after the user edits, [`status`] and [`clean`] for
//! inspection and retry.

use std::path::{Path, PathBuf};

use dmi_merge_git::ConflictStore;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{PipelineError, Step};
use crate::expand::{ensure_non_empty, expand_formats};
use crate::layout::{ConflictPath, DumpKind, PipelineState, Variant};
use crate::optimize::{OptimizeReport, optimize};
use crate::seed::seed_merged;
use crate::stage::extract_stages;
use crate::tools::{Codec, CodecOp, Compressor};

/// Files produced by a successful [`stage_and_expand`].
#[derive(Clone, Debug, Serialize)]
pub struct StageReport {
    /// The conflicted path.
    pub path: PathBuf,
    /// `<path>.base`, `<path>.ours`, `<path>.incoming`.
    pub artifacts: Vec<PathBuf>,
    /// The six `.yml`/`.metadata` dumps.
    pub dumps: Vec<PathBuf>,
    /// The two `merged` dumps.
    pub merged: Vec<PathBuf>,
}

impl StageReport {
    /// The file the user should edit.
    #[must_use]
    pub fn edit_target(&self) -> Option<&Path> {
        self.merged.first().map(PathBuf::as_path)
    }
}

/// Run stage extraction, format expansion, and merge-basis seeding.
///
/// Files from completed steps are left in place on failure; re-running
/// overwrites them.
///
/// # Errors
/// The first step error, tagged with its [`Step`].
#[instrument(skip(store, codec), fields(path = %path))]
pub fn stage_and_expand(
    store: &dyn ConflictStore,
    codec: &dyn Codec,
    path: &ConflictPath,
) -> Result<StageReport, PipelineError> {
    let artifacts = extract_stages(store, path)?;
    let dumps = expand_formats(codec, path)?;
    let merged = seed_merged(path)?;
    info!("staged {} derived files", artifacts.len() + dumps.len() + merged.len());
    Ok(StageReport {
        path: path.as_path().to_path_buf(),
        artifacts,
        dumps,
        merged,
    })
}

/// Encode `<path>.merged.yml` back into `<path>`, optionally followed by
/// compression selection on the result.
///
/// # Errors
/// [`PipelineError::MissingPrerequisite`] if the merged dump is absent,
/// [`PipelineError::Codec`] if encoding fails, or any
/// [`optimize`] error.
#[instrument(skip(codec, compressors), fields(path = %path))]
pub fn finish(
    codec: &dyn Codec,
    path: &ConflictPath,
    compressors: Option<(&dyn Compressor, &dyn Compressor)>,
) -> Result<Option<OptimizeReport>, PipelineError> {
    let merged = path.dump(Variant::Merged, DumpKind::Textual);
    if !merged.is_file() {
        return Err(PipelineError::MissingPrerequisite {
            step: Step::Finish,
            file: merged,
        });
    }

    let target = path.as_path();
    CodecOp::Encode
        .run(codec, &merged, target)
        .and_then(|()| ensure_non_empty(codec.name(), target))
        .map_err(|source| PipelineError::Codec {
            step: Step::Finish,
            operation: CodecOp::Encode,
            input: merged.clone(),
            source,
        })?;
    info!(target = %target.display(), "encoded merged dump");

    match compressors {
        Some((primary, secondary)) => optimize(target, primary, secondary).map(Some),
        None => Ok(None),
    }
}

/// Delete every derived file for `path`. Missing files are skipped.
/// Returns the files actually removed.
///
/// # Errors
/// [`PipelineError::Io`] if an existing file cannot be removed.
#[instrument(fields(path = %path))]
pub fn clean(path: &ConflictPath) -> Result<Vec<PathBuf>, PipelineError> {
    let mut removed = Vec::new();
    for file in path.derived_files() {
        match std::fs::remove_file(&file) {
            Ok(()) => removed.push(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                warn!(file = %file.display(), error = %source, "could not remove");
                return Err(PipelineError::Io {
                    step: Step::Clean,
                    path: file,
                    source,
                });
            }
        }
    }
    info!(count = removed.len(), "removed derived files");
    Ok(removed)
}

/// One derived file in a [`StatusReport`].
#[derive(Clone, Debug, Serialize)]
pub struct FileStatus {
    /// The derived file.
    pub path: PathBuf,
    /// Whether it exists.
    pub exists: bool,
    /// Size in bytes, if it exists.
    pub size: Option<u64>,
}

/// Snapshot of the derived files for a conflicted path.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    /// The conflicted path.
    pub path: PathBuf,
    /// Inferred pipeline progress.
    pub state: PipelineState,
    /// Every derived file, in creation order.
    pub files: Vec<FileStatus>,
}

/// Inspect the derived files for `path` without touching them.
#[must_use]
pub fn status(path: &ConflictPath) -> StatusReport {
    let files = path
        .derived_files()
        .into_iter()
        .map(|file| {
            let size = std::fs::metadata(&file)
                .ok()
                .filter(std::fs::Metadata::is_file)
                .map(|m| m.len());
            FileStatus {
                path: file,
                exists: size.is_some(),
                size,
            }
        })
        .collect();
    StatusReport {
        path: path.as_path().to_path_buf(),
        state: PipelineState::detect(path),
        files,
    }
}
