//! Stage extraction: index stages → `<path>.base/ours/incoming`.

use std::path::PathBuf;

use dmi_merge_git::ConflictStore;
use tracing::{info, instrument};

use crate::error::{PipelineError, Step};
use crate::layout::{ConflictPath, Variant};

/// Read the three conflict stages of `path` and write each verbatim to its
/// artifact file. Returns the files written, in `base, ours, incoming`
/// order.
///
/// All stages are read before anything is written, so a missing stage
/// leaves no artifacts behind.
///
/// # Errors
/// [`PipelineError::Extract`] if any stage cannot be read,
/// [`PipelineError::Io`] if an artifact cannot be written.
#[instrument(skip(store), fields(path = %path))]
pub fn extract_stages(
    store: &dyn ConflictStore,
    path: &ConflictPath,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut blobs = Vec::with_capacity(Variant::EXTRACTED.len());
    for variant in Variant::EXTRACTED {
        let Some(stage) = variant.stage() else {
            continue;
        };
        let bytes = store
            .read_stage(path.as_path(), stage)
            .map_err(|source| PipelineError::Extract {
                path: path.as_path().to_path_buf(),
                stage,
                source,
            })?;
        blobs.push((variant, bytes));
    }

    let mut written = Vec::with_capacity(blobs.len());
    for (variant, bytes) in blobs {
        let file = path.artifact(variant);
        std::fs::write(&file, &bytes).map_err(|source| PipelineError::Io {
            step: Step::Extract,
            path: file.clone(),
            source,
        })?;
        info!(file = %file.display(), bytes = bytes.len(), "wrote {variant} artifact");
        written.push(file);
    }
    Ok(written)
}
