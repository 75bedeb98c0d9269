//! Merge-basis seeding: `ours` dumps → `merged` dumps.

use std::path::PathBuf;

use tracing::{info, instrument};

use crate::error::{PipelineError, Step};
use crate::layout::{ConflictPath, DumpKind, Variant};

/// Copy `<path>.ours.yml` and `<path>.ours.metadata` to their `merged`
/// counterparts, so an unedited merge reproduces the local version.
///
/// Both sources are checked before either copy starts.
///
/// # Errors
/// [`PipelineError::MissingPrerequisite`] if an `ours` dump is absent,
/// [`PipelineError::Io`] if a copy fails.
#[instrument(fields(path = %path))]
pub fn seed_merged(path: &ConflictPath) -> Result<Vec<PathBuf>, PipelineError> {
    let pairs = DumpKind::ALL.map(|kind| {
        (
            path.dump(Variant::Ours, kind),
            path.dump(Variant::Merged, kind),
        )
    });

    if let Some((missing, _)) = pairs.iter().find(|(src, _)| !src.is_file()) {
        return Err(PipelineError::MissingPrerequisite {
            step: Step::Seed,
            file: missing.clone(),
        });
    }

    let mut seeded = Vec::with_capacity(pairs.len());
    for (src, dst) in pairs {
        std::fs::copy(&src, &dst).map_err(|source| PipelineError::Io {
            step: Step::Seed,
            path: dst.clone(),
            source,
        })?;
        info!(from = %src.display(), to = %dst.display(), "seeded merged dump");
        seeded.push(dst);
    }
    Ok(seeded)
}
