//! Format expansion: each extracted artifact → `.yml` and `.metadata` dumps.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::error::{PipelineError, Step};
use crate::layout::{ConflictPath, DumpKind, Variant};
use crate::tools::{Codec, CodecOp, ToolError};

/// The codec operation that produces a dump of `kind`.
#[must_use]
pub const fn codec_op(kind: DumpKind) -> CodecOp {
    match kind {
        DumpKind::Textual => CodecOp::Decode,
        DumpKind::Metadata => CodecOp::ExtractMetadata,
    }
}

/// Run the codec's decode and metadata operations over the three extracted
/// artifacts, stopping at the first failure. Returns the six dumps in the
/// order they were produced.
///
/// # Errors
/// [`PipelineError::MissingPrerequisite`] if an artifact is absent,
/// [`PipelineError::Codec`] if the codec fails or leaves an empty dump.
#[instrument(skip(codec), fields(path = %path, codec = codec.name()))]
pub fn expand_formats(codec: &dyn Codec, path: &ConflictPath) -> Result<Vec<PathBuf>, PipelineError> {
    for variant in Variant::EXTRACTED {
        let artifact = path.artifact(variant);
        if !artifact.is_file() {
            return Err(PipelineError::MissingPrerequisite {
                step: Step::Expand,
                file: artifact,
            });
        }
    }

    let mut dumps = Vec::with_capacity(6);
    for variant in Variant::EXTRACTED {
        let artifact = path.artifact(variant);
        for kind in DumpKind::ALL {
            let dump = path.dump(variant, kind);
            let operation = codec_op(kind);
            operation
                .run(codec, &artifact, &dump)
                .and_then(|()| ensure_non_empty(codec.name(), &dump))
                .map_err(|source| PipelineError::Codec {
                    step: Step::Expand,
                    operation,
                    input: artifact.clone(),
                    source,
                })?;
            info!(dump = %dump.display(), "{operation} finished");
            dumps.push(dump);
        }
    }
    Ok(dumps)
}

/// Treat a missing or zero-length output as a tool failure.
pub(crate) fn ensure_non_empty(tool: &str, output: &Path) -> Result<(), ToolError> {
    match std::fs::metadata(output) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ToolError::NoOutput {
            tool: tool.to_owned(),
            output: output.to_path_buf(),
        }),
    }
}
