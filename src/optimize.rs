//! Compression selection: race two lossless compressors, keep the smaller.
//!
//! Both compressors write to hidden candidate files beside the input. The
//! winner is renamed to `<input>.small`; the loser is deleted. Candidates
//! are [`TempPath`]s, so every early return removes whatever was created.
//! The input file is never written.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempPath;
use tracing::{debug, info, instrument};

use crate::error::{PipelineError, Step};
use crate::expand::ensure_non_empty;
use crate::layout::optimized_path;
use crate::tools::Compressor;

/// Which compressor produced the kept output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// The first compressor (default `oxipng`).
    Primary,
    /// The second compressor (default `zopflipng`).
    Secondary,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

/// Pick the winner from two candidate sizes in bytes.
///
/// The primary wins only when strictly smaller; on a tie the secondary's
/// output is kept.
#[must_use]
pub const fn select(primary: u64, secondary: u64) -> Winner {
    if primary < secondary {
        Winner::Primary
    } else {
        Winner::Secondary
    }
}

/// What [`optimize`] did.
#[derive(Clone, Debug, Serialize)]
pub struct OptimizeReport {
    /// The untouched input.
    pub input: PathBuf,
    /// Where the winner was left.
    pub output: PathBuf,
    /// Input size in bytes.
    pub original_size: u64,
    /// Primary candidate size in bytes.
    pub primary_size: u64,
    /// Secondary candidate size in bytes.
    pub secondary_size: u64,
    /// Which candidate was kept.
    pub winner: Winner,
}

impl OptimizeReport {
    /// Size of the kept output.
    #[must_use]
    pub const fn kept_size(&self) -> u64 {
        match self.winner {
            Winner::Primary => self.primary_size,
            Winner::Secondary => self.secondary_size,
        }
    }
}

/// Compress `input` with both compressors and leave the smaller result at
/// `<input>.small`, overwriting any previous one.
///
/// # Errors
/// [`PipelineError::MissingPrerequisite`] if `input` is not a file,
/// [`PipelineError::Compress`] if either compressor fails or produces an
/// empty file, [`PipelineError::Io`] on candidate bookkeeping failures.
/// On error no candidate files remain and `<input>.small` is not written.
#[instrument(skip(primary, secondary), fields(input = %input.display()))]
pub fn optimize(
    input: &Path,
    primary: &dyn Compressor,
    secondary: &dyn Compressor,
) -> Result<OptimizeReport, PipelineError> {
    let original_size = match std::fs::metadata(input) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => {
            return Err(PipelineError::MissingPrerequisite {
                step: Step::Optimize,
                file: input.to_path_buf(),
            });
        }
    };

    let a = candidate(input, "a")?;
    run_compressor(primary, input, &a)?;
    let b = candidate(input, "b")?;
    run_compressor(secondary, input, &b)?;

    let primary_size = file_size(&a)?;
    let secondary_size = file_size(&b)?;
    let winner = select(primary_size, secondary_size);
    debug!(primary_size, secondary_size, %winner, "candidates compared");

    let (keep, discard) = match winner {
        Winner::Primary => (a, b),
        Winner::Secondary => (b, a),
    };
    let output = optimized_path(input);
    keep.persist(&output).map_err(|e| PipelineError::Io {
        step: Step::Optimize,
        path: output.clone(),
        source: e.error,
    })?;
    discard.close().map_err(|source| PipelineError::Io {
        step: Step::Optimize,
        path: output.clone(),
        source,
    })?;

    let report = OptimizeReport {
        input: input.to_path_buf(),
        output,
        original_size,
        primary_size,
        secondary_size,
        winner,
    };
    info!(
        output = %report.output.display(),
        kept = report.kept_size(),
        original_size,
        "kept {} output",
        report.winner
    );
    Ok(report)
}

/// Create an empty hidden candidate file next to `input`.
fn candidate(input: &Path, tag: &str) -> Result<TempPath, PipelineError> {
    let dir = match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(&format!(".{tag}.candidate"))
        .tempfile_in(dir)
        .map(tempfile::NamedTempFile::into_temp_path)
        .map_err(|source| PipelineError::Io {
            step: Step::Optimize,
            path: dir.to_path_buf(),
            source,
        })
}

fn run_compressor(
    compressor: &dyn Compressor,
    input: &Path,
    output: &Path,
) -> Result<(), PipelineError> {
    compressor
        .compress(input, output)
        .and_then(|()| ensure_non_empty(compressor.name(), output))
        .map_err(|source| PipelineError::Compress {
            compressor: compressor.name().to_owned(),
            input: input.to_path_buf(),
            source,
        })
}

fn file_size(path: &Path) -> Result<u64, PipelineError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| PipelineError::Io {
            step: Step::Optimize,
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_smaller_primary_wins() {
        assert_eq!(select(4000, 4200), Winner::Primary);
        assert_eq!(select(4200, 4000), Winner::Secondary);
    }

    #[test]
    fn tie_goes_to_secondary() {
        assert_eq!(select(3000, 3000), Winner::Secondary);
    }

    #[test]
    fn candidate_lives_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("icon.dmi");
        let c = candidate(&input, "a").unwrap();
        assert_eq!(c.parent(), Some(dir.path()));
        let name = c.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".icon.dmi."));
        assert!(name.ends_with(".a.candidate"));
        let kept = c.to_path_buf();
        drop(c);
        assert!(!kept.exists());
    }
}
