//! On-disk naming for a conflict under merge.
//!
//! Every file the pipeline produces is named by appending a suffix to the
//! conflicted path, so the file set *is* the pipeline state:
//!
//! | File                         | Produced by           |
//! |------------------------------|-----------------------|
//! | `<path>.base/ours/incoming`  | stage extraction      |
//! | `<path>.<variant>.yml`       | format expansion      |
//! | `<path>.<variant>.metadata`  | format expansion      |
//! | `<path>.merged.yml/metadata` | merge-basis seeding   |
//! | `<input>.small`              | compression selection |

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use dmi_merge_git::Stage;
use serde::Serialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// The role a derived file plays in the three-way merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Common ancestor (index stage 1).
    Base,
    /// Local side (index stage 2).
    Ours,
    /// Side being merged in (index stage 3).
    Incoming,
    /// Hand-edited working copy, seeded from [`Variant::Ours`].
    Merged,
}

impl Variant {
    /// The three variants pulled out of the index, in extraction order.
    pub const EXTRACTED: [Self; 3] = [Self::Base, Self::Ours, Self::Incoming];

    /// Suffix used in file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Ours => "ours",
            Self::Incoming => "incoming",
            Self::Merged => "merged",
        }
    }

    /// The index stage this variant is extracted from; `None` for `Merged`.
    #[must_use]
    pub const fn stage(self) -> Option<Stage> {
        match self {
            Self::Base => Some(Stage::Base),
            Self::Ours => Some(Stage::Ours),
            Self::Incoming => Some(Stage::Incoming),
            Self::Merged => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DumpKind
// ---------------------------------------------------------------------------

/// The two textual renderings the codec produces for an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpKind {
    /// Full structured dump (`.yml`).
    Textual,
    /// Embedded metadata only (`.metadata`).
    Metadata,
}

impl DumpKind {
    /// Both kinds, in the order the expander produces them.
    pub const ALL: [Self; 2] = [Self::Textual, Self::Metadata];

    /// File extension appended after the variant.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Textual => "yml",
            Self::Metadata => "metadata",
        }
    }
}

// ---------------------------------------------------------------------------
// ConflictPath
// ---------------------------------------------------------------------------

/// The conflicted icon, as named on the command line. All derived file
/// names are built from it; it is passed to every pipeline step.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConflictPath(PathBuf);

impl ConflictPath {
    /// Validate and wrap a conflicted path.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidPath`] if the path is empty or has no
    /// file name component (e.g. `..` or `/`).
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(PipelineError::InvalidPath {
                path,
                reason: "path is empty".to_owned(),
            });
        }
        if path.file_name().is_none() {
            return Err(PipelineError::InvalidPath {
                path,
                reason: "path does not name a file".to_owned(),
            });
        }
        Ok(Self(path))
    }

    /// The path as given.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// `<path>.<variant>`: the raw container bytes for an extracted variant.
    #[must_use]
    pub fn artifact(&self, variant: Variant) -> PathBuf {
        with_suffix(&self.0, variant.as_str())
    }

    /// `<path>.<variant>.<yml|metadata>`.
    #[must_use]
    pub fn dump(&self, variant: Variant, kind: DumpKind) -> PathBuf {
        with_suffix(
            &self.0,
            &format!("{}.{}", variant.as_str(), kind.extension()),
        )
    }

    /// Every file the staging pipeline can create for this path, in
    /// creation order: three artifacts, six dumps, two merged dumps.
    #[must_use]
    pub fn derived_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Variant::EXTRACTED
            .iter()
            .map(|v| self.artifact(*v))
            .collect();
        for variant in Variant::EXTRACTED.into_iter().chain([Variant::Merged]) {
            for kind in DumpKind::ALL {
                files.push(self.dump(variant, kind));
            }
        }
        files
    }
}

impl fmt::Display for ConflictPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// `<input>.small`: where the compression selector leaves its winner.
#[must_use]
pub fn optimized_path(input: &Path) -> PathBuf {
    with_suffix(input, "small")
}

/// Append `.<suffix>` to the full path (not replacing any extension).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// How far the staging pipeline got for a path, inferred from which derived
/// files exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// No derived files exist.
    Clean,
    /// The three binary artifacts exist.
    Extracted,
    /// Artifacts plus all six dumps exist.
    Expanded,
    /// Expanded, and both merged dumps exist.
    Seeded,
    /// Some derived files exist but no complete step is recognisable,
    /// typically after a failed run.
    Partial,
}

impl PipelineState {
    /// Inspect the filesystem for `path`'s derived files.
    #[must_use]
    pub fn detect(path: &ConflictPath) -> Self {
        Self::from_presence(|p| p.is_file(), path)
    }

    fn from_presence(exists: impl Fn(&Path) -> bool, path: &ConflictPath) -> Self {
        let all = |files: &[PathBuf]| files.iter().all(|f| exists(f.as_path()));

        let artifacts: Vec<PathBuf> = Variant::EXTRACTED.iter().map(|v| path.artifact(*v)).collect();
        let dumps: Vec<PathBuf> = Variant::EXTRACTED
            .iter()
            .flat_map(|v| DumpKind::ALL.map(|k| path.dump(*v, k)))
            .collect();
        let merged: Vec<PathBuf> = DumpKind::ALL.map(|k| path.dump(Variant::Merged, k)).to_vec();

        if all(&artifacts) && all(&dumps) && all(&merged) {
            Self::Seeded
        } else if all(&artifacts) && all(&dumps) && !merged.iter().any(|f| exists(f.as_path())) {
            Self::Expanded
        } else if all(&artifacts)
            && !dumps.iter().chain(&merged).any(|f| exists(f.as_path()))
        {
            Self::Extracted
        } else if !path.derived_files().iter().any(|f| exists(f.as_path())) {
            Self::Clean
        } else {
            Self::Partial
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clean => "clean",
            Self::Extracted => "extracted",
            Self::Expanded => "expanded",
            Self::Seeded => "seeded",
            Self::Partial => "partial",
        };
        f.write_str(s)
    }
}
