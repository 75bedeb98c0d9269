//! Shared fakes for dmi-merge integration tests.
//!
//! The pipeline only sees its collaborators through traits, so tests run
//! without git, an icon codec, or any compressor installed.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use dmi_merge_git::{ConflictEntry, ConflictStore, GitError, Stage};
use dmimerge::tools::{Codec, Compressor, ToolError};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An index with conflict stages held in memory, keyed by the path exactly
/// as the pipeline passes it.
#[derive(Default)]
pub struct MemoryStore {
    workdir: PathBuf,
    stages: HashMap<(PathBuf, Stage), Vec<u8>>,
}

impl MemoryStore {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            stages: HashMap::new(),
        }
    }

    pub fn with_stage(mut self, path: &Path, stage: Stage, bytes: Vec<u8>) -> Self {
        self.stages.insert((path.to_path_buf(), stage), bytes);
        self
    }

    /// All three stages for `path`.
    pub fn with_conflict(self, path: &Path, base: Vec<u8>, ours: Vec<u8>, incoming: Vec<u8>) -> Self {
        self.with_stage(path, Stage::Base, base)
            .with_stage(path, Stage::Ours, ours)
            .with_stage(path, Stage::Incoming, incoming)
    }
}

impl ConflictStore for MemoryStore {
    fn read_stage(&self, path: &Path, stage: Stage) -> Result<Vec<u8>, GitError> {
        if let Some(bytes) = self.stages.get(&(path.to_path_buf(), stage)) {
            return Ok(bytes.clone());
        }
        let name = path.to_string_lossy().into_owned();
        if self.stages.keys().any(|(p, _)| p == path) {
            Err(GitError::StageMissing { path: name, stage })
        } else {
            Err(GitError::NotConflicted { path: name })
        }
    }

    fn conflicts(&self) -> Result<Vec<ConflictEntry>, GitError> {
        let mut grouped: BTreeMap<String, Vec<Stage>> = BTreeMap::new();
        for (path, stage) in self.stages.keys() {
            grouped
                .entry(path.to_string_lossy().into_owned())
                .or_default()
                .push(*stage);
        }
        Ok(grouped
            .into_iter()
            .map(|(path, mut stages)| {
                stages.sort();
                ConflictEntry { path, stages }
            })
            .collect())
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}

// ---------------------------------------------------------------------------
// FakeCodec
// ---------------------------------------------------------------------------

/// Header the fake decoder writes before the container bytes.
pub const DUMP_HEADER: &[u8] = b"# fake dump\n";

/// A codec whose dump is the container bytes behind a fixed header, and
/// whose metadata is the container size. Encoding strips the header.
#[derive(Default)]
pub struct FakeCodec {
    /// Fail any operation whose input file name contains this.
    pub fail_on: Option<String>,
    /// Succeed but leave an empty dump for inputs containing this.
    pub empty_on: Option<String>,
}

impl FakeCodec {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_owned()),
            ..Self::default()
        }
    }

    pub fn empty_on(needle: &str) -> Self {
        Self {
            empty_on: Some(needle.to_owned()),
            ..Self::default()
        }
    }

    fn check(&self, input: &Path) -> Result<bool, ToolError> {
        let name = input.to_string_lossy();
        if self.fail_on.as_deref().is_some_and(|n| name.contains(n)) {
            return Err(ToolError::Failed {
                command: format!("fake-codec {name}"),
                exit_code: 1,
                stderr: "corrupt container".to_owned(),
            });
        }
        Ok(self.empty_on.as_deref().is_some_and(|n| name.contains(n)))
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), ToolError> {
    std::fs::write(path, bytes).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, ToolError> {
    std::fs::read(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Codec for FakeCodec {
    fn name(&self) -> &str {
        "fake-codec"
    }

    fn decode(&self, artifact: &Path, dump: &Path) -> Result<(), ToolError> {
        if self.check(artifact)? {
            return write(dump, b"");
        }
        let mut out = DUMP_HEADER.to_vec();
        out.extend(read(artifact)?);
        write(dump, &out)
    }

    fn extract_metadata(&self, artifact: &Path, dump: &Path) -> Result<(), ToolError> {
        if self.check(artifact)? {
            return write(dump, b"");
        }
        let len = read(artifact)?.len();
        write(dump, format!("size = {len}\n").as_bytes())
    }

    fn encode(&self, dump: &Path, artifact: &Path) -> Result<(), ToolError> {
        if self.check(dump)? {
            return write(artifact, b"");
        }
        let bytes = read(dump)?;
        let body = bytes.strip_prefix(DUMP_HEADER).unwrap_or(&bytes);
        write(artifact, body)
    }
}

// ---------------------------------------------------------------------------
// FixedSizeCompressor
// ---------------------------------------------------------------------------

/// A compressor that ignores its input and writes `size` copies of `fill`,
/// or fails when `size` is `None`.
pub struct FixedSizeCompressor {
    pub name: &'static str,
    pub size: Option<usize>,
    pub fill: u8,
}

impl FixedSizeCompressor {
    pub fn new(name: &'static str, size: usize, fill: u8) -> Self {
        Self {
            name,
            size: Some(size),
            fill,
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            size: None,
            fill: 0,
        }
    }
}

impl Compressor for FixedSizeCompressor {
    fn name(&self) -> &str {
        self.name
    }

    fn compress(&self, _input: &Path, output: &Path) -> Result<(), ToolError> {
        match self.size {
            Some(n) => write(output, &vec![self.fill; n]),
            None => Err(ToolError::Failed {
                command: format!("{} --out {}", self.name, output.display()),
                exit_code: 2,
                stderr: "simulated failure".to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Names of every entry in `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// A fake container of `len` bytes whose content depends on `seed`.
pub fn container(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}
