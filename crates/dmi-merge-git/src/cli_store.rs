//! A [`ConflictStore`] that shells out to the `git` binary.
//!
//! Useful where the index uses extensions gix cannot read yet, or to
//! cross-check the gix backend.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument, warn};

use crate::error::GitError;
use crate::paths::repo_relative;
use crate::store::ConflictStore;
use crate::types::{ConflictEntry, Stage};

/// One record of `git ls-files --unmerged -z`.
#[derive(Debug, PartialEq, Eq)]
struct UnmergedRecord {
    path: String,
    stage: Stage,
    oid: String,
}

/// [`ConflictStore`] backed by `git ls-files -u` and `git cat-file blob`.
pub struct GitCliStore {
    workdir: PathBuf,
}

impl GitCliStore {
    /// Locate the working tree containing `start` via
    /// `git rev-parse --show-toplevel`.
    ///
    /// # Errors
    /// [`GitError::NotARepository`] if `start` is not inside a working tree.
    pub fn discover(start: &Path) -> Result<Self, GitError> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(start)
            .output()?;
        if !output.status.success() {
            return Err(GitError::NotARepository {
                path: start.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        let top = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        let workdir = PathBuf::from(top).canonicalize()?;
        Ok(Self { workdir })
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        debug!(cmd = %format!("git {}", args.join(" ")), "running git");
        let output = Command::new("git")
            .arg("--literal-pathspecs")
            .args(args)
            .current_dir(&self.workdir)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, "git command failed");
            return Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                exit_code,
                stderr,
            });
        }
        Ok(output.stdout)
    }

    fn unmerged(&self, pathspec: Option<&str>) -> Result<Vec<UnmergedRecord>, GitError> {
        let mut args = vec!["ls-files", "--unmerged", "-z"];
        if let Some(spec) = pathspec {
            args.extend(["--", spec]);
        }
        let stdout = self.git(&args)?;
        parse_unmerged(&stdout)
    }
}

impl ConflictStore for GitCliStore {
    #[instrument(skip(self), fields(path = %path.display(), stage = stage.number()))]
    fn read_stage(&self, path: &Path, stage: Stage) -> Result<Vec<u8>, GitError> {
        let rel = repo_relative(&self.workdir, path)?;
        let records: Vec<UnmergedRecord> = self
            .unmerged(Some(&rel))?
            .into_iter()
            .filter(|r| r.path == rel)
            .collect();
        if records.is_empty() {
            return Err(GitError::NotConflicted { path: rel });
        }

        let Some(record) = records.iter().find(|r| r.stage == stage) else {
            return Err(GitError::StageMissing { path: rel, stage });
        };
        self.git(&["cat-file", "blob", &record.oid])
    }

    fn conflicts(&self) -> Result<Vec<ConflictEntry>, GitError> {
        let mut entries: Vec<ConflictEntry> = Vec::new();
        for record in self.unmerged(None)? {
            match entries.last_mut() {
                Some(last) if last.path == record.path => last.stages.push(record.stage),
                _ => entries.push(ConflictEntry {
                    path: record.path,
                    stages: vec![record.stage],
                }),
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        for entry in &mut entries {
            entry.stages.sort();
            entry.stages.dedup();
        }
        Ok(entries)
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}

/// Parse NUL-terminated `<mode> <oid> <stage>\t<path>` records.
fn parse_unmerged(stdout: &[u8]) -> Result<Vec<UnmergedRecord>, GitError> {
    let malformed = |record: &str| GitError::BackendError {
        message: format!("unexpected `git ls-files -u` record: {record:?}"),
    };

    let mut records = Vec::new();
    for raw in stdout.split(|b| *b == 0).filter(|r| !r.is_empty()) {
        let record = String::from_utf8_lossy(raw);
        let (meta, path) = record.split_once('\t').ok_or_else(|| malformed(&record))?;
        let mut fields = meta.split(' ');
        let (Some(_mode), Some(oid), Some(stage)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed(&record));
        };
        let stage = stage
            .parse::<u32>()
            .ok()
            .and_then(Stage::from_number)
            .ok_or_else(|| malformed(&record))?;
        records.push(UnmergedRecord {
            path: path.to_owned(),
            stage,
            oid: oid.to_owned(),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID_A: &str = "1111111111111111111111111111111111111111";
    const OID_B: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn parses_unmerged_records() {
        let raw = format!(
            "100644 {OID_A} 1\ticons/a b.dmi\0100644 {OID_B} 2\ticons/a b.dmi\0"
        );
        let records = parse_unmerged(raw.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![
                UnmergedRecord {
                    path: "icons/a b.dmi".to_owned(),
                    stage: Stage::Base,
                    oid: OID_A.to_owned(),
                },
                UnmergedRecord {
                    path: "icons/a b.dmi".to_owned(),
                    stage: Stage::Ours,
                    oid: OID_B.to_owned(),
                },
            ]
        );
    }

    #[test]
    fn empty_output_has_no_records() {
        assert!(parse_unmerged(b"").unwrap().is_empty());
    }

    #[test]
    fn stage_zero_is_malformed() {
        let raw = format!("100644 {OID_A} 0\ticon.dmi\0");
        assert!(matches!(
            parse_unmerged(raw.as_bytes()),
            Err(GitError::BackendError { .. })
        ));
    }

    #[test]
    fn record_without_tab_is_malformed() {
        assert!(parse_unmerged(b"100644 abc 1 icon.dmi\0").is_err());
    }
}
