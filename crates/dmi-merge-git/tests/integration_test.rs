use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use dmi_merge_git::{ConflictStore, GitCliStore, GitError, GixStore, Stage};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BASE: &[u8] = b"\x89PNG\r\n\x1a\n\0base-bytes";
const OURS: &[u8] = b"\x89PNG\r\n\x1a\n\0ours-bytes-longer";
const INCOMING: &[u8] = b"\x89PNG\r\n\x1a\n\0incoming";

fn git(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new("git")
        .args([
            "-c",
            "user.email=test@test.com",
            "-c",
            "user.name=Test User",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

fn commit_all(dir: &Path, message: &str) {
    assert!(git(dir, &["add", "-A"]).status.success());
    let out = git(dir, &["commit", "-q", "-m", message]);
    assert!(
        out.status.success(),
        "commit failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

/// A repo where `icons/icon.dmi` is modified on both sides and `gone.dmi`
/// is modified on main but deleted on `side`, then `side` is merged in.
fn setup_conflicted_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    assert!(git(root, &["init", "-q"]).status.success());

    std::fs::create_dir_all(root.join("icons")).unwrap();
    std::fs::write(root.join("icons/icon.dmi"), BASE).unwrap();
    std::fs::write(root.join("gone.dmi"), BASE).unwrap();
    std::fs::write(root.join("README.md"), "# icons\n").unwrap();
    commit_all(root, "base");

    assert!(git(root, &["checkout", "-q", "-b", "side"]).status.success());
    std::fs::write(root.join("icons/icon.dmi"), INCOMING).unwrap();
    std::fs::remove_file(root.join("gone.dmi")).unwrap();
    commit_all(root, "incoming");

    assert!(git(root, &["checkout", "-q", "main"]).status.success());
    std::fs::write(root.join("icons/icon.dmi"), OURS).unwrap();
    std::fs::write(root.join("gone.dmi"), OURS).unwrap();
    commit_all(root, "ours");

    let merge = git(root, &["merge", "side"]);
    assert!(!merge.status.success(), "merge was expected to conflict");
    dir
}

fn stores(root: &Path) -> Vec<(&'static str, Box<dyn ConflictStore>)> {
    vec![
        ("gix", Box::new(GixStore::discover(root).unwrap())),
        ("cli", Box::new(GitCliStore::discover(root).unwrap())),
    ]
}

// ===========================================================================
// read_stage
// ===========================================================================

#[test]
fn read_stage_returns_exact_blob_bytes() {
    let dir = setup_conflicted_repo();
    let icon = dir.path().join("icons/icon.dmi");

    for (name, store) in stores(dir.path()) {
        assert_eq!(store.read_stage(&icon, Stage::Base).unwrap(), BASE, "{name}");
        assert_eq!(store.read_stage(&icon, Stage::Ours).unwrap(), OURS, "{name}");
        assert_eq!(
            store.read_stage(&icon, Stage::Incoming).unwrap(),
            INCOMING,
            "{name}"
        );
    }
}

#[test]
fn deleted_side_reports_stage_missing() {
    let dir = setup_conflicted_repo();
    let gone = dir.path().join("gone.dmi");

    for (name, store) in stores(dir.path()) {
        let err = store.read_stage(&gone, Stage::Incoming).unwrap_err();
        assert!(
            matches!(err, GitError::StageMissing { ref path, stage: Stage::Incoming } if path == "gone.dmi"),
            "{name}: {err}"
        );
        assert_eq!(store.read_stage(&gone, Stage::Ours).unwrap(), OURS, "{name}");
    }
}

#[test]
fn clean_path_is_not_conflicted() {
    let dir = setup_conflicted_repo();
    let readme = dir.path().join("README.md");

    for (name, store) in stores(dir.path()) {
        let err = store.read_stage(&readme, Stage::Base).unwrap_err();
        assert!(matches!(err, GitError::NotConflicted { .. }), "{name}: {err}");
    }
}

// ===========================================================================
// conflicts
// ===========================================================================

#[test]
fn conflicts_lists_unmerged_paths_with_stages() {
    let dir = setup_conflicted_repo();

    for (name, store) in stores(dir.path()) {
        let conflicts = store.conflicts().unwrap();
        let paths: Vec<&str> = conflicts.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["gone.dmi", "icons/icon.dmi"], "{name}");

        assert_eq!(conflicts[0].stages, vec![Stage::Base, Stage::Ours], "{name}");
        assert!(conflicts[1].is_three_way(), "{name}");
    }
}

#[test]
fn workdir_is_canonical_root() {
    let dir = setup_conflicted_repo();
    let root = dir.path().canonicalize().unwrap();

    for (name, store) in stores(&dir.path().join("icons")) {
        assert_eq!(store.workdir(), root, "{name}");
    }
}

#[test]
fn discover_outside_repo_fails() {
    let dir = TempDir::new().unwrap();
    assert!(GitCliStore::discover(dir.path()).is_err());
}
