use std::path::Path;

use anyhow::Result;
use dmimerge::{ConflictPath, stage_and_expand};

use crate::context::{self, Options};

/// Extract, expand, and seed one conflicted icon.
pub fn run(opts: &Options, path: &Path) -> Result<()> {
    let config = opts.load_config()?;
    let path = ConflictPath::new(path)?;
    let store = context::open_store(&config)?;
    let codec = context::codec(&config);

    let report = stage_and_expand(store.as_ref(), &codec, &path)?;

    println!("Staged {path}:");
    for file in report.artifacts.iter().chain(&report.dumps) {
        println!("  {}", file.display());
    }
    if let Some(target) = report.edit_target() {
        println!();
        println!("Edit {} and run:", target.display());
        println!("  dmi-merge finish {path}");
    }
    Ok(())
}
