use std::path::Path;

use anyhow::Result;
use dmimerge::ConflictPath;

/// Remove the derived files for `path`.
pub fn run(path: &Path) -> Result<()> {
    let path = ConflictPath::new(path)?;
    let removed = dmimerge::clean(&path)?;
    if removed.is_empty() {
        println!("Nothing to clean for {path}");
    } else {
        for file in &removed {
            println!("removed {}", file.display());
        }
    }
    Ok(())
}
