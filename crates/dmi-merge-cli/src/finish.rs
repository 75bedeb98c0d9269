use std::path::Path;

use anyhow::Result;
use dmimerge::ConflictPath;
use dmimerge::tools::Compressor;

use crate::context::{self, Options};

/// Encode `<path>.merged.yml` into `<path>`, optionally recompressing.
pub fn run(opts: &Options, path: &Path, optimize: bool) -> Result<()> {
    let config = opts.load_config()?;
    let path = ConflictPath::new(path)?;
    let codec = context::codec(&config);
    let (primary, secondary) = context::compressors(&config);
    let compressors: Option<(&dyn Compressor, &dyn Compressor)> = if optimize {
        Some((&primary, &secondary))
    } else {
        None
    };

    let report = dmimerge::finish(&codec, &path, compressors)?;

    println!("Wrote {path}");
    if let Some(report) = report {
        crate::optimize::print_report(&report);
    }
    println!("Review it, then `git add {path}` to resolve the conflict.");
    Ok(())
}
