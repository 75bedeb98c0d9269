use std::path::Path;

use anyhow::Result;
use dmimerge::ConflictPath;

use crate::format::OutputFormat;

pub fn run(path: &Path, format: OutputFormat) -> Result<()> {
    let path = ConflictPath::new(path)?;
    let report = dmimerge::status(&path);

    match format {
        OutputFormat::Json => println!("{}", format.serialize(&report)?),
        OutputFormat::Text => {
            println!("{path}: {}", report.state);
            for file in &report.files {
                match file.size {
                    Some(size) => println!("  [x] {} ({size} bytes)", file.path.display()),
                    None => println!("  [ ] {}", file.path.display()),
                }
            }
        }
    }
    Ok(())
}
