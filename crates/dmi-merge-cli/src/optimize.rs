use std::path::Path;

use anyhow::Result;

use crate::context::{self, Options};

/// Run both compressors on `input` and keep the smaller output.
pub fn run(opts: &Options, input: &Path) -> Result<()> {
    let config = opts.load_config()?;
    let (primary, secondary) = context::compressors(&config);

    let report = dmimerge::optimize(input, &primary, &secondary)?;
    print_report(&report);
    Ok(())
}

pub fn print_report(report: &dmimerge::OptimizeReport) {
    println!(
        "{} -> {} ({} -> {} bytes, {} won: {} vs {})",
        report.input.display(),
        report.output.display(),
        report.original_size,
        report.kept_size(),
        report.winner,
        report.primary_size,
        report.secondary_size,
    );
}
