use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod clean;
mod context;
mod doctor;
mod finish;
mod format;
mod list;
mod optimize;
mod stage;
mod status;
mod telemetry;

use context::BackendArg;
use format::OutputFormat;

/// Three-way merge helper for BYOND `.dmi` icon files
///
/// Git cannot merge `.dmi` icons: they are PNG containers with an embedded
/// text description of their states. dmi-merge pulls the three conflict
/// versions out of the index, expands each into an editable text dump, and
/// seeds a merged dump from your side for you to edit.
///
/// WORKFLOW:
///
///   1. Stage:   dmi-merge stage-and-expand icons/mob.dmi
///   2. Edit:    icons/mob.dmi.merged.yml (compare with .base/.incoming.yml)
///   3. Finish:  dmi-merge finish icons/mob.dmi --optimize
///   4. Tidy:    dmi-merge clean icons/mob.dmi
///
/// External tools (codec and compressors) are configured in
/// dmi-merge.toml at the repository root.
#[derive(Parser)]
#[command(name = "dmi-merge")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'dmi-merge <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file (default: dmi-merge.toml found from the current directory)
    #[arg(long, global = true, env = "DMI_MERGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Index reader to use, overriding the configuration
    #[arg(long, global = true, value_enum, value_name = "BACKEND")]
    git_backend: Option<BackendArg>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, expand, and seed a conflicted icon
    ///
    /// Writes <path>.base/.ours/.incoming from index stages 1-3, a .yml and
    /// .metadata dump of each, and <path>.merged.yml/.metadata copied from
    /// the ours dumps. Edit <path>.merged.yml, then run 'finish'.
    #[command(name = "stage-and-expand")]
    StageAndExpand {
        /// The conflicted icon
        path: PathBuf,
    },

    /// Recompress with both compressors and keep the smaller result
    ///
    /// Writes <input>.small; <input> itself is never modified.
    Optimize {
        /// The icon to compress
        input: PathBuf,
    },

    /// Encode the edited merged dump back into the icon
    ///
    /// Overwrites <path> with the container built from <path>.merged.yml.
    Finish {
        /// The conflicted icon
        path: PathBuf,

        /// Also run the compressors on the result
        #[arg(long)]
        optimize: bool,
    },

    /// Remove every file stage-and-expand created for a path
    ///
    /// <path> and <path>.small are left alone.
    Clean {
        /// The conflicted icon
        path: PathBuf,
    },

    /// Show which derived files exist and how far the pipeline got
    Status {
        /// The conflicted icon
        path: PathBuf,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List conflicted .dmi files in the index
    List {
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check that git, the codec, and the compressors are available
    Doctor {
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let opts = context::Options {
        config: cli.config,
        git_backend: cli.git_backend,
    };
    match cli.command {
        Commands::StageAndExpand { path } => stage::run(&opts, &path),
        Commands::Optimize { input } => optimize::run(&opts, &input),
        Commands::Finish { path, optimize } => finish::run(&opts, &path, optimize),
        Commands::Clean { path } => clean::run(&path),
        Commands::Status { path, format } => status::run(&path, format),
        Commands::List { format } => list::run(&opts, format),
        Commands::Doctor { format } => doctor::run(&opts, format),
    }
}
