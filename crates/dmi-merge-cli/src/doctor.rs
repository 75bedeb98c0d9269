use std::io::ErrorKind;
use std::process::{Command, Stdio};

use anyhow::Result;
use dmimerge::config::Config;
use serde::Serialize;

use crate::context::{self, Options};
use crate::format::OutputFormat;

#[derive(Serialize)]
struct DoctorEnvelope {
    checks: Vec<DoctorCheck>,
    all_ok: bool,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<String>,
}

impl DoctorCheck {
    fn ok(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: "ok".to_string(),
            message,
            fix: None,
        }
    }

    fn fail(name: &str, message: String, fix: String) -> Self {
        Self {
            name: name.to_string(),
            status: "fail".to_string(),
            message,
            fix: Some(fix),
        }
    }
}

fn print_check(check: &DoctorCheck) {
    let prefix = match check.status.as_str() {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "fail" => "[FAIL]",
        _ => "[???]",
    };
    println!("{} {}", prefix, check.message);
    if let Some(fix) = &check.fix {
        println!("       {fix}");
    }
}

/// Check tools and repository
pub fn run(opts: &Options, format: OutputFormat) -> Result<()> {
    let mut checks = Vec::new();

    // A broken config is reported, then the defaults are checked instead
    let config = match opts.load_config() {
        Ok(config) => {
            checks.push(DoctorCheck::ok("config", "config: loaded".to_string()));
            config
        }
        Err(e) => {
            checks.push(DoctorCheck::fail(
                "config",
                format!("config: {e:#}"),
                "Fix dmi-merge.toml (or pass --config)".to_string(),
            ));
            Config::default()
        }
    };

    checks.push(check_tool("git", "git", &["--version"], "https://git-scm.com/downloads"));
    checks.push(check_tool(
        "codec",
        &config.codec.program,
        &["--version"],
        "Set [codec] program in dmi-merge.toml",
    ));
    checks.push(check_tool(
        "primary compressor",
        &config.optimize.primary.program,
        &["--version"],
        "Install oxipng or set [optimize.primary] program",
    ));
    checks.push(check_tool(
        "secondary compressor",
        &config.optimize.secondary.program,
        &["-h"],
        "Install zopflipng or set [optimize.secondary] program",
    ));
    checks.push(check_repo(&config));

    let all_ok = checks.iter().all(|c| c.status == "ok");

    match format {
        OutputFormat::Json => {
            let envelope = DoctorEnvelope { checks, all_ok };
            println!("{}", format.serialize(&envelope)?);
        }
        OutputFormat::Text => {
            println!("dmi-merge doctor");
            println!("================");
            println!();

            for check in &checks {
                print_check(check);
            }

            println!();
            if all_ok {
                println!("All checks passed!");
            } else {
                println!("Some checks failed. See above for details.");
            }
        }
    }

    Ok(())
}

/// A program counts as available if it can be started at all; some of the
/// compressors exit non-zero for every informational flag.
fn check_tool(name: &str, program: &str, args: &[&str], fix: &str) -> DoctorCheck {
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout.lines().next().map(str::trim).filter(|l| !l.is_empty());
            match version {
                Some(v) if output.status.success() => {
                    DoctorCheck::ok(name, format!("{name}: {v}"))
                }
                _ => DoctorCheck::ok(name, format!("{name}: {program} found")),
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => DoctorCheck::fail(
            name,
            format!("{name}: {program} not found"),
            fix.to_string(),
        ),
        Err(e) => DoctorCheck::fail(
            name,
            format!("{name}: {program} could not be run: {e}"),
            fix.to_string(),
        ),
    }
}

fn check_repo(config: &Config) -> DoctorCheck {
    match context::open_store(config) {
        Ok(store) => DoctorCheck::ok(
            "git repository",
            format!(
                "git repository: {} ({} backend)",
                store.workdir().display(),
                config.git.backend
            ),
        ),
        Err(e) => DoctorCheck::fail(
            "git repository",
            format!("git repository: {e:#}"),
            "Run dmi-merge from inside the repository with the conflict".to_string(),
        ),
    }
}
