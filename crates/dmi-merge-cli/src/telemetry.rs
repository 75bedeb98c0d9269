//! Logging initialization.
//!
//! Controlled by two environment variables:
//! - `DMI_MERGE_LOG`: an `EnvFilter` directive (e.g. `dmimerge=debug`).
//!   Unset → `warn`, raised by `-v` (info) or `-vv` (debug).
//! - `DMI_MERGE_LOG_FORMAT`: `json` → JSON events to stderr; anything else
//!   → compact human-readable lines to stderr.
//!
//! stdout is reserved for command output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const FILTER_ENV: &str = "DMI_MERGE_LOG";
const FORMAT_ENV: &str = "DMI_MERGE_LOG_FORMAT";

/// Install the global subscriber. Safe to call once per process.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    let json = std::env::var(FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: could not initialise logging: {e}");
    }
}

const fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
