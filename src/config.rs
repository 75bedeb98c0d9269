//! dmi-merge configuration (`dmi-merge.toml`).
//!
//! Selects the git backend and the command lines used for the codec and the
//! two compressors. Missing file → all defaults (no error).
//!
//! ```toml
//! [git]
//! backend = "gix"
//!
//! [codec]
//! program = "icontool"
//! decode = ["decompile", "--output", "{output}", "{input}"]
//! metadata = ["metadata", "{input}"]
//! encode = ["compile", "--output", "{output}", "{input}"]
//!
//! [optimize.primary]
//! program = "oxipng"
//! args = ["--opt", "max", "--strip", "none", "--zopfli", "--out", "{output}", "{input}"]
//!
//! [optimize.secondary]
//! program = "zopflipng"
//! args = ["-m", "--keepchunks=zTXt", "-y", "{input}", "{output}"]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::tools::process::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};

/// Config file name, looked up from the current directory up to the
/// repository root.
pub const CONFIG_FILE: &str = "dmi-merge.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration. Missing sections and fields use defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where conflict stages are read from.
    #[serde(default)]
    pub git: GitConfig,

    /// The icon codec.
    #[serde(default)]
    pub codec: CodecConfig,

    /// The two compressors raced by `optimize`.
    #[serde(default)]
    pub optimize: OptimizeConfig,
}

// ---------------------------------------------------------------------------
// GitConfig
// ---------------------------------------------------------------------------

/// Conflict-store selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Which backend reads the index.
    #[serde(default)]
    pub backend: GitBackend,
}

/// The conflict-store backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitBackend {
    /// In-process index reading via gix.
    #[default]
    Gix,
    /// `git ls-files -u` + `git cat-file`.
    Cli,
}

impl fmt::Display for GitBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gix => write!(f, "gix"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

// ---------------------------------------------------------------------------
// CodecConfig
// ---------------------------------------------------------------------------

/// Command lines for the icon codec. Each argument list may use `{input}`
/// and `{output}`; without `{output}` the tool's stdout becomes the output.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// Codec executable.
    #[serde(default = "default_codec_program")]
    pub program: String,

    /// Container → full textual dump.
    #[serde(default = "default_decode_args")]
    pub decode: Vec<String>,

    /// Container → metadata dump.
    #[serde(default = "default_metadata_args")]
    pub metadata: Vec<String>,

    /// Textual dump → container.
    #[serde(default = "default_encode_args")]
    pub encode: Vec<String>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            program: default_codec_program(),
            decode: default_decode_args(),
            metadata: default_metadata_args(),
            encode: default_encode_args(),
        }
    }
}

fn default_codec_program() -> String {
    "icontool".to_owned()
}

fn default_decode_args() -> Vec<String> {
    strings(&["decompile", "--output", OUTPUT_PLACEHOLDER, INPUT_PLACEHOLDER])
}

fn default_metadata_args() -> Vec<String> {
    strings(&["metadata", INPUT_PLACEHOLDER])
}

fn default_encode_args() -> Vec<String> {
    strings(&["compile", "--output", OUTPUT_PLACEHOLDER, INPUT_PLACEHOLDER])
}

// ---------------------------------------------------------------------------
// OptimizeConfig
// ---------------------------------------------------------------------------

/// The two compressors. On equal output sizes the secondary wins.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Compressor A.
    #[serde(default = "default_primary")]
    pub primary: ToolConfig,

    /// Compressor B.
    #[serde(default = "default_secondary")]
    pub secondary: ToolConfig,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            secondary: default_secondary(),
        }
    }
}

/// One external program and its argument template.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Executable name or path.
    pub program: String,
    /// Argument template.
    pub args: Vec<String>,
}

fn default_primary() -> ToolConfig {
    ToolConfig {
        program: "oxipng".to_owned(),
        args: strings(&[
            "--opt",
            "max",
            "--strip",
            "none",
            "--zopfli",
            "--out",
            OUTPUT_PLACEHOLDER,
            INPUT_PLACEHOLDER,
        ]),
    }
}

fn default_secondary() -> ToolConfig {
    ToolConfig {
        program: "zopflipng".to_owned(),
        args: strings(&[
            "-m",
            "--keepchunks=zTXt",
            "-y",
            INPUT_PLACEHOLDER,
            OUTPUT_PLACEHOLDER,
        ]),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error loading or validating a configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    fn invalid(message: String) -> Self {
        Self {
            path: None,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; invalid TOML, unknown fields and
    /// bad argument templates are errors.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found), parse
    /// errors, or validation failures.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Find `dmi-merge.toml` in `start` or its ancestors, stopping at the
    /// first directory that contains `.git`. Returns the loaded config and
    /// the file it came from, or defaults and `None`.
    ///
    /// # Errors
    /// Returns `ConfigError` if a file is found but cannot be loaded.
    pub fn discover(start: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
            if dir.join(".git").exists() {
                break;
            }
        }
        Ok((Self::default(), None))
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields or invalid
    /// argument templates.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError::invalid(message)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every argument template for the placeholders it needs.
    ///
    /// Codec templates need `{input}` (output may go to stdout); compressor
    /// templates need both, because candidates are files the compressor
    /// must write itself.
    ///
    /// # Errors
    /// Returns `ConfigError` naming the offending section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, &str, &[String], bool); 5] = [
            ("codec.decode", &self.codec.program, &self.codec.decode, false),
            ("codec.metadata", &self.codec.program, &self.codec.metadata, false),
            ("codec.encode", &self.codec.program, &self.codec.encode, false),
            (
                "optimize.primary",
                &self.optimize.primary.program,
                &self.optimize.primary.args,
                true,
            ),
            (
                "optimize.secondary",
                &self.optimize.secondary.program,
                &self.optimize.secondary.args,
                true,
            ),
        ];

        for (section, program, args, needs_output) in checks {
            if program.trim().is_empty() {
                return Err(ConfigError::invalid(format!("{section}: program is empty")));
            }
            let mentions = |token: &str| args.iter().any(|a| a.contains(token));
            if !mentions(INPUT_PLACEHOLDER) {
                return Err(ConfigError::invalid(format!(
                    "{section}: arguments must contain {INPUT_PLACEHOLDER}"
                )));
            }
            if needs_output && !mentions(OUTPUT_PLACEHOLDER) {
                return Err(ConfigError::invalid(format!(
                    "{section}: arguments must contain {OUTPUT_PLACEHOLDER}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_all_fields() {
        let cfg = Config::default();
        assert_eq!(cfg.git.backend, GitBackend::Gix);
        assert_eq!(cfg.codec.program, "icontool");
        assert_eq!(cfg.codec.decode[0], "decompile");
        assert_eq!(cfg.codec.metadata, vec!["metadata", "{input}"]);
        assert_eq!(cfg.optimize.primary.program, "oxipng");
        assert_eq!(cfg.optimize.secondary.program, "zopflipng");
        cfg.validate().unwrap();
    }

    #[test]
    fn parse_empty_string() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parse_partial_overrides() {
        let cfg = Config::parse(
            r#"
[git]
backend = "cli"

[codec]
program = "/opt/icontool/bin/icontool"

[optimize.secondary]
program = "pngcrush"
args = ["-brute", "{input}", "{output}"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.git.backend, GitBackend::Cli);
        assert_eq!(cfg.codec.program, "/opt/icontool/bin/icontool");
        assert_eq!(cfg.codec.encode, default_encode_args());
        assert_eq!(cfg.optimize.primary, default_primary());
        assert_eq!(cfg.optimize.secondary.program, "pngcrush");
    }

    #[test]
    fn unknown_field_reports_line() {
        let err = Config::parse("[codec]\nprogram = \"x\"\nbogus = 1\n").unwrap_err();
        assert!(
            err.message.contains("line") && err.message.contains("bogus"),
            "error should include line number and field: {}",
            err.message
        );
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Config::parse("[git]\nbackend = \"libgit2\"\n").is_err());
    }

    #[test]
    fn compressor_without_output_placeholder_is_rejected() {
        let err = Config::parse(
            "[optimize.primary]\nprogram = \"oxipng\"\nargs = [\"{input}\"]\n",
        )
        .unwrap_err();
        assert!(err.message.contains("optimize.primary"), "{}", err.message);
        assert!(err.message.contains("{output}"), "{}", err.message);
    }

    #[test]
    fn codec_without_input_placeholder_is_rejected() {
        let err = Config::parse("[codec]\ndecode = [\"decompile\"]\n").unwrap_err();
        assert!(err.message.contains("codec.decode"), "{}", err.message);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not = [valid").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn discover_walks_up_to_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("icons/mob")).unwrap();
        std::fs::write(root.join(CONFIG_FILE), "[git]\nbackend = \"cli\"\n").unwrap();

        let (cfg, found) = Config::discover(&root.join("icons/mob")).unwrap();
        assert_eq!(cfg.git.backend, GitBackend::Cli);
        assert_eq!(found, Some(root.join(CONFIG_FILE)));
    }

    #[test]
    fn discover_stops_at_repo_root() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path();
        std::fs::write(outer.join(CONFIG_FILE), "[git]\nbackend = \"cli\"\n").unwrap();
        let repo = outer.join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        let (cfg, found) = Config::discover(&repo).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(found, None);
    }
}
