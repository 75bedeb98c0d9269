//! Adapters that satisfy [`Codec`] and [`Compressor`] by running external
//! programs configured in `dmi-merge.toml`.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use super::{Codec, Compressor, ToolError};
use crate::config::{CodecConfig, ToolConfig};

/// Placeholder replaced by the input file path.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by the output file path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

// ---------------------------------------------------------------------------
// CommandTemplate
// ---------------------------------------------------------------------------

/// A program plus an argument list containing `{input}` / `{output}`
/// placeholders.
///
/// When no argument mentions `{output}`, the program's stdout is captured
/// and written to the output file once the program exits successfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Build a template from a program name and its argument list.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The program that will be executed.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// `true` if the program writes the output file itself.
    #[must_use]
    pub fn writes_output(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER))
    }

    /// Substitute the placeholders in every argument.
    #[must_use]
    pub fn render(&self, input: &Path, output: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| render_arg(arg, input, output))
            .collect()
    }

    /// Human-readable command line, for logs and errors.
    #[must_use]
    pub fn display(&self, input: &Path, output: &Path) -> String {
        std::iter::once(self.program.clone())
            .chain(
                self.render(input, output)
                    .into_iter()
                    .map(|a| a.to_string_lossy().into_owned()),
            )
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the program to completion, blocking.
    ///
    /// # Errors
    /// [`ToolError::NotFound`] / [`ToolError::Spawn`] if the program cannot
    /// start, [`ToolError::Failed`] on a non-zero exit, [`ToolError::Io`] if
    /// captured stdout cannot be written.
    pub fn run(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let command_line = self.display(input, output);
        debug!(cmd = %command_line, "running external tool");

        let result = Command::new(&self.program)
            .args(self.render(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        program: self.program.clone(),
                    }
                } else {
                    ToolError::Spawn {
                        program: self.program.clone(),
                        source: e,
                    }
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_owned();
            let exit_code = result.status.code().unwrap_or(-1);
            warn!(cmd = %command_line, exit_code, %stderr, "external tool failed");
            return Err(ToolError::Failed {
                command: command_line,
                exit_code,
                stderr,
            });
        }

        if !self.writes_output() {
            std::fs::write(output, &result.stdout).map_err(|source| ToolError::Io {
                path: output.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

fn render_arg(arg: &str, input: &Path, output: &Path) -> OsString {
    let mut rendered = OsString::new();
    let mut rest = arg;
    loop {
        let next = [
            (rest.find(INPUT_PLACEHOLDER), INPUT_PLACEHOLDER, input),
            (rest.find(OUTPUT_PLACEHOLDER), OUTPUT_PLACEHOLDER, output),
        ]
        .into_iter()
        .filter_map(|(pos, token, path)| pos.map(|p| (p, token, path)))
        .min_by_key(|(pos, _, _)| *pos);

        let Some((pos, token, path)) = next else {
            rendered.push(rest);
            return rendered;
        };
        rendered.push(&rest[..pos]);
        rendered.push(path.as_os_str());
        rest = &rest[pos + token.len()..];
    }
}

// ---------------------------------------------------------------------------
// ProcessCodec
// ---------------------------------------------------------------------------

/// [`Codec`] backed by an external icon tool (`icontool` by default).
#[derive(Clone, Debug)]
pub struct ProcessCodec {
    decode: CommandTemplate,
    metadata: CommandTemplate,
    encode: CommandTemplate,
}

impl ProcessCodec {
    /// Build the codec from its configuration section.
    #[must_use]
    pub fn from_config(config: &CodecConfig) -> Self {
        Self {
            decode: CommandTemplate::new(&config.program, &config.decode),
            metadata: CommandTemplate::new(&config.program, &config.metadata),
            encode: CommandTemplate::new(&config.program, &config.encode),
        }
    }
}

impl Codec for ProcessCodec {
    fn name(&self) -> &str {
        self.decode.program()
    }

    fn decode(&self, artifact: &Path, dump: &Path) -> Result<(), ToolError> {
        self.decode.run(artifact, dump)
    }

    fn extract_metadata(&self, artifact: &Path, dump: &Path) -> Result<(), ToolError> {
        self.metadata.run(artifact, dump)
    }

    fn encode(&self, dump: &Path, artifact: &Path) -> Result<(), ToolError> {
        self.encode.run(dump, artifact)
    }
}

// ---------------------------------------------------------------------------
// ProcessCompressor
// ---------------------------------------------------------------------------

/// [`Compressor`] backed by an external PNG optimiser.
#[derive(Clone, Debug)]
pub struct ProcessCompressor {
    template: CommandTemplate,
}

impl ProcessCompressor {
    /// Build a compressor from its configuration section.
    #[must_use]
    pub fn from_config(config: &ToolConfig) -> Self {
        Self {
            template: CommandTemplate::new(&config.program, &config.args),
        }
    }
}

impl Compressor for ProcessCompressor {
    fn name(&self) -> &str {
        self.template.program()
    }

    fn compress(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        self.template.run(input, output)
    }
}
