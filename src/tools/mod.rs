//! Capability interfaces for the external programs the pipeline drives.
//!
//! The codec and the compressors are opaque: the pipeline only ever asks
//! them to turn one file into another. [`process`] holds the adapters that
//! run real binaries; tests substitute in-process fakes.

pub mod process;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use process::{CommandTemplate, ProcessCodec, ProcessCompressor};

/// Failure of a single external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be found on `PATH`.
    #[error("`{program}` not found on PATH")]
    NotFound {
        /// Program name as configured.
        program: String,
    },

    /// The program exists but could not be started.
    #[error("could not run `{program}`")]
    Spawn {
        /// Program name as configured.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited non-zero.
    #[error("`{command}` exited with code {exit_code}{}", stderr_tail(stderr))]
    Failed {
        /// The rendered command line.
        command: String,
        /// Exit code (`-1` if killed by a signal).
        exit_code: i32,
        /// Captured stderr, trimmed.
        stderr: String,
    },

    /// The program reported success but its output file is missing or empty.
    #[error("`{tool}` reported success but left no output at {}", output.display())]
    NoOutput {
        /// Tool name.
        tool: String,
        /// The expected output file.
        output: PathBuf,
    },

    /// Writing captured output to disk failed.
    #[error("could not write {}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn stderr_tail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// The icon codec: container ⇄ textual dump.
pub trait Codec {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Write the full textual dump of `artifact` to `dump`.
    ///
    /// # Errors
    /// Returns a [`ToolError`] if the artifact cannot be decoded.
    fn decode(&self, artifact: &Path, dump: &Path) -> Result<(), ToolError>;

    /// Write only the embedded metadata of `artifact` to `dump`.
    ///
    /// # Errors
    /// Returns a [`ToolError`] if the metadata cannot be read.
    fn extract_metadata(&self, artifact: &Path, dump: &Path) -> Result<(), ToolError>;

    /// Rebuild a container at `artifact` from the textual dump at `dump`.
    ///
    /// # Errors
    /// Returns a [`ToolError`] if the dump cannot be encoded.
    fn encode(&self, dump: &Path, artifact: &Path) -> Result<(), ToolError>;
}

/// A lossless, metadata-preserving image compressor.
pub trait Compressor {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Compress `input` into `output`. `output` may already exist (as an
    /// empty placeholder) and must be overwritten.
    ///
    /// # Errors
    /// Returns a [`ToolError`] if compression fails.
    fn compress(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Which codec operation was running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecOp {
    /// Container → full dump.
    Decode,
    /// Container → metadata dump.
    ExtractMetadata,
    /// Full dump → container.
    Encode,
}

impl CodecOp {
    /// Run this operation on `codec`.
    ///
    /// # Errors
    /// Propagates the codec's [`ToolError`].
    pub fn run(self, codec: &dyn Codec, input: &Path, output: &Path) -> Result<(), ToolError> {
        match self {
            Self::Decode => codec.decode(input, output),
            Self::ExtractMetadata => codec.extract_metadata(input, output),
            Self::Encode => codec.encode(input, output),
        }
    }
}

impl fmt::Display for CodecOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Decode => "decode",
            Self::ExtractMetadata => "metadata extraction",
            Self::Encode => "encode",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_message_includes_stderr_when_present() {
        let err = ToolError::Failed {
            command: "icontool decompile icon.dmi".to_owned(),
            exit_code: 1,
            stderr: "bad png".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "`icontool decompile icon.dmi` exited with code 1: bad png"
        );

        let quiet = ToolError::Failed {
            command: "oxipng".to_owned(),
            exit_code: 3,
            stderr: String::new(),
        };
        assert_eq!(quiet.to_string(), "`oxipng` exited with code 3");
    }

    #[test]
    fn codec_op_names() {
        assert_eq!(CodecOp::ExtractMetadata.to_string(), "metadata extraction");
    }
}
