//! # Executor Adapter
//!
//! All signal processing is delegated to an external audio executor (FFmpeg).
//! This module defines the narrow seam the rest of the crate talks through:
//! run an argument vector, capture its text output, and probe basic stream
//! properties.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use loudmaster::executor::{Executor, FfmpegExecutor};
//!
//! # fn main() -> loudmaster::Result<()> {
//! let executor = FfmpegExecutor::new();
//! executor.check_available()?;
//!
//! let rate = executor.probe_sample_rate("song.wav".as_ref());
//! println!("Sample rate: {:?}", rate);
//! # Ok(())
//! # }
//! ```

mod ffmpeg;
#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

use crate::error::{ExecutorError, Result};

pub use ffmpeg::FfmpegExecutor;

/// Global flags prepended to every processing invocation: no banner, no stdin.
pub const BASE_ARGS: [&str; 2] = ["-hide_banner", "-nostdin"];

/// Captured result of one executor invocation
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Statistics can land on either stream; parsers see both.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stderr, self.stdout)
    }
}

/// Interface to the external audio-processing executor.
///
/// Implementations spawn one process per call and never retry. A non-zero
/// exit is reported through [`ExecOutput::exit_code`]; only a failure to
/// launch the process at all is an `Err`.
pub trait Executor: Send + Sync {
    /// Name used in error messages and logs
    fn tool_name(&self) -> &str;

    /// Run the executor with the given arguments (binary name excluded)
    fn run(&self, args: &[String]) -> Result<ExecOutput>;

    /// Total duration of the media in seconds, `None` if it cannot be probed
    fn probe_duration(&self, path: &Path) -> Option<f64>;

    /// Sample rate of the first audio stream in Hz, `None` if it cannot be probed
    fn probe_sample_rate(&self, path: &Path) -> Option<f64>;

    /// Fails with `ToolUnavailable` when the executor cannot be launched
    fn check_available(&self) -> Result<()>;

    /// Run and turn a non-zero exit into `ExecutorError::Failed` carrying stderr verbatim
    fn run_checked(&self, stage: &str, args: &[String]) -> Result<ExecOutput> {
        let output = self.run(args)?;
        if !output.success() {
            return Err(ExecutorError::Failed {
                tool: self.tool_name().to_string(),
                stage: stage.to_string(),
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(output)
    }
}

/// Start an argument vector with the global flags
pub fn base_args() -> Vec<String> {
    BASE_ARGS.iter().map(|s| s.to_string()).collect()
}

/// Arguments that discard the rendered audio and keep only the log output
pub fn null_sink_args() -> [String; 3] {
    ["-f".to_string(), "null".to_string(), "-".to_string()]
}
