use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{ExecutorError, Result};
use crate::executor::{ExecOutput, Executor};

/// Executor backed by the `ffmpeg` and `ffprobe` command-line tools
#[derive(Debug, Clone)]
pub struct FfmpegExecutor {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegExecutor {
    /// Use `ffmpeg` and `ffprobe` from PATH
    pub fn new() -> Self {
        Self::with_paths("ffmpeg", "ffprobe")
    }

    pub fn with_paths<P: Into<PathBuf>, Q: Into<PathBuf>>(ffmpeg_path: P, ffprobe_path: Q) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Query a single bare value with ffprobe; any failure yields `None`
    fn probe_value(&self, path: &Path, selector: &[&str]) -> Option<f64> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args(["-v", "error"])
            .args(selector)
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .stdin(Stdio::null());

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                warn!("ffprobe could not be launched for {}: {}", path.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            debug!("ffprobe exited with {:?} for {}", output.status.code(), path.display());
            return None;
        }

        String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().ok()
    }
}

impl Executor for FfmpegExecutor {
    fn tool_name(&self) -> &str {
        "ffmpeg"
    }

    fn run(&self, args: &[String]) -> Result<ExecOutput> {
        debug!("{} {}", self.ffmpeg_path.display(), args.join(" "));

        let output = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExecutorError::ToolUnavailable {
                tool: self.ffmpeg_path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }

    fn probe_duration(&self, path: &Path) -> Option<f64> {
        self.probe_value(path, &["-show_entries", "format=duration"])
    }

    fn probe_sample_rate(&self, path: &Path) -> Option<f64> {
        self.probe_value(
            path,
            &["-select_streams", "a:0", "-show_entries", "stream=sample_rate"],
        )
    }

    fn check_available(&self) -> Result<()> {
        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ExecutorError::ToolUnavailable {
                tool: self.ffmpeg_path.display().to_string(),
                reason: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecutorError::ToolUnavailable {
                tool: self.ffmpeg_path.display().to_string(),
                reason: format!("'-version' exited with {:?}", status.code()),
            }
            .into())
        }
    }
}
