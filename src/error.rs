use thiserror::Error;

/// Main error type for the loudmaster library
#[derive(Error, Debug)]
pub enum MasteringError {
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Measurement error: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Filter graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while driving the external audio executor
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("{tool} is not installed or not reachable: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    #[error("{tool} failed during {stage} (exit code {code:?}): {stderr}")]
    Failed {
        tool: String,
        stage: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Background worker stopped before finishing: {reason}")]
    WorkerFailed { reason: String },
}

/// Errors raised while extracting statistics from executor output
#[derive(Error, Debug)]
pub enum MeasurementError {
    #[error("No loudness statistics block found in executor output ({context})")]
    NotFound { context: String },

    #[error("Loudness statistics block is not valid JSON: {reason}")]
    InvalidBlock { reason: String },

    #[error("Measured statistics lack required field: {field}")]
    MissingField { field: String },
}

/// Errors raised while composing a filter graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Dynamic EQ requested but no band analysis is available")]
    MissingBandStatistics,

    #[error("Dynamic EQ requested but band '{band}' has no measured RMS")]
    MissingBandLevel { band: String },
}

/// Errors raised while resolving or writing output files
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Output file {path} already exists; allow overwrite to replace it")]
    OutputExists { path: String },

    #[error("Unsupported output format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Unsupported bit depth: {value}")]
    UnsupportedBitDepth { value: String },

    #[error("No input files found to process")]
    NoInputFiles,
}

/// Errors raised while writing or reading a mastering report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report: {reason}")]
    SerializeFailed { reason: String },

    #[error("Failed to parse report {path}: {reason}")]
    ParseFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using MasteringError
pub type Result<T> = std::result::Result<T, MasteringError>;

impl MasteringError {
    /// Whether the caller can retry with different input (a new path or permission)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Output(OutputError::OutputExists { .. }))
    }

    /// Whether a batch must stop instead of moving on to the next file
    pub fn aborts_batch(&self) -> bool {
        matches!(
            self,
            Self::Executor(ExecutorError::ToolUnavailable { .. })
                | Self::Executor(ExecutorError::WorkerFailed { .. })
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Executor(ExecutorError::ToolUnavailable { tool, .. }) => {
                format!("'{}' is not installed or not on PATH. Install FFmpeg and try again.", tool)
            }
            Self::Output(OutputError::OutputExists { path }) => {
                format!("Output file '{}' already exists. Re-run with --overwrite to replace it.", path)
            }
            Self::Graph(GraphError::MissingBandStatistics) => {
                "Dynamic EQ needs a band analysis first; disable it or analyze the file.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_unavailable_aborts_batch() {
        let err: MasteringError = ExecutorError::ToolUnavailable {
            tool: "ffmpeg".to_string(),
            reason: "not found".to_string(),
        }
        .into();
        assert!(err.aborts_batch());
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("ffmpeg"));
    }

    #[test]
    fn test_executor_failure_is_per_file() {
        let err: MasteringError = ExecutorError::Failed {
            tool: "ffmpeg".to_string(),
            stage: "measure".to_string(),
            code: Some(1),
            stderr: "Invalid data found".to_string(),
        }
        .into();
        assert!(!err.aborts_batch());
        assert!(err.to_string().contains("Invalid data found"));
    }

    #[test]
    fn test_output_exists_is_recoverable() {
        let err: MasteringError = OutputError::OutputExists { path: "out.wav".to_string() }.into();
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("--overwrite"));
    }
}
