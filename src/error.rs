use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file missing or unreadable: {0}")]
    MissingInput(PathBuf),

    #[error("Not a {expected} file: {path}")]
    NotImageFormat { path: PathBuf, expected: String },

    #[error("Required tool unavailable: {tool} ({reason})")]
    ToolUnavailable { tool: String, reason: String },

    #[error("{tool} failed with {}: {diagnostic}", exit_code_label(.code))]
    ToolInvocationFailed {
        tool: String,
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("{tool} timed out after {timeout:?}")]
    ToolTimedOut { tool: String, timeout: Duration },

    #[error("Tool reported success but produced no output: {0}")]
    OutputNotProduced(PathBuf),

    #[error("No quality range in [{ladder}] could be reached for {path}")]
    QualityUnreachable { path: PathBuf, ladder: String },

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Invalid quality range: '{0}'. Expected <min>-<max> with 0 <= min <= max <= 100")]
    InvalidQualityRange(String),

    #[error("Quality ladder must contain at least one range")]
    EmptyQualityLadder,

    #[error("Input path is not a directory: {0}")]
    InputNotDirectory(PathBuf),

    #[error("Output directory is the input directory: {0} (use --replace to compress in place)")]
    OutputIsInput(PathBuf),

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
