use std::io;
use std::process::ExitStatus;
use thiserror::Error;
use url;

/// Error types for the application.
///
/// Per-item failures (a single metadata fetch or download) are turned into
/// counts and outcomes by the reconciler and the downloader; only the
/// errors that reach `main` end the run.

/// Represents all possible errors that can occur in the application.
///
/// # Error Categories
///
/// - IO: File system and process spawning
/// - Tool: The external media tool exited with a failure
/// - Parsing: URL and JSON parsing
/// - Youtube: Binary provisioning through the `yt-dlp` crate
/// - Prompt: Interactive input that could not produce a valid answer
/// - Custom: Application-specific errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Media tool failed ({status}): {stderr}")]
    Tool { status: ExitStatus, stderr: String },

    #[error("Video unavailable: {0}")]
    Unavailable(String),

    #[error("Youtube error: {0}")]
    Youtube(#[from] yt_dlp::error::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Worker pool closed: {0}")]
    Semaphore(#[from] tokio::sync::AcquireError),

    #[error("{0}")]
    Custom(String),
}

impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Custom(error.to_string())
    }
}

impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::Custom(error)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
