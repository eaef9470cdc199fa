use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration management for the application.
///
/// Provides centralized configuration options for controlling:
/// - Concurrency caps for metadata fetches and downloads
/// - Directory paths and the output naming template
/// - Which media tool binary to run
/// - How many times an interactive question is asked before giving up

/// Configuration for the playlist downloader.
///
/// Every field has a default, so a configuration file only needs to name
/// the values it changes.
///
/// # Examples
///
/// ```
/// use playlist_dl::Config;
///
/// let config = Config::default();
/// assert!(config.concurrent_downloads > 0);
/// assert!(config.concurrent_fetches > 0);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub concurrent_fetches: usize,
    pub concurrent_downloads: usize,
    pub output_dir: PathBuf,
    pub libraries_dir: PathBuf,
    /// Use this binary as-is instead of provisioning one into `libraries_dir`.
    pub ytdlp_path: Option<PathBuf>,
    pub output_template: String,
    pub max_prompt_attempts: usize,
    pub failure_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrent_fetches: 8,
            concurrent_downloads: 4,
            output_dir: PathBuf::from("."),
            libraries_dir: PathBuf::from("libs"),
            ytdlp_path: None,
            output_template: String::from("%(title)s.%(ext)s"),
            max_prompt_attempts: 5,
            failure_report: true,
        }
    }
}

impl Config {
    /// Loads a JSON configuration file, filling unspecified fields with defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config.normalized())
    }

    /// Overrides both concurrency caps at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.concurrent_fetches = jobs;
        self.concurrent_downloads = jobs;
        self.normalized()
    }

    // A zero cap would deadlock the semaphores.
    fn normalized(mut self) -> Self {
        self.concurrent_fetches = self.concurrent_fetches.max(1);
        self.concurrent_downloads = self.concurrent_downloads.max(1);
        self.max_prompt_attempts = self.max_prompt_attempts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "concurrent_downloads": 2, "output_dir": "videos" }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.concurrent_downloads, 2);
        assert_eq!(config.output_dir, PathBuf::from("videos"));
        assert_eq!(config.concurrent_fetches, Config::default().concurrent_fetches);
        assert_eq!(config.output_template, "%(title)s.%(ext)s");
    }

    #[test]
    fn zero_caps_are_raised_to_one() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "concurrent_fetches": 0, "max_prompt_attempts": 0 }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.concurrent_fetches, 1);
        assert_eq!(config.max_prompt_attempts, 1);

        let config = Config::default().with_jobs(0);
        assert_eq!(config.concurrent_downloads, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }
}
