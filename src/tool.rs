use crate::config::Config;
use crate::error::{AppError, Result};
use crate::model::{PlaylistListing, VideoMetadata};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};
use yt_dlp::fetcher::deps::Libraries;
use yt_dlp::Youtube;

/// Boundary to the external media tool.
///
/// The reconciler and the downloader only talk to the tool through this
/// trait, so the engine can be driven by an in-memory fake in tests.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Resolves a playlist URL to the URLs of its videos, in playlist order.
    async fn list_playlist(&self, url: &str) -> Result<Vec<String>>;

    /// Dumps the metadata of a single video, formats sorted best-first by the tool.
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata>;

    /// Downloads one video and returns the path of the resulting file.
    async fn download(&self, url: &str, plan: &DownloadPlan) -> Result<PathBuf>;
}

/// Everything a single download invocation needs besides the URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadPlan {
    pub selector: String,
    pub destination: PathBuf,
    pub output_template: String,
    /// Container to re-encode into after download, if any.
    pub recode: Option<String>,
}

/// `yt-dlp` driven as a subprocess.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Uses the configured binary, or provisions one into the libraries directory.
    ///
    /// # Details
    /// Checks for existing yt-dlp and ffmpeg binaries. If not found,
    /// downloads new ones. Otherwise, uses existing binaries and updates the downloader.
    #[instrument(skip(config))]
    pub async fn from_config(config: &Config) -> Result<Self> {
        if let Some(path) = &config.ytdlp_path {
            return Ok(Self::new(path.clone()));
        }

        tokio::fs::create_dir_all(&config.libraries_dir).await?;
        let yt_dlp = config.libraries_dir.join("yt-dlp");
        let ffmpeg = config.libraries_dir.join("ffmpeg");

        if !yt_dlp.exists() || !ffmpeg.exists() {
            debug!(dir = ?config.libraries_dir, "Installing yt-dlp and ffmpeg");
            Youtube::with_new_binaries(config.libraries_dir.clone(), config.output_dir.clone())
                .await?;
        } else {
            let libraries = Libraries::new(yt_dlp.clone(), ffmpeg);
            let youtube = Youtube::new(libraries, config.output_dir.clone())?;
            youtube.update_downloader().await?;
        }

        Ok(Self::new(yt_dlp))
    }

    async fn run(&self, args: Vec<OsString>, url: &str) -> Result<String> {
        debug!(binary = ?self.binary, ?args, "Running media tool");
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("Video unavailable") {
                return Err(AppError::Unavailable(url.to_string()));
            }
            return Err(AppError::Tool {
                status: output.status,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    #[instrument(skip(self))]
    async fn list_playlist(&self, url: &str) -> Result<Vec<String>> {
        let stdout = self.run(listing_args(url), url).await?;
        let listing: PlaylistListing = serde_json::from_str(&stdout)?;
        Ok(listing.video_urls())
    }

    #[instrument(skip(self))]
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let stdout = self.run(metadata_args(url), url).await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    #[instrument(skip(self, plan), fields(selector = %plan.selector))]
    async fn download(&self, url: &str, plan: &DownloadPlan) -> Result<PathBuf> {
        let stdout = self.run(download_args(url, plan), url).await?;
        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| AppError::Custom(format!("No output file reported for {}", url)))?;
        Ok(PathBuf::from(path))
    }
}

fn listing_args(url: &str) -> Vec<OsString> {
    ["--flat-playlist", "--dump-single-json", "--no-warnings", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn metadata_args(url: &str) -> Vec<OsString> {
    [
        "--dump-json",
        "--no-playlist",
        "--no-warnings",
        "--format-sort=resolution,ext,tbr",
        url,
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

fn download_args(url: &str, plan: &DownloadPlan) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-P".into(),
        plan.destination.clone().into_os_string(),
        "-f".into(),
        plan.selector.clone().into(),
        "-o".into(),
        plan.output_template.clone().into(),
        "--print".into(),
        "after_move:filepath".into(),
        "--no-progress".into(),
        "--no-playlist".into(),
    ];
    if let Some(ext) = &plan.recode {
        args.push("--recode-video".into());
        args.push(ext.into());
    }
    args.push(url.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(recode: Option<&str>) -> DownloadPlan {
        DownloadPlan {
            selector: "(ba / a)".into(),
            destination: PathBuf::from("out"),
            output_template: "%(title)s.%(ext)s".into(),
            recode: recode.map(String::from),
        }
    }

    #[test]
    fn download_args_end_with_url() {
        let args = download_args("https://example.com/v", &plan(None));
        assert_eq!(args.last().unwrap(), "https://example.com/v");
        assert!(!args.iter().any(|a| a == "--recode-video"));

        let selector_at = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[selector_at + 1], "(ba / a)");
    }

    #[test]
    fn recode_target_is_forwarded() {
        let args = download_args("https://example.com/v", &plan(Some("mkv")));
        let at = args.iter().position(|a| a == "--recode-video").unwrap();
        assert_eq!(args[at + 1], "mkv");
    }

    #[test]
    fn metadata_is_sorted_by_the_tool() {
        let args = metadata_args("https://example.com/v");
        assert!(args.iter().any(|a| a == "--format-sort=resolution,ext,tbr"));
        assert!(args.iter().any(|a| a == "--dump-json"));
    }

    #[tokio::test]
    async fn missing_binary_is_an_io_error() {
        let tool = YtDlp::new("/nonexistent/yt-dlp-binary");
        let err = tool.fetch_metadata("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    /// Writes an executable `sh` script standing in for the yt-dlp binary.
    #[cfg(unix)]
    fn script(dir: &std::path::Path, body: &str) -> YtDlp {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{}", body).unwrap();
        file.sync_all().unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        YtDlp::new(path)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unavailable_video_is_recognized_from_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(
            dir.path(),
            "echo 'ERROR: [youtube] x: Video unavailable' >&2\nexit 1",
        );

        let err = tool.fetch_metadata("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, AppError::Unavailable(url) if url == "https://example.com/v"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn other_failures_keep_status_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echo boom >&2\nexit 2");

        let err = tool.list_playlist("https://example.com/p").await.unwrap_err();
        match err {
            AppError::Tool { status, stderr } => {
                assert_eq!(status.code(), Some(2));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn garbled_metadata_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echo not-json");

        let err = tool.fetch_metadata("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn download_reports_last_printed_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "echo '[info] x'\necho /tmp/a.mp4\necho");

        let path = tool.download("https://example.com/v", &plan(None)).await.unwrap();
        assert_eq!(path, PathBuf::from("/tmp/a.mp4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_download_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = script(dir.path(), "exit 0");

        let err = tool.download("https://example.com/v", &plan(None)).await.unwrap_err();
        assert!(matches!(err, AppError::Custom(_)));
    }
}
