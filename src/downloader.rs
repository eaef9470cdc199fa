use crate::progress::DownloadProgress;
use crate::tool::{DownloadPlan, MediaTool};
use crate::{config::Config, error::Result};
use futures::future::join_all;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, instrument, warn};

/// Result of downloading one video.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Succeeded { url: String, path: PathBuf },
    Failed { url: String, error: String },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Succeeded { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            DownloadOutcome::Succeeded { url, .. } | DownloadOutcome::Failed { url, .. } => url,
        }
    }
}

/// Succeeded/failed tally of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub fn summarize(outcomes: &[DownloadOutcome]) -> BatchSummary {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    BatchSummary {
        succeeded,
        failed: outcomes.len() - succeeded,
    }
}

/// A downloader that runs one tool invocation per video, concurrently
///
/// # Fields
/// * `tool` - The external media tool
/// * `semaphore` - Controls concurrent download limits
/// * `config` - Application configuration settings
/// * `active_downloads` - Counter for currently active downloads
pub struct Downloader {
    tool: Arc<dyn MediaTool>,
    semaphore: Arc<Semaphore>,
    config: Arc<Config>,
    active_downloads: Arc<AtomicUsize>,
}

impl Downloader {
    /// Creates a new `Downloader` sharing `tool`, capped at `concurrent_downloads`
    pub fn new(tool: Arc<dyn MediaTool>, config: Config) -> Self {
        Self {
            tool,
            semaphore: Arc::new(Semaphore::new(config.concurrent_downloads.max(1))),
            config: Arc::new(config),
            active_downloads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Downloads a single video once a slot is free
    #[instrument(skip(self, plan))]
    async fn download_video(&self, url: &str, index: usize, plan: &DownloadPlan) -> Result<PathBuf> {
        let _permit = self.semaphore.acquire().await?;
        let _active = DownloadGuard::new(&self.active_downloads);
        println!("Starting download for video {}", index + 1);

        self.tool.download(url, plan).await
    }

    /// Downloads every URL with `plan`, returning one outcome per URL in input order
    ///
    /// # Details
    /// * At most `concurrent_downloads` downloads run at once
    /// * A failed download is recorded and never stops the others
    /// * Returns only after every download has settled
    pub async fn download_all(&self, urls: &[String], plan: &DownloadPlan) -> Vec<DownloadOutcome> {
        let total_videos = urls.len();
        println!("Found {} videos to download", total_videos);
        let progress = Arc::new(Mutex::new(DownloadProgress::new(total_videos)));

        let tasks = urls.iter().enumerate().map(|(index, url)| {
            let progress = Arc::clone(&progress);

            async move {
                let start = std::time::Instant::now();
                let result = self.download_video(url, index, plan).await;
                let duration = start.elapsed();

                let mut progress_guard = progress.lock().await;
                let outcome = match result {
                    Ok(path) => {
                        println!(
                            "Video {} completed in {:.1}s: {}",
                            index + 1,
                            duration.as_secs_f64(),
                            path.display()
                        );
                        DownloadOutcome::Succeeded {
                            url: url.clone(),
                            path,
                        }
                    }
                    Err(e) => {
                        let error_msg = e.to_string();
                        warn!(%url, error = %error_msg, "Download failed");
                        eprintln!("Failed to download video {}: {}", index + 1, error_msg);
                        progress_guard.record_failure(url, error_msg.clone());
                        DownloadOutcome::Failed {
                            url: url.clone(),
                            error: error_msg,
                        }
                    }
                };
                progress_guard.update(outcome.is_success());
                outcome
            }
        });

        // join_all yields results in input order regardless of completion order.
        let outcomes = join_all(tasks).await;

        let final_progress = progress.lock().await;
        println!("\nDownload Summary:");
        println!(
            "Total time: {:.1}s",
            final_progress.start_time.elapsed().as_secs_f64()
        );
        println!("Successfully downloaded: {}", final_progress.succeeded());
        println!("Failed downloads: {}", final_progress.errors);
        info!(
            succeeded = final_progress.succeeded(),
            failed = final_progress.errors,
            "Batch finished"
        );

        if self.config.failure_report {
            match final_progress.export_failures(&plan.destination) {
                Ok(Some(path)) => println!("Failure report written to {}", path.display()),
                Ok(None) => {}
                Err(e) => eprintln!("Failed to export failure report: {}", e),
            }
        }

        outcomes
    }

    pub fn active_downloads(&self) -> usize {
        self.active_downloads.load(Ordering::SeqCst)
    }
}

/// RAII guard for tracking active downloads
///
/// Automatically increments counter on creation and
/// decrements it when dropped
struct DownloadGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> DownloadGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl<'a> Drop for DownloadGuard<'a> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::model::VideoMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Fails URLs containing "fail"; sleeps longer for earlier URLs so they finish last.
    struct SlowTool {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MediaTool for SlowTool {
        async fn list_playlist(&self, _url: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn fetch_metadata(&self, _url: &str) -> Result<VideoMetadata> {
            Err("unused".into())
        }

        async fn download(&self, url: &str, plan: &DownloadPlan) -> Result<PathBuf> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let delay = 50u64.saturating_sub(url.len() as u64 % 50);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("fail") {
                return Err(AppError::Unavailable(url.to_string()));
            }
            Ok(plan.destination.join(format!("{}.mp4", url.len())))
        }
    }

    fn plan(dir: &std::path::Path) -> DownloadPlan {
        DownloadPlan {
            selector: "(b/w)".into(),
            destination: dir.to_path_buf(),
            output_template: "%(title)s.%(ext)s".into(),
            recode: None,
        }
    }

    #[tokio::test]
    async fn respects_concurrency_cap_and_order() {
        let tool = Arc::new(SlowTool {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let config = Config {
            concurrent_downloads: 2,
            failure_report: false,
            ..Config::default()
        };
        let downloader = Downloader::new(tool.clone(), config);
        let dir = tempfile::tempdir().unwrap();

        let urls: Vec<String> = (0..6).map(|i| format!("https://example.com/{}", "x".repeat(i))).collect();
        let outcomes = downloader.download_all(&urls, &plan(dir.path())).await;

        assert_eq!(outcomes.len(), urls.len());
        for (outcome, url) in outcomes.iter().zip(&urls) {
            assert_eq!(outcome.url(), url);
        }
        assert!(tool.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(downloader.active_downloads(), 0);
    }

    #[tokio::test]
    async fn failure_report_lands_in_destination() {
        let tool = Arc::new(SlowTool {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let downloader = Downloader::new(tool, Config::default());
        let dir = tempfile::tempdir().unwrap();

        let urls = vec![
            "https://example.com/ok".to_string(),
            "https://example.com/fail".to_string(),
        ];
        let outcomes = downloader.download_all(&urls, &plan(dir.path())).await;

        assert_eq!(
            summarize(&outcomes),
            BatchSummary {
                succeeded: 1,
                failed: 1
            }
        );
        let report = std::fs::read_to_string(dir.path().join("failed.txt")).unwrap();
        assert!(report.contains("https://example.com/fail"));
    }
}
