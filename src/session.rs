//! The two interactive flows: a whole playlist at one quality, or one video
//! in one concrete format.
//!
//! Prompts read synchronously from the prompter's input. They only run
//! between the async phases (after reconciliation, before downloads), so no
//! fetch or download is waiting on the runtime while a question is open.

use crate::catalog::build_catalog;
use crate::config::Config;
use crate::downloader::{summarize, DownloadOutcome, Downloader};
use crate::error::Result;
use crate::model::format_duration;
use crate::prompt::{choose_extension, choose_format, choose_media_kind, choose_tier, Prompter};
use crate::reconcile::Reconciler;
use crate::selector::{build_selector, concrete_selector, SelectorRequest};
use crate::tool::{DownloadPlan, MediaTool};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// How a flow ended without an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// The playlist listed no videos, or could not be listed at all.
    NoVideos,
    /// Every metadata fetch failed.
    NothingAnalyzed,
    /// Nothing on the quality ladders was offered.
    NoFormats,
    /// Downloads ran; one outcome per video, in input order.
    Downloaded(Vec<DownloadOutcome>),
}

/// Downloads every video of a playlist at one chosen quality.
///
/// # Processing Steps
/// 1. Lists the playlist's video URLs
/// 2. Reconciles their formats into availability tables
/// 3. Asks for media type, quality and container
/// 4. Downloads all videos with the resulting fallback selector
///
/// An empty playlist, no analyzable video, or no offered format ends the
/// flow with a message rather than an error.
pub async fn process_playlist<R: BufRead, W: Write>(
    tool: Arc<dyn MediaTool>,
    config: Config,
    url: &Url,
    destination: PathBuf,
    recode: Option<String>,
    prompter: &mut Prompter<R, W>,
) -> Result<SessionEnd> {
    let urls = match tool.list_playlist(url.as_str()).await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(%url, error = %e, "Could not list playlist");
            Vec::new()
        }
    };
    if urls.is_empty() {
        println!("No videos found in the playlist.");
        return Ok(SessionEnd::NoVideos);
    }
    println!("{} videos found.", urls.len());

    let reconciliation = Reconciler::new(Arc::clone(&tool), &config)
        .reconcile(&urls)
        .await;
    if reconciliation.analyzed == 0 {
        println!("None of the videos could be analyzed.");
        return Ok(SessionEnd::NothingAnalyzed);
    }

    let Some(kind) = choose_media_kind(prompter, &reconciliation.tables)? else {
        println!("No common formats were found.");
        return Ok(SessionEnd::NoFormats);
    };
    let table = reconciliation.tables.get(kind);
    let tier = choose_tier(prompter, table)?;
    let extension = choose_extension(prompter, table, tier)?;
    if !table.is_common(tier, &extension) {
        println!(
            "{} at {} is offered by {}/{} videos; the others will fall back to the closest match.",
            extension,
            kind.tier_label(tier),
            table.coverage(tier, &extension),
            table.videos()
        );
    }

    let selector = build_selector(&SelectorRequest {
        kind,
        target: tier,
        extension,
        has_own_audio: false,
    });
    info!(%selector, "Selector built");

    let plan = DownloadPlan {
        selector,
        destination,
        output_template: config.output_template.clone(),
        recode,
    };
    println!("\nDownloading {} videos...", urls.len());
    let outcomes = Downloader::new(tool, config).download_all(&urls, &plan).await;

    let summary = summarize(&outcomes);
    if summary.failed == 0 {
        println!("\nAll downloads finished!");
    } else {
        println!(
            "\nDownloads finished: {} succeeded, {} failed.",
            summary.succeeded, summary.failed
        );
    }
    Ok(SessionEnd::Downloaded(outcomes))
}

/// Downloads one video in a format picked from its own catalog.
///
/// Unlike playlist mode, a failed metadata fetch or a failed download is a
/// hard error.
pub async fn process_video<R: BufRead, W: Write>(
    tool: Arc<dyn MediaTool>,
    config: Config,
    url: &Url,
    destination: PathBuf,
    prompter: &mut Prompter<R, W>,
) -> Result<SessionEnd> {
    let video = tool.fetch_metadata(url.as_str()).await?;
    println!("Title: {}", video.title);
    if let Some(duration) = video.duration {
        println!("Duration: {}", format_duration(duration));
    }
    if let Some(live_status) = video.live_status.as_deref().filter(|s| *s != "not_live") {
        println!("Live status: {}", live_status);
    }

    let catalog = build_catalog(Some(&video));
    if catalog.is_empty() {
        println!("No downloadable formats were found for this video.");
        return Ok(SessionEnd::NoFormats);
    }

    let format = choose_format(prompter, &catalog)?;
    let choice = concrete_selector(format);
    info!(selector = %choice.selector, "Format chosen");

    let plan = DownloadPlan {
        selector: choice.selector,
        destination,
        output_template: config.output_template.clone(),
        recode: choice.recode,
    };
    let outcomes = Downloader::new(tool, config)
        .download_all(&[url.to_string()], &plan)
        .await;

    if summarize(&outcomes).failed > 0 {
        return Err("Download failed".into());
    }
    Ok(SessionEnd::Downloaded(outcomes))
}
