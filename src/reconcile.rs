use crate::catalog::{build_catalog, Catalog};
use crate::config::Config;
use crate::model::{MediaKind, QualityTier, AUDIO_BITRATES};
use crate::tool::MediaTool;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Per-tier extensions obtainable across a set of analyzed videos.
///
/// A tier/extension pair is offered as soon as one analyzed video offers it.
/// The number of videos offering each pair is kept alongside, so callers can
/// tell a truly common choice from one only part of the playlist supports.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityTable {
    kind: MediaKind,
    videos: usize,
    tiers: BTreeMap<QualityTier, BTreeMap<String, usize>>,
}

impl AvailabilityTable {
    /// Every ladder tier starts out with no extension.
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            videos: 0,
            tiers: kind.ladder().iter().map(|&tier| (tier, BTreeMap::new())).collect(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Number of videos folded into this table.
    pub fn videos(&self) -> usize {
        self.videos
    }

    /// Folds the tier/extension pairs of one video into the table.
    fn add_video(&mut self, offered: BTreeSet<(QualityTier, String)>) {
        self.videos += 1;
        for (tier, ext) in offered {
            if let Some(extensions) = self.tiers.get_mut(&tier) {
                *extensions.entry(ext).or_insert(0) += 1;
            }
        }
    }

    /// Extensions offered at `tier`, alphabetically; empty for unknown tiers.
    pub fn extensions(&self, tier: QualityTier) -> Vec<&str> {
        self.tiers
            .get(&tier)
            .map(|extensions| extensions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// How many analyzed videos offer `ext` at `tier`.
    pub fn coverage(&self, tier: QualityTier, ext: &str) -> usize {
        self.tiers
            .get(&tier)
            .and_then(|extensions| extensions.get(ext))
            .copied()
            .unwrap_or(0)
    }

    /// True when every analyzed video offers `ext` at `tier`.
    pub fn is_common(&self, tier: QualityTier, ext: &str) -> bool {
        self.videos > 0 && self.coverage(tier, ext) == self.videos
    }

    /// Tiers with at least one extension, highest quality first.
    pub fn offered_tiers(&self) -> Vec<QualityTier> {
        self.tiers
            .iter()
            .rev()
            .filter(|(_, extensions)| !extensions.is_empty())
            .map(|(&tier, _)| tier)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.values().all(BTreeMap::is_empty)
    }
}

/// One table per media kind.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityTables {
    pub video: AvailabilityTable,
    pub audio: AvailabilityTable,
}

impl AvailabilityTables {
    pub fn empty() -> Self {
        Self {
            video: AvailabilityTable::new(MediaKind::Video),
            audio: AvailabilityTable::new(MediaKind::Audio),
        }
    }

    pub fn get(&self, kind: MediaKind) -> &AvailabilityTable {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }

    /// Builds both tables from per-video catalogs.
    ///
    /// Video formats count only when their height is exactly a ladder tier.
    /// Audio formats always land on the nearest bitrate tier.
    pub fn from_catalogs<'a>(catalogs: impl IntoIterator<Item = &'a Catalog>) -> Self {
        let mut tables = Self::empty();

        for catalog in catalogs {
            let video = catalog
                .video_formats
                .iter()
                .filter_map(|format| {
                    let height = format.height?;
                    MediaKind::Video
                        .ladder()
                        .contains(&height)
                        .then(|| (height, format.ext.clone()))
                })
                .collect();
            tables.video.add_video(video);

            let audio = catalog
                .audio_formats
                .iter()
                .map(|format| {
                    let tier = nearest_bitrate(format.abr.or(format.tbr));
                    (tier, format.ext.clone())
                })
                .collect();
            tables.audio.add_video(audio);
        }

        tables
    }
}

/// Nearest audio tier to `abr`; ties go to the tier seen first in ladder order.
///
/// Formats with no known bitrate map to the lowest tier.
pub fn nearest_bitrate(abr: Option<f64>) -> QualityTier {
    let Some(abr) = abr.filter(|value| value.is_finite()) else {
        return AUDIO_BITRATES[0];
    };

    let mut best = AUDIO_BITRATES[0];
    for &tier in &AUDIO_BITRATES[1..] {
        if (f64::from(tier) - abr).abs() < (f64::from(best) - abr).abs() {
            best = tier;
        }
    }
    best
}

/// Result of analyzing a whole playlist.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub tables: AvailabilityTables,
    pub analyzed: usize,
    pub failed: usize,
}

/// Fetches every video's metadata and merges the catalogs into availability tables.
pub struct Reconciler {
    tool: Arc<dyn MediaTool>,
    concurrency: usize,
}

impl Reconciler {
    pub fn new(tool: Arc<dyn MediaTool>, config: &Config) -> Self {
        Self {
            tool,
            concurrency: config.concurrent_fetches.max(1),
        }
    }

    /// Analyzes `urls` with at most `concurrent_fetches` metadata requests in flight.
    ///
    /// A failed fetch is counted and the video is left out of the tables;
    /// it never fails the reconciliation.
    #[instrument(skip(self, urls), fields(videos = urls.len()))]
    pub async fn reconcile(&self, urls: &[String]) -> Reconciliation {
        println!("Analyzing {} videos...", urls.len());

        let mut results = std::pin::pin!(stream::iter(urls)
            .map(|url| {
                let tool = Arc::clone(&self.tool);
                async move {
                    match tool.fetch_metadata(url).await {
                        Ok(video) => Some(build_catalog(Some(&video))),
                        Err(e) => {
                            warn!(%url, error = %e, "Could not analyze video");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency));

        let mut catalogs = Vec::with_capacity(urls.len());
        let mut failed = 0;
        while let Some(result) = results.next().await {
            match result {
                Some(catalog) => catalogs.push(catalog),
                None => failed += 1,
            }
            println!(
                "Analyzed {}/{} videos ({} failed)",
                catalogs.len() + failed,
                urls.len(),
                failed
            );
        }

        if failed == 0 {
            println!("All videos were analyzed successfully.");
        } else {
            println!("{} video(s) not found or failed during analysis.", failed);
        }
        info!(analyzed = catalogs.len(), failed, "Reconciliation finished");

        Reconciliation {
            tables: AvailabilityTables::from_catalogs(&catalogs),
            analyzed: catalogs.len(),
            failed,
        }
    }
}
