use serde::Deserialize;
use std::fmt;

/// Data shapes produced by the external media tool.
///
/// Only the fields the reconciliation engine reads are modelled; everything
/// else in the tool's JSON is ignored during deserialization.

/// Closed ladder of video heights offered for cross-video comparison.
pub const VIDEO_HEIGHTS: [u32; 4] = [1080, 720, 480, 360];

/// Closed ladder of audio bitrates (kbps) offered for cross-video comparison.
pub const AUDIO_BITRATES: [u32; 6] = [64, 128, 192, 256, 320, 512];

/// Height in pixels for video, bitrate in kbps for audio.
pub type QualityTier = u32;

/// One encoding option for one video.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub resolution: Option<String>,
    pub height: Option<u32>,
    pub tbr: Option<f64>,
    pub abr: Option<f64>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
}

impl RawFormat {
    pub fn has_video(&self) -> bool {
        is_real_codec(self.vcodec.as_deref())
    }

    pub fn has_audio(&self) -> bool {
        is_real_codec(self.acodec.as_deref())
    }

    pub fn is_audio_only_label(&self) -> bool {
        self.resolution.as_deref() == Some("audio only")
    }

    /// One-line description shown when picking a concrete format,
    /// e.g. `1920x1080 | mp4 | 2500 kbps | 12.50 MiB`.
    pub fn title(&self) -> String {
        let size = self.filesize.or(self.filesize_approx);
        [
            self.resolution.clone().unwrap_or_default(),
            self.ext.clone(),
            self.tbr.map(format_bitrate).unwrap_or_default(),
            size.map(format_filesize).unwrap_or_default(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

fn is_real_codec(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != "none")
}

/// Metadata for a single video, as dumped by the tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoMetadata {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub duration: Option<f64>,
    pub live_status: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistEntry {
    pub url: Option<String>,
    pub id: Option<String>,
}

/// Flat listing of a playlist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistListing {
    #[serde(default)]
    pub entries: Vec<PlaylistEntry>,
}

impl PlaylistListing {
    /// Entry URLs in listing order; entries without a URL are skipped.
    pub fn video_urls(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| entry.url.clone())
            .filter(|url| !url.trim().is_empty())
            .collect()
    }
}

/// Which kind of stream the user wants to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Audio];

    pub fn ladder(self) -> &'static [QualityTier] {
        match self {
            MediaKind::Video => &VIDEO_HEIGHTS,
            MediaKind::Audio => &AUDIO_BITRATES,
        }
    }

    pub fn tier_label(self, tier: QualityTier) -> String {
        match self {
            MediaKind::Video => format!("{}p", tier),
            MediaKind::Audio => format!("{} kbps", tier),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "Video"),
            MediaKind::Audio => write!(f, "Audio Only"),
        }
    }
}

pub fn format_bitrate(tbr: f64) -> String {
    format!("{} kbps", tbr.floor() as u64)
}

pub fn format_filesize(size: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes = size as f64;
    if bytes < KIB {
        format!("{} B", size)
    } else if bytes < KIB * KIB {
        format!("{:.2} KiB", bytes / KIB)
    } else if bytes < KIB * KIB * KIB {
        format!("{:.2} MiB", bytes / (KIB * KIB))
    } else {
        format!("{:.2} GiB", bytes / (KIB * KIB * KIB))
    }
}

/// `MM:SS`, or `HH:MM:SS` once the duration reaches an hour.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_none_is_not_real() {
        let format = RawFormat {
            vcodec: Some("none".into()),
            acodec: Some("opus".into()),
            ..Default::default()
        };
        assert!(!format.has_video());
        assert!(format.has_audio());
        assert!(!RawFormat::default().has_audio());
    }

    #[test]
    fn deserializes_tool_json_ignoring_extra_fields() {
        let json = r#"{
            "title": "Clip",
            "duration": 61.5,
            "live_status": "not_live",
            "extractor": "youtube",
            "formats": [
                { "format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2",
                  "resolution": "audio only", "abr": 129.5, "tbr": 129.5, "filesize": 1048576,
                  "protocol": "https" },
                { "format_id": "137", "ext": "mp4", "vcodec": "avc1", "acodec": "none",
                  "resolution": "1920x1080", "height": 1080, "tbr": 2500.7, "filesize_approx": 2048 }
            ]
        }"#;
        let video: VideoMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(video.formats.len(), 2);
        assert_eq!(video.formats[0].abr, Some(129.5));
        assert_eq!(video.formats[1].height, Some(1080));
        assert!(video.formats[0].is_audio_only_label());
    }

    #[test]
    fn title_skips_absent_parts() {
        let format = RawFormat {
            ext: "mp4".into(),
            resolution: Some("1920x1080".into()),
            tbr: Some(2500.7),
            filesize_approx: Some(3 * 1024 * 1024),
            ..Default::default()
        };
        assert_eq!(format.title(), "1920x1080 | mp4 | 2500 kbps | 3.00 MiB");

        let bare = RawFormat { ext: "webm".into(), ..Default::default() };
        assert_eq!(bare.title(), "webm");
    }

    #[test]
    fn human_readable_helpers() {
        assert_eq!(format_filesize(512), "512 B");
        assert_eq!(format_filesize(1536), "1.50 KiB");
        assert_eq!(format_filesize(5 * 1024 * 1024 * 1024), "5.00 GiB");
        assert_eq!(format_duration(75.0), "01:15");
        assert_eq!(format_duration(3725.0), "01:02:05");
    }

    #[test]
    fn listing_keeps_order_and_skips_missing_urls() {
        let json = r#"{ "entries": [
            { "url": "https://example.com/a", "id": "a" },
            { "id": "b" },
            { "url": "https://example.com/c", "id": "c" }
        ] }"#;
        let listing: PlaylistListing = serde_json::from_str(json).unwrap();
        assert_eq!(
            listing.video_urls(),
            vec!["https://example.com/a", "https://example.com/c"]
        );
    }
}
