use crate::model::{RawFormat, VideoMetadata};

/// The two classified format lists derived from one video's metadata.
///
/// Both sequences keep the reverse of the tool's own ordering and are never
/// re-sorted afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub video_formats: Vec<RawFormat>,
    pub audio_formats: Vec<RawFormat>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.video_formats.is_empty() && self.audio_formats.is_empty()
    }
}

/// Splits a video's formats into video-capable and audio-only buckets.
///
/// Absent metadata yields an empty catalog. A format with a real video codec
/// is always video, even without audio; formats with neither codec that are
/// not labelled "audio only" are dropped.
pub fn build_catalog(video: Option<&VideoMetadata>) -> Catalog {
    let mut catalog = Catalog::default();
    let Some(video) = video else {
        return catalog;
    };

    for format in video.formats.iter().rev() {
        if format.has_video() {
            catalog.video_formats.push(format.clone());
        } else if format.has_audio() || format.is_audio_only_label() {
            catalog.audio_formats.push(format.clone());
        }
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, vcodec: &str, acodec: &str, resolution: &str) -> RawFormat {
        RawFormat {
            format_id: id.into(),
            ext: "mp4".into(),
            vcodec: Some(vcodec.into()),
            acodec: Some(acodec.into()),
            resolution: Some(resolution.into()),
            ..Default::default()
        }
    }

    fn metadata(formats: Vec<RawFormat>) -> VideoMetadata {
        VideoMetadata {
            title: "clip".into(),
            formats,
            ..Default::default()
        }
    }

    #[test]
    fn missing_metadata_gives_empty_catalog() {
        assert!(build_catalog(None).is_empty());
    }

    #[test]
    fn video_codec_wins_even_without_audio() {
        let video = metadata(vec![
            format("137", "avc1", "none", "1920x1080"),
            format("22", "avc1", "mp4a", "1280x720"),
        ]);
        let catalog = build_catalog(Some(&video));
        assert_eq!(catalog.video_formats.len(), 2);
        assert!(catalog.audio_formats.is_empty());
    }

    #[test]
    fn audio_only_label_counts_as_audio() {
        let video = metadata(vec![
            format("140", "none", "mp4a", "1x1"),
            format("251", "none", "none", "audio only"),
        ]);
        let catalog = build_catalog(Some(&video));
        let ids: Vec<_> = catalog.audio_formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, ["251", "140"]);
    }

    #[test]
    fn codecless_formats_are_discarded() {
        let video = metadata(vec![
            format("sb0", "none", "none", "48x27"),
            RawFormat {
                format_id: "mhtml".into(),
                ..Default::default()
            },
        ]);
        assert!(build_catalog(Some(&video)).is_empty());
    }

    #[test]
    fn order_is_reversed_from_input() {
        let video = metadata(vec![
            format("a", "vp9", "none", "640x360"),
            format("b", "vp9", "none", "1280x720"),
            format("c", "vp9", "none", "1920x1080"),
        ]);
        let catalog = build_catalog(Some(&video));
        let ids: Vec<_> = catalog.video_formats.iter().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }
}
