use crate::model::{MediaKind, QualityTier, RawFormat};

/// Input for [`build_selector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRequest {
    pub kind: MediaKind,
    /// Height for video, bitrate in kbps for audio.
    pub target: QualityTier,
    pub extension: String,
    /// The requested stream already carries audio, so no audio merge is needed.
    pub has_own_audio: bool,
}

/// Builds a fallback selector expression for the media tool.
///
/// Alternatives are evaluated left to right by the tool and the first one
/// that matches wins. Video degrades from exact height-and-extension, to
/// height only, to anything at or below the height, and finally to best or
/// worst available. Audio degrades from bitrate-and-extension to any audio.
pub fn build_selector(request: &SelectorRequest) -> String {
    match request.kind {
        MediaKind::Video => video_selector(request),
        MediaKind::Audio => audio_selector(request),
    }
}

fn video_selector(request: &SelectorRequest) -> String {
    let at_most = format!("[height<={}]", request.target);
    let below = format!("[height<{}]", request.target);
    let ext = format!("[ext={}]", request.extension);

    let mut layers = if request.has_own_audio {
        vec![
            format!("b{at_most}{ext}"),
            format!("b{at_most}"),
        ]
    } else {
        vec![
            format!("bv*{at_most}{ext}+ba/b{at_most}{ext}"),
            format!("bv*{at_most}+ba/b{at_most}"),
        ]
    };
    layers.push(format!("b{at_most}"));
    layers.push(format!("b{below}/w{at_most}"));
    layers.push("b/w".to_string());
    layers.dedup();

    group(&layers)
}

fn audio_selector(request: &SelectorRequest) -> String {
    let at_most = format!("[abr<={}]", request.target);
    let layers = [
        format!("ba{at_most}[ext={}]", request.extension),
        format!("ba{at_most}"),
        "ba".to_string(),
        "a".to_string(),
    ];
    format!("({})", layers.join(" / "))
}

fn group(layers: &[String]) -> String {
    let inner: Vec<String> = layers.iter().map(|layer| format!("({layer})")).collect();
    format!("({})", inner.join(" / "))
}

/// Selector for one concrete format picked from a single video's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub selector: String,
    /// Container the download is re-encoded into.
    pub recode: Option<String>,
}

/// Requests exactly `format`, merging the best audio only when it has none of its own.
pub fn concrete_selector(format: &RawFormat) -> FormatChoice {
    let audio = if format.has_audio() { "" } else { "+bestaudio" };
    FormatChoice {
        selector: format!("{}{}", format.format_id, audio),
        recode: Some(format.ext.clone()).filter(|ext| !ext.is_empty()),
    }
}
