use crate::error::{AppError, Result};
use url::Url;

/// Checks a user-supplied URL before any external call is made.
///
/// Surrounding whitespace is ignored; inner whitespace and non-http(s)
/// schemes are rejected.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("empty URL".into()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidUrl(format!("URLs cannot contain spaces: {}", trimmed)));
    }

    let url = Url::parse(trimmed)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

/// A URL names a playlist when its query carries a non-empty `list` parameter.
pub fn is_playlist(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, value)| key == "list" && !value.is_empty())
}
