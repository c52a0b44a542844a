//! Response-shape normalization.
//!
//! The service exposes two endpoints with incompatible contracts: the
//! structured generation endpoint returns `{data:[{url}]}` while the
//! chat-style endpoint returns free text with an embedded markdown image
//! link. Both are reduced to one canonical image URL here so downstream
//! callers treat "got an image" uniformly.

use crate::error::{FluxError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[.*?\]\((https?://[^)]+)\)").unwrap());

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'`<>)\]]+"#).unwrap());

/// Extract the first image URL from a structured generation response.
pub fn first_image_url(response: &Value) -> Result<String> {
    let entry = response
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .ok_or(FluxError::NoImageFound)?;

    let url = entry
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| FluxError::InvalidUrl(entry.to_string()))?;

    if !url.starts_with("http") {
        return Err(FluxError::InvalidUrl(url.to_string()));
    }

    Ok(url.to_string())
}

/// Extract an image URL from a free-text chat response.
///
/// Tries the markdown image pattern `![alt](URL)` first, then falls back
/// to the first standalone http(s) token. The fallback cannot tell a
/// generated-image link apart from a URL the caller embedded in their own
/// prompt; the markdown pattern is always preferred for that reason.
pub fn extract_image_url(text: &str) -> Result<String> {
    if let Some(captures) = MARKDOWN_IMAGE.captures(text) {
        return Ok(captures[1].to_string());
    }

    if let Some(found) = BARE_URL.find(text) {
        return Ok(found.as_str().to_string());
    }

    Err(FluxError::NoImageFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_first_url() {
        let response = json!({"data": [{"url": "https://x/y.png"}, {"url": "https://x/z.png"}]});
        assert_eq!(first_image_url(&response).unwrap(), "https://x/y.png");
    }

    #[test]
    fn structured_empty_data_is_no_image() {
        let response = json!({"data": []});
        assert!(matches!(
            first_image_url(&response),
            Err(FluxError::NoImageFound)
        ));
    }

    #[test]
    fn structured_missing_data_is_no_image() {
        let response = json!({"id": "gen-1"});
        assert!(matches!(
            first_image_url(&response),
            Err(FluxError::NoImageFound)
        ));
    }

    #[test]
    fn structured_non_http_url_is_invalid() {
        let response = json!({"data": [{"url": "ftp://x/y.png"}]});
        assert!(matches!(
            first_image_url(&response),
            Err(FluxError::InvalidUrl(_))
        ));
    }

    #[test]
    fn structured_missing_url_field_is_invalid() {
        let response = json!({"data": [{"b64_json": "…"}]});
        assert!(matches!(
            first_image_url(&response),
            Err(FluxError::InvalidUrl(_))
        ));
    }

    #[test]
    fn markdown_link_is_extracted() {
        let text = "Here you go: ![a](https://x/y.png) more text";
        assert_eq!(extract_image_url(text).unwrap(), "https://x/y.png");
    }

    #[test]
    fn bare_url_fallback() {
        let text = "see https://x/y.png now";
        assert_eq!(extract_image_url(text).unwrap(), "https://x/y.png");
    }

    #[test]
    fn bare_url_stops_at_quote() {
        let text = r#"result: "https://x/y.png" done"#;
        assert_eq!(extract_image_url(text).unwrap(), "https://x/y.png");
    }

    #[test]
    fn markdown_wins_over_earlier_bare_url() {
        let text = "prompt had https://example.com/in.png, output ![img](https://x/out.png)";
        assert_eq!(extract_image_url(text).unwrap(), "https://x/out.png");
    }

    #[test]
    fn no_url_is_no_image() {
        assert!(matches!(
            extract_image_url("sorry, I cannot draw that"),
            Err(FluxError::NoImageFound)
        ));
    }
}
