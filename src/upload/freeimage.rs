//! FreeImage.host uploads
//!
//! The image travels base64-encoded in a form post; the public URL comes
//! back at `image.url` in the JSON reply.

use crate::analysis::traits::ImageHost;
use crate::error::{RelprepError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Public upload endpoint
pub const DEFAULT_ENDPOINT: &str = "https://freeimage.host/api/1/upload";

/// Whole-request timeout; spectrogram PNGs are a few hundred KB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct UploadResponse {
    image: Option<UploadedImage>,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    url: Option<String>,
}

/// Image host client for FreeImage.host
#[derive(Debug, Clone)]
pub struct FreeImageHost {
    api_key: String,
    endpoint: String,
}

impl FreeImageHost {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different upload URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl ImageHost for FreeImageHost {
    fn upload(&self, image: &Path) -> Result<String> {
        let bytes = std::fs::read(image)
            .map_err(|e| RelprepError::render_error(image, format!("Failed to read image: {}", e)))?;
        let source = STANDARD.encode(&bytes);

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RelprepError::render_error(image, format!("Failed to build HTTP client: {}", e)))?;

        debug!("Uploading {} ({} bytes) to {}", image.display(), bytes.len(), self.endpoint);

        let params = [
            ("key", self.api_key.as_str()),
            ("action", "upload"),
            ("source", source.as_str()),
            ("format", "json"),
        ];
        let response = client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .map_err(|e| RelprepError::render_error(image, format!("Upload failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RelprepError::render_error(image, format!("Failed to read upload response: {}", e)))?;

        if !status.is_success() {
            return Err(RelprepError::render_error(
                image,
                format!("Upload rejected with status {}: {}", status, truncate(&body, 200)),
            ));
        }

        parse_upload_response(&body)
            .ok_or_else(|| RelprepError::render_error(image, "upload response has no image.url"))
    }

    fn name(&self) -> &'static str {
        "freeimage.host"
    }
}

/// Pull `image.url` out of a JSON reply
fn parse_upload_response(body: &str) -> Option<String> {
    let response: UploadResponse = serde_json::from_str(body).ok()?;
    response
        .image?
        .url
        .filter(|url| !url.trim().is_empty())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_response() {
        let body = r#"{"status_code":200,"image":{"name":"x","url":"https://iili.io/x.png","size":1}}"#;
        assert_eq!(parse_upload_response(body).as_deref(), Some("https://iili.io/x.png"));
    }

    #[test]
    fn test_parse_missing_url() {
        assert_eq!(parse_upload_response(r#"{"image":{"name":"x"}}"#), None);
        assert_eq!(parse_upload_response(r#"{"status_code":400}"#), None);
        assert_eq!(parse_upload_response(r#"{"image":{"url":"  "}}"#), None);
        assert_eq!(parse_upload_response("<html>"), None);
    }

    #[test]
    fn test_missing_image_file_is_render_error() {
        let host = FreeImageHost::new("key").with_endpoint("http://127.0.0.1:9/upload");
        let err = host.upload(Path::new("/nonexistent/plot.png")).unwrap_err();
        assert!(matches!(err, RelprepError::RenderError { .. }));
    }

    #[test]
    fn test_unreachable_endpoint_is_render_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let image = dir.path().join("plot.png");
        std::fs::write(&image, b"png").unwrap();

        let host = FreeImageHost::new("key").with_endpoint("http://127.0.0.1:9/upload");
        let err = host.upload(&image).unwrap_err();
        assert!(matches!(err, RelprepError::RenderError { .. }));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
