//! Testing utilities including mock implementations.
//!
//! Useful for exercising the pipeline without network access: canned
//! responses per URL, injectable failures and latency, and call
//! recording for assertions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::RwLock;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedResponse, Fetcher};

#[derive(Debug, Clone)]
enum Canned {
    Page { html: String },
    Redirect { final_url: String, html: String },
    Bytes { body: Vec<u8>, content_type: String },
    Status(u16),
    Timeout,
}

/// A fetcher that serves canned responses.
///
/// URLs without a canned response return HTTP 404, so a crawl against the
/// mock always terminates.
#[derive(Default)]
pub struct MockFetcher {
    responses: RwLock<HashMap<String, Canned>>,
    calls: RwLock<Vec<String>>,
    latency: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve an HTML page at a URL.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.responses.write().unwrap().insert(
            url.into(),
            Canned::Page { html: html.into() },
        );
        self
    }

    /// Serve an HTML page whose final URL differs from the requested one.
    pub fn with_redirect(
        self,
        url: impl Into<String>,
        final_url: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        self.responses.write().unwrap().insert(
            url.into(),
            Canned::Redirect {
                final_url: final_url.into(),
                html: html.into(),
            },
        );
        self
    }

    /// Serve raw bytes with a content type (images, PDFs).
    pub fn with_bytes(
        self,
        url: impl Into<String>,
        body: Vec<u8>,
        content_type: impl Into<String>,
    ) -> Self {
        self.responses.write().unwrap().insert(
            url.into(),
            Canned::Bytes {
                body,
                content_type: content_type.into(),
            },
        );
        self
    }

    /// Answer a URL with a non-success status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), Canned::Status(status));
        self
    }

    /// Make a URL time out.
    pub fn with_timeout(self, url: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), Canned::Timeout);
        self
    }

    /// Add a fixed latency to every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult<FetchedResponse> {
        self.calls.write().unwrap().push(url.to_string());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let canned = self.responses.read().unwrap().get(url).cloned();
        match canned {
            Some(Canned::Page { html }) => Ok(FetchedResponse {
                status: 200,
                final_url: url.to_string(),
                content_type: Some("text/html".into()),
                body: html.into_bytes(),
            }),
            Some(Canned::Redirect { final_url, html }) => Ok(FetchedResponse {
                status: 200,
                final_url,
                content_type: Some("text/html".into()),
                body: html.into_bytes(),
            }),
            Some(Canned::Bytes { body, content_type }) => Ok(FetchedResponse {
                status: 200,
                final_url: url.to_string(),
                content_type: Some(content_type),
                body,
            }),
            Some(Canned::Status(status)) => Err(FetchError::Status {
                status,
                url: url.into(),
            }),
            Some(Canned::Timeout) => Err(FetchError::Timeout { url: url.into() }),
            None => Err(FetchError::Status {
                status: 404,
                url: url.into(),
            }),
        }
    }
}

/// Encode a solid-color PNG for image-extraction tests.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    buf
}

/// Encode a half-dark, half-light PNG; hashes to alternating halves
/// rather than all-zero/all-one, which makes distances observable.
pub fn split_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb([10, 10, 10])
        } else {
            image::Rgb([245, 245, 245])
        }
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_canned_pages_and_records_calls() {
        let fetcher = MockFetcher::new().with_page("https://example.com/", "<p>hi</p>");

        let response = fetcher
            .fetch("https://example.com/", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_html());
        assert_eq!(fetcher.calls(), vec!["https://example.com/".to_string()]);
    }

    #[tokio::test]
    async fn unknown_urls_get_404() {
        let fetcher = MockFetcher::new();
        let err = fetcher
            .fetch("https://example.com/missing", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn solid_png_is_decodable() {
        let bytes = solid_png(16, 16, [200, 0, 0]);
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}
