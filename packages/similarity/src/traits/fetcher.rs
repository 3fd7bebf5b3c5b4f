//! Fetcher trait and URL security screening.
//!
//! The pipeline never talks to the network directly; it goes through the
//! [`Fetcher`] boundary so tests can substitute canned responses
//! (see [`crate::testing::MockFetcher`]).

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult, SecurityError, SecurityResult};

/// One fetched HTTP response.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Status of the final response after redirects
    pub status: u16,

    /// Final URL after redirect following
    pub final_url: String,

    /// Content-Type header, if provided
    pub content_type: Option<String>,

    /// Response body bytes (HTML pages and image payloads alike)
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Whether the Content-Type marks an HTML document. A missing header
    /// is treated as HTML, matching what small sites actually serve.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(ct) => {
                let mime = ct.split(';').next().unwrap_or("").trim().to_lowercase();
                mime == "text/html" || mime == "application/xhtml+xml"
            }
        }
    }
}

/// Fetch collaborator: HTTP(S) with redirect following assumed.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one URL with a per-request timeout.
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedResponse>;
}

/// Fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    /// Create a fetcher with its own connection pool. Each crawl target
    /// gets its own `HttpFetcher` so the two site crawls never share
    /// connections.
    pub fn new(user_agent: impl Into<String>) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("client construction failed: {e}"),
            })?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }

    fn classify(url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout { url: url.into() }
        } else if err.is_connect() {
            FetchError::Connect {
                url: url.into(),
                message: err.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.into(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult<FetchedResponse> {
        debug!(url = %url, "fetch starting");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "fetch failed");
                Self::classify(url, e)
            })?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.into(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::classify(url, e))?
            .to_vec();

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "fetch complete");

        Ok(FetchedResponse {
            status: status.as_u16(),
            final_url,
            content_type,
            body,
        })
    }
}

/// Security screen applied to root URLs before a crawl begins.
///
/// Blocks the obvious SSRF targets: non-HTTP(S) schemes, loopback,
/// private and link-local ranges.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    blocked_cidrs: Vec<ipnet::IpNet>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlValidator {
    pub fn new() -> Self {
        Self {
            blocked_cidrs: vec![
                "10.0.0.0/8".parse().unwrap(),
                "172.16.0.0/12".parse().unwrap(),
                "192.168.0.0/16".parse().unwrap(),
                "169.254.0.0/16".parse().unwrap(),
                "127.0.0.0/8".parse().unwrap(),
                "::1/128".parse().unwrap(),
                "fc00::/7".parse().unwrap(),
                "fe80::/10".parse().unwrap(),
            ],
        }
    }

    /// Validate a URL for safety.
    pub fn validate(&self, url: &str) -> SecurityResult<()> {
        let parsed = url::Url::parse(url)?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(SecurityError::DisallowedScheme(parsed.scheme().to_string()));
        }

        let host = parsed.host_str().ok_or(SecurityError::NoHost)?;

        if matches!(host, "localhost" | "0.0.0.0") {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }

        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            for cidr in &self.blocked_cidrs {
                if cidr.contains(&ip) {
                    return Err(SecurityError::BlockedCidr(ip.to_string()));
                }
            }
        }

        Ok(())
    }
}
