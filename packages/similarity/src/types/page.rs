//! Crawl output types: page snapshots and the per-site crawl record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// One fetched page, immutable once produced by the crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// URL the crawler requested
    pub url: String,

    /// Final URL after redirects; used for same-host tests and dedup
    pub final_url: String,

    /// HTTP status of the final response
    pub status: u16,

    /// Raw HTML payload
    pub html: String,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,

    /// Crawl depth, fixed at enqueue time (0 = root)
    pub depth: usize,
}

/// Why a discovered URL produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Request timed out
    Timeout,
    /// Connection could not be established
    Connect,
    /// Non-success HTTP status
    HttpStatus(u16),
    /// URL failed to parse
    InvalidUrl,
    /// Transport-level failure
    Transport,
    /// Response was not an HTML document
    NotHtml,
    /// Redirect landed off the crawl host
    OffHostRedirect,
    /// Redirect landed on an already-visited URL
    RedirectAlreadyVisited,
}

impl SkipReason {
    /// Classify a fetch failure into a reason code.
    pub fn from_fetch(err: &FetchError) -> Self {
        match err {
            FetchError::Timeout { .. } => SkipReason::Timeout,
            FetchError::Connect { .. } => SkipReason::Connect,
            FetchError::Status { status, .. } => SkipReason::HttpStatus(*status),
            FetchError::InvalidUrl { .. } => SkipReason::InvalidUrl,
            FetchError::Transport { .. } => SkipReason::Transport,
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SkipReason::Timeout | SkipReason::Connect | SkipReason::Transport => true,
            SkipReason::HttpStatus(status) => *status >= 500,
            _ => false,
        }
    }

    /// Short code for reports.
    pub fn code(&self) -> String {
        match self {
            SkipReason::Timeout => "timeout".into(),
            SkipReason::Connect => "connect".into(),
            SkipReason::HttpStatus(status) => format!("http_{status}"),
            SkipReason::InvalidUrl => "invalid_url".into(),
            SkipReason::Transport => "transport".into(),
            SkipReason::NotHtml => "not_html".into(),
            SkipReason::OffHostRedirect => "off_host_redirect".into(),
            SkipReason::RedirectAlreadyVisited => "redirect_already_visited".into(),
        }
    }
}

/// A URL that was scheduled but yielded no snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: SkipReason,
}

/// Everything one crawl produced for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlOutcome {
    /// Normalized root URL the crawl started from
    pub root_url: String,

    /// Snapshots in completion order (need not match discovery order
    /// under concurrent fetch)
    pub snapshots: Vec<PageSnapshot>,

    /// URLs that were scheduled but produced no snapshot
    pub skipped: Vec<SkippedUrl>,

    /// Off-host links discovered but never fetched
    pub offsite: Vec<String>,

    /// Whether the crawl stopped because its deadline expired
    pub deadline_hit: bool,
}

impl CrawlOutcome {
    /// Number of snapshots produced.
    pub fn page_count(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_codes_are_stable() {
        assert_eq!(SkipReason::HttpStatus(503).code(), "http_503");
        assert_eq!(SkipReason::OffHostRedirect.code(), "off_host_redirect");
    }

    #[test]
    fn skip_reason_transience_follows_fetch_taxonomy() {
        assert!(SkipReason::Timeout.is_transient());
        assert!(SkipReason::HttpStatus(500).is_transient());
        assert!(!SkipReason::HttpStatus(404).is_transient());
        assert!(!SkipReason::NotHtml.is_transient());
    }
}
