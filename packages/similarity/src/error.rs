//! Typed errors for the similarity pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Top-level errors surfaced by an audit run.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Configuration rejected before any network activity
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Root URL failed the security screen
    #[error("security error: {0}")]
    Security(#[from] SecurityError),
}

/// Errors that can occur while fetching a single URL.
///
/// A fetch error never halts a crawl; it is recorded against the URL as a
/// [`SkipReason`](crate::types::page::SkipReason) and the crawl continues.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded its timeout
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Connection could not be established
    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Any other transport-level failure (TLS, body read, protocol)
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts, connection failures, and 5xx responses are transient;
    /// 4xx responses and malformed URLs are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Connect { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::InvalidUrl { .. } => false,
            FetchError::Transport { .. } => true,
        }
    }

    /// The URL the failure was observed on.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Connect { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::InvalidUrl { url }
            | FetchError::Transport { url, .. } => url,
        }
    }
}

/// Configuration problems, rejected synchronously before any fetch.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A signal weight is below zero
    #[error("weight for {signal} must be non-negative, got {value}")]
    NegativeWeight { signal: &'static str, value: f64 },

    /// Every enabled signal has weight zero
    #[error("at least one signal weight must be positive")]
    AllZeroWeights,

    /// A count or duration limit is out of range
    #[error("{field} must be positive, got {value}")]
    NonPositiveLimit { field: &'static str, value: i64 },

    /// A threshold left the unit interval
    #[error("{field} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f64 },

    /// A root URL could not be parsed
    #[error("invalid {role} URL: {url}")]
    InvalidRootUrl { role: &'static str, url: String },
}

/// Security screen failures for root URLs.
#[derive(Debug, Error, PartialEq)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g. file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g. localhost)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in a blocked CIDR range (e.g. 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for security screening.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_5xx_are_transient() {
        let timeout = FetchError::Timeout {
            url: "https://example.com".into(),
        };
        let gateway = FetchError::Status {
            status: 502,
            url: "https://example.com".into(),
        };
        assert!(timeout.is_transient());
        assert!(gateway.is_transient());
    }

    #[test]
    fn client_errors_and_bad_urls_are_permanent() {
        let not_found = FetchError::Status {
            status: 404,
            url: "https://example.com/missing".into(),
        };
        let bad = FetchError::InvalidUrl {
            url: "ht!tp://nope".into(),
        };
        assert!(!not_found.is_transient());
        assert!(!bad.is_transient());
    }
}
