//! Configuration for crawl, extraction, and comparison.
//!
//! Every recognized option is enumerated with an explicit default, and
//! [`AuditConfig::validate`] rejects invalid combinations before any
//! network activity begins.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::artefact::SignalKind;

/// Browser-like default user agent, matching what the sites under audit
/// would serve to a real visitor.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for one site crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of page snapshots to produce (hard ceiling)
    pub max_pages: usize,

    /// Maximum crawl depth (0 = only the root page)
    pub max_depth: usize,

    /// Minimum delay between consecutive fetches to the same host
    pub per_host_delay: Duration,

    /// Per-request fetch timeout
    pub fetch_timeout: Duration,

    /// Concurrent fetch workers within one crawl
    pub concurrency: usize,

    /// Overall crawl deadline; in-flight fetches complete, no new URLs
    /// are dequeued after expiry
    pub deadline: Option<Duration>,

    /// User-Agent header sent with crawler requests
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_depth: 2,
            per_host_delay: Duration::from_millis(500),
            fetch_timeout: Duration::from_secs(10),
            concurrency: 4,
            deadline: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlConfig {
    /// Set the page ceiling.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }

    /// Set the depth ceiling.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the per-host politeness delay.
    pub fn with_per_host_delay(mut self, delay: Duration) -> Self {
        self.per_host_delay = delay;
        self
    }

    /// Set the worker count.
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    /// Set an overall deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Which signals to collect and compare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnabledSignals {
    pub text: bool,
    pub image: bool,
    pub structure: bool,
}

impl Default for EnabledSignals {
    fn default() -> Self {
        Self {
            text: true,
            image: true,
            structure: true,
        }
    }
}

impl EnabledSignals {
    /// Whether a given signal kind is enabled.
    pub fn contains(&self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::Text => self.text,
            SignalKind::Image => self.image,
            SignalKind::Structure => self.structure,
        }
    }
}

/// Configuration for artefact extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Signals to extract; disabling one does not affect the others
    pub signals: EnabledSignals,

    /// Token window size for text shingles
    pub shingle_window: usize,

    /// Shingles shorter than this many characters are dropped
    pub min_shingle_len: usize,

    /// Tag window size for structural n-grams
    pub tag_window: usize,

    /// Cap on images fetched per page
    pub max_images_per_page: usize,

    /// Per-image fetch timeout
    pub image_timeout: Duration,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            signals: EnabledSignals::default(),
            shingle_window: 5,
            min_shingle_len: 20,
            tag_window: 4,
            max_images_per_page: 20,
            image_timeout: Duration::from_secs(5),
        }
    }
}

/// Per-signal aggregation weights.
///
/// Defaults follow the text 0.4 / image 0.4 / structure 0.2 split; weights
/// for signals without two-sided evidence are excluded from the
/// aggregation denominator rather than treated as zero-scoring evidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Weights {
    pub text: f64,
    pub image: f64,
    pub structure: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            text: 0.4,
            image: 0.4,
            structure: 0.2,
        }
    }
}

impl Weights {
    /// Weight for a given signal kind.
    pub fn get(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Text => self.text,
            SignalKind::Image => self.image,
            SignalKind::Structure => self.structure,
        }
    }
}

/// Configuration for matching and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Aggregation weights per signal
    pub weights: Weights,

    /// Minimum similarity for a pairing to count as a match at all
    pub min_match_floor: f64,

    /// Matches at or above this similarity are retained in the breakdown
    /// as citable evidence
    pub report_threshold: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            min_match_floor: 0.3,
            report_threshold: 0.6,
        }
    }
}

/// Full configuration surface for one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// URL of the trusted reference site
    pub base_url: String,

    /// URL of the suspected clone
    pub clone_url: String,

    pub crawl: CrawlConfig,
    pub extract: ExtractConfig,
    pub compare: CompareConfig,
}

impl AuditConfig {
    /// Create a config for a base/clone pair with default tuning.
    pub fn new(base_url: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            clone_url: clone_url.into(),
            crawl: CrawlConfig::default(),
            extract: ExtractConfig::default(),
            compare: CompareConfig::default(),
        }
    }

    /// Reject invalid configuration before any network activity.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (signal, value) in [
            ("text", self.compare.weights.text),
            ("image", self.compare.weights.image),
            ("structure", self.compare.weights.structure),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::NegativeWeight { signal, value });
            }
        }
        let weight_sum = self.compare.weights.text
            + self.compare.weights.image
            + self.compare.weights.structure;
        if weight_sum <= 0.0 {
            return Err(ConfigError::AllZeroWeights);
        }

        if self.crawl.max_pages == 0 {
            return Err(ConfigError::NonPositiveLimit {
                field: "max_pages",
                value: 0,
            });
        }
        if self.crawl.concurrency == 0 {
            return Err(ConfigError::NonPositiveLimit {
                field: "concurrency",
                value: 0,
            });
        }
        if self.crawl.fetch_timeout.is_zero() {
            return Err(ConfigError::NonPositiveLimit {
                field: "fetch_timeout",
                value: 0,
            });
        }
        if self.extract.shingle_window == 0 {
            return Err(ConfigError::NonPositiveLimit {
                field: "shingle_window",
                value: 0,
            });
        }
        if self.extract.tag_window == 0 {
            return Err(ConfigError::NonPositiveLimit {
                field: "tag_window",
                value: 0,
            });
        }

        for (field, value) in [
            ("min_match_floor", self.compare.min_match_floor),
            ("report_threshold", self.compare.report_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }

        for (role, url) in [("base", &self.base_url), ("clone", &self.clone_url)] {
            if url::Url::parse(url).is_err() {
                return Err(ConfigError::InvalidRootUrl {
                    role,
                    url: url.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuditConfig {
        AuditConfig::new("https://example.com", "https://example-clone.com")
    }

    #[test]
    fn default_config_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_negative_weight() {
        let mut config = valid();
        config.compare.weights.image = -0.1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeWeight {
                signal: "image",
                value: -0.1
            })
        );
    }

    #[test]
    fn rejects_all_zero_weights() {
        let mut config = valid();
        config.compare.weights = Weights {
            text: 0.0,
            image: 0.0,
            structure: 0.0,
        };
        assert_eq!(config.validate(), Err(ConfigError::AllZeroWeights));
    }

    #[test]
    fn rejects_zero_page_limit() {
        let mut config = valid();
        config.crawl.max_pages = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveLimit {
                field: "max_pages",
                ..
            })
        ));
    }

    #[test]
    fn rejects_out_of_range_floor() {
        let mut config = valid();
        config.compare.min_match_floor = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange {
                field: "min_match_floor",
                ..
            })
        ));
    }

    #[test]
    fn rejects_unparseable_root() {
        let mut config = valid();
        config.clone_url = "not a url".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRootUrl { role: "clone", .. })
        ));
    }
}
