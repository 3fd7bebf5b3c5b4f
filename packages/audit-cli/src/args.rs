//! Command-line surface, mapped onto the library's validated config.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use similarity::{AuditConfig, EnabledSignals, Weights, DEFAULT_USER_AGENT};

/// Website clone similarity auditor.
#[derive(Debug, Parser)]
#[command(name = "clone-audit", version, about)]
pub struct Args {
    /// URL of the legitimate site
    #[arg(long)]
    pub base: String,

    /// URL of the suspected clone
    #[arg(long)]
    pub clone: String,

    /// Maximum pages to crawl per site
    #[arg(long, default_value_t = 50)]
    pub max_pages: usize,

    /// Maximum crawl depth (0 = root page only)
    #[arg(long, default_value_t = 2)]
    pub max_depth: usize,

    /// Minimum delay between requests to the same host (seconds)
    #[arg(long, default_value_t = 0.5)]
    pub delay: f64,

    /// Per-request timeout (seconds)
    #[arg(long, default_value_t = 10.0)]
    pub timeout: f64,

    /// Concurrent fetch workers per site
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Overall crawl deadline per site (seconds)
    #[arg(long)]
    pub deadline: Option<f64>,

    /// User-Agent header for crawler requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Skip text collection and comparison
    #[arg(long)]
    pub no_text: bool,

    /// Skip image collection and comparison
    #[arg(long)]
    pub no_images: bool,

    /// Skip DOM structure comparison
    #[arg(long)]
    pub no_structure: bool,

    /// Weight assigned to text similarity
    #[arg(long, default_value_t = 0.4, allow_negative_numbers = true)]
    pub weight_text: f64,

    /// Weight assigned to image similarity
    #[arg(long, default_value_t = 0.4, allow_negative_numbers = true)]
    pub weight_images: f64,

    /// Weight assigned to structure similarity
    #[arg(long, default_value_t = 0.2, allow_negative_numbers = true)]
    pub weight_structure: f64,

    /// Minimum similarity for an artefact pairing to count as a match
    #[arg(long, default_value_t = 0.3)]
    pub match_floor: f64,

    /// Minimum similarity for a match to be cited as report evidence
    #[arg(long, default_value_t = 0.6)]
    pub report_threshold: f64,

    /// Path for the Markdown report; prints to stdout if omitted
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Optional path for the JSON report payload
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Skip WHOIS/RDAP registrar lookups
    #[arg(long)]
    pub no_whois: bool,

    /// Skip hosting/IP metadata lookups
    #[arg(long)]
    pub no_hosting: bool,

    /// Directory for homepage screenshots; captured only when overall
    /// similarity reaches the screenshot threshold
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    /// Minimum overall similarity before screenshots are captured
    #[arg(long, default_value_t = 0.7)]
    pub screenshot_threshold: f64,

    /// Screenshot viewport width
    #[arg(long, default_value_t = 1280)]
    pub screenshot_width: u32,

    /// Screenshot viewport height
    #[arg(long, default_value_t = 720)]
    pub screenshot_height: u32,

    /// Logging verbosity (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Build the validated pipeline configuration.
    pub fn to_config(&self) -> AuditConfig {
        let mut config = AuditConfig::new(&self.base, &self.clone);
        config.crawl.max_pages = self.max_pages;
        config.crawl.max_depth = self.max_depth;
        config.crawl.per_host_delay = Duration::from_secs_f64(self.delay.max(0.0));
        config.crawl.fetch_timeout = Duration::from_secs_f64(self.timeout.max(0.0));
        config.crawl.concurrency = self.concurrency;
        config.crawl.deadline = self
            .deadline
            .map(|seconds| Duration::from_secs_f64(seconds.max(0.0)));
        config.crawl.user_agent = self.user_agent.clone();
        config.extract.signals = EnabledSignals {
            text: !self.no_text,
            image: !self.no_images,
            structure: !self.no_structure,
        };
        config.compare.weights = Weights {
            text: self.weight_text,
            image: self.weight_images,
            structure: self.weight_structure,
        };
        config.compare.min_match_floor = self.match_floor;
        config.compare.report_threshold = self.report_threshold;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_library_defaults() {
        let args = Args::try_parse_from([
            "clone-audit",
            "--base",
            "https://legit.test",
            "--clone",
            "https://clone.test",
        ])
        .unwrap();

        let config = args.to_config();
        assert_eq!(config.crawl.max_pages, 50);
        assert_eq!(config.crawl.max_depth, 2);
        assert_eq!(config.compare.weights.text, 0.4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn signal_toggles_map_through() {
        let args = Args::try_parse_from([
            "clone-audit",
            "--base",
            "https://legit.test",
            "--clone",
            "https://clone.test",
            "--no-images",
        ])
        .unwrap();

        let config = args.to_config();
        assert!(config.extract.signals.text);
        assert!(!config.extract.signals.image);
    }

    #[test]
    fn bad_weights_fail_validation_not_parsing() {
        let args = Args::try_parse_from([
            "clone-audit",
            "--base",
            "https://legit.test",
            "--clone",
            "https://clone.test",
            "--weight-text=-1",
        ])
        .unwrap();

        assert!(args.to_config().validate().is_err());
    }
}
