//! Website clone similarity triage.
//!
//! Crawls a trusted reference site and a suspected clone, reduces every
//! page to comparable artefacts (text shingles, image perceptual hashes,
//! DOM tag n-grams), matches artefacts across the two sites, and folds
//! the matches into one weighted, explainable similarity score.
//!
//! # Design Philosophy
//!
//! - Deterministic, inspectable heuristics, so a responder can always
//!   answer *why* a score was produced
//! - Partial results over failed runs: fetch and parse failures become
//!   explicit absence, never aborts
//! - Pure transformations after the crawl; every stage reads immutable
//!   input and produces immutable output
//!
//! # Usage
//!
//! ```rust,ignore
//! use similarity::{run_audit, AuditConfig, HttpFetcher, DEFAULT_USER_AGENT};
//! use std::sync::Arc;
//!
//! let config = AuditConfig::new("https://legit.example", "https://suspect.example");
//! let base = Arc::new(HttpFetcher::new(DEFAULT_USER_AGENT)?);
//! let clone = Arc::new(HttpFetcher::new(DEFAULT_USER_AGENT)?);
//! let outcome = run_audit(&config, base, clone).await?;
//! println!("overall similarity: {:.2}", outcome.breakdown.overall);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The `Fetcher` boundary and URL security screening
//! - [`types`] - Configuration, snapshots, artefacts, scores
//! - [`crawler`] - Breadth-first same-host crawler
//! - [`extract`] - Text/image/structure artefact extraction
//! - [`compare`] - Greedy cross-site artefact matching
//! - [`score`] - Evidence-aware weighted aggregation
//! - [`audit`] - The end-to-end pipeline
//! - [`testing`] - Mock fetcher and fixtures

pub mod audit;
pub mod compare;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod score;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{AuditError, ConfigError, FetchError, SecurityError};
pub use traits::fetcher::{FetchedResponse, Fetcher, HttpFetcher, UrlValidator};
pub use types::{
    artefact::{
        ImageArtefact, SignalKind, SiteArtefactSet, SiteRole, StructureArtefact, TextArtefact,
        IMAGE_HASH_BITS,
    },
    config::{
        AuditConfig, CompareConfig, CrawlConfig, EnabledSignals, ExtractConfig, Weights,
        DEFAULT_USER_AGENT,
    },
    page::{CrawlOutcome, PageSnapshot, SkipReason, SkippedUrl},
    score::{ArtefactMatch, MatchMetric, ScoreBreakdown, SignalScore},
};

// Re-export the pipeline entry points
pub use audit::{run_audit, run_audit_with_cancel, AuditOutcome};
pub use compare::compare_sites;
pub use crawler::{crawl, crawl_with_cancel};
pub use extract::{extract_page, extract_site};
pub use score::aggregate;

// Re-export testing utilities
pub use testing::MockFetcher;
