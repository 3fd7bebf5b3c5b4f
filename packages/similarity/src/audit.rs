//! End-to-end audit pipeline: crawl both sites, extract, compare, score.
//!
//! The two site crawls are independent units of work with no shared
//! mutable state: each owns its frontier, visited set, and artefact
//! accumulator, and each gets its own fetcher so network connections are
//! never shared across sites.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::compare::compare_sites;
use crate::crawler::crawl_with_cancel;
use crate::error::Result;
use crate::extract::extract_site;
use crate::score::aggregate;
use crate::traits::fetcher::{Fetcher, UrlValidator};
use crate::types::artefact::{SiteArtefactSet, SiteRole};
use crate::types::config::AuditConfig;
use crate::types::score::ScoreBreakdown;

/// Everything an audit run produced.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub base: SiteArtefactSet,
    pub clone: SiteArtefactSet,
    pub breakdown: ScoreBreakdown,
}

/// Run the full pipeline for a base/clone pair.
///
/// Configuration is validated and both root URLs are security-screened
/// before any network activity. Each site crawl uses its own fetcher.
pub async fn run_audit(
    config: &AuditConfig,
    base_fetcher: Arc<dyn Fetcher>,
    clone_fetcher: Arc<dyn Fetcher>,
) -> Result<AuditOutcome> {
    run_audit_with_cancel(
        config,
        base_fetcher,
        clone_fetcher,
        CancellationToken::new(),
    )
    .await
}

/// [`run_audit`], honoring an external cancellation token. On
/// cancellation both crawls stop dequeuing and the audit completes over
/// whatever snapshots were already produced.
pub async fn run_audit_with_cancel(
    config: &AuditConfig,
    base_fetcher: Arc<dyn Fetcher>,
    clone_fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
) -> Result<AuditOutcome> {
    config.validate()?;
    let validator = UrlValidator::new();
    validator.validate(&config.base_url)?;
    validator.validate(&config.clone_url)?;

    info!(base = %config.base_url, clone = %config.clone_url, "audit starting");

    let (base_crawl, clone_crawl) = tokio::join!(
        crawl_with_cancel(
            &config.base_url,
            &config.crawl,
            Arc::clone(&base_fetcher),
            cancel.clone(),
        ),
        crawl_with_cancel(
            &config.clone_url,
            &config.crawl,
            Arc::clone(&clone_fetcher),
            cancel.clone(),
        ),
    );

    let base = extract_site(SiteRole::Base, base_crawl, &config.extract, base_fetcher).await;
    let clone = extract_site(SiteRole::Clone, clone_crawl, &config.extract, clone_fetcher).await;

    let matches = compare_sites(&base, &clone, &config.compare);
    let breakdown = aggregate(&matches, &base, &clone, &config.compare);

    info!(
        overall = format!("{:.3}", breakdown.overall),
        base_pages = base.crawl.page_count(),
        clone_pages = clone.crawl.page_count(),
        "audit complete"
    );

    Ok(AuditOutcome {
        base,
        clone,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;
    use crate::testing::MockFetcher;

    #[tokio::test]
    async fn invalid_config_fails_before_any_fetch() {
        let mut config = AuditConfig::new("https://a.test", "https://b.test");
        config.compare.weights.text = -1.0;

        let base = Arc::new(MockFetcher::new());
        let clone = Arc::new(MockFetcher::new());
        let result = run_audit(&config, base.clone(), clone.clone()).await;

        assert!(matches!(result, Err(AuditError::Config(_))));
        assert!(base.calls().is_empty());
        assert!(clone.calls().is_empty());
    }

    #[tokio::test]
    async fn blocked_root_fails_before_any_fetch() {
        let config = AuditConfig::new("http://127.0.0.1/", "https://b.test");

        let base = Arc::new(MockFetcher::new());
        let clone = Arc::new(MockFetcher::new());
        let result = run_audit(&config, base.clone(), clone.clone()).await;

        assert!(matches!(result, Err(AuditError::Security(_))));
        assert!(base.calls().is_empty());
    }
}
