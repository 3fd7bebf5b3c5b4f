//! Artefact extraction: page snapshots in, comparable artefacts out.
//!
//! Text and structure extraction are pure transformations over the
//! snapshot HTML. Image extraction additionally fetches the discovered
//! image payloads through the [`Fetcher`] boundary, bounded by a
//! per-image timeout and a per-page cap. The three kinds are
//! independently toggleable; disabling one does not affect the others,
//! and no extraction failure ever aborts the page or the crawl.

pub mod image;
pub mod structure;
pub mod text;

use std::sync::Arc;
use tracing::debug;

use crate::traits::fetcher::Fetcher;
use crate::types::artefact::{
    ImageArtefact, SiteArtefactSet, SiteRole, StructureArtefact, TextArtefact,
};
use crate::types::config::ExtractConfig;
use crate::types::page::{CrawlOutcome, PageSnapshot};

/// Artefacts produced from one page snapshot.
#[derive(Debug, Clone, Default)]
pub struct PageArtefacts {
    pub text: Option<TextArtefact>,
    pub images: Vec<ImageArtefact>,
    pub structure: Option<StructureArtefact>,
}

/// Extract the enabled artefact kinds from one snapshot.
pub async fn extract_page(
    snapshot: &PageSnapshot,
    config: &ExtractConfig,
    fetcher: &dyn Fetcher,
) -> PageArtefacts {
    let mut artefacts = PageArtefacts::default();

    if config.signals.text {
        artefacts.text = text::text_artefact(&snapshot.html, &snapshot.final_url, config);
    }
    if config.signals.structure {
        artefacts.structure =
            structure::structure_artefact(&snapshot.html, &snapshot.final_url, config);
    }
    if config.signals.image {
        artefacts.images =
            image::image_artefacts(&snapshot.html, &snapshot.final_url, config, fetcher).await;
    }

    debug!(
        url = %snapshot.final_url,
        has_text = artefacts.text.is_some(),
        images = artefacts.images.len(),
        has_structure = artefacts.structure.is_some(),
        "page extracted"
    );

    artefacts
}

/// Extract artefacts for every snapshot of a crawl.
///
/// Artefacts are sorted by URL afterwards so downstream matching sees a
/// deterministic order regardless of fetch completion order.
pub async fn extract_site(
    role: SiteRole,
    crawl: CrawlOutcome,
    config: &ExtractConfig,
    fetcher: Arc<dyn Fetcher>,
) -> SiteArtefactSet {
    let mut set = SiteArtefactSet {
        role,
        crawl,
        texts: Vec::new(),
        images: Vec::new(),
        structures: Vec::new(),
    };

    let snapshots: Vec<PageSnapshot> = set.crawl.snapshots.clone();
    for snapshot in &snapshots {
        let artefacts = extract_page(snapshot, config, fetcher.as_ref()).await;
        if let Some(text) = artefacts.text {
            set.texts.push(text);
        }
        if let Some(structure) = artefacts.structure {
            set.structures.push(structure);
        }
        set.images.extend(artefacts.images);
    }

    set.sort();
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{solid_png, MockFetcher};
    use crate::types::config::EnabledSignals;
    use chrono::Utc;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot {
            url: "https://site.test/".into(),
            final_url: "https://site.test/".into(),
            status: 200,
            html: html.into(),
            fetched_at: Utc::now(),
            depth: 0,
        }
    }

    const PAGE: &str = r#"<html><body>
        <p>Welcome to our secure customer portal where accounts are protected.</p>
        <img src="/logo.png">
    </body></html>"#;

    #[tokio::test]
    async fn disabled_kinds_are_not_extracted() {
        let fetcher = MockFetcher::new();
        let config = ExtractConfig {
            signals: EnabledSignals {
                text: true,
                image: false,
                structure: false,
            },
            ..ExtractConfig::default()
        };

        let artefacts = extract_page(&snapshot(PAGE), &config, &fetcher).await;

        assert!(artefacts.text.is_some());
        assert!(artefacts.images.is_empty());
        assert!(artefacts.structure.is_none());
        // Image fetches must not even be attempted.
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn image_failure_leaves_other_kinds_intact() {
        let fetcher = MockFetcher::new().with_timeout("https://site.test/logo.png");
        let config = ExtractConfig::default();

        let artefacts = extract_page(&snapshot(PAGE), &config, &fetcher).await;

        assert!(artefacts.text.is_some());
        assert!(artefacts.structure.is_some());
        assert!(artefacts.images.is_empty());
    }

    #[tokio::test]
    async fn extract_site_collects_across_snapshots() {
        let fetcher = MockFetcher::new().with_bytes(
            "https://site.test/logo.png",
            solid_png(16, 16, [30, 60, 90]),
            "image/png",
        );
        let crawl = CrawlOutcome {
            root_url: "https://site.test/".into(),
            snapshots: vec![snapshot(PAGE)],
            skipped: vec![],
            offsite: vec![],
            deadline_hit: false,
        };

        let set = extract_site(
            SiteRole::Base,
            crawl,
            &ExtractConfig::default(),
            Arc::new(fetcher),
        )
        .await;

        assert_eq!(set.texts.len(), 1);
        assert_eq!(set.images.len(), 1);
        assert_eq!(set.structures.len(), 1);
    }
}
