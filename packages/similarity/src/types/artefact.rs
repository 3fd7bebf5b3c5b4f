//! Comparable artefacts derived from page snapshots.
//!
//! Artefacts are normalized units a page is reduced to for cross-site
//! comparison: shingle sets for visible text, perceptual hashes for
//! images, tag n-gram sets for DOM shape. All are immutable once built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::page::CrawlOutcome;

/// Bit length of every image perceptual hash.
///
/// Constant across a run so Hamming distance is always well-defined.
pub const IMAGE_HASH_BITS: u32 = 64;

/// The independent comparison signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Text,
    Image,
    Structure,
}

impl SignalKind {
    /// All signal kinds, in reporting order.
    pub const ALL: [SignalKind; 3] = [SignalKind::Text, SignalKind::Image, SignalKind::Structure];

    /// Lowercase label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Text => "text",
            SignalKind::Image => "image",
            SignalKind::Structure => "structure",
        }
    }
}

/// Which side of the audit an artefact set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteRole {
    Base,
    Clone,
}

impl SiteRole {
    pub fn label(&self) -> &'static str {
        match self {
            SiteRole::Base => "base",
            SiteRole::Clone => "clone",
        }
    }
}

/// Visible-text fingerprint of one page.
///
/// Shingles are lower-cased, whitespace-normalized token windows, so
/// formatting-only differences do not affect matching. Stored as an
/// ordered set: matching must not depend on extraction order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextArtefact {
    /// Final URL of the originating page
    pub page_url: String,

    /// Deduplicated shingle set
    pub shingles: BTreeSet<String>,

    /// Token count of the visible text before shingling
    pub token_count: usize,
}

impl TextArtefact {
    pub fn is_empty(&self) -> bool {
        self.shingles.is_empty()
    }
}

/// Perceptual fingerprint of one discovered image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageArtefact {
    /// Resolved URL of the image itself
    pub url: String,

    /// Final URL of the page the image was discovered on
    pub page_url: String,

    /// 64-bit perceptual hash (8x8 luminance grid, mean-thresholded)
    pub hash: u64,

    /// Size of the fetched image payload
    pub byte_size: usize,
}

/// DOM-shape fingerprint of one page: overlapping windows of tag names
/// in document order. Attribute values and text content never contribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureArtefact {
    /// Final URL of the originating page
    pub page_url: String,

    /// Deduplicated tag n-gram set
    pub tag_ngrams: BTreeSet<String>,
}

impl StructureArtefact {
    pub fn is_empty(&self) -> bool {
        self.tag_ngrams.is_empty()
    }
}

/// Everything extracted for one crawl target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteArtefactSet {
    pub role: SiteRole,
    pub crawl: CrawlOutcome,
    pub texts: Vec<TextArtefact>,
    pub images: Vec<ImageArtefact>,
    pub structures: Vec<StructureArtefact>,
}

impl SiteArtefactSet {
    /// Number of artefacts of a given kind.
    pub fn count(&self, kind: SignalKind) -> usize {
        match kind {
            SignalKind::Text => self.texts.len(),
            SignalKind::Image => self.images.len(),
            SignalKind::Structure => self.structures.len(),
        }
    }

    /// Sort artefacts by URL so downstream output is deterministic even
    /// when snapshots completed out of discovery order.
    pub fn sort(&mut self) {
        self.texts.sort_by(|a, b| a.page_url.cmp(&b.page_url));
        self.images
            .sort_by(|a, b| a.url.cmp(&b.url).then_with(|| a.page_url.cmp(&b.page_url)));
        self.structures.sort_by(|a, b| a.page_url.cmp(&b.page_url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::page::CrawlOutcome;

    fn empty_crawl() -> CrawlOutcome {
        CrawlOutcome {
            root_url: "https://example.com/".into(),
            snapshots: vec![],
            skipped: vec![],
            offsite: vec![],
            deadline_hit: false,
        }
    }

    #[test]
    fn sort_orders_by_url() {
        let mut set = SiteArtefactSet {
            role: SiteRole::Base,
            crawl: empty_crawl(),
            texts: vec![
                TextArtefact {
                    page_url: "https://example.com/b".into(),
                    shingles: BTreeSet::new(),
                    token_count: 0,
                },
                TextArtefact {
                    page_url: "https://example.com/a".into(),
                    shingles: BTreeSet::new(),
                    token_count: 0,
                },
            ],
            images: vec![],
            structures: vec![],
        };
        set.sort();
        assert_eq!(set.texts[0].page_url, "https://example.com/a");
        assert_eq!(set.count(SignalKind::Text), 2);
    }
}
