//! Pairwise artefact matching between the two sites.
//!
//! For every base-side artefact the comparer scans every clone-side
//! artefact of the same kind and keeps the single best counterpart,
//! provided it clears the match floor. Greedy rather than globally
//! optimal assignment: with near-duplicate artefacts on the clone side a
//! base artefact can take a counterpart another base artefact scored
//! higher against. An optimal bipartite pass is a known extension point.
//!
//! Cost is O(|base| x |clone|) per kind; artefact counts are capped
//! upstream by the crawl limits, not here.
//!
//! All tie-breaks are total orders, so output is deterministic no matter
//! what order extraction delivered the artefacts in.

use std::collections::BTreeSet;
use tracing::debug;

use crate::types::artefact::{SiteArtefactSet, SignalKind, IMAGE_HASH_BITS};
use crate::types::config::CompareConfig;
use crate::types::score::{ArtefactMatch, MatchMetric};

/// Jaccard similarity of two shingle/n-gram sets, with the shared and
/// union counts that produced it.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> (f64, usize, usize) {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        return (0.0, 0, 0);
    }
    (shared as f64 / union as f64, shared, union)
}

/// Similarity of two 64-bit perceptual hashes: 1 - distance/bits.
pub fn hamming_similarity(a: u64, b: u64) -> (f64, u32) {
    let distance = (a ^ b).count_ones();
    (1.0 - distance as f64 / IMAGE_HASH_BITS as f64, distance)
}

/// Compute all cross-site matches, one matcher pass per signal kind.
pub fn compare_sites(
    base: &SiteArtefactSet,
    clone: &SiteArtefactSet,
    config: &CompareConfig,
) -> Vec<ArtefactMatch> {
    let mut matches = Vec::new();
    matches.extend(match_texts(base, clone, config));
    matches.extend(match_images(base, clone, config));
    matches.extend(match_structures(base, clone, config));

    debug!(
        base_pages = base.crawl.page_count(),
        clone_pages = clone.crawl.page_count(),
        matches = matches.len(),
        "artefact comparison complete"
    );
    matches
}

fn match_texts(
    base: &SiteArtefactSet,
    clone: &SiteArtefactSet,
    config: &CompareConfig,
) -> Vec<ArtefactMatch> {
    let mut matches = Vec::new();
    for base_artefact in &base.texts {
        let mut best: Option<(f64, usize, usize, &str)> = None;
        for clone_artefact in &clone.texts {
            let (score, shared, union) =
                jaccard(&base_artefact.shingles, &clone_artefact.shingles);
            let candidate = (score, shared, union, clone_artefact.page_url.as_str());
            if prefer_set_candidate(&candidate, &best) {
                best = Some(candidate);
            }
        }
        if let Some((score, shared, union, clone_url)) = best {
            if score >= config.min_match_floor {
                matches.push(ArtefactMatch {
                    kind: SignalKind::Text,
                    base_id: base_artefact.page_url.clone(),
                    clone_id: clone_url.to_string(),
                    similarity: score,
                    metric: MatchMetric::Jaccard { shared, union },
                });
            }
        }
    }
    matches
}

fn match_structures(
    base: &SiteArtefactSet,
    clone: &SiteArtefactSet,
    config: &CompareConfig,
) -> Vec<ArtefactMatch> {
    let mut matches = Vec::new();
    for base_artefact in &base.structures {
        let mut best: Option<(f64, usize, usize, &str)> = None;
        for clone_artefact in &clone.structures {
            let (score, shared, union) =
                jaccard(&base_artefact.tag_ngrams, &clone_artefact.tag_ngrams);
            let candidate = (score, shared, union, clone_artefact.page_url.as_str());
            if prefer_set_candidate(&candidate, &best) {
                best = Some(candidate);
            }
        }
        if let Some((score, shared, union, clone_url)) = best {
            if score >= config.min_match_floor {
                matches.push(ArtefactMatch {
                    kind: SignalKind::Structure,
                    base_id: base_artefact.page_url.clone(),
                    clone_id: clone_url.to_string(),
                    similarity: score,
                    metric: MatchMetric::Jaccard { shared, union },
                });
            }
        }
    }
    matches
}

fn match_images(
    base: &SiteArtefactSet,
    clone: &SiteArtefactSet,
    config: &CompareConfig,
) -> Vec<ArtefactMatch> {
    let mut matches = Vec::new();
    for base_artefact in &base.images {
        let mut best: Option<(f64, u32, &str)> = None;
        for clone_artefact in &clone.images {
            let (score, distance) = hamming_similarity(base_artefact.hash, clone_artefact.hash);
            let candidate = (score, distance, clone_artefact.url.as_str());
            let better = match &best {
                None => true,
                Some((best_score, _, best_url)) => {
                    if score != *best_score {
                        score > *best_score
                    } else {
                        candidate.2 < *best_url
                    }
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        if let Some((score, distance, clone_url)) = best {
            if score >= config.min_match_floor {
                matches.push(ArtefactMatch {
                    kind: SignalKind::Image,
                    base_id: base_artefact.url.clone(),
                    clone_id: clone_url.to_string(),
                    similarity: score,
                    metric: MatchMetric::Hamming {
                        distance,
                        bits: IMAGE_HASH_BITS,
                    },
                });
            }
        }
    }
    matches
}

/// Whether a (score, shared, union, url) candidate beats the current best:
/// higher score first, then more shared members, then the
/// lexicographically smaller clone URL.
fn prefer_set_candidate(
    candidate: &(f64, usize, usize, &str),
    best: &Option<(f64, usize, usize, &str)>,
) -> bool {
    match best {
        None => true,
        Some(best) => {
            if candidate.0 != best.0 {
                candidate.0 > best.0
            } else if candidate.1 != best.1 {
                candidate.1 > best.1
            } else {
                candidate.3 < best.3
            }
        }
    }
}
