//! Weighted score aggregation.
//!
//! A signal only participates when both sides produced at least one
//! artefact of its kind. Signals without that two-sided evidence are
//! excluded from the weighted denominator entirely: a text-only clone
//! is not dragged down (or propped up) by image data it never had.

use tracing::info;

use crate::types::artefact::{SignalKind, SiteArtefactSet};
use crate::types::config::CompareConfig;
use crate::types::score::{ArtefactMatch, ScoreBreakdown, SignalScore};

/// Reduce per-signal matches into the terminal [`ScoreBreakdown`].
pub fn aggregate(
    matches: &[ArtefactMatch],
    base: &SiteArtefactSet,
    clone: &SiteArtefactSet,
    config: &CompareConfig,
) -> ScoreBreakdown {
    let mut signals = Vec::new();

    for kind in SignalKind::ALL {
        let base_artefacts = base.count(kind);
        let clone_artefacts = clone.count(kind);
        if base_artefacts == 0 || clone_artefacts == 0 {
            // No evidence for this signal: excluded, not zero-scored.
            continue;
        }

        let scores: Vec<f64> = matches
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.similarity)
            .collect();
        let score = if scores.is_empty() {
            // Evidence existed on both sides but nothing cleared the
            // floor: that is genuine dissimilarity, scored as zero.
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        signals.push(SignalScore {
            kind,
            score,
            match_count: scores.len(),
            base_artefacts,
            clone_artefacts,
        });
    }

    let weight_sum: f64 = signals
        .iter()
        .map(|s| config.weights.get(s.kind))
        .sum();
    let overall = if weight_sum > 0.0 {
        signals
            .iter()
            .map(|s| s.score * config.weights.get(s.kind))
            .sum::<f64>()
            / weight_sum
    } else {
        0.0
    };

    let evidence: Vec<ArtefactMatch> = matches
        .iter()
        .filter(|m| m.similarity >= config.report_threshold)
        .cloned()
        .collect();

    info!(
        overall = format!("{overall:.3}"),
        signals = signals.len(),
        evidence = evidence.len(),
        "similarity aggregated"
    );

    ScoreBreakdown {
        overall,
        signals,
        evidence,
    }
}
