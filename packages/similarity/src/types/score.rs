//! Match records and the terminal score breakdown.

use serde::{Deserialize, Serialize};

use crate::types::artefact::SignalKind;

/// The raw metric that produced a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMetric {
    /// Shingle-set Jaccard: shared and union counts
    Jaccard { shared: usize, union: usize },
    /// Bit distance between two equal-length perceptual hashes
    Hamming { distance: u32, bits: u32 },
}

/// One cross-site pairing, produced by the comparer and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtefactMatch {
    pub kind: SignalKind,

    /// Base-side artefact identifier (page URL, or image URL for images)
    pub base_id: String,

    /// Clone-side artefact identifier
    pub clone_id: String,

    /// Similarity in [0, 1]
    pub similarity: f64,

    /// The raw distance/overlap behind the score
    pub metric: MatchMetric,
}

/// Per-signal aggregate, present only when both sides produced evidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalScore {
    pub kind: SignalKind,

    /// Mean similarity across this signal's matches; 0.0 when evidence
    /// existed on both sides but nothing cleared the match floor
    pub score: f64,

    /// How many matches contributed
    pub match_count: usize,

    /// Artefact counts that established evidence
    pub base_artefacts: usize,
    pub clone_artefacts: usize,
}

/// Terminal, explainable output of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Weighted overall similarity in [0, 1]
    pub overall: f64,

    /// Sub-scores for signals that had evidence on both sides; signals
    /// without evidence are absent, not zero
    pub signals: Vec<SignalScore>,

    /// Matches at or above the reporting threshold, citable as evidence
    pub evidence: Vec<ArtefactMatch>,
}

impl ScoreBreakdown {
    /// Sub-score for a kind, if that signal had evidence.
    pub fn signal(&self, kind: SignalKind) -> Option<&SignalScore> {
        self.signals.iter().find(|s| s.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_lookup_by_kind() {
        let breakdown = ScoreBreakdown {
            overall: 0.5,
            signals: vec![SignalScore {
                kind: SignalKind::Text,
                score: 0.5,
                match_count: 1,
                base_artefacts: 1,
                clone_artefacts: 1,
            }],
            evidence: vec![],
        };
        assert!(breakdown.signal(SignalKind::Text).is_some());
        assert!(breakdown.signal(SignalKind::Image).is_none());
    }
}
