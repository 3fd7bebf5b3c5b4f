//! Report rendering: Markdown for humans, JSON for pipelines.
//!
//! Consumes the terminal `ScoreBreakdown` plus crawl metadata and the
//! adapter records; nothing here feeds back into scoring.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use similarity::{AuditOutcome, MatchMetric, SignalKind, SiteArtefactSet};

use crate::adapters::{HostingRecord, WhoisRecord};

/// How many evidence pairs the Markdown report cites per signal.
const EVIDENCE_LIMIT: usize = 10;

/// Everything the renderers need for one report.
pub struct ReportInputs<'a> {
    pub outcome: &'a AuditOutcome,
    pub base_whois: Option<&'a WhoisRecord>,
    pub clone_whois: Option<&'a WhoisRecord>,
    pub base_hosting: Option<&'a HostingRecord>,
    pub clone_hosting: Option<&'a HostingRecord>,
    pub screenshots: Option<(PathBuf, PathBuf)>,
    pub generated_at: DateTime<Utc>,
}

/// One-line reading of the overall score.
pub fn verdict(overall: f64) -> &'static str {
    if overall >= 0.9 {
        "High-confidence clone"
    } else if overall >= 0.7 {
        "Likely clone"
    } else if overall >= 0.4 {
        "Partial overlap"
    } else {
        "Low similarity"
    }
}

pub fn render_markdown(inputs: &ReportInputs) -> String {
    let outcome = inputs.outcome;
    let breakdown = &outcome.breakdown;
    let mut out = String::new();

    out.push_str("# Clone Similarity Report\n\n");
    out.push_str(&format!(
        "- Generated: {}\n- Base site: {}\n- Suspected clone: {}\n\n",
        inputs.generated_at.to_rfc3339(),
        outcome.base.crawl.root_url,
        outcome.clone.crawl.root_url,
    ));

    out.push_str("## Verdict\n\n");
    out.push_str(&format!(
        "**Overall similarity: {:.2}** — {}\n\n",
        breakdown.overall,
        verdict(breakdown.overall)
    ));

    out.push_str("## Signal breakdown\n\n");
    out.push_str("| Signal | Score | Matches | Base artefacts | Clone artefacts |\n");
    out.push_str("|--------|-------|---------|----------------|-----------------|\n");
    for kind in SignalKind::ALL {
        match breakdown.signal(kind) {
            Some(signal) => out.push_str(&format!(
                "| {} | {:.2} | {} | {} | {} |\n",
                kind.label(),
                signal.score,
                signal.match_count,
                signal.base_artefacts,
                signal.clone_artefacts,
            )),
            None => out.push_str(&format!(
                "| {} | excluded (no evidence) | - | {} | {} |\n",
                kind.label(),
                outcome.base.count(kind),
                outcome.clone.count(kind),
            )),
        }
    }
    out.push('\n');

    out.push_str("## Evidence\n\n");
    if breakdown.evidence.is_empty() {
        out.push_str("No artefact pairs cleared the reporting threshold.\n\n");
    } else {
        for kind in SignalKind::ALL {
            let cited: Vec<_> = breakdown
                .evidence
                .iter()
                .filter(|m| m.kind == kind)
                .take(EVIDENCE_LIMIT)
                .collect();
            for matched in cited {
                out.push_str(&format!(
                    "- `{}` matched `{}` at {:.2} ({})\n",
                    matched.base_id,
                    matched.clone_id,
                    matched.similarity,
                    metric_note(&matched.metric),
                ));
            }
        }
        out.push('\n');
    }

    out.push_str("## Crawl summary\n\n");
    out.push_str(&crawl_summary("Base", &outcome.base));
    out.push_str(&crawl_summary("Clone", &outcome.clone));
    out.push('\n');

    if inputs.base_whois.is_some() || inputs.clone_whois.is_some() {
        out.push_str("## Domain registration\n\n");
        for record in [inputs.base_whois, inputs.clone_whois].into_iter().flatten() {
            out.push_str(&whois_section(record));
        }
    }

    if inputs.base_hosting.is_some() || inputs.clone_hosting.is_some() {
        out.push_str("## Hosting\n\n");
        for record in [inputs.base_hosting, inputs.clone_hosting]
            .into_iter()
            .flatten()
        {
            out.push_str(&hosting_section(record));
        }
    }

    if let Some((base_shot, clone_shot)) = &inputs.screenshots {
        out.push_str("## Homepage captures\n\n");
        out.push_str(&format!(
            "![base homepage]({})\n![clone homepage]({})\n\n",
            base_shot.display(),
            clone_shot.display()
        ));
    }

    out
}

pub fn render_json(inputs: &ReportInputs) -> Value {
    let outcome = inputs.outcome;
    json!({
        "generated_at": inputs.generated_at.to_rfc3339(),
        "verdict": verdict(outcome.breakdown.overall),
        "breakdown": outcome.breakdown,
        "base": site_json(&outcome.base, inputs.base_whois, inputs.base_hosting),
        "clone": site_json(&outcome.clone, inputs.clone_whois, inputs.clone_hosting),
    })
}

fn site_json(
    site: &SiteArtefactSet,
    whois: Option<&WhoisRecord>,
    hosting: Option<&HostingRecord>,
) -> Value {
    json!({
        "root_url": site.crawl.root_url,
        "pages": site.crawl.page_count(),
        "skipped": site.crawl.skipped,
        "offsite_links": site.crawl.offsite,
        "deadline_hit": site.crawl.deadline_hit,
        "artefacts": {
            "text": site.texts.len(),
            "image": site.images.len(),
            "structure": site.structures.len(),
        },
        "whois": whois.map(|w| json!(w)),
        "hosting": hosting.map(|h| json!(h)),
    })
}

fn metric_note(metric: &MatchMetric) -> String {
    match metric {
        MatchMetric::Jaccard { shared, union } => format!("{shared} of {union} shared"),
        MatchMetric::Hamming { distance, bits } => {
            format!("hamming {distance}/{bits}")
        }
    }
}

fn crawl_summary(label: &str, site: &SiteArtefactSet) -> String {
    let mut reasons: BTreeMap<String, usize> = BTreeMap::new();
    for skipped in &site.crawl.skipped {
        *reasons.entry(skipped.reason.code()).or_default() += 1;
    }
    let reason_note = if reasons.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = reasons
            .iter()
            .map(|(code, count)| format!("{code} x{count}"))
            .collect();
        format!(" ({})", parts.join(", "))
    };

    format!(
        "- {label}: {} pages, {} skipped{}, {} off-site links{}\n",
        site.crawl.page_count(),
        site.crawl.skipped.len(),
        reason_note,
        site.crawl.offsite.len(),
        if site.crawl.deadline_hit {
            " — deadline hit, results partial"
        } else {
            ""
        },
    )
}

fn whois_section(record: &WhoisRecord) -> String {
    let mut out = format!("### {}\n\n", record.domain);
    if let Some(error) = &record.error {
        out.push_str(&format!("- Lookup unavailable: {error}\n\n"));
        return out;
    }
    out.push_str(&format!(
        "- Registrar: {}\n- Created: {}\n- Expires: {}\n",
        record.registrar.as_deref().unwrap_or("unknown"),
        date_or_unknown(record.created_at),
        date_or_unknown(record.expires_at),
    ));
    if !record.name_servers.is_empty() {
        out.push_str(&format!("- Name servers: {}\n", record.name_servers.join(", ")));
    }
    out.push('\n');
    out
}

fn hosting_section(record: &HostingRecord) -> String {
    let mut out = format!("### {}\n\n", record.domain);
    if let Some(error) = &record.error {
        out.push_str(&format!("- Lookup unavailable: {error}\n\n"));
        return out;
    }
    out.push_str(&format!(
        "- IP: {}\n- Network: {}\n- Organization: {}\n- Country: {}\n\n",
        record.ip.as_deref().unwrap_or("unknown"),
        record.network_name.as_deref().unwrap_or("unknown"),
        record.organization.as_deref().unwrap_or("unknown"),
        record.country.as_deref().unwrap_or("unknown"),
    ));
    out
}

fn date_or_unknown(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
