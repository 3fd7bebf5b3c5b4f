//! clone-audit: crawl a trusted site and a suspected clone, score how
//! alike they are, and render an explainable report.

mod adapters;
mod args;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use similarity::{run_audit, AuditOutcome, HttpFetcher};

use adapters::{
    domain_of, CaptureOptions, ChromiumCapture, HostingLookup, HostingRecord, RdapHosting,
    RdapWhois, RegistrarLookup, ScreenshotCapture, WhoisRecord,
};
use args::Args;
use report::ReportInputs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.to_config();
    tracing::info!(base = %config.base_url, clone = %config.clone_url, "starting clone audit");

    let base_fetcher = Arc::new(
        HttpFetcher::new(&config.crawl.user_agent).context("failed to build base-site fetcher")?,
    );
    let clone_fetcher = Arc::new(
        HttpFetcher::new(&config.crawl.user_agent).context("failed to build clone-site fetcher")?,
    );

    let outcome = run_audit(&config, base_fetcher, clone_fetcher)
        .await
        .context("audit failed")?;

    let (base_whois, clone_whois) = if args.no_whois {
        (None, None)
    } else {
        let whois = RdapWhois::new();
        let (base, clone) = tokio::join!(
            lookup_whois(&whois, &config.base_url),
            lookup_whois(&whois, &config.clone_url),
        );
        (Some(base), Some(clone))
    };

    let (base_hosting, clone_hosting) = if args.no_hosting {
        (None, None)
    } else {
        let hosting = RdapHosting::new();
        let (base, clone) = tokio::join!(
            lookup_hosting(&hosting, &config.base_url),
            lookup_hosting(&hosting, &config.clone_url),
        );
        (Some(base), Some(clone))
    };

    let screenshots = capture_screenshots(&args, &config.base_url, &config.clone_url, &outcome)
        .await;

    let inputs = ReportInputs {
        outcome: &outcome,
        base_whois: base_whois.as_ref(),
        clone_whois: clone_whois.as_ref(),
        base_hosting: base_hosting.as_ref(),
        clone_hosting: clone_hosting.as_ref(),
        screenshots,
        generated_at: Utc::now(),
    };

    let markdown = report::render_markdown(&inputs);
    match &args.output {
        Some(path) => {
            write_report(path, markdown.as_bytes()).await?;
            tracing::info!(path = %path.display(), "markdown report written");
        }
        None => println!("{markdown}"),
    }

    if let Some(path) = &args.json_output {
        let payload = serde_json::to_vec_pretty(&report::render_json(&inputs))?;
        write_report(path, &payload).await?;
        tracing::info!(path = %path.display(), "json report written");
    }

    tracing::info!(
        overall = format!("{:.3}", outcome.breakdown.overall),
        verdict = report::verdict(outcome.breakdown.overall),
        "audit finished"
    );
    Ok(())
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{level},hyper=warn,reqwest=warn").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn lookup_whois(provider: &dyn RegistrarLookup, url: &str) -> WhoisRecord {
    match domain_of(url) {
        Some(domain) => provider.lookup(&domain).await,
        None => WhoisRecord::unavailable(url, "unable to determine domain"),
    }
}

async fn lookup_hosting(provider: &dyn HostingLookup, url: &str) -> HostingRecord {
    match domain_of(url) {
        Some(domain) => provider.lookup(&domain).await,
        None => HostingRecord::unavailable(url, "unable to determine domain"),
    }
}

/// Capture both homepages when similarity clears the threshold. Any
/// failure is logged and degrades to no screenshots.
async fn capture_screenshots(
    args: &Args,
    base_url: &str,
    clone_url: &str,
    outcome: &AuditOutcome,
) -> Option<(PathBuf, PathBuf)> {
    let dir = args.screenshot_dir.as_ref()?;
    if outcome.breakdown.overall < args.screenshot_threshold {
        tracing::info!(
            overall = format!("{:.3}", outcome.breakdown.overall),
            threshold = args.screenshot_threshold,
            "similarity below screenshot threshold, skipping capture"
        );
        return None;
    }

    let Some(capture) = ChromiumCapture::discover() else {
        tracing::warn!("no chromium binary found, skipping screenshots");
        return None;
    };
    let options = CaptureOptions {
        width: args.screenshot_width,
        height: args.screenshot_height,
        render_delay: Duration::from_secs(2),
        timeout: Duration::from_secs(20),
    };

    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(error = %err, "cannot create screenshot directory");
        return None;
    }

    let mut paths = Vec::with_capacity(2);
    for (label, url) in [("base", base_url), ("clone", clone_url)] {
        match capture.capture(url, &options).await {
            Ok(bytes) => {
                let path = dir.join(format!("{label}.png"));
                if let Err(err) = tokio::fs::write(&path, bytes).await {
                    tracing::warn!(error = %err, "cannot write screenshot");
                    return None;
                }
                paths.push(path);
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "screenshot capture failed");
                return None;
            }
        }
    }

    Some((paths[0].clone(), paths[1].clone()))
}

async fn write_report(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("cannot write {}", path.display()))
}
