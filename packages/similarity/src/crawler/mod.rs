//! Breadth-first, same-host crawler.
//!
//! Drives fetches through the [`Fetcher`] boundary under depth/page
//! ceilings, producing one [`PageSnapshot`] per visited URL. Off-host
//! links are recorded for reporting but never fetched. Fetch failures
//! are recorded per-URL and never halt the crawl.
//!
//! Within one crawl, fetch dispatch is concurrent up to the configured
//! worker count; the frontier keeps the visited check-and-insert atomic
//! so no URL is ever fetched twice. Politeness is a keyed rate limiter
//! per host that suspends only the calling worker.

pub mod frontier;

use chrono::Utc;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::traits::fetcher::Fetcher;
use crate::types::config::CrawlConfig;
use crate::types::page::{CrawlOutcome, PageSnapshot, SkipReason, SkippedUrl};
use frontier::{Frontier, Job};

type HostLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Normalize a URL for deduplication: the `url` crate lowercases scheme
/// and host and strips default ports; we additionally drop the fragment.
pub fn normalize_url(raw: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw)?;
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Lowercased host of a URL, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

/// Crawl a site breadth-first from `root_url`.
///
/// Restartable per invocation, finite (bounded by `max_pages`), and
/// never fails: fetch errors become skipped-URL records in the outcome.
pub async fn crawl(root_url: &str, config: &CrawlConfig, fetcher: Arc<dyn Fetcher>) -> CrawlOutcome {
    crawl_with_cancel(root_url, config, fetcher, CancellationToken::new()).await
}

/// [`crawl`], but honoring an external cancellation token in addition to
/// the configured deadline. On cancellation, in-flight fetches complete,
/// no new URLs are dequeued, and already-produced snapshots are returned.
pub async fn crawl_with_cancel(
    root_url: &str,
    config: &CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
) -> CrawlOutcome {
    let root = match normalize_url(root_url) {
        Ok(root) => root,
        Err(_) => {
            return CrawlOutcome {
                root_url: root_url.to_string(),
                snapshots: vec![],
                skipped: vec![SkippedUrl {
                    url: root_url.to_string(),
                    reason: SkipReason::InvalidUrl,
                }],
                offsite: vec![],
                deadline_hit: false,
            }
        }
    };
    let host = host_of(&root).unwrap_or_default();

    info!(
        root = %root,
        max_depth = config.max_depth,
        max_pages = config.max_pages,
        workers = config.concurrency,
        "crawl starting"
    );

    let ctx = Arc::new(CrawlContext {
        config: config.clone(),
        fetcher,
        frontier: Frontier::new(config.max_pages),
        limiter: Quota::with_period(config.per_host_delay).map(RateLimiter::keyed),
        host: RwLock::new(host),
        collector: Mutex::new(Collector::default()),
        cancel: cancel.child_token(),
        deadline_hit: AtomicBool::new(false),
    });

    ctx.frontier.enqueue(root.clone(), 0);

    let deadline_task = config.deadline.map(|deadline| {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            ctx.deadline_hit.store(true, Ordering::SeqCst);
            ctx.cancel.cancel();
        })
    });
    // The child token fires on external cancellation or deadline expiry;
    // either way the frontier stops handing out work while in-flight
    // fetches run to completion.
    let closer = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            ctx.cancel.cancelled().await;
            ctx.frontier.close();
        })
    };

    let mut workers = JoinSet::new();
    for _ in 0..config.concurrency.max(1) {
        let ctx = Arc::clone(&ctx);
        workers.spawn(async move {
            while let Some(job) = ctx.frontier.next_job().await {
                ctx.run_job(job).await;
            }
        });
    }
    while workers.join_next().await.is_some() {}

    closer.abort();
    if let Some(task) = deadline_task {
        task.abort();
    }

    let deadline_hit = ctx.deadline_hit.load(Ordering::SeqCst);
    let collector = {
        let mut guard = ctx.collector.lock().unwrap();
        std::mem::take(&mut *guard)
    };
    let mut offsite: Vec<String> = collector.offsite.into_iter().collect();
    offsite.sort();

    info!(
        root = %root,
        pages = collector.snapshots.len(),
        skipped = collector.skipped.len(),
        offsite = offsite.len(),
        deadline_hit,
        "crawl complete"
    );

    CrawlOutcome {
        root_url: root,
        snapshots: collector.snapshots,
        skipped: collector.skipped,
        offsite,
        deadline_hit,
    }
}

#[derive(Default)]
struct Collector {
    snapshots: Vec<PageSnapshot>,
    skipped: Vec<SkippedUrl>,
    offsite: HashSet<String>,
}

struct CrawlContext {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    frontier: Frontier,
    limiter: Option<HostLimiter>,
    /// Crawl host; re-resolved once if the root fetch redirects to a
    /// different host (e.g. example.com -> www.example.com)
    host: RwLock<String>,
    collector: Mutex<Collector>,
    cancel: CancellationToken,
    deadline_hit: AtomicBool,
}

impl CrawlContext {
    async fn run_job(&self, job: Job) {
        if let Some(limiter) = &self.limiter {
            if let Some(host) = host_of(&job.url) {
                limiter.until_key_ready(&host).await;
            }
        }

        let result = self
            .fetcher
            .fetch(&job.url, self.config.fetch_timeout)
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                debug!(url = %job.url, error = %err, "fetch skipped");
                self.skip(&job.url, SkipReason::from_fetch(&err));
                self.frontier.complete_failure();
                return;
            }
        };

        let final_url = normalize_url(&response.final_url).unwrap_or_else(|_| job.url.clone());

        if final_url != job.url {
            if !self.frontier.mark_visited(&final_url) {
                self.skip(&job.url, SkipReason::RedirectAlreadyVisited);
                self.frontier.complete_failure();
                return;
            }
            let final_host = host_of(&final_url).unwrap_or_default();
            let crawl_host = self.host.read().unwrap().clone();
            if final_host != crawl_host {
                if job.depth == 0 {
                    // The root itself moved; adopt its resolved host.
                    info!(original = %crawl_host, resolved = %final_host, "root host re-resolved after redirect");
                    *self.host.write().unwrap() = final_host;
                } else {
                    self.skip(&job.url, SkipReason::OffHostRedirect);
                    self.collector
                        .lock()
                        .unwrap()
                        .offsite
                        .insert(final_url.clone());
                    self.frontier.complete_failure();
                    return;
                }
            }
        }

        if !response.is_html() {
            self.skip(&job.url, SkipReason::NotHtml);
            self.frontier.complete_failure();
            return;
        }

        let html = response.text();

        if job.depth < self.config.max_depth {
            self.discover_links(&html, &final_url, job.depth);
        }

        debug!(url = %job.url, depth = job.depth, status = response.status, "snapshot produced");
        self.collector.lock().unwrap().snapshots.push(PageSnapshot {
            url: job.url,
            final_url,
            status: response.status,
            html,
            fetched_at: Utc::now(),
            depth: job.depth,
        });
        self.frontier.complete_success();
    }

    fn discover_links(&self, html: &str, page_url: &str, depth: usize) {
        let Ok(base) = Url::parse(page_url) else {
            return;
        };
        let crawl_host = self.host.read().unwrap().clone();

        for link in extract_links(html, &base) {
            let Ok(normalized) = normalize_url(link.as_str()) else {
                continue;
            };
            let link_host = link.host_str().map(|h| h.to_lowercase());
            if link_host.as_deref() == Some(crawl_host.as_str()) {
                // Duplicates and closed-frontier pushes are silently dropped.
                let _ = self.frontier.enqueue(normalized, depth + 1);
            } else {
                self.collector.lock().unwrap().offsite.insert(normalized);
            }
        }
    }

    fn skip(&self, url: &str, reason: SkipReason) {
        if matches!(reason, SkipReason::Timeout | SkipReason::Connect) {
            warn!(url = %url, reason = %reason.code(), "url skipped");
        }
        self.collector.lock().unwrap().skipped.push(SkippedUrl {
            url: url.to_string(),
            reason,
        });
    }
}

/// Pull anchor targets out of a page, resolved against its final URL.
/// Anchors, javascript:, mailto:, and tel: links are ignored.
fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("anchor selector");

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }
        if let Ok(resolved) = base.join(href) {
            if resolved.scheme() == "http" || resolved.scheme() == "https" {
                links.push(resolved);
            }
        }
    }
    links
}
