//! Crawl frontier: discovery queue and visited set behind a single lock.
//!
//! The visited check-and-insert and the enqueue are one atomic step, so
//! concurrent workers can never schedule the same URL twice. The frontier
//! also owns the page budget: a worker claims a budget slot when it
//! dequeues a URL and returns it if the fetch produces no snapshot.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;

/// A URL scheduled for fetching. Depth is fixed here, at enqueue time,
/// regardless of fetch concurrency.
#[derive(Debug, Clone)]
pub struct Job {
    pub url: String,
    pub depth: usize,
}

/// Outcome of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Added,
    /// URL already visited or already queued
    Duplicate,
    /// Frontier no longer accepts work
    Closed,
}

struct FrontierState {
    queue: VecDeque<Job>,
    visited: HashSet<String>,
    in_flight: usize,
    produced: usize,
    closed: bool,
}

pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
    max_pages: usize,
}

impl Frontier {
    pub fn new(max_pages: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                visited: HashSet::new(),
                in_flight: 0,
                produced: 0,
                closed: false,
            }),
            notify: Notify::new(),
            max_pages,
        }
    }

    /// Test-and-insert against the visited set, then enqueue, atomically.
    /// `url` must already be normalized.
    pub fn enqueue(&self, url: String, depth: usize) -> Enqueue {
        {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return Enqueue::Closed;
            }
            if !state.visited.insert(url.clone()) {
                return Enqueue::Duplicate;
            }
            state.queue.push_back(Job { url, depth });
        }
        self.notify.notify_waiters();
        Enqueue::Added
    }

    /// Insert a URL into the visited set without queueing it (used for
    /// redirect targets). Returns false if it was already visited.
    pub fn mark_visited(&self, url: &str) -> bool {
        self.state.lock().unwrap().visited.insert(url.to_string())
    }

    /// Claim the next URL and a page-budget slot.
    ///
    /// Returns `None` once the frontier is drained, closed, or the page
    /// budget is exhausted. Blocks while the queue is empty but other
    /// workers are still in flight (they may discover more links).
    pub async fn next_job(&self) -> Option<Job> {
        loop {
            // Register interest before re-checking state, so a notify
            // between the check and the await is not lost.
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            {
                let mut state = self.state.lock().unwrap();
                if state.closed || state.produced >= self.max_pages {
                    return None;
                }
                if state.produced + state.in_flight < self.max_pages {
                    if let Some(job) = state.queue.pop_front() {
                        state.in_flight += 1;
                        return Some(job);
                    }
                    if state.in_flight == 0 {
                        return None;
                    }
                }
            }
            notified.await;
        }
    }

    /// A claimed job produced a snapshot; its budget slot is spent.
    pub fn complete_success(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.in_flight -= 1;
            state.produced += 1;
            if state.produced >= self.max_pages {
                state.closed = true;
            }
        }
        self.notify.notify_waiters();
    }

    /// A claimed job produced no snapshot; its budget slot is returned.
    pub fn complete_failure(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.in_flight -= 1;
        }
        self.notify.notify_waiters();
    }

    /// Stop handing out work. Queued URLs are discarded; in-flight fetches
    /// are unaffected.
    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
        self.notify.notify_waiters();
    }

    /// Snapshots produced so far.
    pub fn produced(&self) -> usize {
        self.state.lock().unwrap().produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_urls_rejected() {
        let frontier = Frontier::new(10);
        assert_eq!(
            frontier.enqueue("https://example.com/".into(), 0),
            Enqueue::Added
        );
        assert_eq!(
            frontier.enqueue("https://example.com/".into(), 1),
            Enqueue::Duplicate
        );
    }

    #[test]
    fn closed_frontier_rejects_work() {
        let frontier = Frontier::new(10);
        frontier.close();
        assert_eq!(
            frontier.enqueue("https://example.com/".into(), 0),
            Enqueue::Closed
        );
    }

    #[tokio::test]
    async fn drains_when_queue_empty_and_nothing_in_flight() {
        let frontier = Frontier::new(10);
        frontier.enqueue("https://example.com/".into(), 0);

        let job = frontier.next_job().await.expect("job available");
        assert_eq!(job.depth, 0);
        frontier.complete_success();

        assert!(frontier.next_job().await.is_none());
        assert_eq!(frontier.produced(), 1);
    }

    #[tokio::test]
    async fn budget_slots_are_reserved_at_claim_time() {
        let frontier = Frontier::new(1);
        frontier.enqueue("https://example.com/a".into(), 0);
        frontier.enqueue("https://example.com/b".into(), 0);

        let _job = frontier.next_job().await.expect("first claim");
        // Budget of 1 is held by the in-flight job; a failure returns it.
        frontier.complete_failure();

        let second = frontier.next_job().await.expect("slot returned");
        assert_eq!(second.url, "https://example.com/b");
        frontier.complete_success();

        assert!(frontier.next_job().await.is_none());
    }

    #[tokio::test]
    async fn redirect_targets_count_as_visited() {
        let frontier = Frontier::new(10);
        assert!(frontier.mark_visited("https://example.com/final"));
        assert_eq!(
            frontier.enqueue("https://example.com/final".into(), 1),
            Enqueue::Duplicate
        );
    }
}
