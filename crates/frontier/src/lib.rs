pub mod change;
pub mod snapshot;

pub use change::ChangeDetector;
pub use snapshot::{Snapshot, DEFAULT_STATE_FILE};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use dashmap::DashSet;
use tokio::sync::Mutex;

use webscout_core::{CrawlJob, CrawlPattern};

/// Shared work queue with a traversal order. Breadth-first pops the front;
/// depth-first pops the back, with each page's links appended in reverse so
/// the page's first link is explored first.
pub struct Frontier {
    queue: Mutex<VecDeque<CrawlJob>>,
    order: CrawlPattern,
    /// Every URL ever enqueued this run (superset of visited); dedups pushes.
    enqueued: DashSet<String>,
    /// Jobs currently inside a worker pipeline. The crawl is done only when
    /// the queue is empty and nothing is in flight.
    in_flight: AtomicUsize,
}

impl Frontier {
    pub fn new(order: CrawlPattern) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            order,
            enqueued: DashSet::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Enqueue one job unless its URL was already enqueued this run.
    pub async fn push(&self, job: CrawlJob) -> bool {
        if !self.enqueued.insert(job.url.to_string()) {
            return false;
        }
        self.queue.lock().await.push_back(job);
        true
    }

    /// Enqueue the accepted links of one page in a single lock acquisition.
    /// Returns how many were actually enqueued after dedup.
    pub async fn push_links(&self, mut jobs: Vec<CrawlJob>) -> usize {
        if jobs.is_empty() {
            return 0;
        }
        if self.order == CrawlPattern::DepthFirst {
            jobs.reverse();
        }
        let mut queue = self.queue.lock().await;
        let mut added = 0;
        for job in jobs {
            if self.enqueued.insert(job.url.to_string()) {
                queue.push_back(job);
                added += 1;
            }
        }
        added
    }

    /// Pop per traversal order. A successful pop marks the job in flight;
    /// the worker must balance it with [`finish_job`](Self::finish_job).
    pub async fn pop(&self) -> Option<CrawlJob> {
        let mut queue = self.queue.lock().await;
        let job = match self.order {
            CrawlPattern::BreadthFirst => queue.pop_front(),
            CrawlPattern::DepthFirst => queue.pop_back(),
        };
        if job.is_some() {
            // Incremented while the queue lock is held so is_done() can
            // never observe an empty queue before the job counts as active.
            self.in_flight.fetch_add(1, Ordering::SeqCst);
        }
        job
    }

    pub fn finish_job(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// True when the queue is empty and no worker can still repopulate it.
    pub async fn is_done(&self) -> bool {
        let queue = self.queue.lock().await;
        queue.is_empty() && self.in_flight.load(Ordering::SeqCst) == 0
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Pending entries in queue order, for snapshotting.
    pub async fn entries(&self) -> Vec<CrawlJob> {
        self.queue.lock().await.iter().cloned().collect()
    }

    /// Replace the queue contents (snapshot restore).
    pub async fn restore(&self, jobs: Vec<CrawlJob>) {
        let mut queue = self.queue.lock().await;
        queue.clear();
        for job in jobs {
            self.enqueued.insert(job.url.to_string());
            queue.push_back(job);
        }
    }

    /// Mark a URL as already enqueued without queuing it (restored visited).
    pub fn mark_seen(&self, url: &str) {
        self.enqueued.insert(url.to_string());
    }
}

/// A fetch that failed; collected for the end-of-run report.
#[derive(Debug, Clone)]
pub struct BrokenLink {
    pub url: String,
    pub error: String,
}

/// Per-run shared crawl state: visited set, fingerprint store, broken links.
#[derive(Default)]
pub struct CrawlState {
    pub visited: DashSet<String>,
    pub changes: ChangeDetector,
    broken: StdMutex<Vec<BrokenLink>>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_broken(&self, url: &str, error: &str) {
        let mut broken = self.broken.lock().unwrap_or_else(|e| e.into_inner());
        broken.push(BrokenLink {
            url: url.to_string(),
            error: error.to_string(),
        });
    }

    pub fn broken_links(&self) -> Vec<BrokenLink> {
        self.broken
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
