use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use webscout_core::{CrawlError, CrawlJob};

use crate::{CrawlState, Frontier};

/// Default on-disk state file name.
pub const DEFAULT_STATE_FILE: &str = "crawler_state.json";

/// Serialized crawl state: visited set, pending frontier (ordered) and the
/// fingerprint store. The format is opaque; no cross-version compatibility
/// is promised.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub visited: Vec<String>,
    pub frontier: Vec<FrontierEntry>,
    pub fingerprints: Vec<Fingerprint>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub url: String,
    pub body: Vec<u8>,
}

impl Snapshot {
    /// Capture the current state. Sets are sorted so that capturing an idle
    /// state twice yields bytewise-identical output.
    pub async fn capture(frontier: &Frontier, state: &CrawlState) -> Self {
        let mut visited: Vec<String> = state.visited.iter().map(|e| e.key().clone()).collect();
        visited.sort();

        let frontier_entries = frontier
            .entries()
            .await
            .into_iter()
            .map(|job| FrontierEntry {
                url: job.url.to_string(),
                depth: job.depth,
            })
            .collect();

        let mut fingerprints: Vec<Fingerprint> = state
            .changes
            .entries()
            .into_iter()
            .map(|(url, body)| Fingerprint { url, body })
            .collect();
        fingerprints.sort_by(|a, b| a.url.cmp(&b.url));

        Self {
            visited,
            frontier: frontier_entries,
            fingerprints,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CrawlError> {
        let data = serde_json::to_vec(self)
            .map_err(|e| CrawlError::Storage(format!("serialize state: {e}")))?;
        std::fs::write(path, data)
            .map_err(|e| CrawlError::Storage(format!("write state {}: {e}", path.display())))?;
        info!(path = %path.display(), "crawl state saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        let data = std::fs::read(path)
            .map_err(|e| CrawlError::Storage(format!("read state {}: {e}", path.display())))?;
        serde_json::from_slice(&data)
            .map_err(|e| CrawlError::Storage(format!("corrupt state {}: {e}", path.display())))
    }

    /// Replace the in-memory structures with this snapshot's contents.
    pub async fn restore(self, frontier: &Frontier, state: &CrawlState) -> Result<(), CrawlError> {
        let mut jobs = Vec::with_capacity(self.frontier.len());
        for entry in self.frontier {
            let url = Url::parse(&entry.url)
                .map_err(|e| CrawlError::Storage(format!("bad frontier URL in state: {e}")))?;
            jobs.push(CrawlJob::new(url, entry.depth));
        }
        frontier.restore(jobs).await;

        for url in self.visited {
            frontier.mark_seen(&url);
            state.visited.insert(url);
        }
        state
            .changes
            .restore(self.fingerprints.into_iter().map(|f| (f.url, f.body)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscout_core::CrawlPattern;

    async fn populated() -> (Frontier, CrawlState) {
        let frontier = Frontier::new(CrawlPattern::BreadthFirst);
        let state = CrawlState::new();

        for path in ["/b", "/a"] {
            let url = Url::parse(&format!("http://h{path}")).unwrap();
            frontier.push(CrawlJob::new(url, 1)).await;
        }
        state.visited.insert("http://h/".to_string());
        frontier.mark_seen("http://h/");
        state.changes.observe("http://h/", b"body");

        (frontier, state)
    }

    #[tokio::test]
    async fn test_round_trip_is_bytewise_stable() {
        let (frontier, state) = populated().await;
        let snapshot = Snapshot::capture(&frontier, &state).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STATE_FILE);
        snapshot.save(&path).unwrap();
        let first = std::fs::read(&path).unwrap();

        let restored_frontier = Frontier::new(CrawlPattern::BreadthFirst);
        let restored_state = CrawlState::new();
        Snapshot::load(&path)
            .unwrap()
            .restore(&restored_frontier, &restored_state)
            .await
            .unwrap();

        let again = Snapshot::capture(&restored_frontier, &restored_state).await;
        again.save(&path).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_restore_preserves_frontier_order_and_dedup() {
        let (frontier, state) = populated().await;
        let snapshot = Snapshot::capture(&frontier, &state).await;

        let restored_frontier = Frontier::new(CrawlPattern::BreadthFirst);
        let restored_state = CrawlState::new();
        snapshot
            .restore(&restored_frontier, &restored_state)
            .await
            .unwrap();

        // Visited URLs must not be re-enqueueable after a restore.
        let visited_again = CrawlJob::new(Url::parse("http://h/").unwrap(), 0);
        assert!(!restored_frontier.push(visited_again).await);

        let order: Vec<String> = restored_frontier
            .entries()
            .await
            .into_iter()
            .map(|j| j.url.path().to_string())
            .collect();
        assert_eq!(order, vec!["/b", "/a"]);
        assert!(restored_state.visited.contains("http://h/"));
        assert!(!restored_state.changes.observe("http://h/", b"body"));
    }
}
