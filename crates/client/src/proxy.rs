use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use webscout_core::CrawlError;

/// Round-robin selection over a static proxy list. Safe for concurrent
/// callers; exact interleaving under contention is unspecified.
pub struct ProxyRotator {
    endpoints: Vec<String>,
    counter: AtomicUsize,
}

impl ProxyRotator {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            counter: AtomicUsize::new(0),
        }
    }

    /// Load a newline-separated endpoint list. Blank lines and `#` comments
    /// are skipped.
    pub fn from_file(path: &Path) -> Result<Self, CrawlError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CrawlError::Config(format!("cannot read proxy list {}: {e}", path.display()))
        })?;
        let endpoints = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Ok(Self::new(endpoints))
    }

    pub fn next(&self) -> Option<&str> {
        if self.endpoints.is_empty() {
            return None;
        }
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        Some(&self.endpoints[idx])
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_yields_none() {
        let rotator = ProxyRotator::new(vec![]);
        assert_eq!(rotator.next(), None);
        assert_eq!(rotator.next(), None);
    }

    #[test]
    fn test_round_robin() {
        let rotator = ProxyRotator::new(vec!["a:1".into(), "b:2".into(), "c:3".into()]);
        assert_eq!(rotator.next(), Some("a:1"));
        assert_eq!(rotator.next(), Some("b:2"));
        assert_eq!(rotator.next(), Some("c:3"));
        assert_eq!(rotator.next(), Some("a:1"));
    }
}
