use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Per-URL fingerprint store. The fingerprint is the last observed body
/// itself; comparison is byte-exact.
#[derive(Default)]
pub struct ChangeDetector {
    store: DashMap<String, Vec<u8>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `body` for `url`. Returns true iff the URL was seen before
    /// with a different body.
    pub fn observe(&self, url: &str, body: &[u8]) -> bool {
        match self.store.entry(url.to_string()) {
            Entry::Occupied(mut e) => {
                if e.get().as_slice() == body {
                    false
                } else {
                    e.insert(body.to_vec());
                    true
                }
            }
            Entry::Vacant(v) => {
                v.insert(body.to_vec());
                false
            }
        }
    }

    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        self.store
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn restore(&self, entries: impl IntoIterator<Item = (String, Vec<u8>)>) {
        for (url, body) in entries {
            self.store.insert(url, body);
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
