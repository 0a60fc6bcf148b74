use std::fs::File;
use std::io::{BufWriter, Write};

use webscout_core::{CrawlError, PageRecord};

use crate::{storage_err, Sink};

/// JSON-array backend, streamed: the document opens with `[`, records are
/// separated by `,\n` and the array is closed with `\n]`. The sink tracks
/// whether a first record was written to omit the leading separator.
pub struct JsonSink {
    out: BufWriter<File>,
    wrote_first: bool,
}

impl JsonSink {
    pub fn open(target: &str) -> Result<Self, CrawlError> {
        let file = File::create(target)
            .map_err(|e| CrawlError::Storage(format!("open {target}: {e}")))?;
        let mut out = BufWriter::new(file);
        out.write_all(b"[\n").map_err(storage_err)?;
        Ok(Self {
            out,
            wrote_first: false,
        })
    }
}

impl Sink for JsonSink {
    fn write(&mut self, record: &PageRecord) -> Result<(), CrawlError> {
        if self.wrote_first {
            self.out.write_all(b",\n").map_err(storage_err)?;
        }
        let json = serde_json::to_string(record).map_err(storage_err)?;
        self.out.write_all(json.as_bytes()).map_err(storage_err)?;
        self.wrote_first = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CrawlError> {
        self.out.write_all(b"\n]").map_err(storage_err)?;
        self.out.flush().map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn test_emits_valid_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let target = path.to_str().unwrap();

        let mut sink = JsonSink::open(target).unwrap();
        sink.write(&record("https://example.com/a", "A")).unwrap();
        sink.write(&record("https://example.com/b", "B")).unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["url"], "https://example.com/a");
        assert_eq!(items[0]["metadata"]["description"], "Test page");
        assert_eq!(items[1]["title"], "B");
    }

    #[test]
    fn test_empty_run_is_still_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let mut sink = JsonSink::open(path.to_str().unwrap()).unwrap();
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 0);
    }
}
