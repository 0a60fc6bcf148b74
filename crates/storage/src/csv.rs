use std::fs::File;

use ::csv::Writer;

use webscout_core::{CrawlError, PageRecord};

use crate::{storage_err, Sink};

const HEADER: [&str; 5] = ["URL", "Title", "Metadata", "Content", "Category"];

/// Delimited-row backend. Writes the fixed header on open; metadata is
/// JSON-encoded into a single column.
pub struct CsvSink {
    writer: Writer<File>,
}

impl CsvSink {
    pub fn open(target: &str) -> Result<Self, CrawlError> {
        let file = File::create(target)
            .map_err(|e| CrawlError::Storage(format!("open {target}: {e}")))?;
        let mut writer = Writer::from_writer(file);
        writer.write_record(HEADER).map_err(storage_err)?;
        Ok(Self { writer })
    }
}

impl Sink for CsvSink {
    fn write(&mut self, record: &PageRecord) -> Result<(), CrawlError> {
        let metadata = serde_json::to_string(&record.metadata).map_err(storage_err)?;
        self.writer
            .write_record([
                record.url.as_str(),
                record.title.as_str(),
                metadata.as_str(),
                record.content.as_str(),
                record.category.as_str(),
            ])
            .map_err(storage_err)
    }

    fn close(&mut self) -> Result<(), CrawlError> {
        self.writer.flush().map_err(storage_err)
    }
}
