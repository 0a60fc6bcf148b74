mod csv;
mod json;
mod sqlite;

pub use crate::csv::CsvSink;
pub use crate::json::JsonSink;
pub use crate::sqlite::SqliteSink;

use webscout_core::{CrawlError, OutputFormat, PageRecord};

/// Write-only record stream. Writes may arrive from any worker; the driver
/// serializes them behind a lock. A sink is opened exactly once and closed
/// exactly once per run.
pub trait Sink: Send {
    fn write(&mut self, record: &PageRecord) -> Result<(), CrawlError>;
    fn close(&mut self) -> Result<(), CrawlError>;
}

/// Open the configured backend. Failure here is fatal at startup.
pub fn open_sink(format: OutputFormat, target: &str) -> Result<Box<dyn Sink>, CrawlError> {
    Ok(match format {
        OutputFormat::Csv => Box::new(CsvSink::open(target)?),
        OutputFormat::Json => Box::new(JsonSink::open(target)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(target)?),
    })
}

pub(crate) fn storage_err(e: impl std::fmt::Display) -> CrawlError {
    CrawlError::Storage(e.to_string())
}
