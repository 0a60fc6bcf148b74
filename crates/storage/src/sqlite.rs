use rusqlite::{params, Connection};

use webscout_core::{CrawlError, PageRecord};

use crate::{storage_err, Sink};

/// Relational backend: one `pages` table, upsert by URL, committed per write.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(target: &str) -> Result<Self, CrawlError> {
        let conn = Connection::open(target)
            .map_err(|e| CrawlError::Storage(format!("open {target}: {e}")))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS pages (
                url TEXT PRIMARY KEY,
                title TEXT,
                metadata TEXT,
                content TEXT,
                category TEXT
            )",
            [],
        )
        .map_err(storage_err)?;
        Ok(Self { conn })
    }
}

impl Sink for SqliteSink {
    fn write(&mut self, record: &PageRecord) -> Result<(), CrawlError> {
        let metadata = serde_json::to_string(&record.metadata).map_err(storage_err)?;
        self.conn
            .execute(
                "INSERT INTO pages (url, title, metadata, content, category)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(url) DO UPDATE SET
                     title = excluded.title,
                     metadata = excluded.metadata,
                     content = excluded.content,
                     category = excluded.category",
                params![
                    record.url,
                    record.title,
                    metadata,
                    record.content,
                    record.category
                ],
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CrawlError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.db");
        let target = path.to_str().unwrap();

        let mut sink = SqliteSink::open(target).unwrap();
        sink.write(&record("https://example.com", "Example")).unwrap();
        sink.close().unwrap();
        drop(sink);

        let conn = Connection::open(&path).unwrap();
        let (title, category): (String, String) = conn
            .query_row(
                "SELECT title, category FROM pages WHERE url = ?1",
                ["https://example.com"],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(title, "Example");
        assert_eq!(category, "English");
    }

    #[test]
    fn test_rewrite_upserts_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.db");
        let target = path.to_str().unwrap();

        let mut sink = SqliteSink::open(target).unwrap();
        sink.write(&record("https://example.com", "First")).unwrap();
        sink.write(&record("https://example.com", "Second")).unwrap();
        sink.close().unwrap();
        drop(sink);

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let title: String = conn
            .query_row("SELECT title FROM pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(title, "Second");
    }
}
