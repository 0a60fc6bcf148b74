use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use url::Url;

/// Title used when a page has no `<title>` element.
pub const NO_TITLE: &str = "No title";

/// One crawled page, as emitted to a sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub metadata: BTreeMap<String, String>,
    pub content: String,
    pub category: String,
}

/// Raw result of fetching a URL, before extraction.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: Url,
    /// URL after redirects; link resolution and the output record use this.
    pub final_url: Url,
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// A frontier entry. Two jobs with equal URLs are duplicates regardless of depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub url: Url,
    pub depth: u32,
}

impl CrawlJob {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}
