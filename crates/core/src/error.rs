use thiserror::Error;

/// Fatal and run-level errors.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("notify error: {0}")]
    Notify(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Per-URL fetch failures. All of these are recoverable: the URL is skipped
/// or routed to the broken-links report and the crawl continues.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http status {0}")]
    Http(u16),

    #[error("timeout after {0}s")]
    Timeout(u64),

    #[error("disallowed by robots.txt")]
    RobotsDenied,

    #[error("content type not allowed: {0}")]
    ContentType(String),

    #[error("url matches exclude pattern: {0}")]
    ExcludedPattern(String),

    #[error("renderer error: {0}")]
    Renderer(String),
}
