pub mod config;
pub mod error;
pub mod plugin;
pub mod policy;
pub mod types;

pub use config::{CrawlConfig, CrawlPattern, OutputFormat};
pub use error::{CrawlError, FetchError};
pub use plugin::CrawlerPlugin;
pub use policy::{Rejection, UrlPolicy};
pub use types::*;
