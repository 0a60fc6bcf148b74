use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::CrawlError;

/// Keys the YAML loader recognizes; anything else is ignored with a warning.
const KNOWN_KEYS: [&str; 18] = [
    "url",
    "depth",
    "output",
    "output_format",
    "log_file",
    "log_level",
    "delay",
    "threads",
    "breadth",
    "user_agent",
    "render_js",
    "proxy_list",
    "exclude_patterns",
    "content_types",
    "crawl_pattern",
    "notification_email",
    "plugin_dir",
    "schedule",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CrawlPattern {
    #[default]
    #[serde(rename = "breadth-first")]
    BreadthFirst,
    #[serde(rename = "depth-first")]
    DepthFirst,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URL. May instead come from the CLI positional argument.
    pub url: Option<String>,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Post-fetch sleep in seconds.
    #[serde(default = "default_delay")]
    pub delay: f64,
    /// Worker count.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Max outbound links enqueued per page.
    #[serde(default = "default_breadth")]
    pub breadth: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub render_js: bool,
    /// Path to a newline-separated proxy endpoint list.
    #[serde(default)]
    pub proxy_list: Option<String>,
    /// Substrings; any match rejects a URL.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Content-type allow-list; empty allows all.
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub crawl_pattern: CrawlPattern,
    /// SMTP recipient for change events.
    #[serde(default)]
    pub notification_email: Option<String>,
    #[serde(default = "default_plugin_dir")]
    pub plugin_dir: String,
    /// Daily wall-clock time `HH:MM`.
    #[serde(default)]
    pub schedule: Option<String>,
}

fn default_depth() -> u32 {
    2
}
fn default_output() -> String {
    "output.csv".to_string()
}
fn default_log_file() -> String {
    "web_crawler.log".to_string()
}
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_delay() -> f64 {
    1.0
}
fn default_threads() -> usize {
    5
}
fn default_breadth() -> usize {
    100
}
fn default_user_agent() -> String {
    "AdvancedWebCrawler/1.0".to_string()
}
fn default_plugin_dir() -> String {
    "plugins".to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            url: None,
            depth: default_depth(),
            output: default_output(),
            output_format: OutputFormat::default(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            delay: default_delay(),
            threads: default_threads(),
            breadth: default_breadth(),
            user_agent: default_user_agent(),
            render_js: false,
            proxy_list: None,
            exclude_patterns: Vec::new(),
            content_types: Vec::new(),
            crawl_pattern: CrawlPattern::default(),
            notification_email: None,
            plugin_dir: default_plugin_dir(),
            schedule: None,
        }
    }
}

impl CrawlConfig {
    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CrawlError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse YAML. Unknown keys warn; unsupported enum values are fatal.
    pub fn from_yaml(text: &str) -> Result<Self, CrawlError> {
        let raw: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| CrawlError::Config(format!("invalid YAML: {e}")))?;

        if let serde_yaml::Value::Mapping(map) = &raw {
            for key in map.keys() {
                if let Some(name) = key.as_str() {
                    if !KNOWN_KEYS.contains(&name) {
                        warn!(key = name, "unknown config key ignored");
                    }
                }
            }
        }

        serde_yaml::from_value(raw)
            .map_err(|e| CrawlError::Config(format!("invalid config value: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::from_yaml("url: https://example.com\n").unwrap();
        assert_eq!(config.url.as_deref(), Some("https://example.com"));
        assert_eq!(config.depth, 2);
        assert_eq!(config.output, "output.csv");
        assert_eq!(config.output_format, OutputFormat::Csv);
        assert_eq!(config.threads, 5);
        assert_eq!(config.breadth, 100);
        assert_eq!(config.user_agent, "AdvancedWebCrawler/1.0");
        assert_eq!(config.crawl_pattern, CrawlPattern::BreadthFirst);
        assert_eq!(config.plugin_dir, "plugins");
        assert!(!config.render_js);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
url: https://example.com
depth: 3
output: out.json
output_format: json
delay: 0.5
threads: 8
breadth: 10
crawl_pattern: depth-first
exclude_patterns:
  - /admin
content_types:
  - text/html
notification_email: ops@example.com
schedule: "03:30"
"#;
        let config = CrawlConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.depth, 3);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.crawl_pattern, CrawlPattern::DepthFirst);
        assert_eq!(config.delay, 0.5);
        assert_eq!(config.exclude_patterns, vec!["/admin".to_string()]);
        assert_eq!(config.notification_email.as_deref(), Some("ops@example.com"));
        assert_eq!(config.schedule.as_deref(), Some("03:30"));
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let config = CrawlConfig::from_yaml("url: https://example.com\nbogus_key: 1\n").unwrap();
        assert_eq!(config.depth, 2);
    }

    #[test]
    fn test_unsupported_enum_value_is_fatal() {
        assert!(CrawlConfig::from_yaml("output_format: xml\n").is_err());
        assert!(CrawlConfig::from_yaml("crawl_pattern: random-walk\n").is_err());
    }
}
