use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use robotstxt::DefaultMatcher;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use webscout_core::CrawlError;

/// Robots agent used when no user agent is configured.
pub const DEFAULT_AGENT: &str = "*";

enum RobotsPolicy {
    Rules(String),
    /// Fetch or read failure. Treated as allowed.
    Unknown,
}

/// Per-origin robots.txt cache, populated lazily, never evicted within a run.
/// The per-origin `OnceCell` guarantees a single fetch even under concurrent
/// lookups of the same origin.
pub struct RobotsCache {
    client: reqwest::Client,
    agent: String,
    origins: DashMap<String, Arc<OnceCell<RobotsPolicy>>>,
}

impl RobotsCache {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("robots client: {e}")))?;
        let agent = if user_agent.is_empty() {
            DEFAULT_AGENT.to_string()
        } else {
            user_agent.to_string()
        };
        Ok(Self {
            client,
            agent,
            origins: DashMap::new(),
        })
    }

    /// May `url` be fetched as the configured agent?
    pub async fn can_fetch(&self, url: &Url) -> bool {
        let agent = self.agent.clone();
        self.can_fetch_as(url, &agent).await
    }

    pub async fn can_fetch_as(&self, url: &Url, agent: &str) -> bool {
        let origin = url.origin().ascii_serialization();
        let cell = self
            .origins
            .entry(origin.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let policy = cell.get_or_init(|| self.fetch_policy(origin)).await;
        match policy {
            RobotsPolicy::Unknown => true,
            RobotsPolicy::Rules(body) => {
                DefaultMatcher::default().one_agent_allowed_by_robots(body, agent, url.as_str())
            }
        }
    }

    async fn fetch_policy(&self, origin: String) -> RobotsPolicy {
        let robots_url = format!("{origin}/robots.txt");
        debug!(url = %robots_url, "fetching robots.txt");

        match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => RobotsPolicy::Rules(body),
                Err(e) => {
                    warn!(url = %robots_url, "robots.txt read failed, treating origin as allowed: {e}");
                    RobotsPolicy::Unknown
                }
            },
            Ok(resp) => {
                warn!(
                    url = %robots_url,
                    status = resp.status().as_u16(),
                    "robots.txt fetch failed, treating origin as allowed"
                );
                RobotsPolicy::Unknown
            }
            Err(e) => {
                warn!(url = %robots_url, "robots.txt fetch failed, treating origin as allowed: {e}");
                RobotsPolicy::Unknown
            }
        }
    }
}
