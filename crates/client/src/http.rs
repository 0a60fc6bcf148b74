use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use webscout_core::{CrawlError, FetchError, FetchResponse};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Performs single HTTP GETs, optionally through a rotated proxy.
///
/// One client is prebuilt per proxy endpoint at construction; endpoints that
/// fail to build are skipped with a warning. Rate shaping happens in the
/// worker after a successful fetch, not here.
pub struct Fetcher {
    default_client: reqwest::Client,
    proxy_clients: HashMap<String, reqwest::Client>,
    timeout_secs: u64,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration, proxies: &[String]) -> Result<Self, CrawlError> {
        let default_client = build_client(user_agent, timeout, None)?;

        let mut proxy_clients = HashMap::new();
        for addr in proxies {
            match build_client(user_agent, timeout, Some(addr)) {
                Ok(client) => {
                    proxy_clients.insert(addr.clone(), client);
                }
                Err(e) => warn!(proxy = %addr, "skipping proxy: {e}"),
            }
        }

        Ok(Self {
            default_client,
            proxy_clients,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub async fn fetch(&self, url: &Url, proxy: Option<&str>) -> Result<FetchResponse, FetchError> {
        let client = proxy
            .and_then(|addr| self.proxy_clients.get(addr))
            .unwrap_or(&self.default_client);
        debug!(url = %url, proxy = proxy.unwrap_or("none"), "fetching");

        let resp = client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Http(status));
        }

        let final_url = Url::parse(resp.url().as_str()).unwrap_or_else(|_| url.clone());

        let mut headers = HashMap::new();
        for (k, v) in resp.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }
        let content_type = headers.get("content-type").cloned();

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;

        Ok(FetchResponse {
            url: url.clone(),
            final_url,
            status,
            headers,
            body: body.to_vec(),
            content_type,
        })
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

fn build_client(
    user_agent: &str,
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<reqwest::Client, CrawlError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout);

    if let Some(addr) = proxy {
        // Bare host:port entries in a proxy list are assumed to be HTTP proxies.
        let endpoint = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };
        let proxy = reqwest::Proxy::all(endpoint)
            .map_err(|e| CrawlError::Config(format!("invalid proxy {addr}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| CrawlError::Config(format!("http client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new("TestCrawler/1.0", Duration::from_secs(2), &[]).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html></html>")
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let resp = fetcher().fetch(&url, None).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"<html></html>");
        assert_eq!(
            resp.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(resp.final_url, url);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        match fetcher().fetch(&url, None).await {
            Err(FetchError::Http(404)) => {}
            other => panic!("expected Http(404), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redirect_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", "/new"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let resp = fetcher().fetch(&url, None).await.unwrap();
        assert_eq!(resp.final_url.path(), "/new");
        assert_eq!(resp.url.path(), "/old");
        assert_eq!(resp.body, b"moved");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is almost never listening.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        match fetcher().fetch(&url, None).await {
            Err(FetchError::Network(_)) | Err(FetchError::Timeout(_)) => {}
            other => panic!("expected network error, got {other:?}"),
        }
    }
}
