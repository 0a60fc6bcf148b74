use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use webscout_core::FetchError;

/// How long a page gets to settle before its DOM is captured.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Headless-browser adapter for `render_js` mode. Launched once per run;
/// proxies are ignored on this path.
pub struct JsRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    settle: Duration,
}

impl JsRenderer {
    pub async fn launch(settle: Duration) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(FetchError::Renderer)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Renderer(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler: handle,
            settle,
        })
    }

    /// Navigate, wait the settle delay, return the rendered DOM and the
    /// document title.
    pub async fn render(&self, url: &Url) -> Result<(String, Option<String>), FetchError> {
        debug!(url = %url, "rendering");
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page(url.as_str())
                .await
                .map_err(|e| FetchError::Renderer(e.to_string()))?
        };

        tokio::time::sleep(self.settle).await;

        let body = page
            .content()
            .await
            .map_err(|e| FetchError::Renderer(e.to_string()))?;
        let title = page
            .get_title()
            .await
            .map_err(|e| FetchError::Renderer(e.to_string()))?;

        if let Err(e) = page.close().await {
            warn!(url = %url, "failed to close rendered page: {e}");
        }
        Ok((body, title))
    }

    pub async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("failed to close headless browser: {e}");
        }
        self.handler.abort();
    }
}
