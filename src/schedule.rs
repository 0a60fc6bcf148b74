use chrono::{Duration, Local, NaiveTime};
use tracing::info;

use webscout_core::CrawlError;

/// Parse a daily `HH:MM` wall-clock schedule.
pub fn parse(spec: &str) -> Result<NaiveTime, CrawlError> {
    NaiveTime::parse_from_str(spec, "%H:%M")
        .map_err(|e| CrawlError::Config(format!("invalid schedule '{spec}': {e}")))
}

/// Sleep until the next local occurrence of `at`.
pub async fn wait_until(at: NaiveTime) {
    let now = Local::now().naive_local();
    let mut target = now.date().and_time(at);
    if target <= now {
        target += Duration::days(1);
    }
    let wait = (target - now).to_std().unwrap_or_default();
    info!(target = %target, "sleeping until next scheduled crawl");
    tokio::time::sleep(wait).await;
}
