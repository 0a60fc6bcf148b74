use std::collections::BTreeMap;

/// A per-page observer, invoked after extraction and before record emission.
///
/// Plugins are registered in a table at build time and instantiated through
/// plugin-directory discovery. Errors are logged by the driver and never
/// affect the pipeline.
pub trait CrawlerPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn process(
        &self,
        url: &str,
        body: &str,
        metadata: &BTreeMap<String, String>,
        category: &str,
    ) -> anyhow::Result<()>;
}
