use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use webscout_core::CrawlerPlugin;

type PluginFactory = fn() -> Box<dyn CrawlerPlugin>;

/// Build-time table of available plugins. Discovery walks the plugin
/// directory in sorted order and instantiates the factory matching each file
/// stem; unmatched entries warn. Plugins are data, not code injection.
pub struct PluginRegistry {
    factories: Vec<(&'static str, PluginFactory)>,
}

impl PluginRegistry {
    pub fn builtin() -> Self {
        Self {
            factories: vec![
                ("meta_audit", || Box::new(MetaAudit)),
                ("word_count", || Box::new(WordCount)),
            ],
        }
    }

    pub fn discover(&self, dir: &Path) -> Vec<Box<dyn CrawlerPlugin>> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            debug!(dir = %dir.display(), "no plugin directory, continuing without plugins");
            return Vec::new();
        };

        let mut stems: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            })
            .collect();
        stems.sort();
        stems.dedup();

        let mut plugins = Vec::new();
        for stem in stems {
            match self.factories.iter().find(|(name, _)| *name == stem) {
                Some((name, factory)) => {
                    info!(plugin = %name, "plugin loaded");
                    plugins.push(factory());
                }
                None => warn!(plugin = %stem, "no registered plugin for discovered entry"),
            }
        }
        plugins
    }
}

/// Flags pages that ship without a meta description.
struct MetaAudit;

impl CrawlerPlugin for MetaAudit {
    fn name(&self) -> &'static str {
        "meta_audit"
    }

    fn process(
        &self,
        url: &str,
        _body: &str,
        metadata: &BTreeMap<String, String>,
        _category: &str,
    ) -> anyhow::Result<()> {
        if !metadata.contains_key("description") {
            info!(url, "page has no meta description");
        }
        Ok(())
    }
}

/// Logs the body word count per page.
struct WordCount;

impl CrawlerPlugin for WordCount {
    fn name(&self) -> &'static str {
        "word_count"
    }

    fn process(
        &self,
        url: &str,
        body: &str,
        _metadata: &BTreeMap<String, String>,
        category: &str,
    ) -> anyhow::Result<()> {
        let words = body.split_whitespace().count();
        debug!(url, words, category, "word count");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_matches_registered_stems() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("word_count.plugin"), "").unwrap();
        std::fs::write(dir.path().join("meta_audit.plugin"), "").unwrap();
        std::fs::write(dir.path().join("mystery.plugin"), "").unwrap();

        let plugins = PluginRegistry::builtin().discover(dir.path());
        let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        // Sorted discovery order, unmatched entries skipped.
        assert_eq!(names, vec!["meta_audit", "word_count"]);
    }

    #[test]
    fn test_missing_directory_yields_no_plugins() {
        let plugins = PluginRegistry::builtin().discover(Path::new("does/not/exist"));
        assert!(plugins.is_empty());
    }

    #[test]
    fn test_plugins_accept_a_page() {
        let metadata = BTreeMap::new();
        for (_, factory) in &PluginRegistry::builtin().factories {
            let plugin = factory();
            plugin
                .process("http://h/", "some body text", &metadata, "English")
                .unwrap();
        }
    }
}
