use std::collections::BTreeMap;

use scraper::{Html, Selector};

use webscout_core::NO_TITLE;

/// What the extractor pulls out of one fetched page.
pub struct Extracted {
    pub title: String,
    /// Raw `<a href>` values; normalization happens at enqueue.
    pub links: Vec<String>,
    /// Meta tags keyed by `name` else `property`; first occurrence wins.
    pub metadata: BTreeMap<String, String>,
    /// Concatenated text nodes, used for classification.
    pub text: String,
}

/// Parse a (possibly malformed) HTML body.
pub fn extract(html_str: &str) -> Extracted {
    let document = Html::parse_document(html_str);

    let title = selector("title")
        .and_then(|s| document.select(&s).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let links = selector("a[href]")
        .map(|s| {
            document
                .select(&s)
                .filter_map(|el| el.value().attr("href").map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut metadata = BTreeMap::new();
    if let Some(sel) = selector("meta") {
        for el in document.select(&sel) {
            let Some(key) = el.value().attr("name").or_else(|| el.value().attr("property"))
            else {
                continue;
            };
            let value = el.value().attr("content").unwrap_or("").to_string();
            metadata.entry(key.to_string()).or_insert(value);
        }
    }

    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    Extracted {
        title,
        links,
        metadata,
        text,
    }
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}
