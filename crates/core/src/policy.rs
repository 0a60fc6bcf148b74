use url::Url;

/// Href prefixes that are never crawlable.
const SKIP_PREFIXES: [&str; 10] = [
    "mailto:",
    "tel:",
    "fax:",
    "file:",
    "data:",
    "sms:",
    "news:",
    "irc:",
    "magnet:",
    "javascript:",
];

/// Why a raw href was rejected for enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyHref,
    SkippedScheme,
    NonHttpScheme,
    Unparseable,
    Excluded,
}

/// Canonicalizes raw hrefs and applies user exclusion patterns plus the
/// content-type allow-list.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    exclude_patterns: Vec<String>,
    content_types: Vec<String>,
}

impl UrlPolicy {
    pub fn new(exclude_patterns: Vec<String>, content_types: Vec<String>) -> Self {
        Self {
            exclude_patterns,
            content_types,
        }
    }

    /// Resolve `href` against `base` and decide whether the result may enter
    /// the frontier. Rules apply in order: skip-listed prefixes, RFC 3986
    /// reference resolution, http(s)-only schemes, exclusion substrings.
    pub fn accept_href(&self, base: &Url, href: &str) -> Result<Url, Rejection> {
        let href = href.trim();
        if href.is_empty() {
            return Err(Rejection::EmptyHref);
        }
        if SKIP_PREFIXES.iter().any(|p| href.starts_with(p)) {
            return Err(Rejection::SkippedScheme);
        }

        let resolved = base.join(href).map_err(|_| Rejection::Unparseable)?;
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            return Err(Rejection::NonHttpScheme);
        }
        if self.excluded_pattern(resolved.as_str()).is_some() {
            return Err(Rejection::Excluded);
        }
        Ok(resolved)
    }

    /// The first configured exclusion substring present in `url`, if any.
    pub fn excluded_pattern(&self, url: &str) -> Option<&str> {
        self.exclude_patterns
            .iter()
            .find(|p| url.contains(p.as_str()))
            .map(|s| s.as_str())
    }

    /// Substring match of the first `content-type` token against the
    /// allow-list. An empty allow-list passes everything.
    pub fn allows_content_type(&self, content_type: &str) -> bool {
        if self.content_types.is_empty() {
            return true;
        }
        let first_token = content_type.split(';').next().unwrap_or("").trim();
        self.content_types
            .iter()
            .any(|allowed| first_token.contains(allowed.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://example.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_resolves_relative_hrefs() {
        let policy = UrlPolicy::default();
        let url = policy.accept_href(&base(), "/ok").unwrap();
        assert_eq!(url.as_str(), "http://example.com/ok");

        let url = policy.accept_href(&base(), "sibling.html").unwrap();
        assert_eq!(url.as_str(), "http://example.com/dir/sibling.html");
    }

    #[test]
    fn test_rejects_skip_listed_schemes() {
        let policy = UrlPolicy::default();
        for href in [
            "mailto:x@y",
            "javascript:void(0)",
            "tel:123",
            "fax:123",
            "data:text/plain,hi",
            "magnet:?xt=urn",
        ] {
            assert_eq!(
                policy.accept_href(&base(), href),
                Err(Rejection::SkippedScheme),
                "{href} should be rejected"
            );
        }
        assert_eq!(policy.accept_href(&base(), ""), Err(Rejection::EmptyHref));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let policy = UrlPolicy::default();
        assert_eq!(
            policy.accept_href(&base(), "ftp://example.com/file"),
            Err(Rejection::NonHttpScheme)
        );
    }

    #[test]
    fn test_exclusion_patterns() {
        let policy = UrlPolicy::new(vec!["/admin".into(), "/login".into()], vec![]);
        assert!(policy.accept_href(&base(), "/page").is_ok());
        assert_eq!(
            policy.accept_href(&base(), "/admin/users"),
            Err(Rejection::Excluded)
        );
        assert_eq!(
            policy.accept_href(&base(), "http://example.com/login"),
            Err(Rejection::Excluded)
        );
    }

    #[test]
    fn test_content_type_allow_list() {
        let policy = UrlPolicy::new(vec![], vec!["text/html".into(), "application/json".into()]);
        assert!(policy.allows_content_type("text/html; charset=utf-8"));
        assert!(policy.allows_content_type("application/json"));
        assert!(!policy.allows_content_type("image/jpeg"));
        assert!(!policy.allows_content_type(""));

        let open = UrlPolicy::default();
        assert!(open.allows_content_type("image/jpeg"));
    }
}
