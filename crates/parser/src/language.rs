/// Fallback tag when language detection yields nothing.
pub const UNKNOWN: &str = "unknown";

/// Language tag for a page's plain text. Pure and stable per input;
/// undetectable input yields [`UNKNOWN`].
pub fn classify(text: &str) -> String {
    match whatlang::detect(text) {
        Some(info) => info.lang().eng_name().to_string(),
        None => UNKNOWN.to_string(),
    }
}
