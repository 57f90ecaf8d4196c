use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCRIPT_BLOCK_RE: Regex =
        Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script block regex is valid");
    // Unpaired open or close tags left over after block removal.
    static ref SCRIPT_TAG_RE: Regex =
        Regex::new(r"(?is)</?script\b[^>]*>").expect("script tag regex is valid");
    static ref EVENT_HANDLER_RE: Regex =
        Regex::new(r#"(?i)\bon[a-z0-9]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("event handler regex is valid");
    static ref JS_URL_RE: Regex =
        Regex::new(r"(?i)javascript\s*:").expect("javascript url regex is valid");
}

/// Cleans user-authored card text before storage: trims whitespace,
/// removes script blocks, inline event handlers and javascript: URLs,
/// then neutralizes any remaining angle brackets. The result is safe
/// to echo into an HTML context without further escaping.
pub fn clean_card_text(input: &str) -> String {
    let trimmed = input.trim();
    let no_blocks = SCRIPT_BLOCK_RE.replace_all(trimmed, "");
    let no_tags = SCRIPT_TAG_RE.replace_all(&no_blocks, "");
    let no_handlers = EVENT_HANDLER_RE.replace_all(&no_tags, "");
    let no_js_urls = JS_URL_RE.replace_all(&no_handlers, "");
    no_js_urls
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .trim()
        .to_string()
}
