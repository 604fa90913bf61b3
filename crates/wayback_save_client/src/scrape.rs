//! Extractors for the HTML page returned by the save endpoint.
//!
//! The page is not a stable API. Each check is an independent function that
//! returns an optional match so it can be exercised against fixture HTML.

use regex::Regex;
use std::sync::LazyLock;

static RE_WATCH_JOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"spn\.watchJob\(\s*["']([^"'\s]+)["']"#).expect("watchJob pattern")
});
static RE_ERROR_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\b(?:id|class)\s*=\s*["'][^"']*\berror\b[^"']*["'][^>]*>"#)
        .expect("error block pattern")
});
static RE_SORRY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-6]\b[^>]*>\s*(?:<[^>]+>\s*)*sorry").expect("sorry pattern")
});
static RE_RETURN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<a\b[^>]*>\s*(?:<[^>]+>\s*)*return to save page").expect("return pattern")
});
static RE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("paragraph pattern"));
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static RE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("space pattern"));

const SNIPPET_LEN: usize = 200;

/// What an embedded error block turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorBlock {
    /// A recognised "sorry" page; carries the human-readable reason.
    Rejected(String),
    /// Error-shaped markup without the expected markers.
    Unrecognized(String),
}

/// Job id from the `spn.watchJob("<id>"` call embedded in the page.
pub fn extract_job_id(body: &str) -> Option<String> {
    RE_WATCH_JOB
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Body text from the start of the first error-shaped `<div>` onward.
pub fn find_error_block(body: &str) -> Option<&str> {
    RE_ERROR_BLOCK.find(body).map(|m| &body[m.start()..])
}

pub fn has_sorry_heading(block: &str) -> bool {
    RE_SORRY_HEADING.is_match(block)
}

pub fn has_return_link(block: &str) -> bool {
    RE_RETURN_LINK.is_match(block)
}

/// Text of the first `<p>` element, tags stripped and whitespace collapsed.
pub fn extract_message(block: &str) -> Option<String> {
    RE_PARAGRAPH
        .captures_iter(block)
        .filter_map(|c| c.get(1))
        .map(|m| html_text(m.as_str()))
        .find(|text| !text.is_empty())
}

pub fn classify_error_block(body: &str) -> Option<ErrorBlock> {
    let block = find_error_block(body)?;
    if has_sorry_heading(block) && has_return_link(block) {
        let message = extract_message(block)
            .unwrap_or_else(|| "the service could not save this page".to_string());
        return Some(ErrorBlock::Rejected(message));
    }
    Some(ErrorBlock::Unrecognized(snippet(&html_text(block))))
}

/// First characters of `text`, for log lines and error messages.
pub fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(SNIPPET_LEN).collect();
    if text.chars().count() > SNIPPET_LEN {
        out.push_str("...");
    }
    out
}

fn html_text(fragment: &str) -> String {
    let stripped = RE_TAG.replace_all(fragment, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    RE_SPACE.replace_all(&decoded, " ").trim().to_string()
}
