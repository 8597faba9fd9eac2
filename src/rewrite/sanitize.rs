//! Output cleanup for generated rewrites
//!
//! Models occasionally wrap plain prose in markdown, quotes or a chatty
//! preamble even when told not to. This strips those wrappers so the scorer
//! measures only the rewritten text.

use regex::Regex;
use std::sync::LazyLock;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n?(.*?)\n?```$").expect("static fence regex")
});

/// A whole first line introducing the rewrite, ending in a colon
static PREAMBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\A(?:(?:sure|certainly|okay|ok)[,!.]?[ \t]*)?(?:here(?:'s|’s| is| are)\b[^\n:]{0,60}?\b(?:rewrit\w*|version|revised|text|copy)\b[^\n:]{0,30}|rewritten(?: text| version)?):[ \t]*(?:\n+|\z)",
    )
    .expect("static preamble regex")
});

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").expect("static heading regex"));

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-*•]|\d{1,2}[.)])[ \t]+").expect("static bullet regex")
});

static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*\n]+?)\*\*|__([^_\n]+?)__").expect("static strong regex")
});

static EMPHASIS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*[^*\s](?:[^*\n]*[^*\s])?\*").expect("static emphasis regex")
});

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("static blank line regex"));

/// Strip markdown, wrapping quotes and preambles from generated text
///
/// Returns an empty string when nothing but wrapping remains.
pub fn sanitize_output(raw: &str) -> String {
    let mut text = raw.trim().replace("\r\n", "\n");

    if let Some(inner) = FENCE_RE.captures(&text).and_then(|c| c.get(1)) {
        text = inner.as_str().trim().to_string();
    }

    text = PREAMBLE_RE.replace(&text, "").into_owned();
    text = HEADING_RE.replace_all(&text, "").into_owned();
    text = BULLET_RE.replace_all(&text, "").into_owned();
    text = STRONG_RE.replace_all(&text, "$1$2").into_owned();
    text = strip_emphasis(&text);
    text = BLANK_LINES_RE.replace_all(&text, "\n\n").into_owned();

    strip_wrapping_quotes(text.trim()).trim().to_string()
}

/// Unwrap `*word*` only where both markers sit on a word boundary, so
/// arithmetic like `5*3` and inline asterisks survive
fn strip_emphasis(text: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '*';

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in EMPHASIS_RE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.is_some_and(is_word) || after.is_some_and(is_word) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(&text[m.start() + 1..m.end() - 1]);
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Remove one pair of quotes around the whole text, when no quote of the
/// same kind appears inside
fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('“', '”')] {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
            && !inner.contains(open)
            && !inner.contains(close)
        {
            return inner;
        }
    }
    text
}
