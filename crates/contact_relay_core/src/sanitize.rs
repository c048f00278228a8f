//! Plain-text normalization for untrusted form fields.
//!
//! Submissions are relayed as email, so the goal is readable plain text:
//! markup and executable content are dropped rather than escaped. Escaping
//! for the HTML email body happens later, in [`crate::email`].

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?(?:</(?:script|style)\s*>|$)")
        .expect("script block pattern should compile")
});

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("comment pattern should compile"));

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z!][^<>]*>").expect("tag pattern should compile")
});

static DANGEROUS_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:javascript|vbscript)\s*:|\bdata\s*:\s*[a-z]+/[a-z0-9.+-]+[;,]?")
        .expect("scheme pattern should compile")
});

static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("control pattern should compile")
});

static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("whitespace pattern should compile"));

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern should compile"));

static ANY_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

pub fn strip_markup(text: &str) -> String {
    repeat_until_stable(text, |current| {
        let without_scripts = SCRIPT_BLOCK.replace_all(current, "");
        let without_comments = HTML_COMMENT.replace_all(&without_scripts, "");
        HTML_TAG.replace_all(&without_comments, "").into_owned()
    })
}

pub fn strip_dangerous_schemes(text: &str) -> String {
    repeat_until_stable(text, |current| {
        DANGEROUS_SCHEME.replace_all(current, "").into_owned()
    })
}

/// Collapses horizontal whitespace, trims each line and keeps at most one
/// blank line between paragraphs.
pub fn collapse_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let without_controls = CONTROL_CHARS.replace_all(&unified, "");
    let lines: Vec<String> = without_controls
        .split('\n')
        .map(|line| INLINE_WHITESPACE.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    EXCESS_BLANK_LINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// Sanitizes a field that ends up in a header line; no line breaks survive.
pub fn sanitize_single_line(text: &str) -> String {
    let cleaned = clean(text);
    ANY_WHITESPACE
        .replace_all(&cleaned, " ")
        .trim()
        .to_string()
}

/// Sanitizes a free-form message body, keeping paragraph breaks.
pub fn sanitize_message(text: &str) -> String {
    collapse_whitespace(&clean(text))
}

fn clean(text: &str) -> String {
    strip_dangerous_schemes(&strip_markup(text))
}

/// Reapplies `pass` until nested constructs such as `<scr<script></script>ipt>`
/// stop reassembling. Every pass only deletes text, so a changing pass always
/// shortens it and the loop terminates.
fn repeat_until_stable(text: &str, pass: impl Fn(&str) -> String) -> String {
    let mut current = text.to_string();
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
