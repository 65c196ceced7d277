//! PII scrubbing for complaint text before it is analyzed or logged.

use std::sync::LazyLock;

use regex::Regex;

use crate::rules::compile;

/// Longest text kept by [`scrub`], in characters.
pub const MAX_SCRUBBED_CHARS: usize = 2000;

/// Kazakh mobile/landline numbers: `+7 701 123 45 67`, `8(727)123-45-67`.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?:\+?7|8)[\s\-]?\(?[0-9]{3}\)?[\s\-]?[0-9]{3}[\s\-]?[0-9]{2}[\s\-]?[0-9]{2}")
});

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"));

static URL_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"https?://\S+|www\.\S+"));

/// Long digit runs (phone-like in any format) or e-mails.
static PII_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\+?[0-9][0-9\-\s]{8,}[0-9]|[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
});

static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

/// Replaces phone numbers with `<phone>` and e-mails with `<email>`, then
/// caps the text at [`MAX_SCRUBBED_CHARS`] characters.
pub fn scrub(text: &str) -> String {
    let t = PHONE_RE.replace_all(text, "<phone>");
    let t = EMAIL_RE.replace_all(&t, "<email>");
    t.chars().take(MAX_SCRUBBED_CHARS).collect()
}

/// Drops URLs and PII runs entirely and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    let t = URL_RE.replace_all(text.trim(), " ");
    let t = PII_RUN_RE.replace_all(&t, " ");
    SPACES_RE.replace_all(&t, " ").trim().to_string()
}
