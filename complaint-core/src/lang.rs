//! Kazakh / Russian share of a text, counted over letter tokens.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::rules::compile;

static LETTER_RUN_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\p{L}+"));
static KAZAKH_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"[ӘәӨөҮүҰұҚқҒғІіҢңҺһ]"));
static RUSSIAN_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"[А-Яа-яЁё]"));

/// Fractions of Kazakh-marked and Cyrillic tokens.
///
/// A token counts as Kazakh when it has a Kazakh-specific letter and as
/// Russian when it has any Russian-alphabet letter, so one token may count
/// for both. Both shares are 0 when no token counts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LangShare {
    pub kk: f64,
    pub ru: f64,
}

pub fn token_lang_share(text: &str) -> LangShare {
    let (mut kk, mut ru) = (0usize, 0usize);
    for token in LETTER_RUN_RE.find_iter(text).map(|m| m.as_str()) {
        if KAZAKH_RE.is_match(token) {
            kk += 1;
        }
        if RUSSIAN_RE.is_match(token) {
            ru += 1;
        }
    }
    let total = (kk + ru).max(1) as f64;
    LangShare {
        kk: kk as f64 / total,
        ru: ru as f64 / total,
    }
}
