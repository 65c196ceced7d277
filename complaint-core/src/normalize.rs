//! # Text Normalizer
//!
//! Canonical form used by every matching component (gazetteer variants,
//! fuzzy search, participant lexicon). Complaints mix Kazakh and Russian,
//! are typed on several keyboard layouts and often carry Latin letters in
//! the middle of Cyrillic words ("Capыарка" with Latin `C`, `a`, `p`).
//!
//! ## Steps
//!
//! 1. **Compose** (NFC) and **lower-case** the whole text. Combining marks
//!    that survive composition are dropped.
//! 2. **Homoglyphs**: inside a word that already contains Cyrillic, Latin
//!    look-alikes (`a c e o p x y k i`) become their Cyrillic letters.
//! 3. **Fold**: Latin letters with diacritics, full-width forms and
//!    ligatures decompose (NFKD) to plain ASCII.
//! 4. **Filter**: everything outside `[a-z0-9а-яёқңғүұіһәө\- ]` becomes a space.
//! 5. **Collapse** runs of whitespace and trim.
//!
//! ```rust
//! use complaint_core::normalize::normalize;
//!
//! assert_eq!(normalize("  Сарыарқа  аялдамасы!! "), "сарыарқа аялдамасы");
//! assert_eq!(normalize("Café «Astana»"), "cafe astana");
//! ```

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Kazakh letters kept on top of the Russian alphabet.
const KAZAKH_LETTERS: &[char] = &['қ', 'ң', 'ғ', 'ү', 'ұ', 'і', 'һ', 'ә', 'ө'];

/// Latin letters typed in place of identical-looking Cyrillic ones.
const HOMOGLYPHS: &[(char, char)] = &[
    ('a', 'а'),
    ('c', 'с'),
    ('e', 'е'),
    ('o', 'о'),
    ('p', 'р'),
    ('x', 'х'),
    ('y', 'у'),
    ('k', 'к'),
    ('i', 'і'),
];

/// Normalizes text for matching. Pure; empty input gives an empty string.
pub fn normalize(s: &str) -> String {
    let lower = s.nfc().collect::<String>().to_lowercase();
    let mut out = String::with_capacity(lower.len());

    for chunk in lower.split_whitespace() {
        let cyrillic_word = chunk.chars().any(is_cyrillic);
        for c in chunk.chars() {
            fold_char(c, cyrillic_word, &mut out);
        }
        out.push(' ');
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits already-normalized text into words (Unicode word boundaries).
pub fn words(s: &str) -> Vec<&str> {
    s.unicode_words().collect()
}

fn fold_char(c: char, cyrillic_word: bool, out: &mut String) {
    // marks left after composition (stress accents) belong to the letter before
    if is_combining_mark(c) {
        return;
    }
    if c.is_ascii() {
        let c = if cyrillic_word { homoglyph(c).unwrap_or(c) } else { c };
        out.push(if is_allowed(c) { c } else { ' ' });
        return;
    }
    if is_cyrillic(c) {
        out.push(if is_allowed(c) { c } else { ' ' });
        return;
    }

    // symbols such as `№` decompose to letters too, so only fold letters and digits
    if !c.is_alphanumeric() {
        out.push(' ');
        return;
    }
    let mut pushed = false;
    for d in c.nfkd().filter(|d| d.is_ascii_alphanumeric()) {
        out.push(d.to_ascii_lowercase());
        pushed = true;
    }
    if !pushed {
        out.push(' ');
    }
}

fn homoglyph(c: char) -> Option<char> {
    HOMOGLYPHS
        .iter()
        .find(|(latin, _)| *latin == c)
        .map(|(_, cyr)| *cyr)
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

fn is_allowed(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | 'а'..='я' | 'ё' | '-' | ' ') || KAZAKH_LETTERS.contains(&c)
}
