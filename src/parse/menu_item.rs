use std::sync::OnceLock;

use regex::Regex;

/// Rows naming where ingredients come from rather than a dish. A bare
/// hyphen anywhere in the text also marks the row as an origin listing.
fn origin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("(국내산|수입산|외국산|호주산|미국산|중국산|원산지|-)")
            .expect("regex should be valid")
    })
}

/// Whether a trimmed table-cell line names an actual dish.
///
/// Filters out footnotes (`*`, `※`), origin listings, and short
/// non-Hangul fragments such as stray numbers. Callers trim first.
#[must_use]
pub fn is_menu_item(text: &str) -> bool {
    let char_count = text.chars().count();
    if char_count < 2 {
        return false;
    }
    if text.starts_with('*') || text.starts_with('※') {
        return false;
    }
    if origin_regex().is_match(text) {
        return false;
    }
    if char_count <= 2 && !text.chars().any(is_hangul_syllable) {
        return false;
    }
    true
}

const fn is_hangul_syllable(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}')
}
