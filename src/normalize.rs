use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DATE_KANJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").unwrap());
static DATE_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})").unwrap());
static DATE_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());

fn pad(caps: &Captures, sep_a: &str, sep_b: &str, suffix: &str) -> String {
    let month: u32 = caps[2].parse().unwrap_or_default();
    let day: u32 = caps[3].parse().unwrap_or_default();
    format!("{}{}{:02}{}{:02}{}", &caps[1], sep_a, month, sep_b, day, suffix)
}

/// Rewrites date-like substrings with zero-padded month/day, in place.
///
/// Three shapes are recognized: `2025年8月8日`, `2025/8/8` and `2025-8-8`.
/// Anything around a match (range arrows, weekday markers, plain prose) is
/// preserved untouched, so "8/5〜" style open ranges normalize fine too.
pub fn normalize_date(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let step = DATE_KANJI.replace_all(text, |c: &Captures| pad(c, "年", "月", "日"));
    let step = DATE_SLASH.replace_all(&step, |c: &Captures| pad(c, "/", "/", ""));
    let step = DATE_HYPHEN.replace_all(&step, |c: &Captures| pad(c, "-", "-", ""));
    step.into_owned()
}

/// `normalize_date` over an optional field; absent maps to empty.
pub fn normalize_date_opt(text: Option<&str>) -> String {
    text.map(normalize_date).unwrap_or_default()
}

/// Canonicalizes a string for fingerprint comparison: drops ASCII and
/// full-width spaces, drops half- and full-width parentheses, lowercases.
/// Idempotent by construction.
pub fn normalize_string(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '\u{3000}' | '(' | ')' | '（' | '）'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_kanji_dates() {
        assert_eq!(normalize_date("2025年8月8日"), "2025年08月08日");
        assert_eq!(normalize_date("2025年12月31日"), "2025年12月31日");
    }

    #[test]
    fn pads_slash_and_hyphen_dates() {
        assert_eq!(normalize_date("2025/8/8"), "2025/08/08");
        assert_eq!(normalize_date("2025-8-8"), "2025-08-08");
    }

    #[test]
    fn preserves_surrounding_text_and_open_ranges() {
        assert_eq!(
            normalize_date("開催は2025/8/5〜、入場無料"),
            "開催は2025/08/05〜、入場無料"
        );
        assert_eq!(normalize_date("近日公開"), "近日公開");
    }

    #[test]
    fn empty_and_missing_input_stay_empty() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "");
        assert_eq!(normalize_date_opt(None), "");
    }

    #[test]
    fn string_normalization_collapses_width_space_and_parens() {
        assert_eq!(normalize_string("渋谷 パルコ"), normalize_string("渋谷パルコ"));
        assert_eq!(
            normalize_string("渋谷　PARCO（本館）"),
            normalize_string("渋谷parco本館")
        );
    }

    #[test]
    fn string_normalization_is_idempotent() {
        let once = normalize_string("渋谷 PARCO (B1F)");
        assert_eq!(normalize_string(&once), once);
    }
}
