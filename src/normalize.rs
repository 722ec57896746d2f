//! Text normalization shared by catalog indexing and search queries.
//!
//! Both sides of a match must go through [`normalize`] so that
//! `"Don't Stop"` and `"dont stop"` meet in the middle.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Anything that is neither a word character nor whitespace.
    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s]").unwrap();
}

/// Lowercases `text` and strips every character that is not alphanumeric
/// or whitespace.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)` for any
/// input, including the empty string.
///
/// # Examples
///
/// ```
/// use cadence::normalize::normalize;
///
/// assert_eq!(normalize("Don't Stop Me Now!"), "dont stop me now");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    PUNCTUATION.replace_all(&lowered, "").into_owned()
}

/// Normalizes an optional field, treating absence as the empty string.
#[must_use]
pub fn normalize_opt(text: Option<&str>) -> String {
    normalize(text.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation_and_lowercases() {
        assert_eq!(normalize("Don't Stop"), "dont stop");
        assert_eq!(normalize("AC/DC"), "acdc");
        assert_eq!(normalize("Guns N' Roses"), "guns n roses");
    }

    #[test]
    fn test_keeps_whitespace_and_digits() {
        assert_eq!(normalize("  99 Luftballons\t"), "  99 luftballons\t");
    }

    #[test]
    fn test_keeps_non_ascii_letters() {
        assert_eq!(normalize("Beyoncé — Halo"), "beyoncé  halo");
    }

    #[test]
    fn test_is_idempotent() {
        let inputs = ["Don't Stop", "", "!!!", "Mötley Crüe", "P!nk", "İstanbul", "a.b,c;d"];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "normalize must be idempotent for {input:?}");
        }
    }

    #[test]
    fn test_total_on_empty_and_missing() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!."), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("Hey!")), "hey");
    }
}
