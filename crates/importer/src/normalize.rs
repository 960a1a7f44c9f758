//! String cleanup shared by every parsing and matching step.

use std::borrow::Cow;
use std::collections::HashMap;

use lazy_static::lazy_static;

/// Cleans a raw attribute value: HTML entities are unescaped, tabs become
/// spaces, whitespace runs collapse to a single space and the ends are
/// trimmed.
///
/// Entities are unescaped until nothing changes, so doubly escaped input
/// ("&amp;quot;") ends up plain and the function is idempotent.
///
/// # Examples
///
/// ```
/// use skating_importer::normalize::normalize_string;
///
/// assert_eq!(normalize_string("  СШОР\t&quot;Звезда&quot;  "), "СШОР \"Звезда\"");
/// assert_eq!(normalize_string(""), "");
/// ```
pub fn normalize_string(value: &str) -> String {
    let mut current = value.to_string();
    loop {
        let next = normalize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn normalize_once(value: &str) -> String {
    let mut text = value.to_string();
    while let Cow::Owned(decoded) = html_escape::decode_html_entities(&text) {
        if decoded == text {
            break;
        }
        text = decoded;
    }

    text.replace('\t', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes an optional attribute, mapping blank results to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(normalize_string)
        .filter(|normalized| !normalized.is_empty())
}

lazy_static! {
    /// Latin letters that render like Cyrillic ones.
    static ref LOOK_ALIKES: HashMap<char, char> = [
        ('o', 'о'),
        ('e', 'е'),
        ('c', 'с'),
        ('p', 'р'),
        ('a', 'а'),
        ('y', 'у'),
        ('x', 'х'),
        ('O', 'О'),
        ('E', 'Е'),
        ('C', 'С'),
        ('P', 'Р'),
        ('A', 'А'),
        ('Y', 'У'),
        ('X', 'Х'),
    ]
    .into_iter()
    .collect();
}

/// Replaces Latin letters that render like Cyrillic ones with their
/// Cyrillic counterparts ("3 Юнoшеский" typed with a Latin `o`).
///
/// ```
/// use skating_importer::normalize::fix_latin_to_cyrillic;
///
/// assert_eq!(fix_latin_to_cyrillic("Cпopт"), "Спорт");
/// ```
pub fn fix_latin_to_cyrillic(text: &str) -> String {
    text.chars()
        .map(|c| LOOK_ALIKES.get(&c).copied().unwrap_or(c))
        .collect()
}

/// Drops a whitespace-delimited token that repeats the one before it
/// ("Софья Софья" -> "Софья"). Input with fewer than two tokens is returned
/// unchanged.
pub fn remove_duplication(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return text.to_string();
    }

    let mut result: Vec<&str> = Vec::with_capacity(words.len());
    for word in words {
        if result.last() != Some(&word) {
            result.push(word);
        }
    }
    result.join(" ")
}

/// Comparison key for names: normalized, Latin look-alikes repaired and
/// lowercased.
pub fn comparison_key(value: &str) -> String {
    fix_latin_to_cyrillic(&normalize_string(value)).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_string("  a \t\t b\n\nc  "), "a b c");
        assert_eq!(normalize_string("\u{a0}Звезда\u{a0}"), "Звезда");
        assert_eq!(normalize_string("   "), "");
    }

    #[test]
    fn test_normalize_unescapes_entities() {
        assert_eq!(normalize_string("A &amp; B"), "A & B");
        assert_eq!(normalize_string("&amp;quot;x&amp;quot;"), "\"x\"");
        assert_eq!(normalize_string("Tom&amp;Jerry&nbsp;&nbsp;club"), "Tom&Jerry club");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "",
            "  plain  ",
            "&amp;amp;lt;",
            "a&amp;\t&amp; b",
            "x &lt;\u{2003}y&gt;",
            "&",
            "&amp",
            "Школа\t\t«Лёд»",
        ];
        for sample in samples {
            let once = normalize_string(sample);
            assert_eq!(normalize_string(&once), once, "input {sample:?}");
        }
    }

    #[test]
    fn test_normalize_optional_drops_blank() {
        assert_eq!(normalize_optional(None), None);
        assert_eq!(normalize_optional(Some(" \t ")), None);
        assert_eq!(normalize_optional(Some(" RUS ")), Some("RUS".to_string()));
    }

    #[test]
    fn test_fix_latin_to_cyrillic() {
        assert_eq!(fix_latin_to_cyrillic("3 Юнoшеский"), "3 Юношеский");
        assert_eq!(fix_latin_to_cyrillic("OECPAYX oecpayx"), "ОЕСРАУХ оесраух");
        assert_eq!(fix_latin_to_cyrillic("Kb"), "Kb");
    }

    #[test]
    fn test_fix_latin_to_cyrillic_is_idempotent() {
        let once = fix_latin_to_cyrillic("Cборная Moсквы, pairs");
        assert_eq!(fix_latin_to_cyrillic(&once), once);
    }

    #[test]
    fn test_remove_duplication() {
        assert_eq!(remove_duplication("Софья Софья"), "Софья");
        assert_eq!(remove_duplication("Анна  Мария Мария Анна"), "Анна Мария Анна");
        assert_eq!(remove_duplication("Софья"), "Софья");
        assert_eq!(remove_duplication(""), "");
    }

    #[test]
    fn test_comparison_key() {
        assert_eq!(comparison_key("  CШОР  Звезда "), "сшор звезда");
    }
}
