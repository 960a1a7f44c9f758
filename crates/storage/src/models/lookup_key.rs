use chrono::NaiveDate;
use std::fmt;

/// Deduplication key for athletes, built from the name pair and birth date.
///
/// The key is only defined when all three parts are known: an athlete with a
/// missing birth date can never be matched against an existing row, which
/// keeps two namesakes from being merged on name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AthleteLookupKey(String);

impl AthleteLookupKey {
    /// Builds the key from raw name parts. Whitespace is collapsed and the
    /// comparison is case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use skating_storage::models::AthleteLookupKey;
    ///
    /// let born = NaiveDate::from_ymd_opt(2014, 3, 9);
    /// let a = AthleteLookupKey::new("Анна ", "ИВАНОВА", born).unwrap();
    /// let b = AthleteLookupKey::new("анна", "Иванова", born).unwrap();
    /// assert_eq!(a, b);
    /// assert!(AthleteLookupKey::new("Анна", "Иванова", None).is_none());
    /// ```
    pub fn new(first_name: &str, last_name: &str, birth_date: Option<NaiveDate>) -> Option<Self> {
        let first = fold(first_name);
        let last = fold(last_name);
        let birth_date = birth_date?;
        if first.is_empty() || last.is_empty() {
            return None;
        }
        Some(Self(format!("name:{}:{}:{}", first, last, birth_date)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AthleteLookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn fold(part: &str) -> String {
    part.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn born() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2012, 11, 30)
    }

    #[test]
    fn test_key_format() {
        let key = AthleteLookupKey::new("Мария", "Петрова", born()).unwrap();
        assert_eq!(key.as_str(), "name:мария:петрова:2012-11-30");
    }

    #[test]
    fn test_key_case_and_whitespace_insensitive() {
        let a = AthleteLookupKey::new("  Мария  Анна", "ПЕТРОВА", born()).unwrap();
        let b = AthleteLookupKey::new("мария анна", "петрова", born()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_requires_all_parts() {
        assert!(AthleteLookupKey::new("", "Петрова", born()).is_none());
        assert!(AthleteLookupKey::new("Мария", "   ", born()).is_none());
        assert!(AthleteLookupKey::new("Мария", "Петрова", None).is_none());
    }

    #[test]
    fn test_name_order_matters() {
        let a = AthleteLookupKey::new("Мария", "Петрова", born()).unwrap();
        let b = AthleteLookupKey::new("Петрова", "Мария", born()).unwrap();
        assert_ne!(a, b);
    }
}
