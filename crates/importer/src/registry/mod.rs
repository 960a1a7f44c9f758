//! Deduplicating upserts in front of the store. Registries themselves hold
//! no state; whatever they cache lives in the [`ImportSession`] passed to
//! every call, so nothing leaks between independent imports.

mod athlete;
mod club;
mod coach;
mod session;

pub use athlete::{AthletePayload, AthleteRegistry};
pub use club::{ClubMerge, ClubRegistry};
pub use coach::CoachRegistry;
pub use session::ImportSession;

/// "Longer, non-empty wins": a new value replaces the stored one only when
/// it is non-empty and strictly longer.
pub(crate) fn should_update(current: Option<&str>, candidate: Option<&str>) -> bool {
    let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
        return false;
    };
    match current.filter(|c| !c.is_empty()) {
        None => true,
        Some(current) => candidate.chars().count() > current.chars().count(),
    }
}

/// Applies [`should_update`] to an optional field, returning whether it
/// changed.
pub(crate) fn upgrade(field: &mut Option<String>, candidate: Option<&str>) -> bool {
    if should_update(field.as_deref(), candidate) {
        *field = candidate.map(str::to_string);
        return true;
    }
    false
}

/// Fills an empty field, never overwriting a present value.
pub(crate) fn fill<T: Clone>(field: &mut Option<T>, candidate: Option<&T>) -> bool {
    if field.is_none() {
        if let Some(value) = candidate {
            *field = Some(value.clone());
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_update() {
        assert!(should_update(None, Some("X")));
        assert!(should_update(Some(""), Some("X")));
        assert!(should_update(Some("ab"), Some("abc")));
        assert!(!should_update(Some("abc"), Some("xyz")));
        assert!(!should_update(Some("X"), Some("")));
        assert!(!should_update(Some("X"), None));
        // Counted in characters: 3 Cyrillic letters beat 4 ASCII bytes' worth.
        assert!(!should_update(Some("abcd"), Some("абв")));
    }

    #[test]
    fn test_fill_keeps_present_value() {
        let mut value = Some(1);
        assert!(!fill(&mut value, Some(&2)));
        assert_eq!(value, Some(1));

        let mut empty: Option<i32> = None;
        assert!(fill(&mut empty, Some(&2)));
        assert_eq!(empty, Some(2));
        assert!(!fill(&mut empty, None));
    }
}
