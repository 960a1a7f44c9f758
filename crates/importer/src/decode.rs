//! Stateless decoding of the raw attribute codes found in CalcFS exports.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

pub const DATE_FORMAT: &str = "%Y%m%d";

/// Lowest grade of execution a judge can award.
pub const GOE_MIN: i8 = -5;
/// Highest grade of execution a judge can award.
pub const GOE_MAX: i8 = 3;

/// Decodes a judge's grade-of-execution code.
///
/// Two encodings coexist across scoring software versions and both are
/// accepted:
///
/// * `0..=8` maps linearly onto `-5..=+3`,
/// * `11..=15` maps onto `-5..=-1`, and `10` is a second spelling of `-5`.
///
/// Blank input, the sentinel `9` and anything outside those ranges mean the
/// slot was not scored. Never fails.
///
/// ```
/// use skating_importer::decode::decode_goe;
///
/// assert_eq!(decode_goe(Some("8")), Some(3));
/// assert_eq!(decode_goe(Some("13")), Some(-3));
/// assert_eq!(decode_goe(Some("9")), None);
/// ```
pub fn decode_goe(code: Option<&str>) -> Option<i8> {
    let code: i64 = code?.trim().parse().ok()?;
    match code {
        0..=8 => i8::try_from(code - 5).ok(),
        10 => Some(GOE_MIN),
        11..=15 => i8::try_from(code - 16).ok(),
        _ => None,
    }
}

/// Code judges' software writes into a slot left unscored on purpose.
pub const GOE_UNSCORED: &str = "9";

/// True for a non-blank code that is neither the unscored sentinel nor part
/// of any known encoding.
pub fn is_unknown_goe_code(code: Option<&str>) -> bool {
    match code.map(str::trim) {
        None | Some("") | Some(GOE_UNSCORED) => false,
        Some(code) => decode_goe(Some(code)).is_none(),
    }
}

/// Parses a `YYYYMMDD` date. Anything that is not exactly eight ASCII digits
/// forming a real calendar date yields `None`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Inverse of [`parse_date`].
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_time(raw: Option<&str>) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw?.trim(), "%H:%M:%S").ok()
}

/// Calculation timestamps appear either packed (`20240301143000`) or in
/// ISO-like form (`2024-03-01 14:30:00`).
pub fn parse_datetime(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

pub fn parse_int(raw: Option<&str>) -> Option<i32> {
    raw?.trim().parse().ok()
}

fn parse_hundredths(raw: Option<&str>) -> Option<Decimal> {
    let value: i64 = raw?.trim().parse().ok()?;
    Some(Decimal::new(value, 2))
}

/// Scores are stored as integer hundredths: `"4525"` is 45.25 points.
pub fn parse_score(raw: Option<&str>) -> Option<Decimal> {
    parse_hundredths(raw)
}

/// Program component weighting codes are hundredths as well: `"160"` is a
/// factor of 1.6.
pub fn parse_factor(raw: Option<&str>) -> Option<Decimal> {
    parse_hundredths(raw)
}

pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(|value| value.trim().to_ascii_uppercase())
        .is_some_and(|value| matches!(value.as_str(), "Y" | "1" | "T" | "TRUE"))
}

/// The GOE contribution of an element: the recorded penalty column when
/// present, otherwise the result minus the base value.
pub fn goe_result(penalty: Option<i32>, result: Option<i32>, base_value: Option<i32>) -> Option<i32> {
    penalty.or_else(|| Some(result? - base_value?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_decode_goe_is_total_over_known_codes() {
        for code in 0..=15 {
            let raw = code.to_string();
            if let Some(value) = decode_goe(Some(&raw)) {
                assert!((GOE_MIN..=GOE_MAX).contains(&value), "code {code} -> {value}");
            }
        }
        assert_eq!(decode_goe(Some("9")), None);
        assert_eq!(decode_goe(Some("")), None);
        assert_eq!(decode_goe(Some("   ")), None);
        assert_eq!(decode_goe(None), None);
    }

    #[test]
    fn test_unknown_goe_codes() {
        for code in ["16", "-1", "abc", " 99 "] {
            assert!(is_unknown_goe_code(Some(code)), "{code}");
        }
        for code in ["0", "8", "9", "10", "15", "", "  "] {
            assert!(!is_unknown_goe_code(Some(code)), "{code}");
        }
        assert!(!is_unknown_goe_code(None));
    }

    #[test]
    fn test_decode_goe_encodings() {
        assert_eq!(decode_goe(Some("0")), Some(-5));
        assert_eq!(decode_goe(Some("5")), Some(0));
        assert_eq!(decode_goe(Some("8")), Some(3));
        assert_eq!(decode_goe(Some("10")), Some(-5));
        assert_eq!(decode_goe(Some("11")), Some(-5));
        assert_eq!(decode_goe(Some("15")), Some(-1));
        assert_eq!(decode_goe(Some(" 7 ")), Some(2));
    }

    #[test]
    fn test_decode_goe_unknown_codes() {
        assert_eq!(decode_goe(Some("16")), None);
        assert_eq!(decode_goe(Some("-1")), None);
        assert_eq!(decode_goe(Some("abc")), None);
        assert_eq!(decode_goe(Some("99999999999999999999")), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("20240301")),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("20231332")), None);
        assert_eq!(parse_date(Some("abc")), None);
        assert_eq!(parse_date(Some("2024-03-01")), None);
        assert_eq!(parse_date(Some("+2024031")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_date_round_trip() {
        for raw in ["20240229", "19991231", "20000101", "20230615"] {
            let date = parse_date(Some(raw)).unwrap();
            assert_eq!(format_date(date), raw);
            assert_eq!(parse_date(Some(&format_date(date))), Some(date));
        }
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_datetime(Some("20240301143000")), Some(expected));
        assert_eq!(parse_datetime(Some("2024-03-01 14:30:00")), Some(expected));
        assert_eq!(parse_datetime(Some("14:30:00")), None);
        assert_eq!(
            parse_time(Some("14:30:00")),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
    }

    #[test]
    fn test_parse_score_and_factor() {
        assert_eq!(parse_score(Some("4525")), Some(dec("45.25")));
        assert_eq!(parse_score(Some("0")), Some(Decimal::ZERO));
        assert_eq!(parse_score(Some("")), None);
        assert_eq!(parse_score(Some("45.25")), None);
        assert_eq!(parse_factor(Some("160")), Some(dec("1.6")));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("Y")));
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" 1 ")));
        assert!(!parse_flag(Some("N")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_goe_result() {
        assert_eq!(goe_result(Some(-100), Some(300), Some(400)), Some(-100));
        assert_eq!(goe_result(None, Some(530), Some(400)), Some(130));
        assert_eq!(goe_result(None, None, Some(400)), None);
    }
}
