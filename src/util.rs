// Utility helpers for parsing and basic statistics.
//
// This module centralizes the "dirty" cell handling (numbers, dates and
// times-of-day exported from the production sheet) so the rest of the code
// can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use num_format::{Locale, ToFormattedString};

pub const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Time-of-day formats tried in order when reading start/end cells.
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Timestamp formats tried when the cell carries a full date and time.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Reads a single comma followed by one or two digits, with no `.`, as a
///   decimal comma (`"1,5"` is 1.5, as typed on a Norwegian locale).
/// - Otherwise strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = if is_decimal_comma(s) {
        s.replace(',', ".")
    } else {
        s.replace(',', "")
    };
    s.parse::<f64>().ok()
}

fn is_decimal_comma(s: &str) -> bool {
    if s.contains('.') || s.matches(',').count() != 1 {
        return false;
    }
    match s.split_once(',') {
        Some((_, frac)) => (1..=2).contains(&frac.len()) && frac.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Parse the date key of a row. The sheet stores it as a timestamp at
/// midnight, but plain dates are accepted as well.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
        .or_else(|| DATE_FORMATS.iter().find_map(|f| NaiveDate::parse_from_str(s, f).ok()))
}

/// Parse a time-of-day cell.
///
/// Plain `HH:MM:SS` is the normal case. The alternates cover cells that were
/// exported with a date part or without seconds, typed as `6.30`, or left as
/// the raw spreadsheet day fraction (`0.5` is 12:00).
///
/// A number with one or two integer digits and exactly two decimals is read
/// as `H.MM` only, so `0.30` is 00:30 and `0.75` is rejected. Longer
/// fractions such as `0.2708333333` are day fractions.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.time()))
        })
        .or_else(|| {
            if looks_like_dotted_time(s) {
                NaiveTime::parse_from_str(s, "%H.%M").ok()
            } else {
                day_fraction_to_time(s)
            }
        })
}

fn looks_like_dotted_time(s: &str) -> bool {
    match s.split_once('.') {
        Some((h, m)) => {
            (1..=2).contains(&h.len())
                && m.len() == 2
                && h.chars().chain(m.chars()).all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn day_fraction_to_time(s: &str) -> Option<NaiveTime> {
    let fraction: f64 = s.parse().ok()?;
    if !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let secs = (fraction * 86_400.0).round() as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
}

pub fn minutes_of_day(t: NaiveTime) -> f64 {
    t.num_seconds_from_midnight() as f64 / 60.0
}

pub fn average(v: &[f64]) -> f64 {
    // Arithmetic mean over a sorted copy so the result does not depend on
    // the order of the input; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let mut sorted = v.to_vec();
    sorted.sort_by(f64::total_cmp);
    let sum: f64 = sorted.iter().copied().sum();
    sum / v.len() as f64
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Values that round to zero print without a sign.
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_cells_accept_alternate_formats() {
        let six = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        assert_eq!(parse_time_of_day("06:00:00"), Some(six));
        assert_eq!(parse_time_of_day("06:00"), Some(six));
        assert_eq!(parse_time_of_day("1900-01-01 06:00:00"), Some(six));
        assert_eq!(parse_time_of_day("6.30"), NaiveTime::from_hms_opt(6, 30, 0));
        assert_eq!(parse_time_of_day("0.5"), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(parse_time_of_day("0.2708333333"), NaiveTime::from_hms_opt(6, 30, 0));
        assert_eq!(parse_time_of_day("late"), None);
        assert_eq!(parse_time_of_day(""), None);
    }

    #[test]
    fn two_decimal_numbers_are_dotted_times() {
        assert_eq!(parse_time_of_day("0.30"), NaiveTime::from_hms_opt(0, 30, 0));
        assert_eq!(parse_time_of_day("0.25"), NaiveTime::from_hms_opt(0, 25, 0));
        assert_eq!(parse_time_of_day("14.45"), NaiveTime::from_hms_opt(14, 45, 0));
        assert_eq!(parse_time_of_day("0.75"), None);
    }

    #[test]
    fn numbers_accept_decimal_comma() {
        assert_eq!(parse_f64_safe(Some("1,5")), Some(1.5));
        assert_eq!(parse_f64_safe(Some(" 12,25 ")), Some(12.25));
        assert_eq!(parse_f64_safe(Some("1,234")), Some(1234.0));
        assert_eq!(parse_f64_safe(Some("1,234,567.5")), Some(1_234_567.5));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
    }

    #[test]
    fn date_key_accepts_midnight_timestamps() {
        let d = NaiveDate::from_ymd_opt(2024, 7, 31).unwrap();
        assert_eq!(parse_date_safe(Some("2024-07-31 00:00:00")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-07-31")), Some(d));
        assert_eq!(parse_date_safe(Some("31.07.2024")), Some(d));
        assert_eq!(parse_date_safe(Some("Dato")), None);
    }

    #[test]
    fn average_ignores_input_order() {
        let a = [0.1, 0.7, 1e16, -1e16, 3.3];
        let mut b = a;
        b.reverse();
        assert_eq!(average(&a), average(&b));
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234.567, 2), "1,234.57");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(-0.001, 2), "0.00");
    }
}
