// Which production dates belong to a day, week or month selection.
//
// A production week does not follow the ISO week: it is described by the
// configured day offsets from the Monday of the requested week. Only dates
// that exist in the sheet are returned.
use crate::error::{ReportError, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Day offsets a week window may use: Monday of the preceding ISO week up
/// to Sunday of the requested one.
pub const WINDOW_OFFSETS: RangeInclusive<i64> = -7..=6;

/// Number of ISO weeks in `year`: 53 when Dec 28 falls in week 53.
pub fn weeks_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

/// The ISO week before `(year, week)`. Week 1 steps back into the last week
/// of the previous year.
pub fn preceding_iso_week(year: i32, week: u32) -> (i32, u32) {
    if week <= 1 {
        (year - 1, weeks_in_year(year - 1))
    } else {
        (year, week - 1)
    }
}

fn iso_monday(year: i32, week: u32) -> Result<NaiveDate> {
    let max = weeks_in_year(year);
    if !(1..=max).contains(&week) {
        return Err(ReportError::InvalidSelection(format!(
            "{} has ISO weeks 1 to {}, got week {}",
            year, max, week
        )));
    }
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| ReportError::InvalidSelection(format!("week {} of {}", week, year)))
}

/// The single date of a daily report. Unlike week and month selections, an
/// absent date is an error.
pub fn resolve_date(date: NaiveDate, known: &BTreeSet<NaiveDate>) -> Result<NaiveDate> {
    if known.contains(&date) {
        Ok(date)
    } else {
        Err(ReportError::MissingDate { date })
    }
}

pub fn validate_window(window: &[i64]) -> Result<()> {
    if window.is_empty() {
        return Err(ReportError::InvalidSelection("week_window is empty".to_string()));
    }
    match window.iter().find(|o| !WINDOW_OFFSETS.contains(o)) {
        Some(o) => Err(ReportError::InvalidSelection(format!(
            "week_window offset {} is outside {}..={}",
            o,
            WINDOW_OFFSETS.start(),
            WINDOW_OFFSETS.end()
        ))),
        None => Ok(()),
    }
}

/// Production dates of `(year, week)` under the `window` convention, in
/// chronological order.
pub fn resolve_week(
    year: i32,
    week: u32,
    known: &BTreeSet<NaiveDate>,
    window: &[i64],
) -> Result<Vec<NaiveDate>> {
    validate_window(window)?;
    let monday = iso_monday(year, week)?;
    let wanted: BTreeSet<NaiveDate> = window
        .iter()
        .filter_map(|&offset| monday.checked_add_signed(Duration::days(offset)))
        .collect();
    Ok(wanted.into_iter().filter(|d| known.contains(d)).collect())
}

/// Weekday and ISO week label of the day at `offset` from the Monday of
/// `(year, week)`. Negative offsets fall in the preceding ISO week.
pub fn window_edge(year: i32, week: u32, offset: i64) -> Result<(Weekday, i32, u32)> {
    validate_window(&[offset])?;
    let monday = iso_monday(year, week)?;
    let weekday = (monday + Duration::days(offset)).weekday();
    let (label_year, label_week) = if offset < 0 {
        preceding_iso_week(year, week)
    } else {
        (year, week)
    };
    Ok((weekday, label_year, label_week))
}

pub fn resolve_month(year: i32, month: u32, known: &BTreeSet<NaiveDate>) -> Result<Vec<NaiveDate>> {
    if !(1..=12).contains(&month) {
        return Err(ReportError::InvalidSelection(format!("month {}", month)));
    }
    Ok(known
        .iter()
        .filter(|d| d.year() == year && d.month() == month)
        .copied()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn every_day(from: NaiveDate, to: NaiveDate) -> BTreeSet<NaiveDate> {
        from.iter_days().take_while(|x| *x <= to).collect()
    }

    const WINDOW: [i64; 7] = [-4, -3, -2, -1, 0, 1, 2];

    #[test]
    fn window_offsets_are_bounded() {
        let known = every_day(d(2024, 7, 1), d(2024, 8, 31));
        assert_matches!(
            resolve_week(2024, 31, &known, &[0, i64::MAX]),
            Err(ReportError::InvalidSelection(_))
        );
        assert_matches!(resolve_week(2024, 31, &known, &[]), Err(ReportError::InvalidSelection(_)));
        assert_eq!(resolve_week(2024, 31, &known, &[-7, 6]).unwrap(), vec![d(2024, 7, 22), d(2024, 8, 4)]);
    }

    #[test]
    fn window_edges_name_weekday_and_week() {
        assert_eq!(window_edge(2024, 31, -4).unwrap(), (Weekday::Thu, 2024, 30));
        assert_eq!(window_edge(2024, 31, 2).unwrap(), (Weekday::Wed, 2024, 31));
        assert_eq!(window_edge(2021, 1, -1).unwrap(), (Weekday::Sun, 2020, 53));
        assert_matches!(window_edge(2024, 31, 7), Err(ReportError::InvalidSelection(_)));
    }

    #[test]
    fn long_and_short_years() {
        assert_eq!(weeks_in_year(2020), 53);
        assert_eq!(weeks_in_year(2021), 52);
        assert_eq!(weeks_in_year(2026), 53);
        assert_eq!(weeks_in_year(2023), 52);
    }

    #[test]
    fn week_one_steps_into_previous_year() {
        assert_eq!(preceding_iso_week(2021, 1), (2020, 53));
        assert_eq!(preceding_iso_week(2022, 1), (2021, 52));
        // Dec 28 2026 is in week 53.
        assert_eq!(preceding_iso_week(2027, 1), (2026, 53));
        assert_eq!(preceding_iso_week(2024, 31), (2024, 30));
    }

    #[test]
    fn production_week_runs_thursday_to_wednesday() {
        let known = every_day(d(2024, 7, 1), d(2024, 8, 31));
        let dates = resolve_week(2024, 31, &known, &WINDOW).unwrap();
        assert_eq!(dates.first(), Some(&d(2024, 7, 25)));
        assert_eq!(dates.last(), Some(&d(2024, 7, 31)));
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0].weekday(), Weekday::Thu);
    }

    #[test]
    fn week_one_window_reaches_into_last_week_of_previous_year() {
        let known = every_day(d(2020, 12, 1), d(2021, 1, 31));
        let dates = resolve_week(2021, 1, &known, &WINDOW).unwrap();
        assert_eq!(dates[0], d(2020, 12, 31));
        assert_eq!(dates[0].iso_week().week(), 53);
        assert_eq!(
            (dates[0].iso_week().year(), dates[0].iso_week().week()),
            preceding_iso_week(2021, 1)
        );
        assert_eq!(dates.last(), Some(&d(2021, 1, 6)));
    }

    #[test]
    fn week_selection_skips_days_without_production() {
        let known: BTreeSet<_> = [d(2024, 7, 25), d(2024, 7, 26), d(2024, 7, 29), d(2024, 8, 1)]
            .into_iter()
            .collect();
        let dates = resolve_week(2024, 31, &known, &WINDOW).unwrap();
        assert_eq!(dates, vec![d(2024, 7, 25), d(2024, 7, 26), d(2024, 7, 29)]);
    }

    #[test]
    fn week_out_of_range() {
        let known = BTreeSet::new();
        assert_matches!(
            resolve_week(2021, 53, &known, &WINDOW),
            Err(ReportError::InvalidSelection(_))
        );
        assert!(resolve_week(2020, 53, &known, &WINDOW).unwrap().is_empty());
    }

    #[test]
    fn month_uses_known_dates_only() {
        let known: BTreeSet<_> = [d(2024, 6, 28), d(2024, 7, 1), d(2024, 7, 2), d(2024, 8, 1)]
            .into_iter()
            .collect();
        assert_eq!(
            resolve_month(2024, 7, &known).unwrap(),
            vec![d(2024, 7, 1), d(2024, 7, 2)]
        );
        assert!(resolve_month(2023, 7, &known).unwrap().is_empty());
    }

    #[test]
    fn explicit_date_must_exist() {
        let known: BTreeSet<_> = [d(2024, 7, 29)].into_iter().collect();
        assert_eq!(resolve_date(d(2024, 7, 29), &known).unwrap(), d(2024, 7, 29));
        assert_matches!(
            resolve_date(d(2024, 7, 27), &known),
            Err(ReportError::MissingDate { .. })
        );
        // The same day inside a week selection is simply absent.
        let week = resolve_week(2024, 31, &known, &WINDOW).unwrap();
        assert_eq!(week, vec![d(2024, 7, 29)]);
    }
}
