// Row -> DerivedRecord: stoppage minutes, production duration and unit count
// for one production day.
use crate::error::{ReportError, Result};
use crate::types::{DerivedRecord, ProductionRow, RowLayout};
use crate::util::{minutes_of_day, parse_f64_safe, parse_time_of_day, MINUTES_PER_DAY};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static COLON_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").expect("valid hh:mm pattern"));
static COMPACT_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2})(\d{2})\b").expect("valid hhmm pattern"));

/// Total stoppage minutes of a day. Each block is summed and divided by its
/// divisor; blank cells were read as zero at ingestion.
pub fn compute_stoppage(row: &ProductionRow) -> f64 {
    row.stoppage
        .iter()
        .map(|block| block.minutes.iter().sum::<f64>() / block.divisor)
        .sum()
}

/// Pull the real end time out of an end-cell comment.
///
/// Accepts `hh:mm` or a bare `hhmm` run, the colon form preferred. Comments
/// written by Excel carry an author/date preamble, so the last valid `hh:mm`
/// wins. A `hhmm` run is taken at its first valid occurrence, and runs
/// touching a date separator (`2024-07-31`) are skipped, so a year noted
/// after the time is not read as one.
pub fn parse_annotation(text: &str) -> Option<(u32, u32)> {
    let valid = |c: regex::Captures<'_>| {
        let h: u32 = c.get(1)?.as_str().parse().ok()?;
        let m: u32 = c.get(2)?.as_str().parse().ok()?;
        (h < 24 && m < 60).then_some((h, m))
    };
    if let Some(hm) = COLON_TIME.captures_iter(text).filter_map(valid).last() {
        return Some(hm);
    }
    COMPACT_TIME
        .captures_iter(text)
        .filter(|c| c.get(0).is_some_and(|m| !touches_date_separator(text, m.start(), m.end())))
        .find_map(valid)
}

fn touches_date_separator(text: &str, start: usize, end: usize) -> bool {
    let is_sep = |c: char| matches!(c, '-' | '.' | '/');
    text[..start].chars().next_back().is_some_and(is_sep)
        || text[end..].chars().next().is_some_and(is_sep)
}

/// Production duration in minutes.
///
/// When the end cell holds one of the layout's past-midnight sentinels, the
/// real end time comes from the cell comment. It is placed on the start's
/// day and moved to the next day when it is not after the start, so a
/// recovered shift is never longer than 24 hours.
pub fn compute_duration(row: &ProductionRow, layout: &RowLayout) -> Result<f64> {
    let start = parse_time_of_day(&row.start).ok_or_else(|| ReportError::Parse {
        date: row.date,
        field: "start time",
        value: row.start.clone(),
    })?;
    let end = parse_time_of_day(&row.end).ok_or_else(|| ReportError::Parse {
        date: row.date,
        field: "end time",
        value: row.end.clone(),
    })?;
    let start_min = minutes_of_day(start);

    let mut duration = if layout.end_sentinels.contains(&end) {
        let (h, m) = recover_end_time(row)?;
        let mut d = (h * 60 + m) as f64 - start_min;
        if d <= 0.0 {
            d += MINUTES_PER_DAY;
        }
        debug!(date = %row.date, h, m, "end time recovered from comment");
        d
    } else {
        minutes_of_day(end) - start_min
    };

    // Start and end given in the wrong order.
    if duration < 0.0 {
        duration += MINUTES_PER_DAY;
    }
    if duration == 0.0 {
        return Err(ReportError::ZeroDuration { date: row.date });
    }
    Ok(duration)
}

fn recover_end_time(row: &ProductionRow) -> Result<(u32, u32)> {
    let missing = |reason: &str| ReportError::MissingRecoveryData {
        date: row.date,
        end: row.end.clone(),
        reason: reason.to_string(),
    };
    let text = row
        .annotation
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing("the cell has no comment"))?;
    parse_annotation(text)
        .ok_or_else(|| missing(&format!("the comment {:?} holds no valid hh:mm", text)))
}

/// Units produced. A blank cell counts as zero; text or negative values are
/// rejected.
pub fn read_units(row: &ProductionRow) -> Result<f64> {
    if row.units.trim().is_empty() {
        return Ok(0.0);
    }
    match parse_f64_safe(Some(row.units.as_str())) {
        Some(v) if v >= 0.0 => Ok(v),
        _ => Err(ReportError::Parse {
            date: row.date,
            field: "unit count",
            value: row.units.clone(),
        }),
    }
}

pub fn extract(row: &ProductionRow, layout: &RowLayout) -> Result<DerivedRecord> {
    let record = DerivedRecord {
        stoppage_minutes: compute_stoppage(row),
        duration_minutes: compute_duration(row, layout)?,
        units_produced: read_units(row)?,
    };
    debug!(date = %row.date, ?record, "extracted row");
    Ok(record)
}
