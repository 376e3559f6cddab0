use crate::calendar::{resolve_date, resolve_month, resolve_week, window_edge};
use crate::config::PlantConfig;
use crate::error::{ReportError, Result};
use crate::extract::extract;
use crate::loader::ProductionData;
use crate::metrics::aggregate;
use crate::types::{
    ChartBar, ChartBarRow, DerivedRecord, Metrics, PlantConstants, Report, SkippedDate,
};
use crate::util::{format_number, round2};
use chrono::{NaiveDate, Weekday};
use tracing::{info, warn};

pub const LABEL_BASELINE: &str = "baseline 100%";
pub const LABEL_STOPPAGE: &str = "stoppage loss";
pub const LABEL_UNEXPLAINED: &str = "unexplained loss";
pub const LABEL_ACTUAL: &str = "actual rate";
pub const LABEL_GAP: &str = "gap to target";

/// Report for one explicit date. A missing date or a bad row is an error.
pub fn daily_report(data: &ProductionData, date: NaiveDate, cfg: &PlantConfig) -> Result<Report> {
    let date = resolve_date(date, &data.known_dates())?;
    let profile = cfg.profile(data.process);
    let row = data.find(date).ok_or(ReportError::MissingDate { date })?;
    let record = extract(row, &profile.layout)?;
    let title = format!("Production for {} ({})", date, data.process);
    Ok(build_report(title, data, vec![date], Vec::new(), record, &profile.constants))
}

pub fn weekly_report(
    data: &ProductionData,
    year: i32,
    week: u32,
    cfg: &PlantConfig,
) -> Result<Report> {
    let dates = resolve_week(year, week, &data.known_dates(), &cfg.week_window)?;
    let first = cfg.week_window.iter().min().copied().unwrap_or(0);
    let last = cfg.week_window.iter().max().copied().unwrap_or(0);
    let (from_day, from_year, from_week) = window_edge(year, week, first)?;
    let (to_day, to_year, to_week) = window_edge(year, week, last)?;
    let title = format!(
        "Production week {} of {} ({}), {} week {}/{} to {} week {}/{}",
        week,
        year,
        data.process,
        weekday_name(from_day),
        from_week,
        from_year,
        weekday_name(to_day),
        to_week,
        to_year
    );
    period_report(data, &dates, title, cfg)
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn monthly_report(
    data: &ProductionData,
    year: i32,
    month: u32,
    cfg: &PlantConfig,
) -> Result<Report> {
    let dates = resolve_month(year, month, &data.known_dates())?;
    let title = format!("Production for {}-{:02} ({})", year, month, data.process);
    period_report(data, &dates, title, cfg)
}

/// Aggregate report over several dates. Dates whose rows cannot be read are
/// listed in `skipped` and left out of the mean.
pub fn period_report(
    data: &ProductionData,
    dates: &[NaiveDate],
    title: String,
    cfg: &PlantConfig,
) -> Result<Report> {
    let profile = cfg.profile(data.process);
    let mut included = Vec::new();
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for &date in dates {
        let outcome = data
            .find(date)
            .ok_or(ReportError::MissingDate { date })
            .and_then(|row| extract(row, &profile.layout));
        match outcome {
            Ok(record) => {
                included.push(date);
                records.push(record);
            }
            Err(e) => {
                warn!(%date, error = %e, "day left out of aggregate");
                skipped.push(SkippedDate {
                    date,
                    reason: e.to_string(),
                });
            }
        }
    }

    let Some(mean) = aggregate(&records) else {
        return Err(ReportError::EmptyAggregation { selection: title });
    };
    info!(days = included.len(), skipped = skipped.len(), "aggregated {}", title);
    Ok(build_report(title, data, included, skipped, mean, &profile.constants))
}

fn build_report(
    title: String,
    data: &ProductionData,
    dates: Vec<NaiveDate>,
    skipped: Vec<SkippedDate>,
    record: DerivedRecord,
    constants: &PlantConstants,
) -> Report {
    let metrics = Metrics::derive(&record, constants);
    Report {
        title,
        process: data.process,
        dates,
        skipped,
        record,
        metrics,
        chart: waterfall(&metrics, constants),
    }
}

/// Waterfall bars: the baseline, then stoppage and unexplained loss stepping
/// down from it, the actual rate standing on zero and the gap up to the
/// target on top of it. Values are rounded to 2 decimals here.
pub fn waterfall(metrics: &Metrics, constants: &PlantConstants) -> Vec<ChartBar> {
    let baseline = constants.baseline_rate;
    let stoppage = round2(metrics.stoppage_rate_loss);
    let unexplained = round2(metrics.unexplained_loss);
    let actual = round2(metrics.actual_rate);
    let gap = round2(constants.target_height - metrics.actual_rate);
    let bar = |label: &'static str, value: f64, bottom: f64| ChartBar {
        label,
        value,
        bottom: round2(bottom),
        pct_of_baseline: if baseline == 0.0 { 0.0 } else { round2(value / baseline * 100.0) },
    };
    vec![
        bar(LABEL_BASELINE, baseline, 0.0),
        bar(LABEL_STOPPAGE, stoppage, baseline - stoppage),
        bar(LABEL_UNEXPLAINED, unexplained, baseline - stoppage - unexplained),
        bar(LABEL_ACTUAL, actual, 0.0),
        bar(LABEL_GAP, gap, actual),
    ]
}

pub fn chart_rows(report: &Report) -> Vec<ChartBarRow> {
    report
        .chart
        .iter()
        .map(|b| ChartBarRow {
            label: b.label.to_string(),
            value: format_number(b.value, 2),
            bottom: format_number(b.bottom, 2),
            pct_of_baseline: format!("{}%", format_number(b.pct_of_baseline, 1)),
        })
        .collect()
}
