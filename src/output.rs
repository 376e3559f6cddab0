use crate::error::Result;
use crate::reports::chart_rows;
use crate::types::Report;
use crate::util::{format_int, format_number};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Chart input for the renderer: title, bars and the numbers behind them.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T])
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn print_report(report: &Report) {
    println!("{}", report.title);
    println!("----------------------------------");
    let days = report.dates.len();
    if days > 1 {
        println!("Average over {} production days", format_int(days));
    }
    println!(
        "Stoppage: {} min | Production time: {} h | Units: {}",
        format_number(report.record.stoppage_minutes, 2),
        format_number(report.record.duration_minutes / 60.0, 2),
        format_number(report.record.units_produced, 0)
    );
    println!(
        "Lost units from stoppage: {}",
        format_number(report.metrics.stoppage_rate_loss * report.record.duration_minutes, 0)
    );
    println!("");
    preview_table_rows(&chart_rows(report));
    if report.metrics.unexplained_loss < 0.0 {
        println!("Note: actual rate exceeds baseline minus stoppage loss; some stoppage may be over-recorded.\n");
    }
    for s in &report.skipped {
        println!("Skipped {}: {}", s.date, s.reason);
    }
    if !report.skipped.is_empty() {
        println!("");
    }
}
