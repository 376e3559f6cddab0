// Entry point and interactive menu.
//
// - Option [1] loads a CSV export of the carcass or fillet production sheet.
// - Options [2]-[4] build a daily, weekly or monthly waterfall report, print
//   it and export the chart data (JSON) and bars (CSV).
// - After a report, the user can go back to the menu or exit.
mod calendar;
mod config;
mod error;
mod extract;
mod loader;
mod logging;
mod metrics;
mod output;
mod reports;
mod types;
mod util;

use chrono::NaiveDate;
use config::PlantConfig;
use error::ReportError;
use loader::ProductionData;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::error;
use types::{ProcessType, Report};

// Loaded once, reused for every report in this run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        config: PlantConfig::default(),
        data: None,
    })
});

struct AppState {
    config: PlantConfig,
    data: Option<ProductionData>,
}

fn prompt(label: &str) -> String {
    print!("{}: ", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_number<T: std::str::FromStr>(label: &str) -> Option<T> {
    let raw = prompt(label);
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            println!("Invalid number: {:?}\n", raw);
            None
        }
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match prompt("Back to Report Selection (Y/N)").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load() {
    let process: ProcessType = match prompt("Process type (carcass/fillet)").parse() {
        Ok(p) => p,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };
    let path = prompt("Path to CSV export");
    let mut state = APP_STATE.lock().unwrap();
    match loader::load_rows(&path, process, &state.config) {
        Ok((data, load_report)) => {
            println!(
                "Loaded {} production days ({} rows read, {} without a date).",
                util::format_int(load_report.loaded_rows),
                util::format_int(load_report.total_rows),
                util::format_int(load_report.skipped_rows)
            );
            if load_report.annotated_rows > 0 {
                println!(
                    "Info: {} rows carry an end-time comment.",
                    util::format_int(load_report.annotated_rows)
                );
            }
            println!("");
            state.data = Some(data);
        }
        Err(e) => {
            error!(error = %e, "load failed");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn ask_report(choice: &str, data: &ProductionData, cfg: &PlantConfig) -> Option<Result<Report, ReportError>> {
    let report = match choice {
        "2" => {
            let raw = prompt("Date (YYYY-MM-DD)");
            let Some(date) = util::parse_date_safe(Some(raw.as_str())) else {
                println!("Invalid date: {:?}\n", raw);
                return None;
            };
            reports::daily_report(data, date, cfg)
        }
        "3" => {
            let year: i32 = prompt_number("Year")?;
            let week: u32 = prompt_number("ISO week")?;
            reports::weekly_report(data, year, week, cfg)
        }
        "4" => {
            let year: i32 = prompt_number("Year")?;
            let month: u32 = prompt_number("Month (1-12)")?;
            reports::monthly_report(data, year, month, cfg)
        }
        _ => return None,
    };
    Some(report)
}

fn export_name(report: &Report) -> String {
    let first = report.dates.first().copied().unwrap_or(NaiveDate::MIN);
    let last = report.dates.last().copied().unwrap_or(NaiveDate::MIN);
    if first == last {
        format!("waterfall_{}_{}", report.process, first)
    } else {
        format!("waterfall_{}_{}_{}", report.process, first, last)
    }
}

fn handle_report(choice: &str) {
    let state = APP_STATE.lock().unwrap();
    let Some(data) = state.data.as_ref() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let Some(result) = ask_report(choice, data, &state.config) else {
        return;
    };
    println!("");
    match result {
        Ok(report) => {
            output::print_report(&report);
            let base = export_name(&report);
            if let Err(e) = output::write_json(&format!("{}.json", base), &report) {
                eprintln!("Write error: {}", e);
            }
            if let Err(e) = output::write_csv(&format!("{}.csv", base), &reports::chart_rows(&report)) {
                eprintln!("Write error: {}", e);
            }
            println!("(Chart data exported to {}.json and {}.csv)\n", base, base);
        }
        Err(e) => {
            error!(date = ?e.date(), error = %e, "report failed");
            println!("{}\n", e);
        }
    }
}

fn main() {
    logging::init();
    match PlantConfig::load() {
        Ok(cfg) => APP_STATE.lock().unwrap().config = cfg,
        Err(e) => eprintln!("Ignoring plant config, using defaults: {}\n", e),
    }

    loop {
        println!("Production analysis");
        println!("[1] Load the file");
        println!("[2] Daily report");
        println!("[3] Weekly report");
        println!("[4] Monthly report\n");
        match prompt("Enter choice").as_str() {
            "1" => handle_load(),
            c @ ("2" | "3" | "4") => {
                handle_report(c);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 to 4.\n"),
        }
    }
}
