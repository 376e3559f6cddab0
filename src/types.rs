use crate::error::ReportError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// The two production lines the sheet can describe. Each has its own row
/// layout and plant constants, see [`crate::config::PlantConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessType {
    Carcass,
    Fillet,
}

impl ProcessType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessType::Carcass => "carcass",
            ProcessType::Fillet => "fillet",
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "carcass" | "slakt" | "1" => Ok(ProcessType::Carcass),
            "fillet" | "filet" | "2" => Ok(ProcessType::Fillet),
            other => Err(ReportError::InvalidSelection(format!(
                "unknown process type {:?} (expected carcass or fillet)",
                other
            ))),
        }
    }
}

/// A contiguous block of stoppage columns `[start, end)`. The block sum is
/// divided by `divisor` before it is added to the day's stoppage total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppageRange {
    pub start: usize,
    pub end: usize,
    #[serde(default = "default_divisor")]
    pub divisor: f64,
}

fn default_divisor() -> f64 {
    1.0
}

impl StoppageRange {
    pub fn direct(start: usize, end: usize) -> Self {
        StoppageRange { start, end, divisor: 1.0 }
    }

    pub fn averaged(start: usize, end: usize, divisor: f64) -> Self {
        StoppageRange { start, end, divisor }
    }
}

/// Column positions of one process type's sheet (0-indexed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowLayout {
    pub date: usize,
    pub start: usize,
    pub end: usize,
    pub units: usize,
    pub stoppage: Vec<StoppageRange>,
    /// End-time values meaning "production ran past midnight, see the cell
    /// comment for the real end time". Empty when the line never uses them.
    #[serde(default)]
    pub end_sentinels: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantConstants {
    /// Theoretical units/minute at 100% efficiency.
    pub baseline_rate: f64,
    /// Units/minute target drawn as the dashed "gap to target" bar.
    pub target_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessProfile {
    pub constants: PlantConstants,
    pub layout: RowLayout,
}

/// Stoppage cells of one [`StoppageRange`], already read as minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppageBlock {
    pub minutes: Vec<f64>,
    pub divisor: f64,
}

/// One production day as read from the sheet. Time cells are kept raw so
/// that parse problems surface per date during extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionRow {
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
    pub units: String,
    pub stoppage: Vec<StoppageBlock>,
    pub annotation: Option<String>,
}

/// Raw quantities of one day (or the mean over several days).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRecord {
    pub stoppage_minutes: f64,
    pub duration_minutes: f64,
    pub units_produced: f64,
}

/// Rates in units/minute. `stoppage_rate_loss + actual_rate +
/// unexplained_loss` always equals the baseline rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub stoppage_rate_loss: f64,
    pub actual_rate: f64,
    pub unexplained_loss: f64,
}

/// One bar of the waterfall chart, in units/minute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub label: &'static str,
    pub value: f64,
    /// Where the bar starts on the y-axis.
    pub bottom: f64,
    pub pct_of_baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub process: ProcessType,
    pub dates: Vec<NaiveDate>,
    pub skipped: Vec<SkippedDate>,
    pub record: DerivedRecord,
    pub metrics: Metrics,
    pub chart: Vec<ChartBar>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChartBarRow {
    #[serde(rename = "Stage")]
    #[tabled(rename = "Stage")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Bottom")]
    #[tabled(rename = "Bottom")]
    pub bottom: String,
    #[serde(rename = "PctOfBaseline")]
    #[tabled(rename = "PctOfBaseline")]
    pub pct_of_baseline: String,
}
