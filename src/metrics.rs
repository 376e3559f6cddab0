use crate::types::{DerivedRecord, Metrics, PlantConstants};
use crate::util::average;

impl Metrics {
    /// Rates for one day, or for the mean of several days.
    ///
    /// Full precision; rounding happens when the chart is built.
    /// `unexplained_loss` is not clamped and goes negative when the line
    /// outran the baseline minus recorded stoppages.
    pub fn derive(record: &DerivedRecord, constants: &PlantConstants) -> Self {
        let baseline = constants.baseline_rate;
        let stoppage_rate_loss = record.stoppage_minutes * baseline / record.duration_minutes;
        let actual_rate = record.units_produced / record.duration_minutes;
        Metrics {
            stoppage_rate_loss,
            actual_rate,
            unexplained_loss: baseline - stoppage_rate_loss - actual_rate,
        }
    }
}

/// Mean of the raw quantities. Metrics for a week or month are derived once
/// from this mean, never by averaging per-day rates.
pub fn aggregate(records: &[DerivedRecord]) -> Option<DerivedRecord> {
    if records.is_empty() {
        return None;
    }
    let column = |f: fn(&DerivedRecord) -> f64| average(&records.iter().map(f).collect::<Vec<_>>());
    Some(DerivedRecord {
        stoppage_minutes: column(|r| r.stoppage_minutes),
        duration_minutes: column(|r| r.duration_minutes),
        units_produced: column(|r| r.units_produced),
    })
}
