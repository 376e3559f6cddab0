use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong while turning sheet rows into a report.
///
/// Per-date variants (`Parse`, `MissingRecoveryData`, `ZeroDuration`) are
/// recovered by the weekly/monthly pipeline: the date is reported and left
/// out of the aggregate.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(
        "{date}: could not read {field} value {value:?}. \
         Check that the right process type is selected and that the sheet is not malformed"
    )]
    Parse {
        date: NaiveDate,
        field: &'static str,
        value: String,
    },

    #[error(
        "{date}: end time is the past-midnight marker {end:?} but {reason}. \
         Add the real end time (hh:mm or hhmm) as a comment on the end-time cell"
    )]
    MissingRecoveryData {
        date: NaiveDate,
        end: String,
        reason: String,
    },

    #[error(
        "{date}: start and end time are equal, production duration is zero. \
         The end time may be typed into the wrong cell, or the wrong process type is selected"
    )]
    ZeroDuration { date: NaiveDate },

    #[error(
        "{date} is not in the sheet. Either the date is wrong or there was no production \
         that day (e.g. weekend)"
    )]
    MissingDate { date: NaiveDate },

    #[error(
        "no usable production days for {selection}. Either there was no production in that \
         period, or every day failed to read (wrong sheet or process type selected)"
    )]
    EmptyAggregation { selection: String },

    #[error("invalid selection: {0}. Check the value typed at the prompt or in plant_config.json")]
    InvalidSelection(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// The production date this error is about, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ReportError::Parse { date, .. }
            | ReportError::MissingRecoveryData { date, .. }
            | ReportError::ZeroDuration { date }
            | ReportError::MissingDate { date } => Some(*date),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
