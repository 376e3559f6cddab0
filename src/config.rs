// Plant configuration: row layouts, plant constants and the production-week
// window. Built-in defaults match the plant's current sheets; a JSON file can
// override any part of it.
use crate::calendar::validate_window;
use crate::error::{ReportError, Result};
use crate::types::{PlantConstants, ProcessProfile, ProcessType, RowLayout, StoppageRange};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "PLANT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "plant_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub carcass: ProcessProfile,
    pub fillet: ProcessProfile,
    /// Days of a production week, as offsets from the Monday of the
    /// requested ISO week. The plant runs Thursday to Wednesday.
    pub week_window: Vec<i64>,
    /// Title rows above the header row in the exported sheet.
    pub skip_rows: usize,
}

impl Default for PlantConfig {
    fn default() -> Self {
        PlantConfig {
            carcass: ProcessType::Carcass.default_profile(),
            fillet: ProcessType::Fillet.default_profile(),
            week_window: vec![-4, -3, -2, -1, 0, 1, 2],
            skip_rows: 2,
        }
    }
}

impl PlantConfig {
    pub fn profile(&self, process: ProcessType) -> &ProcessProfile {
        match process {
            ProcessType::Carcass => &self.carcass,
            ProcessType::Fillet => &self.fillet,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_json(&text)?;
        info!(path = %path.as_ref().display(), "loaded plant config");
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: PlantConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would panic or poison every report: week offsets
    /// outside the two ISO weeks, empty stoppage ranges and divisors that are
    /// not a positive number.
    pub fn validate(&self) -> Result<()> {
        validate_window(&self.week_window)?;
        for process in [ProcessType::Carcass, ProcessType::Fillet] {
            for range in &self.profile(process).layout.stoppage {
                if !(range.divisor.is_finite() && range.divisor > 0.0) {
                    return Err(ReportError::InvalidSelection(format!(
                        "{} stoppage columns {}..{} have divisor {}, expected a positive number",
                        process, range.start, range.end, range.divisor
                    )));
                }
                if range.start >= range.end {
                    return Err(ReportError::InvalidSelection(format!(
                        "{} stoppage range {}..{} is empty",
                        process, range.start, range.end
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the config from `PLANT_CONFIG`, then `plant_config.json` in
    /// the working directory, then the built-in defaults.
    pub fn load() -> Result<Self> {
        let candidate = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()));
        match candidate {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }
}

impl ProcessType {
    pub fn default_profile(self) -> ProcessProfile {
        match self {
            ProcessType::Carcass => ProcessProfile {
                constants: PlantConstants {
                    baseline_rate: 150.0,
                    target_height: 120.0,
                },
                layout: RowLayout {
                    date: 0,
                    start: 2,
                    end: 3,
                    units: 5,
                    stoppage: vec![
                        StoppageRange::direct(27, 31),
                        StoppageRange::averaged(34, 40, 6.0),
                        StoppageRange::direct(40, 51),
                    ],
                    end_sentinels: [(23, 59), (0, 0)]
                        .iter()
                        .filter_map(|&(h, m)| NaiveTime::from_hms_opt(h, m, 0))
                        .collect(),
                },
            },
            ProcessType::Fillet => ProcessProfile {
                constants: PlantConstants {
                    baseline_rate: 25.0,
                    target_height: 20.0,
                },
                layout: RowLayout {
                    date: 0,
                    start: 6,
                    end: 7,
                    units: 12,
                    stoppage: vec![StoppageRange::direct(32, 52)],
                    end_sentinels: Vec::new(),
                },
            },
        }
    }
}
