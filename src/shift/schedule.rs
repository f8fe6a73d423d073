use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which working policy is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Regular,
    #[default]
    Ramadan,
}

/// Hour targets for a schedule mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleConfig {
    /// Tracked-work hours required.
    pub work_hours: u32,
    /// Office-stay hours required.
    pub stay_hours: u32,
}

impl ScheduleConfig {
    pub const REGULAR: ScheduleConfig = ScheduleConfig {
        work_hours: 7,
        stay_hours: 9,
    };

    pub const RAMADAN: ScheduleConfig = ScheduleConfig {
        work_hours: 6,
        stay_hours: 7,
    };

    pub fn required_work_seconds(&self) -> i64 {
        i64::from(self.work_hours) * 3600
    }

    pub fn required_stay_seconds(&self) -> i64 {
        i64::from(self.stay_hours) * 3600
    }
}

impl ScheduleMode {
    pub fn config(self) -> ScheduleConfig {
        match self {
            ScheduleMode::Regular => ScheduleConfig::REGULAR,
            ScheduleMode::Ramadan => ScheduleConfig::RAMADAN,
        }
    }
}

impl fmt::Display for ScheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleMode::Regular => write!(f, "regular"),
            ScheduleMode::Ramadan => write!(f, "ramadan"),
        }
    }
}
