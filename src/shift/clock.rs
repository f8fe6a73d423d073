use crate::error::ClockTimeError;
use chrono::Timelike;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A clock-of-day value at minute precision (hour 0-23, minute 0-59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ClockTimeError> {
        if hour >= 24 || minute >= 60 {
            return Err(ClockTimeError::OutOfRange(format!("{}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    /// Truncates seconds.
    pub fn from_time<T: Timelike>(t: &T) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn seconds_of_day(&self) -> i64 {
        i64::from(self.hour) * 3600 + i64::from(self.minute) * 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Accepts `H:MM`, `HH:MM` and `HH:MM:SS`; seconds are dropped. Minute and
/// second fields must be two digits.
impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        let well_formed = (2..=3).contains(&parts.len())
            && (1..=2).contains(&parts[0].len())
            && parts[1..].iter().all(|p| p.len() == 2);
        if !well_formed {
            return Err(ClockTimeError::Format(trimmed.to_string()));
        }

        let nums = parts
            .iter()
            .map(|p| p.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ClockTimeError::Format(trimmed.to_string()))?;

        if nums.get(2).is_some_and(|sec| *sec >= 60) {
            return Err(ClockTimeError::OutOfRange(trimmed.to_string()));
        }

        ClockTime::new(nums[0], nums[1]).map_err(|_| ClockTimeError::OutOfRange(trimmed.to_string()))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
