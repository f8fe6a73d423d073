use crate::error::DurationParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An (hours, minutes, seconds) triple.
///
/// Only built from a second or minute count, so `minutes` and `seconds`
/// are always below 60. `hours` is a span, not a clock hour, and may exceed 23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl Hms {
    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }
}

/// Countdown form, e.g. `4:05:09`.
impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Negative counts clamp to zero.
pub fn seconds_to_hms(total_seconds: i64) -> Hms {
    let secs = total_seconds.max(0) as u64;
    Hms {
        hours: secs / 3600,
        minutes: ((secs % 3600) / 60) as u8,
        seconds: (secs % 60) as u8,
    }
}

pub fn minutes_to_hms(total_minutes: i64) -> Hms {
    let mins = total_minutes.max(0) as u64;
    Hms {
        hours: mins / 60,
        minutes: (mins % 60) as u8,
        seconds: 0,
    }
}

/// `"{h}h {mm}m {ss}s"`
pub fn format_elapsed(total_seconds: i64) -> String {
    let d = seconds_to_hms(total_seconds);
    format!("{}h {:02}m {:02}s", d.hours, d.minutes, d.seconds)
}

/// `"{h}:{mm}:{ss}"`
pub fn format_countdown(d: &Hms) -> String {
    d.to_string()
}

pub fn format_short(d: &Hms) -> String {
    format!("{}h {}m", d.hours, d.minutes)
}

/// 12-hour clock label for a minutes-since-midnight value, wrapping past midnight.
///
/// The value is rounded to the nearest whole minute before splitting, so a
/// fractional minute never renders as `:60`.
pub fn minutes_to_clock_label(total_minutes: f64) -> String {
    let rounded = total_minutes.round() as i64;
    let h24 = rounded.div_euclid(60).rem_euclid(24);
    let minute = rounded.rem_euclid(60);
    let period = if h24 >= 12 { "PM" } else { "AM" };
    let h12 = match h24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", h12, minute, period)
}

/// Largest tracked duration accepted from user input, in seconds.
pub const MAX_DURATION_SECONDS: i64 = u32::MAX as i64;

/// `h * 3600 + m * 60 + s`, or `None` on overflow.
fn hms_seconds(h: i64, m: i64, s: i64) -> Option<i64> {
    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Parse a tracked-work duration into seconds.
///
/// Accepts `3h20m`, `3h`, `45m`, `90s`, `3h20m15s`, `3:20` (H:MM) and
/// `3:20:15` (H:MM:SS). A bare integer is taken as seconds. Totals above
/// [`MAX_DURATION_SECONDS`] are rejected.
pub fn parse_duration(input: &str) -> Result<i64, DurationParseError> {
    let s = input.trim();
    let err = || DurationParseError(input.to_string());
    if s.is_empty() {
        return Err(err());
    }

    let total = if s.contains(':') {
        let nums = s
            .split(':')
            .map(|p| p.parse::<i64>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?;
        match nums.as_slice() {
            [h, m] if *h >= 0 && (0..60).contains(m) => hms_seconds(*h, *m, 0),
            [h, m, sec] if *h >= 0 && (0..60).contains(m) && (0..60).contains(sec) => {
                hms_seconds(*h, *m, *sec)
            }
            _ => None,
        }
    } else if let Ok(secs) = s.parse::<i64>() {
        Some(secs).filter(|secs| *secs >= 0)
    } else {
        parse_units(s)
    };

    total
        .filter(|secs| *secs <= MAX_DURATION_SECONDS)
        .ok_or_else(err)
}

/// `3h20m15s`-style input; any unit may be left out but one must be present.
fn parse_units(s: &str) -> Option<i64> {
    let mut total = 0i64;
    let mut digits = String::new();
    let mut seen_unit = false;
    for c in s.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'h' | 'm' | 's' => {
                let n: i64 = digits.parse().ok()?;
                digits.clear();
                seen_unit = true;
                let secs = match c {
                    'h' => n.checked_mul(3600)?,
                    'm' => n.checked_mul(60)?,
                    _ => n,
                };
                total = total.checked_add(secs)?;
            }
            ' ' => {}
            _ => return None,
        }
    }
    if !digits.is_empty() || !seen_unit {
        return None;
    }
    Some(total)
}

/// Newtype so clap can parse durations directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedDuration(pub i64);

impl FromStr for TrackedDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(TrackedDuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_hms_splits_fields() {
        let d = seconds_to_hms(3665);
        assert_eq!(
            d,
            Hms {
                hours: 1,
                minutes: 1,
                seconds: 5
            }
        );
    }

    #[test]
    fn test_seconds_to_hms_round_trip() {
        for s in (0..200_000).step_by(37) {
            assert_eq!(seconds_to_hms(s).total_seconds(), s as u64);
        }
    }

    #[test]
    fn test_negative_seconds_clamp_to_zero() {
        assert_eq!(seconds_to_hms(-1), seconds_to_hms(0));
        assert_eq!(seconds_to_hms(-86_400), Hms::default());
    }

    #[test]
    fn test_hours_exceed_a_day() {
        assert_eq!(seconds_to_hms(30 * 3600).hours, 30);
    }

    #[test]
    fn test_minutes_to_hms() {
        let d = minutes_to_hms(125);
        assert_eq!((d.hours, d.minutes, d.seconds), (2, 5, 0));
        assert_eq!(minutes_to_hms(-10), Hms::default());
    }

    #[test]
    fn test_format_elapsed_pads_minutes_and_seconds() {
        assert_eq!(format_elapsed(14_400), "4h 00m 00s");
        assert_eq!(format_elapsed(3_725), "1h 02m 05s");
        assert_eq!(format_elapsed(-30), "0h 00m 00s");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(&seconds_to_hms(14_400)), "4:00:00");
        assert_eq!(format_countdown(&seconds_to_hms(45_309)), "12:35:09");
    }

    #[test]
    fn test_format_short() {
        assert_eq!(format_short(&seconds_to_hms(3665)), "1h 1m");
    }

    #[test]
    fn test_clock_label_afternoon() {
        assert_eq!(minutes_to_clock_label(18.0 * 60.0), "6:00 PM");
    }

    #[test]
    fn test_clock_label_midnight_and_noon() {
        assert_eq!(minutes_to_clock_label(0.0), "12:00 AM");
        assert_eq!(minutes_to_clock_label(12.0 * 60.0), "12:00 PM");
    }

    #[test]
    fn test_clock_label_wraps_past_midnight() {
        assert_eq!(minutes_to_clock_label(25.0 * 60.0 + 5.0), "1:05 AM");
    }

    #[test]
    fn test_clock_label_rounds_minutes() {
        assert_eq!(minutes_to_clock_label(9.0 * 60.0 + 29.6), "9:30 AM");
        assert_eq!(minutes_to_clock_label(9.0 * 60.0 + 59.6), "10:00 AM");
    }

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("3h20m"), Ok(12_000));
        assert_eq!(parse_duration("3h 20m 15s"), Ok(12_015));
        assert_eq!(parse_duration("45m"), Ok(2_700));
        assert_eq!(parse_duration("3:20"), Ok(12_000));
        assert_eq!(parse_duration("3:20:15"), Ok(12_015));
        assert_eq!(parse_duration("12000"), Ok(12_000));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("3:75").is_err());
        assert!(parse_duration("3h20").is_err());
        assert!(parse_duration("-5").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        assert!(parse_duration("9999999999999999h").is_err());
        assert!(parse_duration("9223372036854775807").is_err());
        assert!(parse_duration("9223372036854775807m").is_err());
        assert!(parse_duration("9223372036854775807:59").is_err());
        assert!(parse_duration("2562047788015215h30m").is_err());
    }

    #[test]
    fn test_parse_duration_upper_bound() {
        assert_eq!(
            parse_duration(&MAX_DURATION_SECONDS.to_string()),
            Ok(MAX_DURATION_SECONDS)
        );
        assert!(parse_duration(&(MAX_DURATION_SECONDS + 1).to_string()).is_err());
        assert!(parse_duration("1193047h").is_err());
        assert_eq!(parse_duration("1193046h"), Ok(1_193_046 * 3600));
    }
}
