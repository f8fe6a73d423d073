use thiserror::Error;

/// Failure to parse a clock-of-day value such as an entry time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockTimeError {
    #[error("Invalid time format '{0}', expected HH:MM")]
    Format(String),
    #[error("Invalid time '{0}'")]
    OutOfRange(String),
}

/// Failure to parse a tracked-work duration.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid duration '{0}', expected e.g. 3h20m, 3:20, 3:20:15 or 12000s")]
pub struct DurationParseError(pub String);

/// Outcome taxonomy for the external data sources.
///
/// `Ok(value)` plays the role of a successful sample; every other outcome
/// is one of these variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("not connected: {0}")]
    NotConnected(String),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("no data: {0}")]
    NoData(String),
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl SourceError {
    /// Authentication failures stop backend fallback; everything else is
    /// worth retrying on the next backend.
    pub fn is_auth(&self) -> bool {
        matches!(self, SourceError::AuthFailed(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Parse(e.to_string())
        } else {
            SourceError::NotConnected(e.to_string())
        }
    }
}
