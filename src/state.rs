use crate::shift::{CalculationInput, ClockTime, ScheduleMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct State {
    pub version: String,
    /// Last selected schedule mode; survives session resets.
    pub mode: Option<ScheduleMode>,
    pub session: Option<Session>,
    pub td_auth: Option<TdAuthCache>,
    pub rams_employee: Option<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            mode: None,
            session: None,
            td_auth: None,
            rams_employee: None,
        }
    }
}

/// Inputs of the running shift.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    pub entry: ClockTime,
    pub tracked_base_seconds: i64,
    pub tracked_set_at: DateTime<Utc>,
}

impl Session {
    pub fn new(now: DateTime<Utc>, entry: ClockTime, tracked_base_seconds: i64) -> Self {
        Self {
            started_at: now,
            entry,
            tracked_base_seconds,
            tracked_set_at: now,
        }
    }

    /// Replace the tracked sample, re-stamping its capture time.
    pub fn set_tracked(&mut self, seconds: i64, captured_at: DateTime<Utc>) {
        self.tracked_base_seconds = seconds.max(0);
        self.tracked_set_at = captured_at;
    }

    pub fn is_stale(&self, now: DateTime<Utc>, expiry_hours: u32) -> bool {
        now - self.started_at > Duration::hours(i64::from(expiry_hours))
    }

    pub fn input(&self, now: DateTime<FixedOffset>, mode: ScheduleMode) -> CalculationInput {
        CalculationInput {
            entry: self.entry,
            tracked_base_seconds: self.tracked_base_seconds,
            tracked_base_set_at: self.tracked_set_at,
            now,
            mode,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TdAuthCache {
    pub token: String,
    pub company_id: String,
    pub user_id: String,
    pub obtained_at: DateTime<Utc>,
}

impl TdAuthCache {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_hours: u32) -> bool {
        now - self.obtained_at <= Duration::hours(i64::from(ttl_hours))
    }
}

impl State {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).context("Failed to read state file")?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).context("Failed to parse state JSON")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize state")?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Atomic write: temp file then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Mode to use: explicit state choice, else the configured default.
    pub fn effective_mode(&self, default_mode: ScheduleMode) -> ScheduleMode {
        self.mode.unwrap_or(default_mode)
    }

    /// Drop a session older than `expiry_hours`. Returns true if one was dropped.
    pub fn discard_stale(&mut self, now: DateTime<Utc>, expiry_hours: u32) -> bool {
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.is_stale(now, expiry_hours))
        {
            tracing::info!("Discarding session older than {}h", expiry_hours);
            self.session = None;
            return true;
        }
        false
    }

    /// Cached token if still within its time-to-live.
    pub fn fresh_td_auth(&self, now: DateTime<Utc>, ttl_hours: u32) -> Option<&TdAuthCache> {
        self.td_auth
            .as_ref()
            .filter(|auth| auth.is_fresh(now, ttl_hours))
    }
}

pub fn with_state_lock<F, R>(lock_path: &Path, state_path: &Path, f: F) -> Result<R>
where
    F: FnOnce(&mut State) -> Result<R>,
{
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(lock_path)
        .context("Failed to open lock file")?;

    file.lock_exclusive().context("Failed to acquire lock")?;

    let mut state = State::load(state_path)?;

    let result = f(&mut state);

    if result.is_ok() {
        state.save(state_path)?;
    }

    file.unlock().context("Failed to unlock")?;

    result
}
