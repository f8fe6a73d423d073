use crate::OutputFormat;
use crate::commands::{emit, local_now, state_paths};
use crate::config::Config;
use crate::shift::duration::{format_short, seconds_to_hms};
use crate::shift::{ClockTime, ScheduleMode};
use crate::sources::employees::{TrackerMatch, lookup};
use crate::state::{Session, with_state_lock};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct SessionView<'a> {
    mode: ScheduleMode,
    #[serde(flatten)]
    session: &'a Session,
}

fn describe(session: &Session, mode: ScheduleMode) -> String {
    format!(
        "Mode: {}\nEntry: {}\nTracked: {} (as of {})",
        mode,
        session.entry,
        format_short(&seconds_to_hms(session.tracked_base_seconds)),
        session.tracked_set_at.with_timezone(&Local).format("%H:%M")
    )
}

fn show(format: OutputFormat, session: &Session, mode: ScheduleMode, headline: &str) -> Result<()> {
    let view = SessionView { mode, session };
    emit(
        format,
        &view,
        &format!("✓ {}\n{}", headline, describe(session, mode)),
    )
}

/// Begin a new shift, replacing any active one.
pub fn start(
    config: &Config,
    entry: Option<ClockTime>,
    tracked_seconds: Option<i64>,
    mode: Option<ScheduleMode>,
    format: OutputFormat,
) -> Result<()> {
    let (lock_path, state_path) = state_paths(config)?;
    let now = local_now();

    let (session, effective_mode) = with_state_lock(&lock_path, &state_path, |state| {
        if let Some(mode) = mode {
            state.mode = Some(mode);
        }
        if state.session.is_some() {
            tracing::info!("Replacing active session");
        }

        let session = Session::new(
            now.with_timezone(&Utc),
            entry.unwrap_or_else(|| ClockTime::from_time(&now)),
            tracked_seconds.unwrap_or(0),
        );
        state.session = Some(session.clone());
        Ok((session, state.effective_mode(config.schedule.default_mode)))
    })?;

    show(format, &session, effective_mode, "Shift started")
}

/// Apply `change` to the active session, starting one at the current time
/// when there is none.
fn update_session<F>(config: &Config, change: F) -> Result<(Session, ScheduleMode)>
where
    F: FnOnce(&mut Session, DateTime<Utc>),
{
    let (lock_path, state_path) = state_paths(config)?;
    let now = local_now();
    let now_utc = now.with_timezone(&Utc);

    with_state_lock(&lock_path, &state_path, |state| {
        state.discard_stale(now_utc, config.state.expiry_hours);
        let session = state.session.get_or_insert_with(|| {
            tracing::info!("No active session, starting one now");
            Session::new(now_utc, ClockTime::from_time(&now), 0)
        });
        change(session, now_utc);
        let session = session.clone();
        Ok((session, state.effective_mode(config.schedule.default_mode)))
    })
}

pub fn set_entry(config: &Config, entry: ClockTime, format: OutputFormat) -> Result<()> {
    let (session, mode) = update_session(config, |session, _| session.entry = entry)?;
    show(format, &session, mode, &format!("Entry time set to {}", entry))
}

pub fn set_tracked(config: &Config, seconds: i64, format: OutputFormat) -> Result<()> {
    let (session, mode) =
        update_session(config, |session, now| session.set_tracked(seconds, now))?;
    show(
        format,
        &session,
        mode,
        &format!(
            "Tracked time set to {}",
            format_short(&seconds_to_hms(seconds))
        ),
    )
}

pub fn set_mode(config: &Config, mode: ScheduleMode, format: OutputFormat) -> Result<()> {
    let (lock_path, state_path) = state_paths(config)?;
    with_state_lock(&lock_path, &state_path, |state| {
        state.mode = Some(mode);
        Ok(())
    })?;

    let schedule = mode.config();
    emit(
        format,
        &serde_json::json!({ "mode": mode, "schedule": schedule }),
        &format!(
            "✓ Schedule mode set to {} ({}h work / {}h stay)",
            mode, schedule.work_hours, schedule.stay_hours
        ),
    )
}

pub fn reset(config: &Config, forget_credentials: bool, format: OutputFormat) -> Result<()> {
    let (lock_path, state_path) = state_paths(config)?;
    let cleared = with_state_lock(&lock_path, &state_path, |state| {
        let had_session = state.session.take().is_some();
        if forget_credentials {
            state.td_auth = None;
        }
        Ok(had_session)
    })?;

    if forget_credentials {
        crate::keyring::forget_all();
    }

    let mut text = if cleared {
        "✓ Session cleared".to_string()
    } else {
        "No active session".to_string()
    };
    if forget_credentials {
        text.push_str("\n✓ Stored credentials removed");
    }

    emit(
        format,
        &serde_json::json!({ "cleared": cleared, "credentials_removed": forget_credentials }),
        &text,
    )
}

/// Save the RAMS employee name used to pick the entry time on fetch.
pub fn set_employee(config: &Config, name: &str, format: OutputFormat) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Employee name must not be empty");
    }

    let (lock_path, state_path) = state_paths(config)?;
    with_state_lock(&lock_path, &state_path, |state| {
        state.rams_employee = Some(name.to_string());
        Ok(())
    })?;

    let tracker = lookup(&config.employees, name);
    let note = match &tracker {
        TrackerMatch::Mapped(td_name) => format!("Time Doctor user: {}", td_name),
        TrackerMatch::NoTracker => "Does not use Time Doctor".to_string(),
        TrackerMatch::Unknown => {
            "Not in [employees]; tracked time will use the Time Doctor login user".to_string()
        }
    };

    emit(
        format,
        &serde_json::json!({ "employee": name, "tracker": tracker }),
        &format!("✓ Employee set to {}\n{}", name, note),
    )
}
