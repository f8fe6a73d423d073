use crate::OutputFormat;
use crate::commands::{local_now, print_json, state_paths};
use crate::config::Config;
use crate::shift::duration::{format_countdown, format_elapsed, format_short};
use crate::shift::{CalculationResult, ClockTime, DrivingConstraint, ScheduleMode, calculate};
use crate::state::{Session, with_state_lock};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::time::Duration;
use termtree::Tree;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub now: DateTime<FixedOffset>,
    pub entry: ClockTime,
    #[serde(flatten)]
    pub result: CalculationResult,
}

/// Active session and mode, dropping a stale session on the way.
fn load_session(config: &Config, now: DateTime<Utc>) -> Result<(Option<Session>, ScheduleMode)> {
    let (lock_path, state_path) = state_paths(config)?;
    with_state_lock(&lock_path, &state_path, |state| {
        state.discard_stale(now, config.state.expiry_hours);
        Ok((
            state.session.clone(),
            state.effective_mode(config.schedule.default_mode),
        ))
    })
}

pub fn report(session: &Session, mode: ScheduleMode, now: DateTime<FixedOffset>) -> StatusReport {
    StatusReport {
        now,
        entry: session.entry,
        result: calculate(&session.input(now, mode)),
    }
}

pub fn render_tree(report: &StatusReport) -> String {
    let r = &report.result;
    let mut root = Tree::new(format!(
        "Shift ({} mode) at {}",
        r.mode,
        report.now.format("%H:%M:%S")
    ));

    let mut tracked = Tree::new("Time Doctor".to_string());
    tracked.push(format!("Tracked: {}", format_elapsed(r.tracked_seconds)));
    if r.tracked_remaining_seconds > 0 {
        tracked.push(format!(
            "Remaining: {}",
            format_countdown(&r.tracked_remaining)
        ));
    } else {
        tracked.push("Remaining: quota met".to_string());
    }
    tracked.push(format!("Progress: {}%", r.progress_percent));
    root.push(tracked);

    let mut office = Tree::new(format!("Office (entry {})", report.entry));
    office.push(format!("In office: {}", format_elapsed(r.entry_elapsed_seconds)));
    office.push(format!("Can leave at: {}", r.can_leave_at));
    if r.stay_remaining_seconds > 0 {
        office.push(format!(
            "Stay remaining: {}",
            format_countdown(&r.stay_remaining)
        ));
    } else {
        office.push("Stay remaining: done".to_string());
    }
    root.push(office);

    let mut leave = Tree::new(format!("Leave at: {}", r.effective_can_leave_at));
    leave.push(match r.driving_constraint {
        DrivingConstraint::TrackedWork => "Driven by: tracked work".to_string(),
        DrivingConstraint::Entry => "Driven by: entry time".to_string(),
    });
    if r.extra_time_required.total_seconds() > 0 {
        leave.push(format!(
            "Extra time required: {}",
            format_short(&r.extra_time_required)
        ));
        leave.push(format!(
            "Effective stay remaining: {}",
            format_countdown(&r.effective_stay_remaining)
        ));
    }
    leave.push(format!("Free time: {}", format_short(&r.free_time)));
    root.push(leave);

    root.to_string()
}

fn no_session(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "status": "idle" })),
        OutputFormat::Text => {
            println!("No active shift. Start one with: shc start");
            Ok(())
        }
    }
}

fn print_report(report: &StatusReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Text => {
            print!("{}", render_tree(report));
            Ok(())
        }
    }
}

/// One calculation, at `at` or the current time.
pub fn status(config: &Config, at: Option<DateTime<FixedOffset>>, format: OutputFormat) -> Result<()> {
    let now = at.unwrap_or_else(local_now);
    let (session, mode) = load_session(config, now.with_timezone(&Utc))?;

    match session {
        Some(session) => print_report(&report(&session, mode, now), format),
        None => no_session(format),
    }
}

/// Redraw the status every `interval_secs` until Ctrl-C.
///
/// State is re-read on every tick so edits from another terminal show up.
pub async fn watch(config: &Config, interval_secs: u64, format: OutputFormat) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = local_now();
                let (session, mode) = load_session(config, now.with_timezone(&Utc))
                    .context("Failed to read session state")?;

                if format == OutputFormat::Text {
                    // Clear screen, cursor home
                    print!("\x1b[2J\x1b[H");
                }
                match session {
                    Some(session) => print_report(&report(&session, mode, now), format)?,
                    None => no_session(format)?,
                }
            }
            _ = &mut shutdown => {
                tracing::debug!("Interrupted, leaving watch");
                return Ok(());
            }
        }
    }
}
