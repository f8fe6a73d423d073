use crate::OutputFormat;
use crate::commands::fetch::{cached_auth, remember_auth, tracker_user};
use crate::commands::{local_now, print_json, state_paths};
use crate::config::Config;
use crate::shift::duration::{format_short, seconds_to_hms};
use crate::sources::timedoctor::models::{ActivityStats, activity_level};
use crate::sources::timedoctor::{Credentials, fetch_stats};
use crate::state::{State, with_state_lock};
use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use serde::Serialize;
use termtree::Tree;

#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    activity_level: &'static str,
    activity_percent: f64,
    #[serde(flatten)]
    stats: &'a ActivityStats,
}

fn duration(seconds: f64) -> String {
    format_short(&seconds_to_hms(seconds.round() as i64))
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

fn render(stats: &ActivityStats) -> String {
    let ratio = stats.activity_ratio();
    let mut root = Tree::new(format!(
        "Activity today: {} ({})",
        percent(ratio),
        activity_level(ratio)
    ));
    root.push(format!("Total: {}", duration(stats.total_sec)));
    root.push(format!("Active: {}", duration(stats.active_sec)));
    root.push(format!(
        "Idle: {} ({})",
        duration(stats.idle_sec),
        percent(stats.idle_ratio())
    ));

    let mut breakdown = Tree::new("Breakdown".to_string());
    for (label, seconds, ratio) in [
        ("Unproductive", stats.unprod, stats.unprod_ratio),
        ("Manual", stats.manual, stats.manual_ratio),
        ("Mobile", stats.mobile, stats.mobile_ratio),
        ("Meeting", stats.meeting, stats.meeting_ratio),
        ("Paid break", stats.paid_break, stats.paid_break_ratio),
    ] {
        if seconds > 0.0 {
            breakdown.push(format!("{}: {} ({})", label, duration(seconds), percent(ratio)));
        }
    }
    if stats.unpaid_break > 0.0 {
        breakdown.push(format!("Unpaid break: {}", duration(stats.unpaid_break)));
    }
    root.push(breakdown);

    root.to_string()
}

/// Time Doctor activity figures from local midnight until now.
pub fn stats(config: &Config, format: OutputFormat) -> Result<()> {
    let (lock_path, state_path) = state_paths(config)?;
    let state = State::load(&state_path)?;
    let cached = cached_auth(&state, config);
    let employee = state
        .rams_employee
        .clone()
        .or_else(|| config.rams.employee.clone());

    let user_name = tracker_user(config, employee.as_deref()).map_err(anyhow::Error::msg)?;
    let password = config.time_doctor_password()?;
    let credentials = Credentials {
        email: &config.time_doctor.email,
        password: &password,
    };

    let now = local_now();
    let from = now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(*now.offset())
        .single()
        .context("Could not determine local midnight")?
        .with_timezone(&Utc);

    let (stats, auth) = fetch_stats(
        &config.time_doctor,
        &credentials,
        cached.as_ref(),
        user_name.as_deref(),
        from,
        now.with_timezone(&Utc),
    )
    .context("Failed to fetch activity stats")?;

    with_state_lock(&lock_path, &state_path, |state| {
        remember_auth(state, cached.as_ref(), &auth);
        Ok(())
    })?;

    match format {
        OutputFormat::Json => print_json(&StatsReport {
            activity_level: activity_level(stats.activity_ratio()),
            activity_percent: (stats.activity_ratio() * 100.0).round(),
            stats: &stats,
        }),
        OutputFormat::Text => {
            print!("{}", render(&stats));
            Ok(())
        }
    }
}
