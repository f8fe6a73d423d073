use crate::OutputFormat;
use crate::commands::{emit, local_now, state_paths};
use crate::config::Config;
use crate::error::SourceError;
use crate::shift::ClockTime;
use crate::shift::duration::{format_short, seconds_to_hms};
use crate::sources::employees::{TrackerMatch, lookup, normalise};
use crate::sources::rams::{AttendanceRecord, RamsClient, find_employee};
use crate::sources::timedoctor::models::TdAuth;
use crate::sources::timedoctor::{self, Credentials, TrackedSample};
use crate::state::{Session, State, TdAuthCache, with_state_lock};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Skipped,
    NotConnected,
    AuthFailed,
    NoData,
    Error,
}

#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub source: &'static str,
    pub outcome: Outcome,
    pub message: String,
}

impl SourceReport {
    fn new(source: &'static str, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            source,
            outcome,
            message: message.into(),
        }
    }

    fn failed(source: &'static str, err: &SourceError) -> Self {
        let outcome = match err {
            SourceError::NotConnected(_) => Outcome::NotConnected,
            SourceError::AuthFailed(_) => Outcome::AuthFailed,
            SourceError::NoData(_) => Outcome::NoData,
            SourceError::Parse(_) => Outcome::Error,
        };
        Self::new(source, outcome, err.to_string())
    }

    fn line(&self) -> String {
        let mark = match self.outcome {
            Outcome::Success => "✓",
            Outcome::Skipped => "-",
            _ => "✗",
        };
        format!("{} {}: {}", mark, self.source, self.message)
    }
}

#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub attendance: SourceReport,
    pub time_doctor: SourceReport,
    pub dry_run: bool,
    pub applied: bool,
}

enum Fetched<T> {
    Skipped(String),
    Done(Result<T, SourceError>),
}

type Pending<T> = std::result::Result<JoinHandle<Result<T, SourceError>>, String>;

async fn settle<T>(pending: Pending<T>) -> Result<Fetched<T>> {
    match pending {
        Err(reason) => Ok(Fetched::Skipped(reason)),
        Ok(handle) => Ok(Fetched::Done(
            handle.await.context("Fetch task did not complete")?,
        )),
    }
}

/// Time Doctor user to report for: explicit config wins, then the saved
/// employee's mapping. `Err` means the employee has no Time Doctor account.
pub(crate) fn tracker_user(
    config: &Config,
    employee: Option<&str>,
) -> std::result::Result<Option<String>, String> {
    if let Some(name) = &config.time_doctor.user_name {
        return Ok(Some(name.clone()));
    }
    let Some(employee) = employee else {
        return Ok(None);
    };
    match lookup(&config.employees, employee) {
        TrackerMatch::Mapped(name) => Ok(Some(name)),
        TrackerMatch::NoTracker => Err(format!("{} does not use Time Doctor", employee)),
        TrackerMatch::Unknown => Ok(None),
    }
}

pub(crate) fn cached_auth(state: &State, config: &Config) -> Option<TdAuth> {
    state
        .fresh_td_auth(Utc::now(), config.state.token_ttl_hours)
        .map(|cache| TdAuth {
            token: cache.token.clone(),
            company_id: cache.company_id.clone(),
            user_id: cache.user_id.clone(),
        })
}

/// Persist `auth` unless it is the token that was already cached.
pub(crate) fn remember_auth(state: &mut State, previous: Option<&TdAuth>, auth: &TdAuth) {
    if previous == Some(auth) {
        return;
    }
    state.td_auth = Some(TdAuthCache {
        token: auth.token.clone(),
        company_id: auth.company_id.clone(),
        user_id: auth.user_id.clone(),
        obtained_at: Utc::now(),
    });
}

fn spawn_rams(config: &Config, employee: Option<&str>) -> Pending<Vec<AttendanceRecord>> {
    if employee.is_none() {
        return Err("No employee saved. Run 'shc employee <NAME>' (see 'shc attendance')".to_string());
    }
    if config.rams.username.trim().is_empty() {
        return Err("RAMS username not configured".to_string());
    }
    let password = config.rams_password().map_err(|e| e.to_string())?;
    let rams = config.rams.clone();

    Ok(tokio::task::spawn_blocking(move || {
        RamsClient::new(&rams.base_url)?.fetch_attendance(&rams.username, &password)
    }))
}

fn spawn_time_doctor(
    config: &Config,
    employee: Option<&str>,
    cached: Option<TdAuth>,
) -> Pending<TrackedSample> {
    let user_name = tracker_user(config, employee)?;
    if config.time_doctor.email.trim().is_empty() {
        return Err("Time Doctor email not configured".to_string());
    }
    let password = config.time_doctor_password().map_err(|e| e.to_string())?;
    let td = config.time_doctor.clone();
    let date = local_now().date_naive();

    Ok(tokio::task::spawn_blocking(move || {
        let credentials = Credentials {
            email: &td.email,
            password: &password,
        };
        timedoctor::fetch_tracked(
            &timedoctor::backends(&td),
            &credentials,
            cached.as_ref(),
            user_name.as_deref(),
            date,
        )
    }))
}

fn entry_from(
    fetched: Fetched<Vec<AttendanceRecord>>,
    employee: Option<&str>,
) -> (Option<ClockTime>, SourceReport) {
    const SOURCE: &str = "RAMS";
    let records = match fetched {
        Fetched::Skipped(reason) => return (None, SourceReport::new(SOURCE, Outcome::Skipped, reason)),
        Fetched::Done(Err(e)) => return (None, SourceReport::failed(SOURCE, &e)),
        Fetched::Done(Ok(records)) => records,
    };
    let employee = employee.unwrap_or_default();

    let Some(record) = find_employee(&records, employee).or_else(|| {
        records
            .iter()
            .find(|r| normalise(&r.name) == normalise(employee))
    }) else {
        let report = SourceReport::new(
            SOURCE,
            Outcome::NoData,
            format!("No first-in today for '{}'", employee),
        );
        return (None, report);
    };

    match record.entry_time() {
        Ok(entry) => {
            let message = format!("Entry {} for {}", entry, record.name);
            (Some(entry), SourceReport::new(SOURCE, Outcome::Success, message))
        }
        Err(e) => (None, SourceReport::new(SOURCE, Outcome::Error, e.to_string())),
    }
}

fn tracked_from(fetched: Fetched<TrackedSample>) -> (Option<TrackedSample>, SourceReport) {
    const SOURCE: &str = "Time Doctor";
    match fetched {
        Fetched::Skipped(reason) => (None, SourceReport::new(SOURCE, Outcome::Skipped, reason)),
        Fetched::Done(Err(e)) => (None, SourceReport::failed(SOURCE, &e)),
        Fetched::Done(Ok(sample)) => {
            let message = format!(
                "Tracked {} today",
                format_short(&seconds_to_hms(sample.seconds))
            );
            (Some(sample), SourceReport::new(SOURCE, Outcome::Success, message))
        }
    }
}

/// Fetch the entry time and tracked time concurrently and apply whatever
/// succeeded to the session.
pub async fn fetch(config: &Config, dry_run: bool, format: OutputFormat) -> Result<()> {
    let (lock_path, state_path) = state_paths(config)?;
    let now = local_now();
    let now_utc = now.with_timezone(&Utc);

    let (employee, cached) = with_state_lock(&lock_path, &state_path, |state| {
        state.discard_stale(now_utc, config.state.expiry_hours);
        let employee = state
            .rams_employee
            .clone()
            .or_else(|| config.rams.employee.clone());
        Ok((employee, cached_auth(state, config)))
    })?;

    let rams = spawn_rams(config, employee.as_deref());
    let td = spawn_time_doctor(config, employee.as_deref(), cached.clone());
    let (rams, td) = tokio::join!(settle(rams), settle(td));

    let (entry, attendance) = entry_from(rams?, employee.as_deref());
    let (tracked, time_doctor) = tracked_from(td?);
    let has_data = entry.is_some() || tracked.is_some();

    let applied = has_data && !dry_run;
    if applied {
        with_state_lock(&lock_path, &state_path, |state| {
            if let Some(sample) = &tracked {
                remember_auth(state, cached.as_ref(), &sample.auth);
            }
            let session = state.session.get_or_insert_with(|| {
                Session::new(now_utc, entry.unwrap_or_else(|| ClockTime::from_time(&now)), 0)
            });
            if let Some(entry) = entry {
                session.entry = entry;
            }
            if let Some(sample) = &tracked {
                session.set_tracked(sample.seconds, sample.captured_at);
            }
            Ok(())
        })?;
    }

    let report = FetchReport {
        attendance,
        time_doctor,
        dry_run,
        applied,
    };

    let mut text = format!("{}\n{}", report.attendance.line(), report.time_doctor.line());
    if applied {
        text.push_str("\n✓ Session updated");
    } else if has_data {
        text.push_str("\n[DRY-RUN] Would update session");
    }
    emit(format, &report, &text)?;

    if !has_data {
        anyhow::bail!("Nothing fetched from RAMS or Time Doctor");
    }
    Ok(())
}

/// Today's first-in records from RAMS.
pub fn attendance(config: &Config, format: OutputFormat) -> Result<()> {
    let password = config.rams_password()?;
    let client = RamsClient::new(&config.rams.base_url).context("Failed to create RAMS client")?;
    let records = client
        .fetch_attendance(&config.rams.username, &password)
        .context("Failed to fetch attendance")?;

    let (_, state_path) = state_paths(config)?;
    let saved = State::load(&state_path)?
        .rams_employee
        .or_else(|| config.rams.employee.clone());

    if format == OutputFormat::Json {
        return crate::commands::print_json(&records);
    }

    println!("{:<3} {:<40} {}", "", "Name", "First In");
    println!("{}", "-".repeat(55));
    for record in &records {
        let marker = if saved.as_deref() == Some(record.name.as_str()) {
            "*"
        } else {
            ""
        };
        let tracker = match lookup(&config.employees, &record.name) {
            TrackerMatch::Mapped(name) => format!("  (Time Doctor: {})", name),
            TrackerMatch::NoTracker => "  (no Time Doctor)".to_string(),
            TrackerMatch::Unknown => String::new(),
        };
        println!(
            "{:<3} {:<40} {}{}",
            marker, record.name, record.first_in, tracker
        );
    }
    println!("\n{} records", records.len());
    Ok(())
}
