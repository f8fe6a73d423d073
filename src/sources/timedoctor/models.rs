use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session credentials returned by a Time Doctor login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdAuth {
    pub token: String,
    pub company_id: String,
    pub user_id: String,
}

/// Login request body
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub permissions: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdUser {
    pub id: String,
    pub name: String,
}

/// Row of the v1.1 `/stats/total` report. Durations are seconds, ratios 0-1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityStats {
    pub total_sec: f64,
    pub active_sec: f64,
    pub active_sec_ratio: Option<f64>,
    pub standard_active_sec_ratio: Option<f64>,
    pub idle_sec: f64,
    pub idle_mins_ratio: Option<f64>,
    pub idle_sec_ratio: Option<f64>,
    pub unprod: f64,
    pub unprod_ratio: f64,
    pub mobile: f64,
    pub mobile_ratio: f64,
    pub manual: f64,
    pub manual_ratio: f64,
    pub meeting: f64,
    pub meeting_ratio: f64,
    pub paid_break: f64,
    pub paid_break_ratio: f64,
    pub unpaid_break: f64,
    pub paid_leave: f64,
}

/// Fields requested from `/stats/total`.
pub const STATS_FIELDS: &str = "userId,idleSec,idleMins,idleMinsRatio,idleSecRatio,\
totalSec,mobile,mobileRatio,manual,manualRatio,unprod,unprodRatio,activeSec,\
activeSecRatio,activeBiasRatio,standardActiveSecRatio,paidBreak,paidBreakRatio,\
unpaidBreak,paidLeave,meeting,meetingRatio";

impl ActivityStats {
    /// Standard ratio when reported, else the raw active ratio.
    pub fn activity_ratio(&self) -> f64 {
        self.standard_active_sec_ratio
            .or(self.active_sec_ratio)
            .unwrap_or(0.0)
    }

    pub fn idle_ratio(&self) -> f64 {
        self.idle_mins_ratio.or(self.idle_sec_ratio).unwrap_or(0.0)
    }
}

/// Dashboard label for an activity ratio.
pub fn activity_level(ratio: f64) -> &'static str {
    let pct = ratio * 100.0;
    if pct >= 80.0 {
        "Very High"
    } else if pct >= 60.0 {
        "High"
    } else if pct >= 40.0 {
        "Medium"
    } else if pct >= 20.0 {
        "Low"
    } else {
        "Very Low"
    }
}

/// Payloads nest the interesting object under `data` inconsistently.
pub(crate) fn unwrap_data(body: &Value) -> &Value {
    match body.get("data") {
        Some(d) if !d.is_null() => d,
        _ => body,
    }
}

/// Ids arrive as either numbers or strings.
pub(crate) fn id_string(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First key holding a non-zero number, truncated to whole seconds.
pub(crate) fn first_seconds(obj: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_f64))
        .find(|n| *n != 0.0)
        .map(|n| n as i64)
}

pub(crate) fn parse_login(body: &Value) -> Option<TdAuth> {
    let d = unwrap_data(body);
    let user = d.get("user");

    let token = id_string(d.get("token")).or_else(|| id_string(user?.get("token")))?;
    let company_id = id_string(d.get("companyId"))
        .or_else(|| id_string(d.get("company").and_then(|c| c.get("id"))))
        .or_else(|| {
            id_string(
                d.get("companies")
                    .and_then(|c| c.get(0))
                    .and_then(|c| c.get("id")),
            )
        })
        .or_else(|| id_string(user.and_then(|u| u.get("companyId"))))?;
    let user_id = id_string(d.get("userId"))
        .or_else(|| id_string(user.and_then(|u| u.get("id"))))
        .or_else(|| id_string(d.get("id")))?;

    Some(TdAuth {
        token,
        company_id,
        user_id,
    })
}

/// Sum a worklog payload. Entries may be nested one array deep.
pub(crate) fn sum_worklog(body: &Value) -> i64 {
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        return 0;
    };

    items
        .iter()
        .flat_map(|item| match item {
            Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
            Value::Object(_) => vec![item],
            _ => Vec::new(),
        })
        .map(|entry| {
            first_seconds(entry, &["time", "duration", "total"])
                .or_else(|| span_seconds(entry))
                .unwrap_or(0)
        })
        .sum()
}

fn span_seconds(entry: &Value) -> Option<i64> {
    let start = DateTime::parse_from_rfc3339(entry.get("start")?.as_str()?).ok()?;
    let end = DateTime::parse_from_rfc3339(entry.get("end")?.as_str()?).ok()?;
    Some((end - start).num_seconds())
}

pub(crate) fn sum_stats(body: &Value) -> i64 {
    match body.get("data") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let own = first_seconds(
                    item,
                    &["total", "totalTracked", "tracked", "totalSec", "trackedSec"],
                )
                .filter(|t| *t > 0)
                .unwrap_or(0);
                let dates: i64 = item
                    .get("dates")
                    .and_then(Value::as_array)
                    .map(|dates| {
                        dates
                            .iter()
                            .filter_map(|d| first_seconds(d, &["total", "totalTracked", "tracked"]))
                            .sum()
                    })
                    .unwrap_or(0);
                own + dates
            })
            .sum(),
        Some(obj @ Value::Object(_)) => {
            first_seconds(obj, &["total", "totalTracked", "tracked"]).unwrap_or(0)
        }
        _ => 0,
    }
}

pub(crate) fn sum_summary(body: &Value) -> i64 {
    match body.get("data") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                first_seconds(
                    item,
                    &[
                        "total",
                        "totalTracked",
                        "tracked",
                        "totalSec",
                        "trackedSec",
                        "duration",
                    ],
                )
            })
            .sum(),
        Some(obj @ Value::Object(_)) => first_seconds(obj, &["total", "totalTracked"]).unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn parse_users(body: &Value) -> Vec<TdUser> {
    let Some(items) = unwrap_data(body).as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|u| {
            Some(TdUser {
                id: id_string(u.get("id"))?,
                name: u.get("name")?.as_str()?.to_string(),
            })
        })
        .collect()
}
