use crate::error::SourceError;
use crate::sources::timedoctor::models::{
    ActivityStats, LoginRequest, STATS_FIELDS, TdAuth, TdUser, parse_login, parse_users,
    sum_stats, sum_summary, sum_worklog,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde_json::Value;

pub struct TimeDoctorClient {
    client: Client,
    base_url: String,
    stats_url: String,
}

fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

impl TimeDoctorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            stats_url: crate::config::DEFAULT_TD_STATS_API_URL.to_string(),
        }
    }

    /// Base URL of the v1.1 API used for activity stats
    pub fn with_stats_url(mut self, url: &str) -> Self {
        self.stats_url = url.trim_end_matches('/').to_string();
        self
    }

    fn get(&self, url: &str, auth: &TdAuth, query: &[(&str, &str)]) -> Result<Response, SourceError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("JWT {}", auth.token))
            .query(query)
            .query(&[("token", auth.token.as_str())])
            .send()?;
        Ok(response)
    }

    /// Whether a cached token is still accepted.
    pub fn verify_token(&self, auth: &TdAuth) -> bool {
        let url = format!("{}/users", self.base_url);
        match self.get(&url, auth, &[("company", auth.company_id.as_str())]) {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Token check failed: {}", e);
                false
            }
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<TdAuth, SourceError> {
        let url = format!("{}/authorization/login", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email,
                password,
                permissions: "read",
            })
            .send()?;

        let status = response.status();
        if is_auth_status(status) {
            return Err(SourceError::AuthFailed(
                "Invalid email or password.".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(SourceError::NotConnected(format!("Login HTTP {}", status)));
        }

        let body: Value = response.json()?;
        parse_login(&body).ok_or_else(|| SourceError::Parse("No auth token received.".to_string()))
    }

    pub fn list_users(&self, auth: &TdAuth) -> Result<Vec<TdUser>, SourceError> {
        let url = format!("{}/users", self.base_url);
        let response = self.get(&url, auth, &[("company", auth.company_id.as_str())])?;

        let status = response.status();
        if is_auth_status(status) {
            return Err(SourceError::AuthFailed("Token expired".to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::NotConnected(format!("Users HTTP {}", status)));
        }

        let body: Value = response.json()?;
        Ok(parse_users(&body))
    }

    /// Tracked seconds for one calendar day.
    ///
    /// Tries the worklog, stats and summary endpoints in turn; the first
    /// non-zero total wins. Only an auth rejection from the worklog endpoint
    /// is an error, the fallbacks swallow failures.
    pub fn tracked_on(
        &self,
        auth: &TdAuth,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<i64, SourceError> {
        let day = date.format("%Y-%m-%d").to_string();
        let from = format!("{}T00:00:00", day);
        let to = format!("{}T23:59:59", day);

        let url = format!("{}/activity/worklog", self.base_url);
        let worklog = self.get(
            &url,
            auth,
            &[
                ("company", auth.company_id.as_str()),
                ("user", user_id),
                ("from", from.as_str()),
                ("to", to.as_str()),
            ],
        );
        let mut total = match worklog {
            Ok(r) if is_auth_status(r.status()) => {
                return Err(SourceError::AuthFailed("Token expired".to_string()));
            }
            Ok(r) if r.status().is_success() => r.json::<Value>().map(|b| sum_worklog(&b)).unwrap_or(0),
            Ok(r) => {
                tracing::debug!("Worklog HTTP {}", r.status());
                0
            }
            Err(e) => {
                tracing::debug!("Worklog request failed: {}", e);
                0
            }
        };

        if total == 0 {
            let url = format!("{}/stats", self.base_url);
            total = self.fallback_total(
                &url,
                auth,
                &[
                    ("company", auth.company_id.as_str()),
                    ("user", user_id),
                    ("from", day.as_str()),
                    ("to", day.as_str()),
                    ("period", "days"),
                ],
                sum_stats,
            );
        }

        if total == 0 {
            let url = format!("{}/activity/summary", self.base_url);
            total = self.fallback_total(
                &url,
                auth,
                &[
                    ("company", auth.company_id.as_str()),
                    ("user", user_id),
                    ("from", day.as_str()),
                    ("to", day.as_str()),
                ],
                sum_summary,
            );
        }

        Ok(total.max(0))
    }

    fn fallback_total(
        &self,
        url: &str,
        auth: &TdAuth,
        query: &[(&str, &str)],
        sum: fn(&Value) -> i64,
    ) -> i64 {
        match self.get(url, auth, query) {
            Ok(r) if r.status().is_success() => r.json::<Value>().map(|b| sum(&b)).unwrap_or(0),
            Ok(r) => {
                tracing::debug!("{} HTTP {}", url, r.status());
                0
            }
            Err(e) => {
                tracing::debug!("{} failed: {}", url, e);
                0
            }
        }
    }

    pub fn activity_stats(
        &self,
        auth: &TdAuth,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<ActivityStats, SourceError> {
        let url = format!("{}/stats/total", self.stats_url);
        let from = from.to_rfc3339_opts(SecondsFormat::Millis, true);
        let to = to.to_rfc3339_opts(SecondsFormat::Millis, true);

        let response = self.get(
            &url,
            auth,
            &[
                ("company", auth.company_id.as_str()),
                ("user", user_id),
                ("fields", STATS_FIELDS),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("group-by", "userId"),
                ("sort", "modeTotal"),
                ("limit", "200"),
            ],
        )?;

        let status = response.status();
        if is_auth_status(status) {
            return Err(SourceError::AuthFailed("Token expired".to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::NotConnected(format!(
                "Failed to fetch activity stats (HTTP {})",
                status
            )));
        }

        let body: Value = response.json()?;
        let first = body
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| SourceError::NoData("No activity data for today.".to_string()))?;

        serde_json::from_value(first.clone()).map_err(|e| SourceError::Parse(e.to_string()))
    }
}
