pub mod client;
pub mod models;

use crate::config::TimeDoctorConfig;
use crate::error::SourceError;
use crate::sources::retry::{Backend, try_backends};
use chrono::{DateTime, NaiveDate, Utc};
use client::TimeDoctorClient;
use models::{ActivityStats, TdAuth};

/// Backends in the order they are tried: direct API, then the optional proxy.
pub fn backends(config: &TimeDoctorConfig) -> Vec<Backend> {
    let mut list = vec![Backend::new("Direct", config.api_url())];
    if let Some(proxy) = &config.proxy_url {
        list.push(Backend::new("Proxy", proxy));
    }
    list
}

pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Tracked time for one user and day, captured at `captured_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSample {
    pub seconds: i64,
    pub captured_at: DateTime<Utc>,
    pub user_id: String,
    /// Token used, for reuse on the next fetch.
    pub auth: TdAuth,
}

/// Reuse the cached token if the service still accepts it, else log in.
fn authenticate(
    client: &TimeDoctorClient,
    credentials: &Credentials<'_>,
    cached: Option<&TdAuth>,
) -> Result<(TdAuth, bool), SourceError> {
    if let Some(auth) = cached
        && client.verify_token(auth)
    {
        return Ok((auth.clone(), true));
    }
    Ok((client.login(credentials.email, credentials.password)?, false))
}

fn resolve_user(
    client: &TimeDoctorClient,
    auth: &TdAuth,
    user_name: Option<&str>,
) -> Result<String, SourceError> {
    let Some(name) = user_name else {
        return Ok(auth.user_id.clone());
    };
    let users = client.list_users(auth)?;
    users
        .into_iter()
        .find(|u| u.name.trim().eq_ignore_ascii_case(name.trim()))
        .map(|u| u.id)
        .ok_or_else(|| SourceError::NoData(format!("Time Doctor user '{}' not found", name)))
}

/// Fetch today's tracked seconds, falling back across backends.
///
/// A cached token rejected mid-fetch triggers one fresh login on the same
/// backend before giving up.
pub fn fetch_tracked(
    backends: &[Backend],
    credentials: &Credentials<'_>,
    cached: Option<&TdAuth>,
    user_name: Option<&str>,
    date: NaiveDate,
) -> Result<TrackedSample, SourceError> {
    try_backends(backends, |backend| {
        let client = TimeDoctorClient::new(&backend.base_url);
        let (mut auth, reused) = authenticate(&client, credentials, cached)?;

        let attempt = |auth: &TdAuth| -> Result<(String, i64), SourceError> {
            let user_id = resolve_user(&client, auth, user_name)?;
            let seconds = client.tracked_on(auth, &user_id, date)?;
            Ok((user_id, seconds))
        };

        let (user_id, seconds) = match attempt(&auth) {
            Err(SourceError::AuthFailed(_)) if reused => {
                tracing::info!("Cached Time Doctor token expired, logging in again");
                auth = client.login(credentials.email, credentials.password)?;
                attempt(&auth)?
            }
            other => other?,
        };

        tracing::info!("{} reported {}s tracked for {}", backend.name, seconds, date);
        Ok(TrackedSample {
            seconds,
            captured_at: Utc::now(),
            user_id,
            auth,
        })
    })
}

pub fn fetch_stats(
    config: &TimeDoctorConfig,
    credentials: &Credentials<'_>,
    cached: Option<&TdAuth>,
    user_name: Option<&str>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<(ActivityStats, TdAuth), SourceError> {
    let client = TimeDoctorClient::new(config.api_url()).with_stats_url(config.stats_api_url());
    let (auth, _) = authenticate(&client, credentials, cached)?;
    let user_id = resolve_user(&client, &auth, user_name)?;
    let stats = client.activity_stats(&auth, &user_id, from, to)?;
    Ok((stats, auth))
}
