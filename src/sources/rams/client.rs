use crate::error::SourceError;
use crate::sources::rams::parse::{
    AttendanceRecord, extract_form_key, is_invalid_login, is_login_page, parse_attendance_table,
};
use reqwest::blocking::Client;

const REPORT_PATH: &str = "get_first_in_last_out_log2";

/// Session-based client for the RAMS attendance web app.
///
/// RAMS has no JSON API: login is a CSRF-protected HTML form and the data is
/// an HTML report, so the client keeps a cookie jar for the session.
pub struct RamsClient {
    client: Client,
    base_url: String,
}

impl RamsClient {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn login_url(&self) -> String {
        format!("{}/user/login", self.base_url)
    }

    fn get_text(&self, url: &str, what: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(SourceError::NotConnected(format!(
                "Could not {} (HTTP {})",
                what,
                response.status()
            )));
        }
        Ok(response.text()?)
    }

    /// Log in and return the page the login redirected to.
    pub fn login(&self, username: &str, password: &str) -> Result<String, SourceError> {
        let login_page = self.get_text(&self.login_url(), "reach RAMS")?;
        let form_key = extract_form_key(&login_page)
            .ok_or_else(|| SourceError::NotConnected("Could not extract login token.".to_string()))?;

        let next = format!("/rams/{}", REPORT_PATH);
        let form = [
            ("username", username.trim()),
            ("password", password.trim()),
            ("_next", next.as_str()),
            ("_formkey", form_key.as_str()),
            ("_formname", "login"),
        ];

        let response = self.client.post(self.login_url()).form(&form).send()?;
        let html = response.text()?;

        if is_invalid_login(&html) {
            return Err(SourceError::AuthFailed(
                "Invalid username or password.".to_string(),
            ));
        }
        Ok(html)
    }

    /// Today's first-in records.
    pub fn fetch_attendance(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Vec<AttendanceRecord>, SourceError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(SourceError::AuthFailed(
                "Please configure both RAMS username and password.".to_string(),
            ));
        }

        let landing = self.login(username, password)?;
        let mut records = parse_attendance_table(&landing);

        if records.is_empty() {
            tracing::debug!("Login landing page had no records, fetching report");
            let url = format!("{}/{}", self.base_url, REPORT_PATH);
            let html = self.get_text(&url, "fetch attendance data")?;
            if is_login_page(&html) {
                return Err(SourceError::NotConnected(
                    "Session expired. Please try again.".to_string(),
                ));
            }
            records = parse_attendance_table(&html);
        }

        if records.is_empty() {
            return Err(SourceError::NoData(
                "No attendance records with First-In time found for today.".to_string(),
            ));
        }

        tracing::info!("RAMS returned {} attendance records", records.len());
        Ok(records)
    }
}
