use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_TIME_DOCTOR: &str = "shiftclock-time-doctor";
const SERVICE_RAMS: &str = "shiftclock-rams";

/// Store a credential in the system keyring.
///
/// Reads the secret back through a fresh entry, so a backend that does not
/// persist (e.g. the in-memory mock store) is reported as a failure.
pub fn store_credential(service: &str, username: &str, password: &str) -> Result<()> {
    let entry = Entry::new(service, username).context("Failed to create keyring entry")?;

    entry
        .set_password(password)
        .context("Failed to store credential in keyring")?;

    match get_credential(service, username) {
        Ok(stored) if stored == password => Ok(()),
        _ => anyhow::bail!("Keyring backend did not persist the credential"),
    }
}

/// Retrieve a credential from the system keyring
pub fn get_credential(service: &str, username: &str) -> Result<String> {
    let entry = Entry::new(service, username).context("Failed to create keyring entry")?;

    entry
        .get_password()
        .context("Failed to retrieve credential from keyring")
}

/// Delete a credential from the system keyring
pub fn delete_credential(service: &str, username: &str) -> Result<()> {
    let entry = Entry::new(service, username).context("Failed to create keyring entry")?;

    entry
        .delete_credential()
        .context("Failed to delete credential from keyring")?;

    Ok(())
}

pub fn store_time_doctor_password(password: &str) -> Result<()> {
    store_credential(SERVICE_TIME_DOCTOR, "default", password)
}

pub fn get_time_doctor_password() -> Result<String> {
    get_credential(SERVICE_TIME_DOCTOR, "default")
}

pub fn store_rams_password(password: &str) -> Result<()> {
    store_credential(SERVICE_RAMS, "default", password)
}

pub fn get_rams_password() -> Result<String> {
    get_credential(SERVICE_RAMS, "default")
}

/// Remove both stored passwords; missing entries are not an error.
pub fn forget_all() {
    for service in [SERVICE_TIME_DOCTOR, SERVICE_RAMS] {
        if let Err(e) = delete_credential(service, "default") {
            tracing::debug!("No credential removed for {}: {:#}", service, e);
        }
    }
}
