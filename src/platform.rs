//! Where the shift state lives on disk.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "shiftclock";
const PROBE_FILE: &str = ".probe";

/// Directories tried in order when no override is configured:
/// `~/.shiftclock`, the platform data dir, then `./.shiftclock`.
fn candidates() -> Vec<PathBuf> {
    let mut list = Vec::with_capacity(3);
    if let Some(home) = home::home_dir() {
        list.push(home.join(format!(".{}", APP_DIR)));
    }
    // ~/.local/share/shiftclock, ~/Library/Application Support/shiftclock, %LOCALAPPDATA%\shiftclock
    if let Some(data) = dirs::data_local_dir() {
        list.push(data.join(APP_DIR));
    }
    list.push(PathBuf::from(format!(".{}", APP_DIR)));
    list
}

/// First usable state directory. An override must itself be usable; there
/// is no fallback from an explicit choice.
pub fn get_state_dir(override_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        ensure_writable(dir)?;
        return Ok(dir.clone());
    }

    for dir in candidates() {
        match ensure_writable(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) => tracing::warn!("Skipping state directory: {:#}", e),
        }
    }

    anyhow::bail!(
        "No writable state directory found. Set state.state_dir_override in the config."
    )
}

/// Create `dir` if needed and prove it accepts writes.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;

    let probe = dir.join(PROBE_FILE);
    fs::write(&probe, b"ok").with_context(|| format!("{} is not writable", dir.display()))?;
    // Leftover probe files are harmless
    let _ = fs::remove_file(&probe);
    Ok(())
}

/// `(state.lock, state.json)` inside the resolved state directory.
pub fn state_paths(state_dir_override: Option<&PathBuf>) -> Result<(PathBuf, PathBuf)> {
    let dir = get_state_dir(state_dir_override)?;
    Ok((dir.join("state.lock"), dir.join("state.json")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_override_is_used_as_is() {
        let temp = TempDir::new().unwrap();
        let chosen = temp.path().join("shift-state");

        assert_eq!(get_state_dir(Some(&chosen)).unwrap(), chosen);
        assert!(chosen.is_dir());
    }

    #[test]
    fn test_probe_file_is_cleaned_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("x").join("y");

        ensure_writable(&nested).unwrap();
        assert!(!nested.join(PROBE_FILE).exists());
    }

    #[test]
    fn test_unusable_override_is_an_error() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        assert!(get_state_dir(Some(&file)).is_err());
    }

    #[test]
    fn test_candidates_end_with_working_dir() {
        let list = candidates();
        assert_eq!(list.last(), Some(&PathBuf::from(".shiftclock")));
    }

    #[test]
    fn test_state_file_names() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_path_buf();

        let (lock, state) = state_paths(Some(&dir)).unwrap();
        assert_eq!(lock.file_name().unwrap(), "state.lock");
        assert_eq!(state.file_name().unwrap(), "state.json");
    }
}
