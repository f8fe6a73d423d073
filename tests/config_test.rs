use shiftclock::config::{DEFAULT_RAMS_BASE_URL, load_from_path, set_value_in_file};
use shiftclock::shift::ScheduleMode;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_valid() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let config_content = r#"
        [schedule]
        default_mode = "regular"

        [time_doctor]
        email = "me@example.com"
        proxy_url = "http://localhost:3001/api/td"

        [rams]
        username = "me"
        employee = "DONALD JERRY (2)"

        [employees]
        "donald jerry" = "Donald J."
        "abdulla" = ""

        [state]
        expiry_hours = 10
    "#;
    temp_file.write_all(config_content.as_bytes()).unwrap();

    let config = load_from_path(temp_file.path()).expect("Failed to load valid config");

    assert_eq!(config.schedule.default_mode, ScheduleMode::Regular);
    assert_eq!(config.time_doctor.email, "me@example.com");
    assert_eq!(
        config.time_doctor.proxy_url.as_deref(),
        Some("http://localhost:3001/api/td")
    );
    assert_eq!(config.rams.base_url, DEFAULT_RAMS_BASE_URL);
    assert_eq!(config.rams.employee.as_deref(), Some("DONALD JERRY (2)"));
    assert_eq!(config.employees.get("abdulla").map(String::as_str), Some(""));
    assert_eq!(config.state.expiry_hours, 10);
    assert_eq!(config.state.token_ttl_hours, 6);
}

#[test]
fn test_load_config_defaults() {
    let temp_file = NamedTempFile::new().unwrap();

    let config = load_from_path(temp_file.path()).expect("Empty config should use defaults");

    assert_eq!(config.schedule.default_mode, ScheduleMode::Ramadan);
    assert_eq!(config.state.expiry_hours, 12);
    assert_eq!(config.logging.level, "warn");
    assert!(config.employees.is_empty());
}

#[test]
fn test_load_config_rejects_unknown_mode() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[schedule]\ndefault_mode = \"weekend\"\n")
        .unwrap();

    assert!(load_from_path(temp_file.path()).is_err());
}

#[test]
fn test_set_value_creates_file_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    set_value_in_file(&path, "rams.username", "me").unwrap();
    set_value_in_file(&path, "state.expiry_hours", "8").unwrap();
    set_value_in_file(&path, "schedule.default_mode", "regular").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.rams.username, "me");
    assert_eq!(config.state.expiry_hours, 8);
    assert_eq!(config.schedule.default_mode, ScheduleMode::Regular);
}

#[test]
fn test_set_value_keeps_other_keys() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[time_doctor]\nemail = \"me@example.com\"\n")
        .unwrap();

    set_value_in_file(temp_file.path(), "time_doctor.user_name", "Me Myself").unwrap();

    let config = load_from_path(temp_file.path()).unwrap();
    assert_eq!(config.time_doctor.email, "me@example.com");
    assert_eq!(config.time_doctor.user_name.as_deref(), Some("Me Myself"));
}

#[test]
fn test_set_value_rolls_back_invalid_change() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let original = "[state]\nexpiry_hours = 12\n";
    temp_file.write_all(original.as_bytes()).unwrap();

    let result = set_value_in_file(temp_file.path(), "state.expiry_hours", "0");
    assert!(result.is_err());

    let content = std::fs::read_to_string(temp_file.path()).unwrap();
    assert_eq!(content, original);
}

#[test]
fn test_set_value_rejects_key_through_scalar() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[rams]\nusername = \"me\"\n").unwrap();

    let result = set_value_in_file(temp_file.path(), "rams.username.first", "x");
    assert!(result.is_err());
}
