use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn shc(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shc").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn json(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    serde_json::from_slice(&assert.get_output().stdout).expect("Output should be valid JSON")
}

#[test]
fn test_start_then_status_json_contract() {
    let home = TempDir::new().unwrap();

    let started = json(shc(&home).args([
        "start",
        "--entry",
        "09:00",
        "--tracked",
        "3h",
        "--mode",
        "regular",
        "--format",
        "json",
    ]));
    assert_eq!(started["mode"], "regular");
    assert_eq!(started["entry"], "09:00");
    assert_eq!(started["tracked_base_seconds"], 10_800);

    // An instant before the sample was taken adds no extrapolated time
    let status = json(shc(&home).args([
        "status",
        "--at",
        "2020-01-06T13:00:00+06:00",
        "--format",
        "json",
    ]));
    assert_eq!(status["entry"], "09:00");
    assert_eq!(status["mode"], "regular");
    assert_eq!(status["tracked_seconds"], 10_800);
    assert_eq!(status["entry_elapsed_seconds"], 14_400);
    assert_eq!(status["tracked_remaining"]["hours"], 4);
    assert_eq!(status["stay_remaining"]["hours"], 5);
    assert_eq!(status["can_leave_at"], "6:00 PM");
    assert_eq!(status["driving_constraint"], "entry");
    assert_eq!(status["progress_percent"], 43);
}

#[test]
fn test_status_text_tree() {
    let home = TempDir::new().unwrap();
    shc(&home)
        .args(["start", "--entry", "08:00", "--mode", "ramadan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shift started"));

    shc(&home)
        .args(["status", "--at", "2020-01-06T08:00:00+06:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Can leave at: 3:00 PM"))
        .stdout(predicate::str::contains("Driven by: entry time"));
}

#[test]
fn test_status_without_session_is_idle() {
    let home = TempDir::new().unwrap();
    let status = json(shc(&home).args(["status", "--format", "json"]));
    assert_eq!(status["status"], "idle");
}

#[test]
fn test_mode_survives_reset() {
    let home = TempDir::new().unwrap();

    shc(&home).args(["mode", "regular"]).assert().success();
    shc(&home).args(["start", "--entry", "09:00"]).assert().success();

    let reset = json(shc(&home).args(["reset", "--format", "json"]));
    assert_eq!(reset["cleared"], true);

    let status = json(shc(&home).args(["status", "--format", "json"]));
    assert_eq!(status["status"], "idle");

    let started = json(shc(&home).args(["start", "--format", "json"]));
    assert_eq!(started["mode"], "regular");
}

#[test]
fn test_tracked_and_entry_update_session() {
    let home = TempDir::new().unwrap();
    shc(&home).args(["start", "--entry", "09:00"]).assert().success();

    let updated = json(shc(&home).args(["tracked", "2:30", "--format", "json"]));
    assert_eq!(updated["tracked_base_seconds"], 9_000);

    let updated = json(shc(&home).args(["entry", "8:45", "--format", "json"]));
    assert_eq!(updated["entry"], "08:45");
    assert_eq!(updated["tracked_base_seconds"], 9_000);
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let home = TempDir::new().unwrap();

    shc(&home)
        .args(["entry", "25:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid time"));

    shc(&home).args(["tracked", "soon"]).assert().failure();
    shc(&home)
        .args(["tracked", "9999999999999999h"])
        .assert()
        .failure();
    shc(&home)
        .args(["tracked", "9223372036854775807"])
        .assert()
        .failure();
    shc(&home).args(["mode", "weekend"]).assert().failure();
    shc(&home)
        .args(["status", "--at", "tomorrow"])
        .assert()
        .failure();
}

#[test]
fn test_fetch_without_configuration_reports_skips() {
    let home = TempDir::new().unwrap();

    shc(&home)
        .args(["fetch"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("RAMS: No employee saved"))
        .stdout(predicate::str::contains(
            "Time Doctor: Time Doctor email not configured",
        ))
        .stderr(predicate::str::contains("Nothing fetched"));
}

#[test]
fn test_employee_mapping_is_reported() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".shiftclock");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[employees]\n\"donald jerry\" = \"Donald J.\"\nabdulla = \"\"\n",
    )
    .unwrap();

    let mapped = json(shc(&home).args(["employee", "DONALD JERRY (2)", "--format", "json"]));
    assert_eq!(mapped["tracker"]["kind"], "mapped");
    assert_eq!(mapped["tracker"]["name"], "Donald J.");

    let none = json(shc(&home).args(["employee", "Abdulla (100025)", "--format", "json"]));
    assert_eq!(none["tracker"]["kind"], "no_tracker");
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();

    shc(&home)
        .args(["config", "set", "rams.username", "me"])
        .assert()
        .success();
    shc(&home)
        .args(["config", "set", "schedule.default_mode", "regular"])
        .assert()
        .success();

    shc(&home)
        .args(["config", "get", "rams.username"])
        .assert()
        .success()
        .stdout("me\n");

    let started = json(shc(&home).args(["start", "--format", "json"]));
    assert_eq!(started["mode"], "regular");

    shc(&home)
        .args(["config", "set", "state.expiry_hours", "0"])
        .assert()
        .failure();
}
