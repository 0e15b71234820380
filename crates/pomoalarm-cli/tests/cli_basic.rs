//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomoalarm"))
        .args(args)
        .env("POMOALARM_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let stdout = run_ok(dir, args);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_demo_login_after_first_run() {
    let dir = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(
        dir.path(),
        &["auth", "login", "--email", "demo@example.com", "--password", "nope"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid credentials"));

    let login = run_json(
        dir.path(),
        &["auth", "login", "--email", "demo@example.com", "--password", "password123"],
    );
    assert_eq!(login["success"], true);
    assert_eq!(login["message"], "Login successful");

    let who = run_json(dir.path(), &["auth", "whoami"]);
    assert_eq!(who["email"], "demo@example.com");

    let alarms = run_json(dir.path(), &["alarm", "list"]);
    assert_eq!(alarms.as_array().unwrap().len(), 2);

    let stats = run_json(dir.path(), &["achievements", "stats"]);
    assert_eq!(stats["total_sessions"], 12);
}

#[test]
fn test_duplicate_registration_fails() {
    let dir = tempfile::tempdir().unwrap();
    let args = [
        "auth", "register", "--name", "Ada", "--email", "ada@example.com", "--password", "secret1",
    ];
    let first = run_json(dir.path(), &args);
    assert_eq!(first["success"], true);

    let (_, stderr, code) = run_cli(dir.path(), &args);
    assert_eq!(code, 1);
    assert!(stderr.contains("Email is already registered"));
}

#[test]
fn test_alarm_lifecycle_and_history() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(
        dir.path(),
        &["auth", "register", "--name", "Bo", "--email", "bo@example.com", "--password", "secret1"],
    );
    assert!(run_json(dir.path(), &["alarm", "list"])
        .as_array()
        .unwrap()
        .is_empty());

    let alarm = run_json(dir.path(), &["alarm", "create", "--name", "Deep work"]);
    assert_eq!(alarm["uptimeMinutes"], 25);
    assert_eq!(alarm["downtimeMinutes"], 5);
    assert_eq!(alarm["repetitions"], 4);
    let id = alarm["id"].as_i64().unwrap().to_string();

    let edited = run_json(dir.path(), &["alarm", "edit", &id, "--uptime", "50"]);
    assert_eq!(edited["uptimeMinutes"], 50);
    assert_eq!(edited["name"], "Deep work");

    let (_, _, code) = run_cli(dir.path(), &["alarm", "edit", &id, "--repetitions", "21"]);
    assert_eq!(code, 1);

    run_ok(dir.path(), &["alarm", "delete", &id]);
    let (_, _, code) = run_cli(dir.path(), &["alarm", "show", &id]);
    assert_eq!(code, 1);
    let history = run_json(dir.path(), &["alarm", "history", &id]);
    assert!(history.as_array().unwrap().is_empty());
}

#[test]
fn test_timer_start_pause_cancel() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(
        dir.path(),
        &["auth", "register", "--name", "Cy", "--email", "cy@example.com", "--password", "secret1"],
    );
    let alarm = run_json(dir.path(), &["alarm", "create", "--name", "Quick"]);
    let id = alarm["id"].as_i64().unwrap().to_string();

    let started = run_json(dir.path(), &["timer", "start", &id]);
    assert_eq!(started["type"], "run_started");
    assert_eq!(started["duration_secs"], 120 * 60);

    let (_, _, code) = run_cli(dir.path(), &["timer", "start", &id]);
    assert_eq!(code, 1, "second start must be refused");

    let paused = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(paused["type"], "run_paused");
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "paused");

    let resumed = run_json(dir.path(), &["timer", "resume"]);
    assert_eq!(resumed["type"], "run_resumed");
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "running");
    assert_eq!(status["title"], "Uptime (Repetition 1)");

    let cancelled = run_json(dir.path(), &["timer", "cancel"]);
    assert_eq!(cancelled["type"], "run_cancelled");
    let (_, _, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 1);

    let sessions = run_json(dir.path(), &["achievements", "list"]);
    assert!(sessions.as_array().unwrap().is_empty());
}

#[test]
fn test_foreground_run_records_session() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(
        dir.path(),
        &["auth", "register", "--name", "Di", "--email", "di@example.com", "--password", "secret1"],
    );
    let alarm = run_json(
        dir.path(),
        &["alarm", "create", "--name", "Tiny", "--uptime", "1", "--downtime", "1", "--repetitions", "1"],
    );
    let id = alarm["id"].as_i64().unwrap().to_string();

    let stdout = run_ok(dir.path(), &["timer", "run", &id, "--tick-ms", "1"]);
    assert!(stdout.contains("\"run_finished\""));
    assert!(stdout.contains("\"session_recorded\""));

    let achievements = run_json(dir.path(), &["achievements", "list"]);
    let entries = achievements.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["session"]["totalDurationMinutes"], 2);
    assert_eq!(entries[0]["alarm"]["status"], "found");
}

#[test]
fn test_commands_require_login() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["alarm", "list"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "defaults.uptime_minutes"]).trim(), "25");
    run_ok(dir.path(), &["config", "set", "defaults.uptime_minutes", "45"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "defaults.uptime_minutes"]).trim(), "45");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "defaults.repetitions", "0"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_data_reset_does_not_reseed() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["data", "reset"]);
    let (_, _, code) = run_cli(
        dir.path(),
        &["auth", "login", "--email", "demo@example.com", "--password", "password123"],
    );
    assert_eq!(code, 1);

    let summary = run_json(dir.path(), &["data", "seed"]);
    assert_eq!(summary["sessions"], 12);
}
