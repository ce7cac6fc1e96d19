//! Basic CLI E2E tests.
//!
//! Tests run the built binary with HOME pointed at a temporary directory so
//! config and database files never touch the real profile.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    run_cli_with_input(home, args, "")
}

fn run_cli_with_input(home: &TempDir, args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_celspeak"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("CELSPEAK_ENV")
        .env_remove("GEMINI_API_KEY")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for CLI");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

#[test]
fn test_tasks_list() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["tasks", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Giving Advice"));
    assert_eq!(stdout.lines().count(), 8);
}

#[test]
fn test_tasks_list_json() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["tasks", "list", "--json"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tasks = parsed.as_array().unwrap();
    assert_eq!(tasks.len(), 8);
    assert_eq!(tasks[2]["requires_image"], true);
}

#[test]
fn test_tasks_show_unknown_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["tasks", "show", "42"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: unknown task: 42"));
}

#[test]
fn test_counter_and_custom_persist() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["counter", "show"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "0");

    let (_, _, code) = run_cli(&home, &["custom", "set", "Talk about your weekend."]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["custom", "show"]);
    assert_eq!(stdout.trim(), "Talk about your weekend.");

    run_cli(&home, &["custom", "clear"]);
    let (stdout, _, _) = run_cli(&home, &["custom", "show"]);
    assert_eq!(stdout.trim(), "");
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "timer.tick_interval_ms"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "1000");

    let (_, _, code) = run_cli(&home, &["config", "set", "timer.tick_interval_ms", "10"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&home, &["config", "get", "timer.tick_interval_ms"]);
    assert_eq!(stdout.trim(), "10");

    let (_, _, code) = run_cli(&home, &["config", "set", "timer.tick_interval_ms", "soon"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(&home, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn test_practice_runs_to_finish() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "timer.tick_interval_ms", "5"]);
    run_cli(&home, &["config", "set", "notifications.enabled", "false"]);

    // Start, skip preparation, then keep stdin open long enough for 90 ticks.
    let mut child = Command::new(env!("CARGO_BIN_EXE_celspeak"))
        .args(["practice", "--json"])
        .env("HOME", home.path())
        .env_remove("CELSPEAK_ENV")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"space\n:skip\n").unwrap();
    stdin.flush().unwrap();
    std::thread::sleep(std::time::Duration::from_secs(3));
    stdin.write_all(b":quit\n").unwrap();
    drop(stdin);
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let last: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    assert_eq!(last["phase"], "finished");
    assert_eq!(last["practice_count"], 1);

    let (stdout, _, _) = run_cli(&home, &["counter", "show"]);
    assert_eq!(stdout.trim(), "1");
}

#[test]
fn test_practice_space_twice_pauses() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["config", "set", "notifications.enabled", "false"]);

    // Both presses are read before the first one is applied.
    let (stdout, _, code) =
        run_cli_with_input(&home, &["practice", "--json"], "space\nspace\n:quit\n");
    assert_eq!(code, 0);
    let last: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    assert_eq!(last["phase"], "preparation");
    assert_eq!(last["paused"], true);
}

#[test]
fn test_practice_image_task_is_refused() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) =
        run_cli_with_input(&home, &["practice", "--task", "3"], "space\n:quit\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("Please upload a picture to continue for this task."));
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("celspeak"));
}
