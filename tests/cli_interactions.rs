//! CLI interaction tests
//!
//! Run the `kvc` binary against temporary configuration files and check
//! stdout, stderr, exit codes and the resulting file contents.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const KVC_VARS: &[&str] = &[
    "KVC_FILE",
    "KVC_MAX_LINE_LEN",
    "KVC_TRIM_KEYS",
    "KVC_DUPLICATES",
    "KVC_LOG_FORMAT",
    "KVC_ENABLE_COLOR",
];

/// Helper function to create a test command isolated from the caller's environment
fn create_test_cmd(dir: &Path) -> Command {
    let mut cmd = create_plain_cmd(dir);
    cmd.arg("--no-color");
    cmd
}

/// Like `create_test_cmd` but leaves the color decision to the tool
fn create_plain_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kvc").unwrap();
    cmd.current_dir(dir).env_remove("NO_COLOR").env_remove("FORCE_COLOR");
    for var in KVC_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper function to create a temporary configuration file
fn create_temp_config(content: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("app.conf");
    fs::write(&config_path, content).unwrap();
    let config_path_str = config_path.to_str().unwrap().to_string();
    (temp_dir, config_path_str)
}

#[test]
fn test_get_prints_value() {
    let (dir, path) = create_temp_config("# a comment\nname=Alice\nage= 30 \n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "get", "age"])
        .assert()
        .success()
        .stdout(" 30\n");
}

#[test]
fn test_get_missing_key_exit_code() {
    let (dir, path) = create_temp_config("name=Alice\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "get", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Key not found: nope"));
}

#[test]
fn test_list_drops_comments() {
    let (dir, path) = create_temp_config("# header\n\nKEY1=a b c\nKEY2=\n   KEY3 =x\n");

    create_test_cmd(dir.path())
        .args(["list", "--file", &path])
        .assert()
        .success()
        .stdout("KEY1=a b c\nKEY2=\nKEY3 =x\n");
}

#[test]
fn test_list_json() {
    let (dir, path) = create_temp_config("a=1\nb=2\n");

    let output = create_test_cmd(dir.path())
        .args(["--file", &path, "list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["key"], "b");
}

#[test]
fn test_set_round_trip() {
    let (dir, path) = create_temp_config("# gone after save\nhost=localhost\nport=80\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "set", "port", "8080"])
        .assert()
        .success();

    create_test_cmd(dir.path())
        .args(["--file", &path, "set", "debug", "-1"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "host=localhost\nport=8080\ndebug=-1\n"
    );
}

#[test]
fn test_set_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fresh.conf");

    create_test_cmd(dir.path())
        .arg("--file")
        .arg(&path)
        .args(["set", "key", "value"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&path).unwrap(), "key=value\n");
}

#[test]
fn test_check_reports_malformed_lines() {
    let (dir, path) = create_temp_config("a=1\n=novalue\nb=2\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "check"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Malformed configuration line skipped"))
        .stderr(predicate::str::contains("Malformed line 2: =novalue"));
}

#[test]
fn test_check_clean_file() {
    let (dir, path) = create_temp_config("# ok\n\na=1\nb=2\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "check"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("OK: 4 lines, 2 pairs"));
}

#[test]
fn test_json_log_format() {
    let (dir, path) = create_temp_config("junk\na=1\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "--log-format", "json", "list"])
        .assert()
        .success()
        .stdout("a=1\n")
        .stderr(predicate::str::contains("\"level\":\"Warn\""));
}

#[test]
fn test_line_limit() {
    let (dir, path) = create_temp_config("a=1\nlong=0123456789\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "--max-line-len", "8", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exceeds the maximum length of 8 bytes"));

    create_test_cmd(dir.path())
        .args(["--file", &path, "--max-line-len", "0", "list"])
        .assert()
        .success();
}

#[test]
fn test_duplicates_flag() {
    let (dir, path) = create_temp_config("a=1\na=2\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "get", "a"])
        .assert()
        .success()
        .stdout("1\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "--duplicates", "last", "get", "a"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_file_from_env() {
    let (dir, path) = create_temp_config("a=1\n");

    create_test_cmd(dir.path())
        .env("KVC_FILE", &path)
        .args(["get", "a"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_file_from_dotenv() {
    let (dir, path) = create_temp_config("a=from-dotenv\n");
    fs::write(dir.path().join(".env"), format!("KVC_FILE={}\n", path)).unwrap();

    create_test_cmd(dir.path())
        .args(["get", "a"])
        .assert()
        .success()
        .stdout("from-dotenv\n");
}

#[test]
fn test_missing_file_setting() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(dir.path())
        .args(["list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No configuration file given"));
}

#[test]
fn test_unreadable_file_exit_code() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(dir.path())
        .args(["--file", "does-not-exist.conf", "list"])
        .assert()
        .code(5);
}

#[test]
fn test_env_help_and_init_env() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(dir.path())
        .arg("env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("KVC_DUPLICATES"));

    create_test_cmd(dir.path())
        .arg("init-env")
        .assert()
        .success();
    assert!(dir.path().join(".env").exists());

    create_test_cmd(dir.path())
        .arg("init-env")
        .assert()
        .code(1);
}

#[test]
fn test_invalid_option_values() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(dir.path())
        .args(["--duplicates", "newest", "check"])
        .assert()
        .failure();

    create_test_cmd(dir.path())
        .args(["--color", "check", "-f", "x.conf"])
        .assert()
        .code(1);
}

#[test]
fn test_no_color_env_disables_log_colors() {
    let (dir, path) = create_temp_config("junk\na=1\n");

    create_plain_cmd(dir.path())
        .env("NO_COLOR", "1")
        .args(["--file", &path, "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Malformed configuration line skipped"))
        .stderr(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_colors_follow_terminal_and_flags() {
    let (dir, path) = create_temp_config("junk\na=1\n");

    // stderr is a pipe here, not a terminal
    create_plain_cmd(dir.path())
        .args(["--file", &path, "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\x1b[").not());

    create_plain_cmd(dir.path())
        .env("KVC_ENABLE_COLOR", "false")
        .args(["--file", &path, "--color", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\x1b["));
}

#[test]
fn test_non_utf8_values_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gbk.conf");
    // "张三" in GBK
    fs::write(&path, b"user=\xd5\xc5\xc8\xfd\nport=80\n").unwrap();

    let output = create_test_cmd(dir.path())
        .arg("--file")
        .arg(&path)
        .args(["get", "user"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, b"\xd5\xc5\xc8\xfd\n");

    create_test_cmd(dir.path())
        .arg("--file")
        .arg(&path)
        .args(["set", "port", "8080"])
        .assert()
        .success();
    assert_eq!(fs::read(&path).unwrap(), b"user=\xd5\xc5\xc8\xfd\nport=8080\n");
}

#[test]
fn test_set_rejects_comment_key() {
    let (dir, path) = create_temp_config("a=1\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "set", "#a", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid key"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a=1\n");
}

#[test]
fn test_env_help_reports_bad_env_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "KVC_FILE=app.conf\nKVC_DUPLICATES=newest\n").unwrap();

    create_test_cmd(dir.path())
        .arg("env-help")
        .assert()
        .success()
        .stdout(predicate::str::contains(".env: 1 problem(s)"))
        .stdout(predicate::str::contains("KVC_DUPLICATES: Configuration error"));

    // The same .env still breaks commands that need settings
    create_test_cmd(dir.path())
        .arg("list")
        .assert()
        .code(1);
}

#[test]
fn test_debug_output_stays_off_stdout() {
    let (dir, path) = create_temp_config("a=1\n");

    create_test_cmd(dir.path())
        .args(["--file", &path, "--debug", "get", "a"])
        .assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("Debug mode enabled"))
        .stderr(predicate::str::contains("Parsed configuration"));
}
