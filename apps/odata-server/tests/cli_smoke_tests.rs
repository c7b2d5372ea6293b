//! CLI smoke tests for the odata-server binary
//!
//! These tests verify that the CLI commands work correctly, including
//! configuration validation, help output, and the formatter listing.

use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

/// Helper to run the odata-server binary with given arguments
fn run_odata_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_odata-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute odata-server")
}

/// Helper to run the odata-server binary with timeout
async fn run_odata_server_with_timeout(
    args: &[&str],
    timeout_duration: Duration,
) -> Result<std::process::Output, Box<dyn std::error::Error>> {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_odata-server"));
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(timeout_duration, cmd.output()).await {
        Ok(result) => result.map_err(|e| e.into()),
        Err(elapsed) => Err(elapsed.into()),
    }
}

fn write_config(dir: &TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("Failed to write config file");
    path.to_string_lossy().to_string()
}

fn valid_config(dir: &TempDir, port: u16) -> String {
    let home = dir.path().join("home").to_string_lossy().replace('\\', "/");
    format!(
        r#"
server:
  home_dir: "{}"
  host: "127.0.0.1"
  port: {}

odata:
  route_prefix: "/odata"
  namespace: "Sample"
  default_metadata: minimal

logging:
  default:
    console_level: info
    file: "logs/odata-server.log"
    file_level: info
    max_backups: 3
    max_size_mb: 10
"#,
        home, port
    )
}

#[test]
fn test_cli_help_command() {
    let output = run_odata_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("odata-server"), "Should contain binary name");
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should contain usage information"
    );
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_odata_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("odata-server"), "Should contain binary name");
    assert!(
        stdout.chars().any(|c| c.is_ascii_digit()),
        "Should contain version numbers"
    );
}

#[test]
fn test_cli_invalid_command() {
    let output = run_odata_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid") || stderr.contains("unexpected"),
        "Should contain error message about invalid command"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_odata_server(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config file not found"),
        "Should mention config file issue: {}",
        stderr
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "invalid.yaml", "invalid: yaml: content: [unclosed");

    let output = run_odata_server(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config") || stderr.contains("yaml") || stderr.contains("parse"),
        "Should mention YAML parsing issue: {}",
        stderr
    );
}

#[test]
fn test_cli_unknown_odata_key_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "unknown.yaml",
        "odata:\n  route_prefix: /odata\n  page_size: 10\n",
    );

    let output = run_odata_server(&["--config", &config_path, "check"]);

    assert!(
        !output.status.success(),
        "Unknown keys in the odata section should be rejected"
    );
}

#[test]
fn test_cli_check_lists_formatters() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "valid.yaml", &valid_config(&temp_dir, 8087));

    let output = run_odata_server(&["--config", &config_path, "check"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
        eprintln!("STDOUT: {}", stdout);
    }
    assert!(output.status.success(), "Should succeed with valid config");

    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("odata.json.resource"));
    assert!(stdout.contains("odata.json.parameters"));
    assert!(stdout.contains("odata.xml"));
    assert!(stdout.contains("application/json;odata.metadata=minimal;odata.streaming=true"));
    assert!(stdout.contains("Unicode (UTF-8), Unicode"));
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "valid.yaml", &valid_config(&temp_dir, 8087));

    let output = run_odata_server(&["--config", &config_path, "--port", "9191", "--print-config"]);

    assert!(output.status.success(), "print-config should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 9191"), "CLI port should override: {}", stdout);
    assert!(stdout.contains("route_prefix: /odata"));
}

#[tokio::test]
async fn test_cli_run_command_starts_server() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "run.yaml", &valid_config(&temp_dir, 0));

    // Server should start and keep running until the timeout
    let result =
        run_odata_server_with_timeout(&["--config", &config_path, "run"], Duration::from_secs(3))
            .await;

    match result {
        Err(err) => {
            assert!(
                err.to_string().contains("elapsed"),
                "Server failed to start: {}",
                err
            );
        }
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(
                output.status.success(),
                "Server should start successfully\nSTDOUT: {}\nSTDERR: {}",
                stdout,
                stderr
            );
        }
    }
}

#[test]
fn test_cli_run_command_rejects_bad_host() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = temp_dir.path().join("home").to_string_lossy().replace('\\', "/");
    let config_path = write_config(
        &temp_dir,
        "bad_host.yaml",
        &format!(
            "server:\n  home_dir: \"{}\"\n  host: \"not a host\"\n  port: 8087\n",
            home
        ),
    );

    let output = run_odata_server(&["--config", &config_path, "run"]);

    assert!(!output.status.success(), "Should fail with invalid bind address");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid bind address"),
        "Should mention address parsing issue: {}",
        stderr
    );
}

#[test]
fn test_cli_verbose_flag() {
    let output = run_odata_server(&["--verbose", "--help"]);

    assert!(output.status.success(), "Verbose help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage:") || stdout.contains("USAGE:"),
        "Should still contain usage information"
    );
}

#[test]
fn test_cli_config_flag_short_form() {
    let output = run_odata_server(&["-c", "/nonexistent/config.yaml", "check"]);

    assert!(
        !output.status.success(),
        "Should fail with missing config file"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("config"),
        "Should mention config file issue with short flag: {}",
        stderr
    );
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_odata_server(&["run", "--help"]);
    assert!(output.status.success(), "Run subcommand help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("run") || stdout.contains("server"),
        "Should contain information about run command"
    );

    let output = run_odata_server(&["check", "--help"]);
    assert!(output.status.success(), "Check subcommand help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("check") || stdout.contains("formatters"),
        "Should contain information about check command"
    );
}
