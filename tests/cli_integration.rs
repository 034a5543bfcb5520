//! Integration tests for hoptrace CLI functionality

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn is_root() -> bool {
    hoptrace::socket::utils::is_root()
}

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Sequential IPv4 traceroute"))
        .stdout(predicate::str::contains("--protocol"))
        .stdout(predicate::str::contains("--max-hops"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--port"));
}

#[test]
fn test_version_output() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("hoptrace "));
}

#[test]
fn test_missing_host_is_usage_error() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");

    cmd.assert().failure().code(2);
}

#[test]
fn test_unknown_protocol_rejected() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args(["--protocol", "tcp", "127.0.0.1"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_invalid_ttl() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args(["--start-ttl", "0", "127.0.0.1"]);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("start_ttl must be at least 1"));
}

#[test]
fn test_start_ttl_above_max_hops() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args(["-f", "20", "-m", "10", "127.0.0.1"]);

    cmd.assert().code(2).stderr(predicate::str::contains(
        "max_hops must be greater than or equal to start_ttl",
    ));
}

#[test]
fn test_invalid_timeout() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args(["--probe-timeout-ms", "0", "127.0.0.1"]);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("probe_timeout must be greater than 0"));
}

#[test]
fn test_ipv6_target_rejected() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.arg("::1");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("IPv6 targets are not supported"));
}

#[test]
fn test_port_warning_with_icmp() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args([
        "--protocol",
        "icmp",
        "--port",
        "8080",
        "--max-hops",
        "1",
        "--probe-timeout-ms",
        "100",
        "127.0.0.1",
    ]);

    cmd.assert().stderr(predicate::str::contains(
        "Warning: Port 8080 specified but will be ignored",
    ));
}

#[test]
fn test_localhost_traceroute() {
    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args(["--max-hops", "3", "--probe-timeout-ms", "200", "127.0.0.1"]);

    let output = cmd.output().expect("Failed to execute command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if is_root() {
        assert!(output.status.success(), "stderr: {}", stderr);
        assert!(stdout.contains("hoptrace to 127.0.0.1"));
        assert!(stdout.contains(" 1 127.0.0.1"));
    } else if !output.status.success() {
        // Unprivileged runs may still hold CAP_NET_RAW
        assert_eq!(output.status.code(), Some(2));
        assert!(
            stderr.contains("Insufficient permissions")
                || stderr.contains("Failed to create socket"),
            "Expected permission error, got: {}",
            stderr
        );
    }
}

#[test]
fn test_json_output_format() {
    if !is_root() {
        eprintln!("Skipping JSON output test - requires root");
        return;
    }

    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args(["--json", "--max-hops", "3", "--probe-timeout-ms", "200", "127.0.0.1"]);

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(json["target"], "127.0.0.1");
    assert_eq!(json["destination"], "127.0.0.1");
    assert_eq!(json["protocol"], "ICMP");
    assert_eq!(json["status"], "reached");
    assert!(json["hops"].is_array());
    assert_eq!(json["hops"][0]["ttl"], 1);
}

#[test]
fn test_udp_protocol_to_localhost() {
    if !is_root() {
        eprintln!("Skipping UDP test - requires root");
        return;
    }

    let mut cmd = Command::cargo_bin("hoptrace").expect("Failed to find hoptrace binary");
    cmd.args([
        "--protocol",
        "udp",
        "--max-hops",
        "3",
        "--probe-timeout-ms",
        "200",
        "127.0.0.1",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reached 127.0.0.1"));
}
