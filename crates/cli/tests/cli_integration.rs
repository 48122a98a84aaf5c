// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::process::Command;

fn mmiosim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mmiosim"))
}

#[test]
fn test_cli_run_json_report() {
    let output = mmiosim()
        .args(["run", "--json", "--interval-ms", "1", "--max-iterations", "10000"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let last_json = stdout.lines().rfind(|l| l.starts_with('{'));
    assert!(
        last_json.is_some(),
        "Report JSON not found in output. Stdout: {}",
        stdout
    );

    let json: serde_json::Value =
        serde_json::from_str(last_json.unwrap()).expect("Failed to parse JSON");
    assert_eq!(json["run"]["exit"], "shutdown");
    assert!(json["run"]["overflow_count"].as_u64().unwrap() >= 5);
    assert!(json["interrupts_fired"].as_u64().unwrap() >= 10);
    assert!(json["registers"]["peripherals"].is_array());
}

#[test]
fn test_cli_polling_shows_cached_timeout() {
    let output = mmiosim()
        .args(["polling", "--change-after", "2", "--timeout", "50"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("detected 0xdeadbeef after 2 iterations"));
    assert!(stdout.contains("TIMEOUT after 50 iterations"));
    assert!(stdout.contains("missed a change"));
}

#[test]
fn test_cli_uart_loopback() {
    let output = mmiosim()
        .args(["uart", "--byte", "Z"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Received byte: 0x5a"), "Stdout: {}", stdout);
}

#[test]
fn test_cli_gpio_sequence() {
    let output = mmiosim()
        .arg("gpio")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DIRECTION = 0x00000020"));
    assert!(stdout.contains("GPIO pin 3 is LOW"));
}

#[test]
fn test_cli_invalid_config_exits_with_config_error() {
    let path = std::env::temp_dir().join("mmiosim-invalid-scenario.yaml");
    std::fs::write(&path, "trigger:\n  interval_ms: 0\n").expect("Failed to write config");

    let output = mmiosim()
        .args(["run", "--config", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("interval_ms"), "Stderr: {}", stderr);
}

#[test]
fn test_cli_missing_config_exits_with_config_error() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.yaml");
    let output = mmiosim()
        .args(["run", "--config", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_timer_overflow_serviced_by_interrupt() {
    let output = mmiosim()
        .args(["timer", "--reload", "4", "--ticks", "1", "--irq"])
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("serviced by interrupt: detected 0x00000000 after 4 iterations"),
        "Stdout: {}",
        stdout
    );
}
