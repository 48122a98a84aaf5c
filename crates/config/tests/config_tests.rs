// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use mmiosim_config::ScenarioConfig;

#[test]
fn test_empty_yaml_uses_defaults() {
    let cfg = ScenarioConfig::from_yaml("{}").unwrap();
    assert_eq!(cfg, ScenarioConfig::default());
    assert_eq!(cfg.control.iteration_cap, 10);
    assert_eq!(cfg.hardware.timer_reload, 1000);
}

#[test]
fn test_partial_sections_parse() {
    let yaml = r#"
name: "fast-shutdown"
trigger:
  interval_ms: 5
control:
  iteration_cap: 40
hardware:
  uart_rx: "AB"
  uart_error_at_step: 3
"#;
    let cfg = ScenarioConfig::from_yaml(yaml).unwrap();
    assert_eq!(cfg.name, "fast-shutdown");
    assert_eq!(cfg.trigger.interval_ms, 5);
    assert_eq!(cfg.control.iteration_cap, 40);
    // Untouched fields keep their defaults.
    assert_eq!(cfg.control.poll_timeout, 100);
    assert_eq!(cfg.control.status_led_pin, 5);
    assert_eq!(cfg.hardware.uart_rx, "AB");
    assert_eq!(cfg.hardware.uart_error_at_step, Some(3));
    assert_eq!(cfg.hardware.uart_baudrate, 9600);
}

#[test]
fn test_rejects_unknown_schema_version() {
    let err = ScenarioConfig::from_yaml("schema_version: \"2.0\"").unwrap_err();
    assert!(err.to_string().contains("Unsupported schema_version"));
}

#[test]
fn test_rejects_zero_interval_and_cap() {
    let err = ScenarioConfig::from_yaml("trigger:\n  interval_ms: 0\n").unwrap_err();
    assert!(err.to_string().contains("interval_ms"));

    let err = ScenarioConfig::from_yaml("control:\n  iteration_cap: 0\n").unwrap_err();
    assert!(err.to_string().contains("iteration_cap"));
}

#[test]
fn test_rejects_out_of_range_led_pin() {
    let err = ScenarioConfig::from_yaml("control:\n  status_led_pin: 32\n").unwrap_err();
    assert!(err.to_string().contains("status_led_pin"));
}

#[test]
fn test_from_file_reports_missing_path() {
    let path = std::env::temp_dir().join("mmiosim-config-does-not-exist.yaml");
    let _ = std::fs::remove_file(&path);
    let err = ScenarioConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read scenario"));
}

#[test]
fn test_from_file_round_trip() {
    let path = std::env::temp_dir().join("mmiosim-config-roundtrip.yaml");
    let mut cfg = ScenarioConfig::default();
    cfg.name = "saved".to_string();
    cfg.control.iteration_cap = 3;
    std::fs::write(&path, serde_yaml::to_string(&cfg).unwrap()).unwrap();

    let loaded = ScenarioConfig::from_file(&path).unwrap();
    assert_eq!(loaded, cfg);
    let _ = std::fs::remove_file(&path);
}
