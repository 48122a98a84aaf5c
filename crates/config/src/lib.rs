// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_name() -> String {
    "interrupt-demo".to_string()
}

/// Pacing of the simulated interrupt source.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TriggerConfig {
    /// Wall-clock time between two interrupt fires.
    pub interval_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self { interval_ms: 50 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ControlConfig {
    /// Safety bound on WAITING -> DISPATCHING cycles.
    pub iteration_cap: u32,
    /// Poll iterations allowed per WAITING state.
    pub poll_timeout: u32,
    /// Pause between two poll iterations, in microseconds (0 = spin).
    pub poll_interval_us: u64,
    /// GPIO pin toggled whenever a UART byte is dispatched.
    pub status_led_pin: u8,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            iteration_cap: 10,
            poll_timeout: 100,
            poll_interval_us: 1_000,
            status_led_pin: 5,
        }
    }
}

/// Behavior of the simulated peripherals between interrupt fires.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HardwareConfig {
    pub timer_reload: u32,
    /// Counter increments applied each hardware step.
    pub timer_ticks_per_step: u32,
    /// Bytes the UART "receives", one per hardware step.
    pub uart_rx: String,
    /// Hardware step at which the UART latches its error bit.
    #[serde(default)]
    pub uart_error_at_step: Option<u64>,
    pub uart_baudrate: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            timer_reload: 1000,
            timer_ticks_per_step: 500,
            uart_rx: "HELLO".to_string(),
            uart_error_at_step: None,
            uart_baudrate: 9600,
        }
    }
}

/// A complete interrupt-demo scenario.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_name(),
            trigger: TriggerConfig::default(),
            control: ControlConfig::default(),
            hardware: HardwareConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario at {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Scenario YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        if self.trigger.interval_ms == 0 {
            anyhow::bail!("Trigger 'interval_ms' must be greater than zero");
        }

        if self.control.iteration_cap == 0 {
            anyhow::bail!("Control 'iteration_cap' must be greater than zero");
        }

        if self.control.status_led_pin >= 32 {
            anyhow::bail!(
                "Control 'status_led_pin' must be in 0..32, got {}",
                self.control.status_led_pin
            );
        }

        if self.hardware.timer_reload == 0 {
            anyhow::bail!("Hardware 'timer_reload' must be greater than zero");
        }

        if !self.hardware.uart_rx.is_ascii() {
            tracing::warn!(
                "Hardware 'uart_rx' contains non-ASCII text; only the raw bytes are fed to the UART"
            );
        }

        Ok(())
    }
}
