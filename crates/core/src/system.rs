// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::control::{ControlLoop, ControlSettings, RunReport};
use crate::hardware::HardwareModel;
use crate::metrics::{MetricsSnapshot, SimulationMetrics};
use crate::snapshot::DevicesSnapshot;
use crate::trigger::{InterruptTrigger, TriggerThread};
use crate::{Devices, SharedFlags};
use mmiosim_config::ScenarioConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub run: RunReport,
    pub interrupts_fired: u64,
    pub hardware_steps: u64,
    pub transmitted: Vec<u8>,
    pub metrics: MetricsSnapshot,
    pub registers: DevicesSnapshot,
}

/// Wires the peripherals, the interrupt source and the main loop for one
/// scenario.
#[derive(Debug)]
pub struct Simulator {
    config: ScenarioConfig,
    devices: Arc<Devices>,
    flags: Arc<SharedFlags>,
    hardware: Arc<HardwareModel>,
    trigger: Arc<InterruptTrigger>,
    metrics: Arc<SimulationMetrics>,
}

impl Simulator {
    pub fn new(config: ScenarioConfig) -> Self {
        let devices = Arc::new(Devices::new());
        let flags = Arc::new(SharedFlags::new());
        let metrics = Arc::new(SimulationMetrics::new());
        let hardware = Arc::new(HardwareModel::from_config(
            devices.clone(),
            &config.hardware,
        ));
        let trigger = Arc::new(
            InterruptTrigger::new(devices.clone(), flags.clone()).with_observer(metrics.clone()),
        );

        Self {
            config,
            devices,
            flags,
            hardware,
            trigger,
            metrics,
        }
    }

    pub fn devices(&self) -> &Arc<Devices> {
        &self.devices
    }

    pub fn flags(&self) -> &Arc<SharedFlags> {
        &self.flags
    }

    pub fn run(&self) -> std::io::Result<SimulationReport> {
        let settings = ControlSettings::from(&self.config);
        let mut control = ControlLoop::new(self.devices.clone(), self.flags.clone(), settings)
            .with_observer(self.metrics.clone());

        tracing::info!(
            "Scenario '{}': interrupt every {} ms, cap {} iterations",
            self.config.name,
            self.config.trigger.interval_ms,
            self.config.control.iteration_cap
        );

        control.configure();
        let thread = TriggerThread::spawn(
            self.trigger.clone(),
            self.hardware.clone(),
            Duration::from_millis(self.config.trigger.interval_ms),
        )?;
        let run = control.run();
        let fired = thread.stop();

        tracing::info!(
            "Finished after {} cycles ({}), {} interrupts",
            run.cycles,
            run.status(),
            fired
        );

        Ok(SimulationReport {
            scenario: self.config.name.clone(),
            run,
            interrupts_fired: self.trigger.fire_count(),
            hardware_steps: self.hardware.steps(),
            transmitted: self.hardware.transmitted(),
            metrics: self.metrics.snapshot(),
            registers: self.devices.snapshot(),
        })
    }
}
