// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::uart::UartControl;
use crate::poll::{PollOutcome, Poller};
use crate::{Devices, Peripheral, SharedFlags, SimulationObserver};
use mmiosim_config::ScenarioConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlState {
    Init,
    Configuring,
    Waiting,
    Dispatching,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The shutdown flag was observed.
    Shutdown,
    /// The safety bound on loop cycles was reached first.
    IterationCap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    pub iteration_cap: u32,
    pub poll_timeout: u32,
    pub poll_interval: Duration,
    pub status_led_pin: u8,
    pub timer_reload: u32,
    pub uart_baudrate: u32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self::from(&ScenarioConfig::default())
    }
}

impl From<&ScenarioConfig> for ControlSettings {
    fn from(config: &ScenarioConfig) -> Self {
        Self {
            iteration_cap: config.control.iteration_cap,
            poll_timeout: config.control.poll_timeout,
            poll_interval: Duration::from_micros(config.control.poll_interval_us),
            status_led_pin: config.control.status_led_pin,
            timer_reload: config.hardware.timer_reload,
            uart_baudrate: config.hardware.uart_baudrate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// `None` while the loop has not reached SHUTTING_DOWN.
    pub exit: Option<ExitReason>,
    /// Completed WAITING -> DISPATCHING cycles.
    pub cycles: u32,
    pub bytes_received: Vec<u8>,
    pub completions: u32,
    pub timeouts: u32,
    pub overflow_count: u32,
    pub uart_errors: u32,
    pub states: Vec<ControlState>,
}

impl RunReport {
    pub fn is_finished(&self) -> bool {
        self.exit.is_some()
    }

    pub fn status(&self) -> &'static str {
        match self.exit {
            Some(ExitReason::Shutdown) => "shutdown requested",
            Some(ExitReason::IterationCap) => "iteration cap reached",
            None => "running",
        }
    }

    pub fn received_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes_received).into_owned()
    }
}

/// The main control loop, driven one state at a time by [`step`](Self::step).
#[derive(Debug)]
pub struct ControlLoop {
    devices: Arc<Devices>,
    flags: Arc<SharedFlags>,
    settings: ControlSettings,
    poller: Poller,
    state: ControlState,
    exit: Option<ExitReason>,
    cycles: u32,
    bytes_received: Vec<u8>,
    completions: u32,
    timeouts: u32,
    states: Vec<ControlState>,
    observers: Vec<Arc<dyn SimulationObserver>>,
}

impl ControlLoop {
    pub fn new(devices: Arc<Devices>, flags: Arc<SharedFlags>, settings: ControlSettings) -> Self {
        let poller = Poller::new(settings.poll_timeout).with_pause(settings.poll_interval);
        Self {
            devices,
            flags,
            settings,
            poller,
            state: ControlState::Init,
            exit: None,
            cycles: 0,
            bytes_received: Vec::new(),
            completions: 0,
            timeouts: 0,
            states: vec![ControlState::Init],
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SimulationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    /// Run INIT and CONFIGURING. Handlers must not fire before this returns,
    /// since INIT zeroes the state they write.
    pub fn configure(&mut self) {
        while matches!(self.state, ControlState::Init | ControlState::Configuring) {
            self.step();
        }
    }

    /// Advance by one state. Returns the new state.
    pub fn step(&mut self) -> ControlState {
        let next = match self.state {
            ControlState::Init => self.init(),
            ControlState::Configuring => self.configure_peripherals(),
            ControlState::Waiting => self.wait(),
            ControlState::Dispatching => self.dispatch(),
            ControlState::ShuttingDown => return ControlState::ShuttingDown,
        };
        self.transition(next);
        next
    }

    /// Run until SHUTTING_DOWN.
    pub fn run(&mut self) -> RunReport {
        while self.state != ControlState::ShuttingDown {
            self.step();
        }
        self.report()
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            exit: self.exit,
            cycles: self.cycles,
            bytes_received: self.bytes_received.clone(),
            completions: self.completions,
            timeouts: self.timeouts,
            overflow_count: self.flags.overflow_count(),
            uart_errors: self.flags.uart_errors(),
            states: self.states.clone(),
        }
    }

    fn transition(&mut self, next: ControlState) {
        let prev = self.state;
        self.state = next;
        self.states.push(next);
        tracing::debug!("Control: {:?} -> {:?}", prev, next);
        for observer in &self.observers {
            observer.on_state_change(prev, next);
        }
    }

    fn init(&mut self) -> ControlState {
        self.devices.reset();
        self.flags.reset();
        ControlState::Configuring
    }

    fn configure_peripherals(&mut self) -> ControlState {
        let gpio = &self.devices.gpio;
        gpio.configure_output(self.settings.status_led_pin);

        let timer = &self.devices.timer;
        timer.reload.write(self.settings.timer_reload);
        timer.enable();

        let uart = &self.devices.uart;
        uart.baudrate.write(self.settings.uart_baudrate);
        uart.control
            .set_bits((UartControl::ENABLE | UartControl::RX_INTERRUPT).bits());

        tracing::info!(
            "Configured {}: pin {} output, {} reload {}, {} at {} baud",
            gpio.name(),
            self.settings.status_led_pin,
            timer.name(),
            self.settings.timer_reload,
            uart.name(),
            self.settings.uart_baudrate
        );
        ControlState::Waiting
    }

    fn wait(&mut self) -> ControlState {
        let outcome = self.poller.until(self.flags.as_ref(), |events| events != 0);
        if let PollOutcome::TimedOut { iterations } = outcome {
            self.timeouts += 1;
            tracing::debug!("Main: no events after {} polls", iterations);
        }
        for observer in &self.observers {
            observer.on_poll(&outcome);
        }
        ControlState::Dispatching
    }

    fn dispatch(&mut self) -> ControlState {
        self.cycles += 1;

        if let Some(byte) = self.flags.take_data() {
            self.bytes_received.push(byte);
            self.devices.gpio.toggle_pin(self.settings.status_led_pin);
            tracing::info!(
                "Main: processing UART data {:#04x} ({})",
                byte,
                printable(byte)
            );
        }

        if self.flags.take_processing_complete() {
            self.completions += 1;
            tracing::info!("Main: processing completed");
        }

        tracing::info!(
            "Main loop iteration {} (timer overflows: {})",
            self.cycles,
            self.flags.overflow_count()
        );

        if self.flags.shutdown_requested() {
            self.exit = Some(ExitReason::Shutdown);
            tracing::info!("Main: shutdown requested");
            ControlState::ShuttingDown
        } else if self.cycles >= self.settings.iteration_cap {
            self.exit = Some(ExitReason::IterationCap);
            tracing::info!(
                "Main: iteration cap {} reached",
                self.settings.iteration_cap
            );
            ControlState::ShuttingDown
        } else {
            ControlState::Waiting
        }
    }
}

fn printable(byte: u8) -> char {
    if byte.is_ascii_graphic() || byte == b' ' {
        byte as char
    } else {
        '?'
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::gpio::GpioBlock;

    fn fast_settings(cap: u32) -> ControlSettings {
        ControlSettings {
            iteration_cap: cap,
            poll_timeout: 3,
            poll_interval: Duration::ZERO,
            ..ControlSettings::default()
        }
    }

    fn control(cap: u32) -> (Arc<Devices>, Arc<SharedFlags>, ControlLoop) {
        let devices = Arc::new(Devices::new());
        let flags = Arc::new(SharedFlags::new());
        let ctl = ControlLoop::new(devices.clone(), flags.clone(), fast_settings(cap));
        (devices, flags, ctl)
    }

    #[test]
    fn test_init_and_configure() {
        let (devices, flags, mut ctl) = control(10);
        devices.gpio.output.write(0xFFFF);
        flags.request_shutdown();

        assert_eq!(ctl.step(), ControlState::Configuring);
        assert!(!flags.shutdown_requested());
        assert_eq!(devices.gpio.output.read(), 0);

        assert_eq!(ctl.step(), ControlState::Waiting);
        assert!(devices.gpio.is_output(5));
        assert!(devices.timer.is_enabled());
        assert_eq!(devices.timer.reload.read(), 1000);
        assert_eq!(devices.uart.control.read(), 0b11);
    }

    #[test]
    fn test_iteration_cap_terminates_after_exact_cycles() {
        let (_, _, mut ctl) = control(10);
        let report = ctl.run();

        assert_eq!(report.exit, Some(ExitReason::IterationCap));
        assert_eq!(report.cycles, 10);
        assert_eq!(report.timeouts, 10);
        let waits_then_dispatch = report
            .states
            .windows(2)
            .filter(|w| w[0] == ControlState::Waiting && w[1] == ControlState::Dispatching)
            .count();
        assert_eq!(waits_then_dispatch, 10);
        assert_eq!(report.states.last(), Some(&ControlState::ShuttingDown));
    }

    #[test]
    fn test_dispatch_consumes_flags() {
        let (devices, flags, mut ctl) = control(10);
        ctl.configure();

        flags.publish_byte(b'H');
        flags.signal_processing_complete();
        assert_eq!(ctl.step(), ControlState::Dispatching);
        assert_eq!(ctl.step(), ControlState::Waiting);

        assert!(flags.pending().is_empty());
        assert!(devices.gpio.output_level(5));
        let report = ctl.report();
        assert_eq!(report.exit, None);
        assert_eq!(report.bytes_received, b"H".to_vec());
        assert_eq!(report.completions, 1);
        assert_eq!(report.timeouts, 0);
        assert_eq!(devices.gpio.output.read(), GpioBlock::pin_mask(5));
    }

    #[test]
    fn test_shutdown_flag_ends_loop() {
        let (_, flags, mut ctl) = control(10);
        ctl.configure();
        flags.request_shutdown();

        let report = ctl.run();
        assert_eq!(report.exit, Some(ExitReason::Shutdown));
        assert_eq!(report.cycles, 1);
    }

    #[test]
    fn test_shutdown_wins_over_cap_on_same_cycle() {
        let (_, flags, mut ctl) = control(1);
        ctl.configure();
        flags.request_shutdown();
        assert_eq!(ctl.run().exit, Some(ExitReason::Shutdown));
    }

    #[test]
    fn test_shutting_down_is_terminal() {
        let (devices, flags, mut ctl) = control(1);
        ctl.run();
        devices.gpio.output.write(0xAA);
        flags.publish_byte(1);

        assert_eq!(ctl.step(), ControlState::ShuttingDown);
        assert_eq!(ctl.state(), ControlState::ShuttingDown);
        assert_eq!(devices.gpio.output.read(), 0xAA);
        assert!(flags.data_ready());
    }

    #[test]
    fn test_report_before_shutdown_has_no_exit() {
        let (_, _, mut ctl) = control(10);
        assert_eq!(ctl.report().exit, None);

        ctl.configure();
        let report = ctl.report();
        assert_eq!(ctl.state(), ControlState::Waiting);
        assert_eq!(report.exit, None);
        assert!(!report.is_finished());
        assert_eq!(report.status(), "running");
        assert_eq!(report.cycles, 0);

        let report = ctl.run();
        assert!(report.is_finished());
        assert_eq!(report.status(), "iteration cap reached");
    }

    #[test]
    fn test_configure_ignores_out_of_range_led_pin() {
        let devices = Arc::new(Devices::new());
        let flags = Arc::new(SharedFlags::new());
        let settings = ControlSettings {
            status_led_pin: 37,
            ..fast_settings(1)
        };
        let mut ctl = ControlLoop::new(devices.clone(), flags.clone(), settings);
        ctl.configure();
        assert_eq!(devices.gpio.direction.read(), 0);

        flags.publish_byte(b'x');
        let report = ctl.run();
        assert_eq!(report.bytes_received, b"x".to_vec());
        assert_eq!(devices.gpio.output.read(), 0);
    }
}
