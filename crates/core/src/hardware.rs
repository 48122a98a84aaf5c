// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::uart::UartStatus;
use crate::Devices;
use mmiosim_config::HardwareConfig;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What the simulated hardware did during one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareStep {
    pub step: u64,
    pub transmitted: Option<u8>,
    pub delivered: Option<u8>,
    pub error_raised: bool,
    pub timer_overflow: bool,
}

/// Stands in for the peripheral logic that changes registers behind the
/// program's back: the UART shift registers and the timer clock.
#[derive(Debug)]
pub struct HardwareModel {
    devices: Arc<Devices>,
    rx_queue: Mutex<VecDeque<u8>>,
    tx_log: Mutex<Vec<u8>>,
    steps: AtomicU64,
    timer_ticks_per_step: u32,
    uart_error_at_step: Option<u64>,
    loopback: bool,
}

impl HardwareModel {
    pub fn new(devices: Arc<Devices>) -> Self {
        Self {
            devices,
            rx_queue: Mutex::new(VecDeque::new()),
            tx_log: Mutex::new(Vec::new()),
            steps: AtomicU64::new(0),
            timer_ticks_per_step: 0,
            uart_error_at_step: None,
            loopback: false,
        }
    }

    pub fn from_config(devices: Arc<Devices>, config: &HardwareConfig) -> Self {
        let model = Self::new(devices)
            .with_timer_ticks(config.timer_ticks_per_step)
            .with_uart_error_at(config.uart_error_at_step);
        model.feed_rx(config.uart_rx.as_bytes());
        model
    }

    pub fn with_timer_ticks(mut self, ticks: u32) -> Self {
        self.timer_ticks_per_step = ticks;
        self
    }

    pub fn with_uart_error_at(mut self, step: Option<u64>) -> Self {
        self.uart_error_at_step = step;
        self
    }

    /// Transmitted bytes come back on the receive side.
    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    pub fn feed_rx(&self, bytes: &[u8]) {
        if let Ok(mut queue) = self.rx_queue.lock() {
            queue.extend(bytes.iter().copied());
        }
    }

    pub fn pending_rx(&self) -> usize {
        self.rx_queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn transmitted(&self) -> Vec<u8> {
        self.tx_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }

    /// Advance the peripherals by one step. Steps are numbered from 1.
    pub fn step(&self) -> HardwareStep {
        let step = self.steps.fetch_add(1, Ordering::AcqRel) + 1;
        let mut report = HardwareStep {
            step,
            ..Default::default()
        };

        report.transmitted = self.drain_tx();
        report.delivered = self.deliver_rx();

        if self.uart_error_at_step == Some(step) {
            self.devices.uart.set_status(UartStatus::ERROR);
            report.error_raised = true;
        }

        report.timer_overflow = self.devices.timer.advance(self.timer_ticks_per_step);

        tracing::debug!("HW: {:?}", report);
        report
    }

    /// Only advance the timer clock.
    pub fn step_timer(&self) -> bool {
        self.devices.timer.advance(self.timer_ticks_per_step)
    }

    fn drain_tx(&self) -> Option<u8> {
        let uart = &self.devices.uart;
        if uart.has_status(UartStatus::TX_EMPTY) {
            return None;
        }

        let byte = uart.received_byte();
        if let Ok(mut log) = self.tx_log.lock() {
            log.push(byte);
        }
        if self.loopback {
            if let Ok(mut queue) = self.rx_queue.lock() {
                queue.push_back(byte);
            }
        }
        uart.set_status(UartStatus::TX_EMPTY);
        Some(byte)
    }

    /// The receiver holds the next byte until software has taken the
    /// previous one (RX_READY clear).
    fn deliver_rx(&self) -> Option<u8> {
        let uart = &self.devices.uart;
        if uart.has_status(UartStatus::RX_READY) {
            return None;
        }

        let byte = self.rx_queue.lock().ok()?.pop_front()?;
        uart.data.write(byte as u32);
        uart.set_status(UartStatus::RX_READY);
        Some(byte)
    }
}
