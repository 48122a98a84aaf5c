// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::uart::UartStatus;
use crate::{Devices, SharedFlags};
use std::fmt::Debug;

/// Timer overflows after which the Timer handler requests shutdown.
pub const SHUTDOWN_OVERFLOW_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrqKind {
    Uart,
    Timer,
}

impl IrqKind {
    /// Handler selected for the zero-based fire `index`: even fires go to the
    /// UART, odd fires to the Timer.
    pub fn for_fire(index: u64) -> Self {
        if index % 2 == 0 {
            IrqKind::Uart
        } else {
            IrqKind::Timer
        }
    }
}

/// What a handler observed and changed during one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct HandlerOutcome {
    pub received: Option<u8>,
    pub error_cleared: bool,
    pub overflow: Option<u32>,
    pub shutdown_raised: bool,
}

impl HandlerOutcome {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Trait representing an interrupt service routine.
///
/// Handlers run to completion without blocking and only communicate through
/// registers and [`SharedFlags`].
pub trait InterruptHandler: Debug + Send + Sync {
    fn kind(&self) -> IrqKind;
    fn service(&self, devices: &Devices, flags: &SharedFlags) -> HandlerOutcome;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UartHandler;

impl InterruptHandler for UartHandler {
    fn kind(&self) -> IrqKind {
        IrqKind::Uart
    }

    fn service(&self, devices: &Devices, flags: &SharedFlags) -> HandlerOutcome {
        let uart = &devices.uart;
        let mut outcome = HandlerOutcome::default();

        if uart.has_status(UartStatus::RX_READY) {
            let byte = uart.received_byte();
            flags.publish_byte(byte);
            uart.clear_status(UartStatus::RX_READY);
            tracing::info!("[ISR] UART data received: {:#04x}", byte);
            outcome.received = Some(byte);
        }

        if uart.has_status(UartStatus::ERROR) {
            uart.clear_status(UartStatus::ERROR);
            let errors = flags.record_uart_error();
            tracing::warn!("[ISR] UART error detected (total {})", errors);
            outcome.error_cleared = true;
        }

        outcome
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TimerHandler;

impl InterruptHandler for TimerHandler {
    fn kind(&self) -> IrqKind {
        IrqKind::Timer
    }

    fn service(&self, devices: &Devices, flags: &SharedFlags) -> HandlerOutcome {
        let timer = &devices.timer;
        let mut outcome = HandlerOutcome::default();

        if timer.overflow_pending() {
            let count = flags.record_overflow();
            timer.clear_overflow();
            tracing::info!("[ISR] Timer overflow #{}", count);
            outcome.overflow = Some(count);

            if count >= SHUTDOWN_OVERFLOW_THRESHOLD && !flags.shutdown_requested() {
                flags.request_shutdown();
                tracing::info!("[ISR] Overflow threshold reached, requesting shutdown");
                outcome.shutdown_raised = true;
            }
        }

        outcome
    }
}
