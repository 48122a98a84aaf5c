// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Short guided sequences over the simulated peripherals, each returning
//! what it observed.

use crate::hardware::HardwareModel;
use crate::peripherals::timer::TimerStatus;
use crate::peripherals::uart::UartStatus;
use crate::peripherals::GpioBlock;
use crate::poll::{bits_set, poll_until_cached_with, poll_until_with, PollOutcome};
use crate::{Devices, Register, SharedFlags};
use serde::Serialize;
use std::hint::black_box;
use std::time::Instant;

pub const LED_PIN: u8 = 5;
pub const BUTTON_PIN: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpioWalkthrough {
    pub direction: u32,
    pub output_after_set: u32,
    pub button_high: bool,
    pub output_after_toggle: u32,
    pub output_after_clear: u32,
}

/// Drive the LED pin through set, toggle and clear while sampling the button.
pub fn gpio_walkthrough(gpio: &GpioBlock) -> GpioWalkthrough {
    gpio.configure_output(LED_PIN);
    let direction = gpio.direction.read();

    let output_after_set = gpio.set_pin(LED_PIN);
    let button_high = gpio.input_level(BUTTON_PIN);
    let output_after_toggle = gpio.toggle_pin(LED_PIN);
    gpio.set_pin(LED_PIN);
    let output_after_clear = gpio.clear_pin(LED_PIN);

    GpioWalkthrough {
        direction,
        output_after_set,
        button_high,
        output_after_toggle,
        output_after_clear,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UartExchange {
    pub sent: u8,
    pub tx_wait: PollOutcome,
    pub rx_wait: PollOutcome,
    pub received: Option<u8>,
}

/// Wait for the transmitter, send `byte`, then wait for a received byte.
/// The hardware model advances once per poll iteration.
pub fn uart_exchange(
    devices: &Devices,
    hardware: &HardwareModel,
    byte: u8,
    timeout: u32,
) -> UartExchange {
    let uart = &devices.uart;

    let tx_wait = poll_until_with(
        &uart.status,
        timeout,
        bits_set(UartStatus::TX_EMPTY.bits()),
        |_| {
            hardware.step();
        },
    );
    if tx_wait.is_satisfied() {
        uart.transmit(byte);
    }

    let rx_wait = poll_until_with(
        &uart.status,
        timeout,
        bits_set(UartStatus::RX_READY.bits()),
        |_| {
            hardware.step();
        },
    );
    let received = if rx_wait.is_satisfied() {
        let byte = uart.received_byte();
        uart.clear_status(UartStatus::RX_READY);
        Some(byte)
    } else {
        None
    };

    UartExchange {
        sent: byte,
        tx_wait,
        rx_wait,
        received,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerWait {
    pub outcome: PollOutcome,
    /// Overflows counted by the timer handler while waiting.
    pub serviced: u32,
    pub counter: u32,
    pub reload: u32,
}

/// Wait until the timer overflows, seen either as STATUS.OVERFLOW or as a
/// change in the handler's overflow count. `between` runs after each poll
/// iteration, after the hardware has advanced. A pending STATUS bit is
/// acknowledged before returning.
pub fn timer_wait<H>(
    devices: &Devices,
    flags: &SharedFlags,
    hardware: &HardwareModel,
    timeout: u32,
    mut between: H,
) -> TimerWait
where
    H: FnMut(u32),
{
    let timer = &devices.timer;
    let baseline = flags.overflow_count();
    let overflowed = bits_set(TimerStatus::OVERFLOW.bits());
    let outcome = poll_until_with(
        &timer.status,
        timeout,
        |status| overflowed(status) || flags.overflow_count() != baseline,
        |elapsed| {
            hardware.step_timer();
            between(elapsed);
        },
    );
    if timer.overflow_pending() {
        timer.clear_overflow();
    }
    TimerWait {
        outcome,
        serviced: flags.overflow_count().wrapping_sub(baseline),
        counter: timer.counter.read(),
        reload: timer.reload.read(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollingContrast {
    pub change_after: u32,
    pub timeout: u32,
    pub fresh: PollOutcome,
    pub cached: PollOutcome,
}

impl PollingContrast {
    pub fn diverged(&self) -> bool {
        self.fresh != self.cached
    }
}

/// Poll a register that "hardware" sets to `value` after `change_after`
/// iterations, once re-reading every time and once from a cached copy.
pub fn polling_contrast(change_after: u32, timeout: u32, value: u32) -> PollingContrast {
    let reg = Register::new("HW_REG", 0, 0);
    let simulate_hardware = |elapsed: u32| {
        if elapsed == change_after {
            reg.write(value);
        }
    };

    let fresh = poll_until_with(&reg, timeout, |v| v != 0, simulate_hardware);
    reg.reset();
    let cached = poll_until_cached_with(&reg, timeout, |v| v != 0, simulate_hardware);

    PollingContrast {
        change_after,
        timeout,
        fresh,
        cached,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessCost {
    pub iterations: u32,
    pub plain_secs: f64,
    pub register_secs: f64,
    pub plain_value: u32,
    pub register_value: u32,
}

impl AccessCost {
    pub fn overhead(&self) -> Option<f64> {
        (self.plain_secs > 0.0).then(|| self.register_secs / self.plain_secs)
    }
}

/// Time `iterations` rounds of increment, decrement, add-two on a local
/// variable versus on a register, where every step is a real memory access.
pub fn access_cost(iterations: u32) -> AccessCost {
    let start = Instant::now();
    let mut plain = 0u32;
    for _ in 0..black_box(iterations) {
        plain = plain.wrapping_add(1);
        plain = plain.wrapping_sub(1);
        plain = plain.wrapping_add(2);
    }
    let plain_value = black_box(plain);
    let plain_secs = start.elapsed().as_secs_f64();

    let reg = Register::new("COUNTER", 0, 0);
    let start = Instant::now();
    for _ in 0..iterations {
        reg.write(reg.read().wrapping_add(1));
        reg.write(reg.read().wrapping_sub(1));
        reg.write(reg.read().wrapping_add(2));
    }
    let register_secs = start.elapsed().as_secs_f64();

    AccessCost {
        iterations,
        plain_secs,
        register_secs,
        plain_value,
        register_value: reg.read(),
    }
}
