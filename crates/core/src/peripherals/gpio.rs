// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{Peripheral, Register};

pub const GPIO_BASE: u64 = 0x4002_0000;

const INPUT: u64 = 0x00;
const OUTPUT: u64 = 0x04;
const DIRECTION: u64 = 0x08;
const PULLUP: u64 = 0x0C;
const INTERRUPT: u64 = 0x10;
/// Three reserved words follow INTERRUPT (0x14..0x1C).
const WINDOW_SIZE: u64 = 0x20;

/// GPIO port: 32 pins, one bit per pin in each register.
#[derive(Debug)]
pub struct GpioBlock {
    base: u64,
    pub input: Register,     // 0x00: input data, driven by the pins
    pub output: Register,    // 0x04: output data
    pub direction: Register, // 0x08: 0 = input, 1 = output
    pub pullup: Register,    // 0x0C: pull-up enable
    pub interrupt: Register, // 0x10: interrupt status/clear
}

impl Default for GpioBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBlock {
    pub fn new() -> Self {
        Self::at(GPIO_BASE)
    }

    pub fn at(base: u64) -> Self {
        Self {
            base,
            input: Register::new("INPUT", base + INPUT, 0),
            output: Register::new("OUTPUT", base + OUTPUT, 0),
            direction: Register::new("DIRECTION", base + DIRECTION, 0),
            pullup: Register::new("PULLUP", base + PULLUP, 0),
            interrupt: Register::new("INTERRUPT", base + INTERRUPT, 0),
        }
    }

    /// Bit for `pin`. Pins outside 0..32 have an empty mask, so every pin
    /// operation on them leaves the registers untouched and reads as low.
    pub fn pin_mask(pin: u8) -> u32 {
        1u32.checked_shl(pin as u32).unwrap_or(0)
    }

    pub fn configure_output(&self, pin: u8) {
        self.direction.set_bits(Self::pin_mask(pin));
    }

    pub fn configure_input(&self, pin: u8) {
        self.direction.clear_bits(Self::pin_mask(pin));
    }

    pub fn is_output(&self, pin: u8) -> bool {
        self.direction.read() & Self::pin_mask(pin) != 0
    }

    pub fn set_pin(&self, pin: u8) -> u32 {
        self.output.set_bits(Self::pin_mask(pin))
    }

    pub fn clear_pin(&self, pin: u8) -> u32 {
        self.output.clear_bits(Self::pin_mask(pin))
    }

    pub fn toggle_pin(&self, pin: u8) -> u32 {
        self.output.toggle_bits(Self::pin_mask(pin))
    }

    pub fn output_level(&self, pin: u8) -> bool {
        self.output.read() & Self::pin_mask(pin) != 0
    }

    pub fn input_level(&self, pin: u8) -> bool {
        self.input.read() & Self::pin_mask(pin) != 0
    }
}

impl Peripheral for GpioBlock {
    fn name(&self) -> &'static str {
        "gpio"
    }

    fn base(&self) -> u64 {
        self.base
    }

    fn registers(&self) -> Vec<&Register> {
        vec![
            &self.input,
            &self.output,
            &self.direction,
            &self.pullup,
            &self.interrupt,
        ]
    }

    fn size(&self) -> u64 {
        WINDOW_SIZE
    }
}
