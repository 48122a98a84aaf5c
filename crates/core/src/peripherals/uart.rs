// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{Peripheral, Register};
use bitflags::bitflags;

pub const UART_BASE: u64 = 0x4001_1000;
pub const DEFAULT_BAUDRATE: u32 = 9600;

bitflags! {
    /// UART STATUS register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UartStatus: u32 {
        const RX_READY = 1 << 0;
        const TX_EMPTY = 1 << 1;
        const ERROR = 1 << 2;
    }
}

bitflags! {
    /// UART CONTROL register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UartControl: u32 {
        const ENABLE = 1 << 0;
        const RX_INTERRUPT = 1 << 1;
    }
}

/// UART with a single shared DATA register for transmit and receive.
#[derive(Debug)]
pub struct UartBlock {
    base: u64,
    pub data: Register,     // 0x00
    pub status: Register,   // 0x04
    pub control: Register,  // 0x08
    pub baudrate: Register, // 0x0C: baud rate divisor
}

impl Default for UartBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl UartBlock {
    pub fn new() -> Self {
        Self::at(UART_BASE)
    }

    pub fn at(base: u64) -> Self {
        Self {
            base,
            data: Register::new("DATA", base, 0),
            status: Register::new("STATUS", base + 0x04, UartStatus::TX_EMPTY.bits()),
            control: Register::new("CONTROL", base + 0x08, 0),
            baudrate: Register::new("BAUDRATE", base + 0x0C, DEFAULT_BAUDRATE),
        }
    }

    pub fn status(&self) -> UartStatus {
        UartStatus::from_bits_retain(self.status.read())
    }

    pub fn has_status(&self, flags: UartStatus) -> bool {
        self.status.test_bits(flags.bits())
    }

    pub fn set_status(&self, flags: UartStatus) {
        self.status.set_bits(flags.bits());
    }

    pub fn clear_status(&self, flags: UartStatus) {
        self.status.clear_bits(flags.bits());
    }

    /// Queue a byte for transmission. The transmitter owns DATA until it
    /// raises TX_EMPTY again.
    pub fn transmit(&self, byte: u8) {
        self.data.write(byte as u32);
        self.clear_status(UartStatus::TX_EMPTY);
    }

    /// Low byte of DATA.
    pub fn received_byte(&self) -> u8 {
        (self.data.read() & 0xFF) as u8
    }
}

impl Peripheral for UartBlock {
    fn name(&self) -> &'static str {
        "uart"
    }

    fn base(&self) -> u64 {
        self.base
    }

    fn registers(&self) -> Vec<&Register> {
        vec![&self.data, &self.status, &self.control, &self.baudrate]
    }
}

#[cfg(test)]
mod tests {
    use super::{UartBlock, UartStatus, DEFAULT_BAUDRATE};
    use crate::Peripheral;

    #[test]
    fn test_reset_values() {
        let uart = UartBlock::new();
        assert_eq!(uart.status(), UartStatus::TX_EMPTY);
        assert_eq!(uart.baudrate.read(), DEFAULT_BAUDRATE);
        assert_eq!(uart.read(0x0C).unwrap(), DEFAULT_BAUDRATE);
    }

    #[test]
    fn test_transmit_clears_tx_empty() {
        let uart = UartBlock::new();
        uart.transmit(b'A');
        assert_eq!(uart.data.read(), b'A' as u32);
        assert!(!uart.has_status(UartStatus::TX_EMPTY));
    }

    #[test]
    fn test_received_byte_uses_low_byte() {
        let uart = UartBlock::new();
        uart.data.write(0x1234_5642);
        assert_eq!(uart.received_byte(), 0x42);
    }

    #[test]
    fn test_status_flags() {
        let uart = UartBlock::new();
        uart.set_status(UartStatus::RX_READY | UartStatus::ERROR);
        assert!(uart.has_status(UartStatus::RX_READY | UartStatus::ERROR));
        uart.clear_status(UartStatus::ERROR);
        assert_eq!(uart.status(), UartStatus::RX_READY | UartStatus::TX_EMPTY);
        uart.reset();
        assert_eq!(uart.status(), UartStatus::TX_EMPTY);
    }
}
