// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::{GpioBlock, TimerBlock, UartBlock};
use crate::snapshot::{DevicesSnapshot, PeripheralSnapshot};
use crate::{Peripheral, SimResult, SimulationError};
use std::sync::Arc;

/// The peripheral blocks of the simulated chip. Lives for the whole run and
/// is shared by reference between the main loop, the handlers and the
/// hardware model.
#[derive(Debug, Default)]
pub struct Devices {
    pub gpio: GpioBlock,
    pub uart: UartBlock,
    pub timer: TimerBlock,
}

impl Devices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peripherals(&self) -> [&dyn Peripheral; 3] {
        [&self.timer, &self.uart, &self.gpio]
    }

    pub fn reset(&self) {
        for p in self.peripherals() {
            p.reset();
        }
    }

    pub fn snapshot(&self) -> DevicesSnapshot {
        DevicesSnapshot {
            peripherals: self
                .peripherals()
                .into_iter()
                .map(PeripheralSnapshot::capture)
                .collect(),
        }
    }
}

/// Absolute-address view of [`Devices`].
///
/// The bit helpers here are plain read-then-write sequences on top of
/// [`RegisterMap::read`] and [`RegisterMap::write`]; use the typed
/// registers for atomic read-modify-write.
#[derive(Debug, Clone)]
pub struct RegisterMap {
    devices: Arc<Devices>,
}

impl RegisterMap {
    pub fn new(devices: Arc<Devices>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &Arc<Devices> {
        &self.devices
    }

    pub fn find_peripheral(&self, addr: u64) -> Option<&dyn Peripheral> {
        self.devices
            .peripherals()
            .into_iter()
            .find(|p| p.contains(addr))
    }

    fn route(&self, addr: u64) -> SimResult<(&dyn Peripheral, u64)> {
        let p = self
            .find_peripheral(addr)
            .ok_or(SimulationError::MemoryViolation(addr))?;
        Ok((p, addr - p.base()))
    }

    pub fn read(&self, addr: u64) -> SimResult<u32> {
        let (p, offset) = self.route(addr)?;
        p.read(offset)
    }

    pub fn write(&self, addr: u64, value: u32) -> SimResult<()> {
        let (p, offset) = self.route(addr)?;
        tracing::debug!("Bus: {}+{:#x} <= {:#x}", p.name(), offset, value);
        p.write(offset, value)
    }

    pub fn set_bits(&self, addr: u64, mask: u32) -> SimResult<u32> {
        let value = self.read(addr)? | mask;
        self.write(addr, value)?;
        Ok(value)
    }

    pub fn clear_bits(&self, addr: u64, mask: u32) -> SimResult<u32> {
        let value = self.read(addr)? & !mask;
        self.write(addr, value)?;
        Ok(value)
    }

    pub fn toggle_bits(&self, addr: u64, mask: u32) -> SimResult<u32> {
        let value = self.read(addr)? ^ mask;
        self.write(addr, value)?;
        Ok(value)
    }

    pub fn test_bits(&self, addr: u64, mask: u32) -> SimResult<bool> {
        Ok(self.read(addr)? & mask == mask)
    }
}
