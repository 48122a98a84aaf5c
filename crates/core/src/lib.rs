// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bus;
pub mod control;
pub mod hardware;
pub mod interrupt;
pub mod metrics;
pub mod peripherals;
pub mod poll;
pub mod register;
pub mod signals;
pub mod snapshot;
pub mod system;
pub mod trigger;
pub mod walkthrough;


pub use bus::{Devices, RegisterMap};
pub use control::{ControlLoop, ControlSettings, ControlState, ExitReason, RunReport};
pub use interrupt::{HandlerOutcome, InterruptHandler, IrqKind};
pub use poll::{Observable, PollOutcome, Poller, Probe};
pub use register::Register;
pub use signals::{Events, SharedFlags};
pub use trigger::{InterruptTrigger, TriggerThread};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u64),
    #[error("Unaligned register access at {0:#x}")]
    UnalignedAccess(u64),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait for observing simulation events in a modular way.
pub trait SimulationObserver: std::fmt::Debug + Send + Sync {
    fn on_interrupt(&self, _kind: IrqKind, _outcome: &HandlerOutcome) {}
    fn on_state_change(&self, _from: ControlState, _to: ControlState) {}
    fn on_poll(&self, _outcome: &PollOutcome) {}
}

/// Trait representing a block of memory-mapped registers.
///
/// Registers carry their own interior mutability, so both the main loop and
/// interrupt handlers access a block through a shared reference.
pub trait Peripheral: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn base(&self) -> u64;

    /// Live registers in address order. Reserved words are not listed.
    fn registers(&self) -> Vec<&Register>;

    /// Size of the address window in bytes, reserved words included.
    fn size(&self) -> u64 {
        self.registers().len() as u64 * 4
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.base() && addr - self.base() < self.size()
    }

    fn register_at(&self, offset: u64) -> SimResult<Option<&Register>> {
        if offset >= self.size() {
            return Err(SimulationError::MemoryViolation(
                self.base().wrapping_add(offset),
            ));
        }
        let addr = self.base() + offset;
        if offset % 4 != 0 {
            return Err(SimulationError::UnalignedAccess(addr));
        }
        Ok(self.registers().into_iter().find(|r| r.address() == addr))
    }

    /// Reserved words read as zero.
    fn read(&self, offset: u64) -> SimResult<u32> {
        Ok(self.register_at(offset)?.map(Register::read).unwrap_or(0))
    }

    /// Writes to reserved words are dropped.
    fn write(&self, offset: u64, value: u32) -> SimResult<()> {
        match self.register_at(offset)? {
            Some(reg) => reg.write(value),
            None => tracing::debug!(
                "{}: write {:#x} to reserved offset {:#x} ignored",
                self.name(),
                value,
                offset
            ),
        }
        Ok(())
    }

    fn reset(&self) {
        for reg in self.registers() {
            reg.reset();
        }
    }

    fn snapshot(&self) -> serde_json::Value {
        let snap = snapshot::PeripheralSnapshot::capture(self);
        serde_json::to_value(snap).unwrap_or(serde_json::Value::Null)
    }
}
