// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicU32, Ordering};

/// A 32-bit memory-mapped register cell.
///
/// Every accessor goes to the backing atomic. There is deliberately no way to
/// obtain a reference to the inner value, so a caller can never hold on to a
/// stale copy and mistake it for the current hardware state. Reads use
/// `Acquire` and writes `Release`, so anything a writer published before
/// touching the register is visible to the reader that observes it.
#[derive(Debug)]
pub struct Register {
    name: &'static str,
    address: u64,
    reset_value: u32,
    value: AtomicU32,
}

impl Register {
    pub const fn new(name: &'static str, address: u64, reset_value: u32) -> Self {
        Self {
            name,
            address,
            reset_value,
            value: AtomicU32::new(reset_value),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn reset_value(&self) -> u32 {
        self.reset_value
    }

    #[inline]
    pub fn read(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn write(&self, value: u32) {
        tracing::trace!("{} <= {:#010x}", self.name, value);
        self.value.store(value, Ordering::Release);
    }

    /// OR `mask` into the register. Returns the new value.
    pub fn set_bits(&self, mask: u32) -> u32 {
        self.value.fetch_or(mask, Ordering::AcqRel) | mask
    }

    /// Clear every bit of `mask`. Returns the new value.
    pub fn clear_bits(&self, mask: u32) -> u32 {
        self.value.fetch_and(!mask, Ordering::AcqRel) & !mask
    }

    /// Flip every bit of `mask`. Returns the new value.
    pub fn toggle_bits(&self, mask: u32) -> u32 {
        self.value.fetch_xor(mask, Ordering::AcqRel) ^ mask
    }

    /// True when all bits of `mask` are currently set.
    #[inline]
    pub fn test_bits(&self, mask: u32) -> bool {
        self.read() & mask == mask
    }

    /// Atomic read-modify-write with an arbitrary update. `f` may run more
    /// than once if another actor writes concurrently. Returns the new value.
    pub fn modify<F>(&self, mut f: F) -> u32
    where
        F: FnMut(u32) -> u32,
    {
        let mut current = self.read();
        loop {
            let next = f(current);
            match self.value.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn reset(&self) {
        self.value.store(self.reset_value, Ordering::Release);
    }
}
