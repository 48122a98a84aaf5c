// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{Peripheral, Register};
use bitflags::bitflags;

pub const TIMER_BASE: u64 = 0x4001_0000;
pub const DEFAULT_RELOAD: u32 = 1000;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimerControl: u32 {
        const ENABLE = 1 << 0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimerStatus: u32 {
        const OVERFLOW = 1 << 0;
    }
}

/// Basic up-counting timer with auto-reload.
#[derive(Debug)]
pub struct TimerBlock {
    base: u64,
    pub counter: Register, // 0x00: current count
    pub reload: Register,  // 0x04: auto-reload value
    pub control: Register, // 0x08
    pub status: Register,  // 0x0C: interrupt flags
}

impl Default for TimerBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerBlock {
    pub fn new() -> Self {
        Self::at(TIMER_BASE)
    }

    pub fn at(base: u64) -> Self {
        Self {
            base,
            counter: Register::new("COUNTER", base, 0),
            reload: Register::new("RELOAD", base + 0x04, DEFAULT_RELOAD),
            control: Register::new("CONTROL", base + 0x08, TimerControl::ENABLE.bits()),
            status: Register::new("STATUS", base + 0x0C, 0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.control.test_bits(TimerControl::ENABLE.bits())
    }

    pub fn enable(&self) {
        self.control.set_bits(TimerControl::ENABLE.bits());
    }

    pub fn disable(&self) {
        self.control.clear_bits(TimerControl::ENABLE.bits());
    }

    pub fn overflow_pending(&self) -> bool {
        self.status.test_bits(TimerStatus::OVERFLOW.bits())
    }

    pub fn raise_overflow(&self) {
        self.status.set_bits(TimerStatus::OVERFLOW.bits());
    }

    pub fn clear_overflow(&self) {
        self.status.clear_bits(TimerStatus::OVERFLOW.bits());
    }

    /// Count `ticks` clock edges. Reaching RELOAD wraps the counter and
    /// latches OVERFLOW. Returns true when at least one overflow occurred.
    pub fn advance(&self, ticks: u32) -> bool {
        if !self.is_enabled() || ticks == 0 {
            return false;
        }

        let reload = self.reload.read().max(1);
        let mut wrapped = false;
        self.counter.modify(|count| {
            let next = count as u64 + ticks as u64;
            wrapped = next >= reload as u64;
            (next % reload as u64) as u32
        });

        if wrapped {
            self.raise_overflow();
        }
        wrapped
    }
}

impl Peripheral for TimerBlock {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn base(&self) -> u64 {
        self.base
    }

    fn registers(&self) -> Vec<&Register> {
        vec![&self.counter, &self.reload, &self.control, &self.status]
    }
}

#[cfg(test)]
mod tests {
    use super::{TimerBlock, DEFAULT_RELOAD};

    #[test]
    fn test_reset_values() {
        let timer = TimerBlock::new();
        assert_eq!(timer.reload.read(), DEFAULT_RELOAD);
        assert!(timer.is_enabled());
        assert!(!timer.overflow_pending());
    }

    #[test]
    fn test_advance_wraps_and_latches_overflow() {
        let timer = TimerBlock::new();
        timer.reload.write(10);

        assert!(!timer.advance(6));
        assert_eq!(timer.counter.read(), 6);
        assert!(!timer.overflow_pending());

        assert!(timer.advance(6));
        assert_eq!(timer.counter.read(), 2);
        assert!(timer.overflow_pending());

        timer.clear_overflow();
        assert!(!timer.overflow_pending());
    }

    #[test]
    fn test_disabled_timer_does_not_count() {
        let timer = TimerBlock::new();
        timer.disable();
        assert!(!timer.advance(5000));
        assert_eq!(timer.counter.read(), 0);
        assert!(!timer.overflow_pending());
    }

    #[test]
    fn test_zero_reload_is_treated_as_one() {
        let timer = TimerBlock::new();
        timer.reload.write(0);
        assert!(timer.advance(1));
        assert_eq!(timer.counter.read(), 0);
    }
}
