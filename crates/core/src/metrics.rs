// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::control::ControlState;
use crate::interrupt::{HandlerOutcome, IrqKind};
use crate::poll::PollOutcome;
use crate::SimulationObserver;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct SimulationMetrics {
    uart_interrupts: AtomicU64,
    timer_interrupts: AtomicU64,
    spurious_interrupts: AtomicU64,
    polls: AtomicU64,
    poll_timeouts: AtomicU64,
    poll_iterations: AtomicU64,
    state_changes: AtomicU64,
    start_time: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub uart_interrupts: u64,
    pub timer_interrupts: u64,
    /// Handler invocations that found nothing to do.
    pub spurious_interrupts: u64,
    pub polls: u64,
    pub poll_timeouts: u64,
    pub poll_iterations: u64,
    pub state_changes: u64,
    pub elapsed_secs: f64,
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationMetrics {
    pub fn new() -> Self {
        Self {
            uart_interrupts: AtomicU64::new(0),
            timer_interrupts: AtomicU64::new(0),
            spurious_interrupts: AtomicU64::new(0),
            polls: AtomicU64::new(0),
            poll_timeouts: AtomicU64::new(0),
            poll_iterations: AtomicU64::new(0),
            state_changes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn get_interrupts(&self, kind: IrqKind) -> u64 {
        match kind {
            IrqKind::Uart => self.uart_interrupts.load(Ordering::SeqCst),
            IrqKind::Timer => self.timer_interrupts.load(Ordering::SeqCst),
        }
    }

    pub fn get_polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn get_poll_timeouts(&self) -> u64 {
        self.poll_timeouts.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uart_interrupts: self.get_interrupts(IrqKind::Uart),
            timer_interrupts: self.get_interrupts(IrqKind::Timer),
            spurious_interrupts: self.spurious_interrupts.load(Ordering::SeqCst),
            polls: self.get_polls(),
            poll_timeouts: self.get_poll_timeouts(),
            poll_iterations: self.poll_iterations.load(Ordering::SeqCst),
            state_changes: self.state_changes.load(Ordering::SeqCst),
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }
}

impl SimulationObserver for SimulationMetrics {
    fn on_interrupt(&self, kind: IrqKind, outcome: &HandlerOutcome) {
        match kind {
            IrqKind::Uart => self.uart_interrupts.fetch_add(1, Ordering::SeqCst),
            IrqKind::Timer => self.timer_interrupts.fetch_add(1, Ordering::SeqCst),
        };
        if outcome.is_noop() {
            self.spurious_interrupts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_state_change(&self, _from: ControlState, _to: ControlState) {
        self.state_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_poll(&self, outcome: &PollOutcome) {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.poll_iterations
            .fetch_add(outcome.iterations() as u64, Ordering::SeqCst);
        if !outcome.is_satisfied() {
            self.poll_timeouts.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_interrupts_and_polls() {
        let metrics = SimulationMetrics::new();
        metrics.on_interrupt(
            IrqKind::Uart,
            &HandlerOutcome {
                received: Some(b'a'),
                ..Default::default()
            },
        );
        metrics.on_interrupt(IrqKind::Timer, &HandlerOutcome::default());
        metrics.on_poll(&PollOutcome::TimedOut { iterations: 4 });
        metrics.on_poll(&PollOutcome::Satisfied {
            iterations: 1,
            value: 1,
        });
        metrics.on_state_change(ControlState::Waiting, ControlState::Dispatching);

        let snap = metrics.snapshot();
        assert_eq!(snap.uart_interrupts, 1);
        assert_eq!(snap.timer_interrupts, 1);
        assert_eq!(snap.spurious_interrupts, 1);
        assert_eq!(snap.polls, 2);
        assert_eq!(snap.poll_timeouts, 1);
        assert_eq!(snap.poll_iterations, 5);
        assert_eq!(snap.state_changes, 1);
    }
}
