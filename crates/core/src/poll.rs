// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bounded busy-wait primitives.
//!
//! [`poll_until`] re-observes its source on every iteration. The `_cached`
//! variants read the source once and keep testing that copy, which is what
//! an optimizer is allowed to do to a non-volatile load in a loop. They
//! exist so tests and walkthroughs can show the two diverging.

use crate::{Register, SharedFlags};
use std::sync::Arc;
use std::time::Duration;

/// A location whose current value can be fetched.
pub trait Observable {
    fn observe(&self) -> u32;
}

impl Observable for Register {
    fn observe(&self) -> u32 {
        self.read()
    }
}

impl Observable for SharedFlags {
    fn observe(&self) -> u32 {
        self.pending().bits()
    }
}

impl<T: Observable + ?Sized> Observable for &T {
    fn observe(&self) -> u32 {
        (**self).observe()
    }
}

impl<T: Observable + ?Sized> Observable for Arc<T> {
    fn observe(&self) -> u32 {
        (**self).observe()
    }
}

/// Adapts a closure into an [`Observable`].
#[derive(Debug, Clone, Copy)]
pub struct Probe<F>(pub F);

impl<F: Fn() -> u32> Observable for Probe<F> {
    fn observe(&self) -> u32 {
        (self.0)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The condition held after `iterations` timeout decrements.
    Satisfied { iterations: u32, value: u32 },
    /// The timeout counter reached zero first.
    TimedOut { iterations: u32 },
}

impl PollOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PollOutcome::Satisfied { .. })
    }

    pub fn iterations(&self) -> u32 {
        match *self {
            PollOutcome::Satisfied { iterations, .. } | PollOutcome::TimedOut { iterations } => {
                iterations
            }
        }
    }

    pub fn value(&self) -> Option<u32> {
        match *self {
            PollOutcome::Satisfied { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }
}

/// Condition: every bit of `mask` is set.
pub fn bits_set(mask: u32) -> impl Fn(u32) -> bool {
    move |value| value & mask == mask
}

/// Condition: every bit of `mask` is clear.
pub fn bits_clear(mask: u32) -> impl Fn(u32) -> bool {
    move |value| value & mask == 0
}

pub fn poll_until<S, C>(source: &S, timeout: u32, cond: C) -> PollOutcome
where
    S: Observable + ?Sized,
    C: FnMut(u32) -> bool,
{
    poll_until_with(source, timeout, cond, |_| {})
}

/// Like [`poll_until`], running `between` after each timeout decrement with
/// the number of iterations elapsed so far.
pub fn poll_until_with<S, C, H>(
    source: &S,
    timeout: u32,
    mut cond: C,
    mut between: H,
) -> PollOutcome
where
    S: Observable + ?Sized,
    C: FnMut(u32) -> bool,
    H: FnMut(u32),
{
    let mut remaining = timeout;
    let mut elapsed = 0;
    loop {
        let value = source.observe();
        if cond(value) {
            return PollOutcome::Satisfied {
                iterations: elapsed,
                value,
            };
        }
        if remaining == 0 {
            return PollOutcome::TimedOut {
                iterations: elapsed,
            };
        }
        remaining -= 1;
        elapsed += 1;
        between(elapsed);
    }
}

/// Anti-pattern: observes `source` once and keeps testing the stale copy.
pub fn poll_until_cached<S, C>(source: &S, timeout: u32, cond: C) -> PollOutcome
where
    S: Observable + ?Sized,
    C: FnMut(u32) -> bool,
{
    poll_until_cached_with(source, timeout, cond, |_| {})
}

pub fn poll_until_cached_with<S, C, H>(
    source: &S,
    timeout: u32,
    mut cond: C,
    mut between: H,
) -> PollOutcome
where
    S: Observable + ?Sized,
    C: FnMut(u32) -> bool,
    H: FnMut(u32),
{
    let cached = source.observe();
    let mut remaining = timeout;
    let mut elapsed = 0;
    loop {
        if cond(cached) {
            return PollOutcome::Satisfied {
                iterations: elapsed,
                value: cached,
            };
        }
        if remaining == 0 {
            return PollOutcome::TimedOut {
                iterations: elapsed,
            };
        }
        remaining -= 1;
        elapsed += 1;
        between(elapsed);
    }
}

/// A configured poll: timeout plus an optional pause between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    timeout: u32,
    pause: Option<Duration>,
}

impl Poller {
    pub fn new(timeout: u32) -> Self {
        Self {
            timeout,
            pause: None,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = (!pause.is_zero()).then_some(pause);
        self
    }

    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    pub fn pause(&self) -> Option<Duration> {
        self.pause
    }

    pub fn until<S, C>(&self, source: &S, cond: C) -> PollOutcome
    where
        S: Observable + ?Sized,
        C: FnMut(u32) -> bool,
    {
        self.until_with(source, cond, |_| {})
    }

    pub fn until_with<S, C, H>(&self, source: &S, cond: C, mut between: H) -> PollOutcome
    where
        S: Observable + ?Sized,
        C: FnMut(u32) -> bool,
        H: FnMut(u32),
    {
        let pause = self.pause;
        poll_until_with(source, self.timeout, cond, |elapsed| {
            between(elapsed);
            if let Some(pause) = pause {
                std::thread::sleep(pause);
            }
        })
    }
}
