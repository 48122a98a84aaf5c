// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use bitflags::bitflags;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

bitflags! {
    /// Events the main loop waits for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Events: u32 {
        const DATA_READY = 1 << 0;
        const PROCESSING_COMPLETE = 1 << 1;
        const SHUTDOWN = 1 << 2;
    }
}

/// Flags and counters shared between interrupt handlers and the main loop.
///
/// Each field has exactly one writer. Publishing uses `Release` and every
/// observation uses `Acquire`, so the main loop never works from a stale
/// copy of something a handler already wrote.
#[derive(Debug, Default)]
pub struct SharedFlags {
    /// Set by the UART handler, cleared by the main loop.
    data_ready: AtomicBool,
    /// Written by the UART handler before `data_ready` is raised.
    received_byte: AtomicU8,
    /// Incremented by the Timer handler only.
    overflow_count: AtomicU32,
    /// Raised by the Timer handler. Terminal.
    shutdown_requested: AtomicBool,
    /// Raised by external collaborators, cleared by the main loop.
    processing_complete: AtomicBool,
    /// Incremented by the UART handler only.
    uart_errors: AtomicU32,
}

impl SharedFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every flag and counter. Only valid before any handler can run.
    pub fn reset(&self) {
        self.data_ready.store(false, Ordering::Release);
        self.received_byte.store(0, Ordering::Release);
        self.overflow_count.store(0, Ordering::Release);
        self.shutdown_requested.store(false, Ordering::Release);
        self.processing_complete.store(false, Ordering::Release);
        self.uart_errors.store(0, Ordering::Release);
    }

    pub fn data_ready(&self) -> bool {
        self.data_ready.load(Ordering::Acquire)
    }

    pub fn received_byte(&self) -> u8 {
        self.received_byte.load(Ordering::Acquire)
    }

    /// Store the byte, then raise `data_ready`.
    pub fn publish_byte(&self, byte: u8) {
        self.received_byte.store(byte, Ordering::Release);
        self.data_ready.store(true, Ordering::Release);
    }

    /// Consume a pending byte, clearing `data_ready`.
    pub fn take_data(&self) -> Option<u8> {
        if self.data_ready.swap(false, Ordering::AcqRel) {
            Some(self.received_byte())
        } else {
            None
        }
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflow_count.load(Ordering::Acquire)
    }

    /// Returns the count after the increment.
    pub fn record_overflow(&self) -> u32 {
        self.overflow_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
    }

    pub fn processing_complete(&self) -> bool {
        self.processing_complete.load(Ordering::Acquire)
    }

    pub fn signal_processing_complete(&self) {
        self.processing_complete.store(true, Ordering::Release);
    }

    pub fn take_processing_complete(&self) -> bool {
        self.processing_complete.swap(false, Ordering::AcqRel)
    }

    pub fn uart_errors(&self) -> u32 {
        self.uart_errors.load(Ordering::Acquire)
    }

    pub fn record_uart_error(&self) -> u32 {
        self.uart_errors.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Fresh view of every event the main loop reacts to.
    pub fn pending(&self) -> Events {
        let mut events = Events::empty();
        events.set(Events::DATA_READY, self.data_ready());
        events.set(Events::PROCESSING_COMPLETE, self.processing_complete());
        events.set(Events::SHUTDOWN, self.shutdown_requested());
        events
    }
}
