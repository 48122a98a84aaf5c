// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::hardware::HardwareModel;
use crate::interrupt::{HandlerOutcome, InterruptHandler, IrqKind, TimerHandler, UartHandler};
use crate::{Devices, SharedFlags, SimulationObserver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireRecord {
    /// Zero-based fire index.
    pub index: u64,
    pub kind: IrqKind,
    pub outcome: HandlerOutcome,
}

/// The asynchronous interrupt source. Each [`fire`](Self::fire) runs exactly
/// one handler, alternating UART and Timer.
#[derive(Debug)]
pub struct InterruptTrigger {
    devices: Arc<Devices>,
    flags: Arc<SharedFlags>,
    uart: UartHandler,
    timer: TimerHandler,
    fires: AtomicU64,
    observers: Vec<Arc<dyn SimulationObserver>>,
}

impl InterruptTrigger {
    pub fn new(devices: Arc<Devices>, flags: Arc<SharedFlags>) -> Self {
        Self {
            devices,
            flags,
            uart: UartHandler,
            timer: TimerHandler,
            fires: AtomicU64::new(0),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SimulationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn handler(&self, kind: IrqKind) -> &dyn InterruptHandler {
        match kind {
            IrqKind::Uart => &self.uart,
            IrqKind::Timer => &self.timer,
        }
    }

    pub fn fire_count(&self) -> u64 {
        self.fires.load(Ordering::Acquire)
    }

    pub fn fire(&self) -> FireRecord {
        let index = self.fires.fetch_add(1, Ordering::AcqRel);
        let kind = IrqKind::for_fire(index);
        let outcome = self.handler(kind).service(&self.devices, &self.flags);

        tracing::debug!("IRQ #{} -> {:?}: {:?}", index + 1, kind, outcome);
        for observer in &self.observers {
            observer.on_interrupt(kind, &outcome);
        }

        FireRecord {
            index,
            kind,
            outcome,
        }
    }
}

/// Background thread that preempts the main loop: every `interval` it
/// advances the hardware and fires the trigger.
#[derive(Debug)]
pub struct TriggerThread {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
}

impl TriggerThread {
    pub fn spawn(
        trigger: Arc<InterruptTrigger>,
        hardware: Arc<HardwareModel>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("irq-trigger".to_string())
            .spawn(move || {
                let mut fired = 0u64;
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            hardware.step();
                            trigger.fire();
                            fired += 1;
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("Trigger thread stopped after {} fires", fired);
                fired
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the thread and return how many times it fired.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(fired)) => fired,
            Some(Err(_)) => {
                tracing::error!("Trigger thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for TriggerThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}
