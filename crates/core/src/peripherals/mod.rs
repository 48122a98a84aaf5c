// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod gpio;
pub mod timer;
pub mod uart;

pub use gpio::GpioBlock;
pub use timer::TimerBlock;
pub use uart::UartBlock;
