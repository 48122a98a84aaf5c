// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::Peripheral;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub name: String,
    pub address: u64,
    pub value: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PeripheralSnapshot {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub registers: Vec<RegisterSnapshot>,
}

impl PeripheralSnapshot {
    pub fn capture<P: Peripheral + ?Sized>(peripheral: &P) -> Self {
        Self {
            name: peripheral.name().to_string(),
            base: peripheral.base(),
            size: peripheral.size(),
            registers: peripheral
                .registers()
                .into_iter()
                .map(|r| RegisterSnapshot {
                    name: r.name().to_string(),
                    address: r.address(),
                    value: r.read(),
                })
                .collect(),
        }
    }

    pub fn value_of(&self, register: &str) -> Option<u32> {
        self.registers
            .iter()
            .find(|r| r.name == register)
            .map(|r| r.value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DevicesSnapshot {
    pub peripherals: Vec<PeripheralSnapshot>,
}

impl DevicesSnapshot {
    pub fn peripheral(&self, name: &str) -> Option<&PeripheralSnapshot> {
        self.peripherals.iter().find(|p| p.name == name)
    }
}
