// MmioSim - Volatile Register Simulation
// Copyright (C) 2026 Andrii Shylenko

use mmiosim_core::peripherals::gpio::GPIO_BASE;
use mmiosim_core::peripherals::timer::TIMER_BASE;
use mmiosim_core::peripherals::uart::UART_BASE;
use mmiosim_core::{Devices, Peripheral, RegisterMap, SimulationError};
use std::sync::Arc;

/// (register name, absolute address, reset value)
const MEMORY_MAP: &[(&str, u64, u32)] = &[
    ("INPUT", GPIO_BASE, 0),
    ("OUTPUT", GPIO_BASE + 0x04, 0),
    ("DIRECTION", GPIO_BASE + 0x08, 0),
    ("PULLUP", GPIO_BASE + 0x0C, 0),
    ("INTERRUPT", GPIO_BASE + 0x10, 0),
    ("DATA", UART_BASE, 0),
    ("STATUS", UART_BASE + 0x04, 0b10),
    ("CONTROL", UART_BASE + 0x08, 0),
    ("BAUDRATE", UART_BASE + 0x0C, 9600),
    ("COUNTER", TIMER_BASE, 0),
    ("RELOAD", TIMER_BASE + 0x04, 1000),
    ("CONTROL", TIMER_BASE + 0x08, 1),
    ("STATUS", TIMER_BASE + 0x0C, 0),
];

#[test]
fn test_memory_map_matches_layout() {
    let devices = Arc::new(Devices::new());
    let map = RegisterMap::new(devices.clone());

    for &(name, addr, reset) in MEMORY_MAP {
        let p = map
            .find_peripheral(addr)
            .unwrap_or_else(|| panic!("{} at {:#x} is unmapped", name, addr));
        let reg = p
            .registers()
            .into_iter()
            .find(|r| r.address() == addr)
            .unwrap_or_else(|| panic!("no register at {:#x}", addr));
        assert_eq!(reg.name(), name);
        assert_eq!(map.read(addr).unwrap(), reset, "{} reset value", name);
    }
}

#[test]
fn test_blocks_are_contiguous_words() {
    let devices = Devices::new();
    for p in devices.peripherals() {
        let regs = p.registers();
        for (i, reg) in regs.iter().enumerate() {
            assert_eq!(reg.address(), p.base() + 4 * i as u64, "{}", p.name());
        }
    }
    assert_eq!(devices.gpio.size(), 0x20);
    assert_eq!(devices.uart.size(), 0x10);
    assert_eq!(devices.timer.size(), 0x10);
}

#[test]
fn test_freshness_every_read_sees_last_write() {
    let devices = Arc::new(Devices::new());
    let map = RegisterMap::new(devices.clone());

    for &(_, addr, _) in MEMORY_MAP {
        for value in [0x1u32, 0xFFFF_0000, 0] {
            map.write(addr, value).unwrap();
            // Several reads between writes all observe the same value.
            for _ in 0..3 {
                assert_eq!(map.read(addr).unwrap(), value);
            }
        }
    }
}

#[test]
fn test_typed_and_absolute_views_agree() {
    let devices = Arc::new(Devices::new());
    let map = RegisterMap::new(devices.clone());

    devices.timer.counter.write(123);
    assert_eq!(map.read(TIMER_BASE).unwrap(), 123);

    map.write(UART_BASE + 0x0C, 115_200).unwrap();
    assert_eq!(devices.uart.baudrate.read(), 115_200);
}

#[test]
fn test_gaps_between_blocks_are_unmapped() {
    let map = RegisterMap::new(Arc::new(Devices::new()));
    let gap = TIMER_BASE + 0x10;
    assert_eq!(map.read(gap), Err(SimulationError::MemoryViolation(gap)));
    assert_eq!(
        map.read(GPIO_BASE + 0x02),
        Err(SimulationError::UnalignedAccess(GPIO_BASE + 0x02))
    );
    // Reserved GPIO words are mapped but inert.
    assert_eq!(map.read(GPIO_BASE + 0x1C), Ok(0));
}
