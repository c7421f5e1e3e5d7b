// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Host-side models of the register bus, the timebase and the CPU.

extern crate std;

use core::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::vec::Vec;

use crate::bus::{RegisterBus, RegisterMap};
use crate::registers::*;
use crate::time::{Cpu, Timebase};

/// Register file that models the CMU strobe conventions and keeps a log of
/// every write.
pub struct SimBus {
    map: RegisterMap,
    mem: RefCell<HashMap<usize, u32>>,
    /// write-1-to-clear address -> the register it clears
    clears: HashMap<usize, usize>,
    /// write-1-to-set addresses
    sets: Vec<usize>,
    /// action-only addresses that store nothing
    strobes: Vec<usize>,
    log: RefCell<Vec<(usize, u32)>>,
    reads: RefCell<HashMap<usize, usize>>,
}

impl SimBus {
    pub fn new() -> SimBus {
        SimBus::with_map(RegisterMap::DEFAULT)
    }

    pub fn with_map(map: RegisterMap) -> SimBus {
        let mut bus = SimBus {
            map,
            mem: RefCell::new(HashMap::new()),
            clears: HashMap::new(),
            sets: Vec::new(),
            strobes: Vec::new(),
            log: RefCell::new(Vec::new()),
            reads: RefCell::new(HashMap::new()),
        };

        let domains = [
            map.cmu + CMU_H_DOMAIN,
            map.cmu + CMU_P_DOMAIN,
            map.cmu + CMU_O_DOMAIN,
            map.cmu + CMU_Q_DOMAIN,
            map.cmu + CMU_X_DOMAIN,
            map.cmu + CMU_AP_DOMAIN,
            map.aon + AON_DOMAIN,
            map.bt_cmu + SUBSYS_DOMAIN,
            map.wlan_cmu + SUBSYS_DOMAIN,
        ];
        for base in domains {
            bus.pair(base + DOMAIN_ENABLE, base + DOMAIN_DISABLE);
            bus.pair(base + DOMAIN_RST_SET, base + DOMAIN_RST_CLR);
            bus.strobes.push(base + DOMAIN_RST_PULSE);
        }
        bus.pair(map.cmu + CMU_TOP_CLK_EN, map.cmu + CMU_TOP_CLK_DIS);
        bus.pair(map.cmu + CMU_SYS_CLK_EN, map.cmu + CMU_SYS_CLK_DIS);
        bus.pair(map.aon + AON_PLL_EN, map.aon + AON_PLL_DIS);

        // Out of reset the bus bridge clock runs and every lane takes the
        // undivided 26 MHz oscillator.
        bus.poke(map.cmu + CMU_H_DOMAIN + DOMAIN_ENABLE, 1 << 0);
        bus.poke(map.cmu + CMU_SYS_CLK_EN, 0x1111_1111);
        bus
    }

    fn pair(&mut self, set: usize, clear: usize) {
        self.sets.push(set);
        self.clears.insert(clear, set);
    }

    pub fn map(&self) -> RegisterMap {
        self.map
    }

    /// Reads a register without logging.
    pub fn peek(&self, addr: usize) -> u32 {
        self.mem.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Stores a value without logging or strobe handling.
    pub fn poke(&self, addr: usize, value: u32) {
        self.mem.borrow_mut().insert(addr, value);
    }

    pub fn log(&self) -> Vec<(usize, u32)> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn writes_to(&self, addr: usize) -> Vec<u32> {
        self.log
            .borrow()
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn reads_of(&self, addr: usize) -> usize {
        self.reads.borrow().get(&addr).copied().unwrap_or(0)
    }
}

impl RegisterBus for SimBus {
    fn read(&self, addr: usize) -> u32 {
        *self.reads.borrow_mut().entry(addr).or_insert(0) += 1;
        if self.clears.contains_key(&addr) || self.strobes.contains(&addr) {
            0
        } else {
            self.peek(addr)
        }
    }

    fn write(&self, addr: usize, value: u32) {
        self.log.borrow_mut().push((addr, value));
        if let Some(&target) = self.clears.get(&addr) {
            let old = self.peek(target);
            self.poke(target, old & !value);
        } else if self.sets.contains(&addr) {
            let old = self.peek(addr);
            self.poke(addr, old | value);
        } else if !self.strobes.contains(&addr) {
            self.poke(addr, value);
        }
    }
}

/// Tick source that advances by one on every `ticks()` call. Delays are
/// counted but do not move time.
pub struct FakeTimebase {
    now: Cell<u32>,
    pub cycles: Cell<u64>,
    pub micros: Cell<u64>,
}

impl FakeTimebase {
    pub fn new() -> FakeTimebase {
        FakeTimebase::starting_at(0)
    }

    pub fn starting_at(now: u32) -> FakeTimebase {
        FakeTimebase {
            now: Cell::new(now),
            cycles: Cell::new(0),
            micros: Cell::new(0),
        }
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }
}

impl Timebase for FakeTimebase {
    fn ticks(&self) -> u32 {
        let t = self.now.get();
        self.now.set(t.wrapping_add(1));
        t
    }

    fn delay_cycles(&self, cycles: u32) {
        self.cycles.set(self.cycles.get() + cycles as u64);
    }

    fn delay_us(&self, us: u32) {
        self.micros.set(self.micros.get() + us as u64);
    }
}

/// Register state captured at the moment the CPU stalls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WfiSnapshot {
    pub scr: u32,
    pub pll: u32,
    pub top_clk: u32,
    pub sys_clk: u32,
    pub codec: u32,
    pub sleep_ctrl: u32,
}

/// A CPU that wakes up immediately and records what the bus looked like
/// while it was asleep.
pub struct SimCpu<'a> {
    bus: &'a SimBus,
    pub sleeps: RefCell<Vec<WfiSnapshot>>,
}

impl<'a> SimCpu<'a> {
    pub fn new(bus: &'a SimBus) -> SimCpu<'a> {
        SimCpu {
            bus,
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Option<WfiSnapshot> {
        self.sleeps.borrow().last().copied()
    }
}

impl Cpu for SimCpu<'_> {
    fn wait_for_interrupt(&self) {
        let map = self.bus.map();
        let snapshot = WfiSnapshot {
            scr: self.bus.peek(map.scb_scr),
            pll: self.bus.peek(map.aon + AON_PLL_EN),
            top_clk: self.bus.peek(map.cmu + CMU_TOP_CLK_EN),
            sys_clk: self.bus.peek(map.cmu + CMU_SYS_CLK_EN),
            codec: self.bus.peek(map.aon + AON_CODEC_DIV),
            sleep_ctrl: self.bus.peek(map.aon + AON_SLEEP_CTRL),
        };
        self.sleeps.borrow_mut().push(snapshot);
    }
}
