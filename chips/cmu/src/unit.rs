// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Typed views of the clock management register groups.

use tock_registers::RegisterLongName;

use crate::bus::{BusRegister, RegisterBus, RegisterMap};
use crate::registers::*;
use crate::time::Timebase;

/// Gate and reset registers of one clock domain.
pub struct DomainRegs<'a> {
    pub enable: BusRegister<'a>,
    pub disable: BusRegister<'a>,
    pub mode: BusRegister<'a>,
    pub rst_set: BusRegister<'a>,
    pub rst_clr: BusRegister<'a>,
    pub rst_pulse: BusRegister<'a>,
}

impl<'a> DomainRegs<'a> {
    pub fn at(bus: &'a dyn RegisterBus, base: usize) -> DomainRegs<'a> {
        DomainRegs {
            enable: BusRegister::new(bus, base + DOMAIN_ENABLE),
            disable: BusRegister::new(bus, base + DOMAIN_DISABLE),
            mode: BusRegister::new(bus, base + DOMAIN_MODE),
            rst_set: BusRegister::new(bus, base + DOMAIN_RST_SET),
            rst_clr: BusRegister::new(bus, base + DOMAIN_RST_CLR),
            rst_pulse: BusRegister::new(bus, base + DOMAIN_RST_PULSE),
        }
    }
}

/// The register bus, the timebase and the register map, bundled.
///
/// This is cheap to copy; every driver in the crate keeps its own copy.
#[derive(Clone, Copy)]
pub struct Cmu<'a> {
    bus: &'a dyn RegisterBus,
    time: &'a dyn Timebase,
    map: RegisterMap,
}

impl<'a> Cmu<'a> {
    pub fn new(bus: &'a dyn RegisterBus, time: &'a dyn Timebase, map: RegisterMap) -> Cmu<'a> {
        Cmu { bus, time, map }
    }

    pub fn bus(&self) -> &'a dyn RegisterBus {
        self.bus
    }

    pub fn time(&self) -> &'a dyn Timebase {
        self.time
    }

    pub fn map(&self) -> &RegisterMap {
        &self.map
    }

    fn reg<R: RegisterLongName>(&self, addr: usize) -> BusRegister<'a, R> {
        BusRegister::new(self.bus, addr)
    }

    pub fn domain_at(&self, base: usize) -> DomainRegs<'a> {
        DomainRegs::at(self.bus, base)
    }

    pub fn top_clk_en(&self) -> BusRegister<'a, TOP_CLK::Register> {
        self.reg(self.map.cmu + CMU_TOP_CLK_EN)
    }

    pub fn top_clk_dis(&self) -> BusRegister<'a, TOP_CLK::Register> {
        self.reg(self.map.cmu + CMU_TOP_CLK_DIS)
    }

    pub fn sys_clk_en(&self) -> BusRegister<'a, SYS_CLK::Register> {
        self.reg(self.map.cmu + CMU_SYS_CLK_EN)
    }

    pub fn sys_clk_dis(&self) -> BusRegister<'a, SYS_CLK::Register> {
        self.reg(self.map.cmu + CMU_SYS_CLK_DIS)
    }

    pub fn clk_div(&self) -> BusRegister<'a, CLK_DIV::Register> {
        self.reg(self.map.cmu + CMU_CLK_DIV)
    }

    pub fn periph_div0(&self) -> BusRegister<'a, PERIPH_DIV0::Register> {
        self.reg(self.map.cmu + CMU_PERIPH_DIV0)
    }

    pub fn periph_div1(&self) -> BusRegister<'a, PERIPH_DIV1::Register> {
        self.reg(self.map.cmu + CMU_PERIPH_DIV1)
    }

    pub fn pll_en(&self) -> BusRegister<'a, PLL_CTRL::Register> {
        self.reg(self.map.aon + AON_PLL_EN)
    }

    pub fn pll_dis(&self) -> BusRegister<'a, PLL_CTRL::Register> {
        self.reg(self.map.aon + AON_PLL_DIS)
    }

    pub fn codec_div(&self) -> BusRegister<'a, CODEC_DIV::Register> {
        self.reg(self.map.aon + AON_CODEC_DIV)
    }

    pub fn wakeup_clk_cfg(&self) -> BusRegister<'a, WAKEUP_CLK_CFG::Register> {
        self.reg(self.map.aon + AON_WAKEUP_CLK_CFG)
    }

    pub fn wakeup_mask(&self, bank: usize) -> BusRegister<'a> {
        let offset = if bank == 0 {
            AON_WAKEUP_MASK0
        } else {
            AON_WAKEUP_MASK1
        };
        self.reg(self.map.aon + offset)
    }

    pub fn sleep_ctrl(&self) -> BusRegister<'a, SLEEP_CTRL::Register> {
        self.reg(self.map.aon + AON_SLEEP_CTRL)
    }

    pub fn wake_status(&self) -> BusRegister<'a, WAKE_STATUS::Register> {
        self.reg(self.map.aon + AON_WAKE_STATUS)
    }

    pub fn aon_status(&self) -> BusRegister<'a> {
        self.reg(self.map.aon + AON_STATUS)
    }

    /// NVIC ISER0 (`bank == 0`) or ISER1.
    pub fn nvic_iser(&self, bank: usize) -> BusRegister<'a> {
        self.reg(self.map.nvic_iser + 4 * bank)
    }

    pub fn scr(&self) -> BusRegister<'a, SCR::Register> {
        self.reg(self.map.scb_scr)
    }
}
