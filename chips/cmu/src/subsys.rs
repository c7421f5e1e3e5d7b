// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Start and stop of the DSP, Bluetooth and WLAN cores.
//!
//! The DSP sits on the AP domain of the main CMU and runs from the DSP PLL.
//! Bluetooth and WLAN each have a clock unit of their own with a single
//! domain block; their CPU, radio and modem are started and stopped
//! together. What runs on those cores afterwards is not managed here.

use tock_registers::interfaces::{Readable, Writeable};

use crate::gate::ClockGate;
use crate::module::{ApModule, ModuleId};
use crate::pll::{Pll, PllManager, PllUser};
use crate::registers::{SUBSYS, SUBSYS_DOMAIN};
use crate::reset::ResetController;
use crate::unit::{Cmu, DomainRegs};

const RELEASE_DELAY_CYCLES: u32 = 64;

const DSP_CORE: ModuleId = ModuleId::Ap(ApModule::Dsp);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Subsystem {
    Dsp,
    Bt,
    Wlan,
}

pub struct Subsystems<'a> {
    cmu: Cmu<'a>,
    pll: PllManager<'a>,
}

impl<'a> Subsystems<'a> {
    pub fn new(cmu: Cmu<'a>, pll: PllManager<'a>) -> Subsystems<'a> {
        Subsystems { cmu, pll }
    }

    fn unit(&self, subsystem: Subsystem) -> Option<DomainRegs<'a>> {
        let base = match subsystem {
            Subsystem::Dsp => return None,
            Subsystem::Bt => self.cmu.map().bt_cmu,
            Subsystem::Wlan => self.cmu.map().wlan_cmu,
        };
        Some(self.cmu.domain_at(base + SUBSYS_DOMAIN))
    }

    fn unit_bits() -> u32 {
        (SUBSYS::CPU::SET + SUBSYS::RF::SET + SUBSYS::MODEM::SET).value
    }

    /// Clocks `subsystem` and releases it from reset.
    pub fn start(&self, subsystem: Subsystem) {
        debug!("start {:?}", subsystem);
        match self.unit(subsystem) {
            None => {
                self.pll.enable(Pll::Dsp, PllUser::Dsp);
                ClockGate::new(self.cmu).enable_and_deassert(DSP_CORE);
            }
            Some(regs) => {
                regs.enable.set(Self::unit_bits());
                regs.rst_clr.set(Self::unit_bits());
                self.cmu.time().delay_cycles(RELEASE_DELAY_CYCLES);
            }
        }
    }

    /// Holds `subsystem` in reset and gates its clocks.
    pub fn stop(&self, subsystem: Subsystem) {
        debug!("stop {:?}", subsystem);
        match self.unit(subsystem) {
            None => {
                ClockGate::new(self.cmu).disable_and_reset(DSP_CORE);
                self.pll.disable(Pll::Dsp, PllUser::Dsp);
            }
            Some(regs) => {
                regs.rst_set.set(Self::unit_bits());
                regs.disable.set(Self::unit_bits());
            }
        }
    }

    /// Clocked and out of reset.
    pub fn is_running(&self, subsystem: Subsystem) -> bool {
        match self.unit(subsystem) {
            None => {
                ClockGate::new(self.cmu).is_enabled(DSP_CORE)
                    && !ResetController::new(self.cmu).is_asserted(DSP_CORE)
            }
            Some(regs) => {
                let bits = Self::unit_bits();
                regs.enable.get() & bits == bits && regs.rst_set.get() & bits == 0
            }
        }
    }
}
