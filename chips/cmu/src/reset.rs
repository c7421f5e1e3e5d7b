// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Per-module reset control.
//!
//! Resets are driven through the RST_SET / RST_CLR / RST_PULSE strobes of
//! the module's domain block. Releasing a reset needs a short propagation
//! delay before the module may be touched: a fixed cycle count on the fast
//! domains, and a few reads of an always-on status register on the AON
//! domain, whose clock period bounds the delay.

use tock_registers::fields::Field;
use tock_registers::interfaces::{Readable, Writeable};

use crate::module::ModuleId;
use crate::unit::{Cmu, DomainRegs};

const DEASSERT_DELAY_CYCLES: u32 = 16;
const AON_DEASSERT_READS: usize = 3;
const PULSE_DELAY_CYCLES: u32 = 32;

pub struct ResetController<'a> {
    cmu: Cmu<'a>,
}

impl<'a> ResetController<'a> {
    pub fn new(cmu: Cmu<'a>) -> ResetController<'a> {
        ResetController { cmu }
    }

    fn regs(&self, module: ModuleId) -> DomainRegs<'a> {
        self.cmu.domain_at(module.domain().block(self.cmu.map()))
    }

    fn field(module: ModuleId) -> Field<u32, ()> {
        Field::new(1, module.bit())
    }

    /// Holds `module` in reset.
    pub fn assert(&self, module: ModuleId) {
        let regs = self.regs(module);
        regs.rst_set.write(Self::field(module).val(1));
        if module.domain().is_slow() {
            let _ = regs.rst_set.get();
        }
    }

    /// Releases `module` from reset and waits for the release to propagate.
    pub fn deassert(&self, module: ModuleId) {
        let regs = self.regs(module);
        regs.rst_clr.write(Self::field(module).val(1));
        self.propagate(module);
    }

    fn propagate(&self, module: ModuleId) {
        if module.domain().is_slow() {
            let status = self.cmu.aon_status();
            for _ in 0..AON_DEASSERT_READS {
                let _ = status.get();
            }
        } else {
            self.cmu.time().delay_cycles(DEASSERT_DELAY_CYCLES);
        }
    }

    /// Issues a hardware reset pulse. A module that is already held in reset
    /// is simply released instead.
    pub fn pulse(&self, module: ModuleId) {
        if self.is_asserted(module) {
            self.deassert(module);
            return;
        }
        let regs = self.regs(module);
        regs.rst_pulse.write(Self::field(module).val(1));
        self.cmu.time().delay_cycles(PULSE_DELAY_CYCLES);
    }

    pub fn is_asserted(&self, module: ModuleId) -> bool {
        self.regs(module).rst_set.is_set(Self::field(module))
    }
}
