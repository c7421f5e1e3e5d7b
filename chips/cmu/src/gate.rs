// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Module clock gating.
//!
//! Enabling and disabling go through write-only ENABLE / DISABLE strobes, so
//! no read-modify-write is needed and no lock is taken. The MODE register is
//! a plain register whose bits are shared by every module of the domain,
//! which makes its update a read-modify-write under a critical section.
//!
//! The AHB-to-APB bridge ([`ModuleId::PROTECTED`]) carries the path to the
//! CMU itself. Requests to gate it are ignored.

use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::module::ModuleId;
use crate::reset::ResetController;
use crate::unit::{Cmu, DomainRegs};

/// Whether a module clock follows bus activity or only the ENABLE strobe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateMode {
    Manual = 0,
    Auto = 1,
}

pub struct ClockGate<'a> {
    cmu: Cmu<'a>,
}

impl<'a> ClockGate<'a> {
    pub fn new(cmu: Cmu<'a>) -> ClockGate<'a> {
        ClockGate { cmu }
    }

    fn regs(&self, module: ModuleId) -> DomainRegs<'a> {
        self.cmu.domain_at(module.domain().block(self.cmu.map()))
    }

    fn field(module: ModuleId) -> Field<u32, ()> {
        Field::new(1, module.bit())
    }

    /// Read back through the slow domain so the strobe is known to have
    /// landed before the caller touches the module.
    fn land(module: ModuleId, regs: &DomainRegs) {
        if module.domain().is_slow() {
            let _ = regs.enable.get();
        }
    }

    pub fn enable(&self, module: ModuleId) {
        let regs = self.regs(module);
        regs.enable.write(Self::field(module).val(1));
        Self::land(module, &regs);
    }

    /// Gates the module clock. No-op for the protected bridge.
    pub fn disable(&self, module: ModuleId) {
        if module.is_protected() {
            return;
        }
        let regs = self.regs(module);
        regs.disable.write(Self::field(module).val(1));
        Self::land(module, &regs);
    }

    /// Live clock status.
    pub fn is_enabled(&self, module: ModuleId) -> bool {
        self.regs(module).enable.is_set(Self::field(module))
    }

    pub fn set_mode(&self, module: ModuleId, mode: GateMode) {
        let regs = self.regs(module);
        critical_section::with(|_| {
            regs.mode.modify(Self::field(module).val(mode as u32));
        });
        Self::land(module, &regs);
    }

    pub fn get_mode(&self, module: ModuleId) -> GateMode {
        if self.regs(module).mode.is_set(Self::field(module)) {
            GateMode::Auto
        } else {
            GateMode::Manual
        }
    }

    /// Clocks the module and releases it from reset.
    pub fn enable_and_deassert(&self, module: ModuleId) {
        self.enable(module);
        ResetController::new(self.cmu).deassert(module);
    }

    /// Holds the module in reset, then gates its clock. The protected bridge
    /// is still reset but keeps its clock.
    pub fn disable_and_reset(&self, module: ModuleId) {
        ResetController::new(self.cmu).assert(module);
        self.disable(module);
    }
}
