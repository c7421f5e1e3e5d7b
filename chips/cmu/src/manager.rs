// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Owner of all runtime clock and power state.
//!
//! Boards create exactly one [`ClockPowerManager`] during bring-up and hand
//! out references to it. The drivers it returns are short-lived views that
//! borrow its state; none of them keeps anything of its own.
//!
//! ```rust,ignore
//! let cmu = static_init!(
//!     ClockPowerManager<'static>,
//!     ClockPowerManager::new(&BUS, &TIMEBASE, &CPU, RegisterMap::DEFAULT, PowerConfig::default())
//!         .unwrap()
//! );
//! cmu.gate().enable(ModuleId::P(PModule::Uart0));
//! cmu.freq().set_system_frequency(FrequencyTier::Mhz156)?;
//! ```

use core::cell::Cell;

use critical_section::Mutex;

use crate::bus::{RegisterBus, RegisterMap};
use crate::divider::Dividers;
use crate::errorcode::ErrorCode;
use crate::freq::FrequencySelector;
use crate::gate::ClockGate;
use crate::lpu::{LowPowerUnit, LpuConfig, LpuState};
use crate::pll::{PllManager, PllTopology, PLL_COUNT};
use crate::reset::ResetController;
use crate::subsys::Subsystems;
use crate::time::{Cpu, Timebase};
use crate::unit::Cmu;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PowerConfig {
    pub lpu: LpuConfig,
    pub topology: PllTopology,
}

pub struct ClockPowerManager<'a> {
    cmu: Cmu<'a>,
    cpu: &'a dyn Cpu,
    topology: PllTopology,
    pll_users: Mutex<Cell<[u8; PLL_COUNT]>>,
    lpu_config: Cell<LpuConfig>,
    lpu_state: Cell<LpuState>,
}

impl<'a> ClockPowerManager<'a> {
    /// Checks `config` and programs the low-power unit with it.
    ///
    /// # Errors
    ///
    /// + [`ErrorCode::TOPOLOGY`]: the PLL topology cannot exist in hardware.
    /// + [`ErrorCode::INVAL`]: an LPU timeout does not fit its timer field.
    pub fn new(
        bus: &'a dyn RegisterBus,
        time: &'a dyn Timebase,
        cpu: &'a dyn Cpu,
        map: RegisterMap,
        config: PowerConfig,
    ) -> Result<ClockPowerManager<'a>, ErrorCode> {
        config.topology.validate()?;

        let manager = ClockPowerManager {
            cmu: Cmu::new(bus, time, map),
            cpu,
            topology: config.topology,
            pll_users: Mutex::new(Cell::new([0; PLL_COUNT])),
            lpu_config: Cell::new(config.lpu),
            lpu_state: Cell::new(LpuState::Idle),
        };
        manager.lpu().init(config.lpu)?;
        Ok(manager)
    }

    pub fn cmu(&self) -> Cmu<'a> {
        self.cmu
    }

    pub fn gate(&self) -> ClockGate<'a> {
        ClockGate::new(self.cmu)
    }

    pub fn reset(&self) -> ResetController<'a> {
        ResetController::new(self.cmu)
    }

    pub fn pll(&self) -> PllManager<'_> {
        PllManager::new(self.cmu, &self.pll_users, &self.topology)
    }

    pub fn freq(&self) -> FrequencySelector<'_> {
        FrequencySelector::new(self.cmu, self.pll())
    }

    pub fn dividers(&self) -> Dividers<'a> {
        Dividers::new(self.cmu)
    }

    pub fn lpu(&self) -> LowPowerUnit<'_> {
        LowPowerUnit::new(
            self.cmu,
            self.cpu,
            &self.topology,
            self.freq(),
            &self.lpu_config,
            &self.lpu_state,
        )
    }

    pub fn subsys(&self) -> Subsystems<'_> {
        Subsystems::new(self.cmu, self.pll())
    }
}
