// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Low-power unit: sleep entry and wake-up sequencing.
//!
//! A sleep cycle tears the clock tree down to the oscillator, stops every
//! running PLL, stalls the core and then rebuilds exactly what was running
//! before. The state needed for the rebuild is captured in a [`Saved`] value
//! on the stack when the cycle starts and consumed when it ends.
//!
//! ```text
//!   Idle -> EnteringSleep -> Asleep -> Waking -> Idle
//! ```
//!
//! With one of the automatic modes configured the LPU hardware brings the
//! oscillator (and in [`LpuMode::AutoPll`] the PLL) back up by itself on
//! wake-up and raises status bits when they are usable. Those bits are
//! polled with a bounded wait; a wait that runs out is reported but the
//! rebuild still happens.

use core::cell::Cell;

use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::errorcode::ErrorCode;
use crate::freq::{ClockTarget, FrequencySelector, Route};
use crate::pll::{power_down, power_up, Pll, PllTopology};
use crate::registers::{CODEC_DIV, SCR, SLEEP_CTRL, TOP_CLK, WAKEUP_CLK_CFG, WAKE_STATUS};
use crate::time::Cpu;
use crate::unit::Cmu;

/// PLLs are stopped in this order and restarted in reverse.
const SHUTDOWN_ORDER: [Pll; 5] = [Pll::Usb, Pll::Ddr, Pll::Dsp, Pll::Bb, Pll::BbPsram];

/// Ticks allowed on top of the configured ready and lock timeouts.
const WAKE_SLACK_TICKS: u32 = 32;

/// Oscillator settle time before the system clock is restored when no
/// automatic mode brought it back.
const MANUAL_WAKE_SETTLE_US: u32 = 100;

const BUS_SETTLE_CYCLES: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LpuMode {
    /// Software restores every clock on wake-up.
    Off,
    /// Hardware restarts the 26 MHz oscillator on wake-up.
    Auto26m,
    /// Hardware steps 32 kHz -> 26 MHz -> PLL on wake-up.
    AutoPll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LpuConfig {
    pub mode: LpuMode,
    /// Oscillator ready wait, in timebase ticks
    pub ready_timeout_ticks: u32,
    /// PLL lock wait, in timebase ticks
    pub lock_timeout_ticks: u32,
}

impl Default for LpuConfig {
    fn default() -> Self {
        LpuConfig {
            mode: LpuMode::Off,
            ready_timeout_ticks: 64,
            lock_timeout_ticks: 128,
        }
    }
}

impl LpuConfig {
    /// Upper bound, in ticks, on the wake-up poll.
    pub fn wake_bound(&self) -> u32 {
        self.ready_timeout_ticks
            .saturating_add(self.lock_timeout_ticks)
            .saturating_add(WAKE_SLACK_TICKS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LpuState {
    Idle,
    EnteringSleep,
    Asleep,
    Waking,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepMode {
    /// Whole-chip deep sleep on the 32 kHz clock.
    Chip,
    /// Core clock stop only; the rest of the chip keeps running.
    Core,
}

/// Clock state captured on the way down and consumed on the way up.
struct Saved {
    pll: u32,
    top_clk: u32,
    codec: u32,
    /// System clock route to put back, if it was off the oscillator
    sys: Option<Route>,
}

pub struct LowPowerUnit<'a> {
    cmu: Cmu<'a>,
    cpu: &'a dyn Cpu,
    topology: &'a PllTopology,
    freq: FrequencySelector<'a>,
    config: &'a Cell<LpuConfig>,
    state: &'a Cell<LpuState>,
}

impl<'a> LowPowerUnit<'a> {
    pub fn new(
        cmu: Cmu<'a>,
        cpu: &'a dyn Cpu,
        topology: &'a PllTopology,
        freq: FrequencySelector<'a>,
        config: &'a Cell<LpuConfig>,
        state: &'a Cell<LpuState>,
    ) -> LowPowerUnit<'a> {
        LowPowerUnit {
            cmu,
            cpu,
            topology,
            freq,
            config,
            state,
        }
    }

    /// Programs the wake-up clock timers and automatic switch bits.
    ///
    /// # Errors
    ///
    /// + [`ErrorCode::INVAL`]: a timeout does not fit its timer field.
    ///   Nothing is written.
    pub fn init(&self, config: LpuConfig) -> Result<(), ErrorCode> {
        if config.ready_timeout_ticks > WAKEUP_CLK_CFG::READY_TIMER.mask
            || config.lock_timeout_ticks > WAKEUP_CLK_CFG::LOCK_TIMER.mask
        {
            return Err(ErrorCode::INVAL);
        }

        let (auto_26m, auto_pll) = match config.mode {
            LpuMode::Off => (0, 0),
            LpuMode::Auto26m => (1, 0),
            LpuMode::AutoPll => (1, 1),
        };
        self.cmu.wakeup_clk_cfg().write(
            WAKEUP_CLK_CFG::READY_TIMER.val(config.ready_timeout_ticks)
                + WAKEUP_CLK_CFG::LOCK_TIMER.val(config.lock_timeout_ticks)
                + WAKEUP_CLK_CFG::AUTO_26M.val(auto_26m)
                + WAKEUP_CLK_CFG::AUTO_PLL.val(auto_pll),
        );
        self.config.set(config);
        Ok(())
    }

    pub fn config(&self) -> LpuConfig {
        self.config.get()
    }

    pub fn state(&self) -> LpuState {
        self.state.get()
    }

    /// Runs one full sleep cycle and returns once the clocks are rebuilt.
    ///
    /// Must not be called while a sleep cycle is already in progress.
    ///
    /// # Errors
    ///
    /// + [`ErrorCode::TIMEOUT`]: the wake-up status bits did not come up in
    ///   time. Advisory only: the clock tree has been restored.
    pub fn sleep(&self, mode: SleepMode) -> Result<(), ErrorCode> {
        debug_assert_eq!(self.state.get(), LpuState::Idle);
        let config = self.config.get();

        self.state.set(LpuState::EnteringSleep);
        trace!("sleep {:?} enter", mode);
        let saved = self.tear_down(config.mode);

        self.arm(mode);
        self.state.set(LpuState::Asleep);
        self.cpu.wait_for_interrupt();
        self.state.set(LpuState::Waking);

        let woke = self.wait_for_clocks(&config);
        self.disarm();
        self.rebuild(saved);

        self.state.set(LpuState::Idle);
        trace!("sleep {:?} exit", mode);
        woke
    }

    fn tear_down(&self, mode: LpuMode) -> Saved {
        let mut saved = Saved {
            pll: self.cmu.pll_en().get(),
            top_clk: self.cmu.top_clk_en().get(),
            codec: self.cmu.codec_div().get(),
            sys: None,
        };

        // The audio path has to survive the PLL shutdown.
        critical_section::with(|_| {
            self.cmu
                .codec_div()
                .modify(CODEC_DIV::SEL_AON_OSC::SET + CODEC_DIV::SEL_PLL::CLEAR);
        });

        let bus = saved.top_clk & bus_clocks();
        if bus != 0 {
            self.cmu.top_clk_dis().set(bus);
        }

        if mode != LpuMode::Off {
            for bank in 0..2 {
                let enabled = self.cmu.nvic_iser(bank).get();
                self.cmu.wakeup_mask(bank).set(enabled);
            }
        }

        // The PLLs stop below, so the system clock cannot stay on one.
        let route = self.freq.route(ClockTarget::Sys);
        if route != Route::OSC {
            self.freq.switch(ClockTarget::Sys, Route::OSC);
            saved.sys = Some(route);
        }

        let en = self.cmu.pll_en();
        for pll in SHUTDOWN_ORDER {
            if !en.is_set(pll.distribution()) {
                continue;
            }
            let block_in_use = self
                .topology
                .sharers(pll)
                .any(|other| en.is_set(other.distribution()));
            power_down(&self.cmu, self.topology, pll, block_in_use);
        }

        saved
    }

    fn arm(&self, mode: SleepMode) {
        let retention = match mode {
            SleepMode::Chip => SLEEP_CTRL::RAM_RET_AUTO::SET,
            SleepMode::Core => SLEEP_CTRL::RAM_RET_HOLD::SET,
        };
        self.cmu.sleep_ctrl().modify(retention);
        if mode == SleepMode::Chip {
            self.cmu.scr().modify(SCR::SLEEPDEEP::SET);
        }
    }

    fn disarm(&self) {
        self.cmu.scr().modify(SCR::SLEEPDEEP::CLEAR);
        self.cmu
            .sleep_ctrl()
            .modify(SLEEP_CTRL::RAM_RET_AUTO::CLEAR + SLEEP_CTRL::RAM_RET_HOLD::CLEAR);
    }

    fn wait_for_clocks(&self, config: &LpuConfig) -> Result<(), ErrorCode> {
        let ready = match config.mode {
            LpuMode::Off => {
                self.cmu.time().delay_us(MANUAL_WAKE_SETTLE_US);
                return Ok(());
            }
            LpuMode::Auto26m => WAKE_STATUS::OSC_READY::SET,
            LpuMode::AutoPll => WAKE_STATUS::OSC_READY::SET + WAKE_STATUS::PLL_LOCKED::SET,
        };

        let time = self.cmu.time();
        let status = self.cmu.wake_status();
        let bound = config.wake_bound();
        let start = time.ticks();
        while !status.matches_all(ready) {
            if time.ticks().wrapping_sub(start) > bound {
                warn!("wake-up clocks not ready after {} ticks", bound);
                return Err(ErrorCode::TIMEOUT);
            }
        }
        Ok(())
    }

    fn rebuild(&self, saved: Saved) {
        for pll in SHUTDOWN_ORDER.iter().rev() {
            if saved.pll & pll.distribution().val(1).value != 0 {
                power_up(&self.cmu, self.topology, *pll, false);
            }
        }

        if let Some(route) = saved.sys {
            self.freq.switch(ClockTarget::Sys, route);
        }

        let bus = saved.top_clk & bus_clocks();
        let top = self.cmu.top_clk_en();
        let missing = saved.top_clk & !bus & !top.get();
        if missing != 0 {
            top.set(missing);
        }
        let stray = top.get() & !saved.top_clk;
        if stray != 0 {
            self.cmu.top_clk_dis().set(stray);
        }
        self.cmu.codec_div().set(saved.codec);

        if bus != 0 {
            top.set(bus);
            self.cmu.time().delay_cycles(BUS_SETTLE_CYCLES);
        }
    }
}

/// Memory and flash high-speed bus clocks, which must be idle across the
/// frequency drop.
fn bus_clocks() -> u32 {
    (TOP_CLK::MEM_HS::SET + TOP_CLK::FLASH_HS::SET).value
}
