// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! System, DSP, memory and flash clock frequency selection.
//!
//! Each of the four clocks has a lane in the SYS_CLK strobe pair with one
//! select bit per source, a BYPASS bit choosing the undivided path and an
//! RSTN bit releasing the lane divider, plus a divider field in CLK_DIV.
//! The source mux follows the highest-priority select that is set
//! (PLL > OSCX4 > OSCX2 > OSC > 32 kHz).
//!
//! Switching is glitch free as long as two rules hold:
//!
//! + the new select bit is written to ENABLE before the old select bits are
//!   written to DISABLE, so the mux only ever moves once;
//! + the divider is held in reset (RSTN cleared) only while BYPASS is set,
//!   so the divided path is never selected with a stopped divider.
//!
//! Retuning a divider that is currently in use first parks the lane on the
//! undivided oscillator.
//!
//! Requested frequencies are encoded through a per-clock table; the current
//! frequency is decoded through a separate table of recognized
//! source/divider combinations.

use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::errorcode::ErrorCode;
use crate::pll::{Pll, PllManager, PllUser};
use crate::registers::{CLK_DIV, SYS_CLK};
use crate::unit::Cmu;

/// Stored divider field value is divisor - `DIV_BIAS`.
const DIV_BIAS: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FrequencyTier {
    Khz32 = 0,
    Mhz6_5 = 1,
    Mhz13 = 2,
    Mhz26 = 3,
    Mhz52 = 4,
    Mhz78 = 5,
    Mhz104 = 6,
    Mhz156 = 7,
    Mhz208 = 8,
    Mhz260 = 9,
    Mhz390 = 10,
    Mhz780 = 11,
}

impl FrequencyTier {
    pub const ALL: [FrequencyTier; 12] = [
        FrequencyTier::Khz32,
        FrequencyTier::Mhz6_5,
        FrequencyTier::Mhz13,
        FrequencyTier::Mhz26,
        FrequencyTier::Mhz52,
        FrequencyTier::Mhz78,
        FrequencyTier::Mhz104,
        FrequencyTier::Mhz156,
        FrequencyTier::Mhz208,
        FrequencyTier::Mhz260,
        FrequencyTier::Mhz390,
        FrequencyTier::Mhz780,
    ];

    pub fn hz(self) -> u32 {
        match self {
            FrequencyTier::Khz32 => 32_768,
            FrequencyTier::Mhz6_5 => 6_500_000,
            FrequencyTier::Mhz13 => 13_000_000,
            FrequencyTier::Mhz26 => 26_000_000,
            FrequencyTier::Mhz52 => 52_000_000,
            FrequencyTier::Mhz78 => 78_000_000,
            FrequencyTier::Mhz104 => 104_000_000,
            FrequencyTier::Mhz156 => 156_000_000,
            FrequencyTier::Mhz208 => 208_000_000,
            FrequencyTier::Mhz260 => 260_000_000,
            FrequencyTier::Mhz390 => 390_000_000,
            FrequencyTier::Mhz780 => 780_000_000,
        }
    }
}

impl TryFrom<u8> for FrequencyTier {
    type Error = ErrorCode;

    fn try_from(id: u8) -> Result<FrequencyTier, ErrorCode> {
        FrequencyTier::ALL
            .get(id as usize)
            .copied()
            .ok_or(ErrorCode::INVAL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// 32 kHz always-on clock, selected when no other select bit is set
    Slow,
    /// 26 MHz crystal oscillator
    Osc,
    OscX2,
    OscX4,
    /// 780 MHz PLL output
    Pll,
}

/// A source and, for the divided path, its divisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Route {
    pub source: Source,
    /// `None` selects the undivided (bypass) path
    pub divider: Option<u8>,
}

impl Route {
    pub const OSC: Route = Route::bypass(Source::Osc);

    pub const fn bypass(source: Source) -> Route {
        Route {
            source,
            divider: None,
        }
    }

    pub const fn divided(source: Source, divider: u8) -> Route {
        Route {
            source,
            divider: Some(divider),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockTarget {
    Sys,
    Dsp,
    Mem,
    Flash,
}

struct Lane {
    osc: Field<u32, SYS_CLK::Register>,
    oscx2: Field<u32, SYS_CLK::Register>,
    oscx4: Field<u32, SYS_CLK::Register>,
    pll: Field<u32, SYS_CLK::Register>,
    bypass: Field<u32, SYS_CLK::Register>,
    rstn: Field<u32, SYS_CLK::Register>,
    div: Field<u32, CLK_DIV::Register>,
}

impl Lane {
    fn select(&self, source: Source) -> u32 {
        match source {
            Source::Slow => 0,
            Source::Osc => self.osc.val(1).value,
            Source::OscX2 => self.oscx2.val(1).value,
            Source::OscX4 => self.oscx4.val(1).value,
            Source::Pll => self.pll.val(1).value,
        }
    }

    fn selects(&self) -> u32 {
        self.select(Source::Osc)
            | self.select(Source::OscX2)
            | self.select(Source::OscX4)
            | self.select(Source::Pll)
    }
}

// System clock: 208 MHz and 780 MHz cannot be produced.
const SYS_TABLE: [(FrequencyTier, Route); 10] = [
    (FrequencyTier::Khz32, Route::bypass(Source::Slow)),
    (FrequencyTier::Mhz6_5, Route::divided(Source::Osc, 4)),
    (FrequencyTier::Mhz13, Route::divided(Source::Osc, 2)),
    (FrequencyTier::Mhz26, Route::bypass(Source::Osc)),
    (FrequencyTier::Mhz52, Route::bypass(Source::OscX2)),
    (FrequencyTier::Mhz78, Route::divided(Source::Pll, 10)),
    (FrequencyTier::Mhz104, Route::bypass(Source::OscX4)),
    (FrequencyTier::Mhz156, Route::divided(Source::Pll, 5)),
    (FrequencyTier::Mhz260, Route::divided(Source::Pll, 3)),
    (FrequencyTier::Mhz390, Route::divided(Source::Pll, 2)),
];

const DSP_TABLE: [(FrequencyTier, Route); 7] = [
    (FrequencyTier::Mhz26, Route::bypass(Source::Osc)),
    (FrequencyTier::Mhz52, Route::bypass(Source::OscX2)),
    (FrequencyTier::Mhz104, Route::bypass(Source::OscX4)),
    (FrequencyTier::Mhz156, Route::divided(Source::Pll, 5)),
    (FrequencyTier::Mhz260, Route::divided(Source::Pll, 3)),
    (FrequencyTier::Mhz390, Route::divided(Source::Pll, 2)),
    (FrequencyTier::Mhz780, Route::bypass(Source::Pll)),
];

const MEM_TABLE: [(FrequencyTier, Route); 6] = [
    (FrequencyTier::Mhz26, Route::bypass(Source::Osc)),
    (FrequencyTier::Mhz52, Route::bypass(Source::OscX2)),
    (FrequencyTier::Mhz104, Route::bypass(Source::OscX4)),
    (FrequencyTier::Mhz156, Route::divided(Source::Pll, 5)),
    (FrequencyTier::Mhz260, Route::divided(Source::Pll, 3)),
    (FrequencyTier::Mhz390, Route::divided(Source::Pll, 2)),
];

const FLASH_TABLE: [(FrequencyTier, Route); 6] = [
    (FrequencyTier::Mhz13, Route::divided(Source::Osc, 2)),
    (FrequencyTier::Mhz26, Route::bypass(Source::Osc)),
    (FrequencyTier::Mhz52, Route::bypass(Source::OscX2)),
    (FrequencyTier::Mhz78, Route::divided(Source::Pll, 10)),
    (FrequencyTier::Mhz104, Route::bypass(Source::OscX4)),
    (FrequencyTier::Mhz156, Route::divided(Source::Pll, 5)),
];

/// Every source/divider combination with a known frequency.
const DECODE_TABLE: [(Source, Option<u8>, FrequencyTier); 18] = [
    (Source::Slow, None, FrequencyTier::Khz32),
    (Source::Osc, Some(4), FrequencyTier::Mhz6_5),
    (Source::Osc, Some(2), FrequencyTier::Mhz13),
    (Source::Osc, None, FrequencyTier::Mhz26),
    (Source::OscX2, Some(8), FrequencyTier::Mhz6_5),
    (Source::OscX2, Some(4), FrequencyTier::Mhz13),
    (Source::OscX2, Some(2), FrequencyTier::Mhz26),
    (Source::OscX2, None, FrequencyTier::Mhz52),
    (Source::OscX4, Some(8), FrequencyTier::Mhz13),
    (Source::OscX4, Some(4), FrequencyTier::Mhz26),
    (Source::OscX4, Some(2), FrequencyTier::Mhz52),
    (Source::OscX4, None, FrequencyTier::Mhz104),
    (Source::Pll, Some(15), FrequencyTier::Mhz52),
    (Source::Pll, Some(10), FrequencyTier::Mhz78),
    (Source::Pll, Some(5), FrequencyTier::Mhz156),
    (Source::Pll, Some(3), FrequencyTier::Mhz260),
    (Source::Pll, Some(2), FrequencyTier::Mhz390),
    (Source::Pll, None, FrequencyTier::Mhz780),
];

impl ClockTarget {
    fn lane(self) -> Lane {
        match self {
            ClockTarget::Sys => Lane {
                osc: SYS_CLK::SYS_OSC,
                oscx2: SYS_CLK::SYS_OSCX2,
                oscx4: SYS_CLK::SYS_OSCX4,
                pll: SYS_CLK::SYS_PLL,
                bypass: SYS_CLK::SYS_BYPASS,
                rstn: SYS_CLK::SYS_RSTN,
                div: CLK_DIV::SYS,
            },
            ClockTarget::Dsp => Lane {
                osc: SYS_CLK::DSP_OSC,
                oscx2: SYS_CLK::DSP_OSCX2,
                oscx4: SYS_CLK::DSP_OSCX4,
                pll: SYS_CLK::DSP_PLL,
                bypass: SYS_CLK::DSP_BYPASS,
                rstn: SYS_CLK::DSP_RSTN,
                div: CLK_DIV::DSP,
            },
            ClockTarget::Mem => Lane {
                osc: SYS_CLK::MEM_OSC,
                oscx2: SYS_CLK::MEM_OSCX2,
                oscx4: SYS_CLK::MEM_OSCX4,
                pll: SYS_CLK::MEM_PLL,
                bypass: SYS_CLK::MEM_BYPASS,
                rstn: SYS_CLK::MEM_RSTN,
                div: CLK_DIV::MEM,
            },
            ClockTarget::Flash => Lane {
                osc: SYS_CLK::FLASH_OSC,
                oscx2: SYS_CLK::FLASH_OSCX2,
                oscx4: SYS_CLK::FLASH_OSCX4,
                pll: SYS_CLK::FLASH_PLL,
                bypass: SYS_CLK::FLASH_BYPASS,
                rstn: SYS_CLK::FLASH_RSTN,
                div: CLK_DIV::FLASH,
            },
        }
    }

    fn table(self) -> &'static [(FrequencyTier, Route)] {
        match self {
            ClockTarget::Sys => &SYS_TABLE,
            ClockTarget::Dsp => &DSP_TABLE,
            ClockTarget::Mem => &MEM_TABLE,
            ClockTarget::Flash => &FLASH_TABLE,
        }
    }

    /// The PLL output feeding this clock, and the user it is held for.
    pub fn pll(self) -> (Pll, PllUser) {
        match self {
            ClockTarget::Sys => (Pll::Bb, PllUser::Sys),
            ClockTarget::Dsp => (Pll::Dsp, PllUser::Dsp),
            ClockTarget::Mem => (Pll::BbPsram, PllUser::Psram),
            ClockTarget::Flash => (Pll::Bb, PllUser::Flash),
        }
    }

    pub fn encode(self, tier: FrequencyTier) -> Option<Route> {
        self.table()
            .iter()
            .find(|(t, _)| *t == tier)
            .map(|(_, route)| *route)
    }
}

pub fn decode(route: Route) -> Option<FrequencyTier> {
    DECODE_TABLE
        .iter()
        .find(|(source, divider, _)| *source == route.source && *divider == route.divider)
        .map(|(_, _, tier)| *tier)
}

pub struct FrequencySelector<'a> {
    cmu: Cmu<'a>,
    pll: PllManager<'a>,
}

impl<'a> FrequencySelector<'a> {
    pub fn new(cmu: Cmu<'a>, pll: PllManager<'a>) -> FrequencySelector<'a> {
        FrequencySelector { cmu, pll }
    }

    pub fn set_system_frequency(&self, tier: FrequencyTier) -> Result<(), ErrorCode> {
        self.set_frequency(ClockTarget::Sys, tier)
    }

    pub fn set_dsp_frequency(&self, tier: FrequencyTier) -> Result<(), ErrorCode> {
        self.set_frequency(ClockTarget::Dsp, tier)
    }

    pub fn set_memory_frequency(&self, tier: FrequencyTier) -> Result<(), ErrorCode> {
        self.set_frequency(ClockTarget::Mem, tier)
    }

    pub fn set_flash_frequency(&self, tier: FrequencyTier) -> Result<(), ErrorCode> {
        self.set_frequency(ClockTarget::Flash, tier)
    }

    pub fn get_system_frequency(&self) -> Option<FrequencyTier> {
        self.get_frequency(ClockTarget::Sys)
    }

    pub fn get_dsp_frequency(&self) -> Option<FrequencyTier> {
        self.get_frequency(ClockTarget::Dsp)
    }

    pub fn get_memory_frequency(&self) -> Option<FrequencyTier> {
        self.get_frequency(ClockTarget::Mem)
    }

    pub fn get_flash_frequency(&self) -> Option<FrequencyTier> {
        self.get_frequency(ClockTarget::Flash)
    }

    /// Moves `target` to `tier`, holding its PLL while the PLL path is used.
    ///
    /// # Errors
    ///
    /// + [`ErrorCode::NOSUPPORT`]: `target` cannot run at `tier`. Nothing is
    ///   written.
    pub fn set_frequency(&self, target: ClockTarget, tier: FrequencyTier) -> Result<(), ErrorCode> {
        let route = target.encode(tier).ok_or(ErrorCode::NOSUPPORT)?;
        let current = self.route(target);
        let (pll, user) = target.pll();

        if route.source == Source::Pll && current.source != Source::Pll {
            self.pll.enable(pll, user);
        }
        self.switch(target, route);
        if current.source == Source::Pll && route.source != Source::Pll {
            self.pll.disable(pll, user);
        }

        debug!("{:?} clock at {:?}", target, tier);
        Ok(())
    }

    /// Decodes the live configuration of `target`. `None` if the hardware
    /// runs a combination without a known frequency.
    pub fn get_frequency(&self, target: ClockTarget) -> Option<FrequencyTier> {
        decode(self.route(target))
    }

    /// Reads back the live route of `target`.
    pub fn route(&self, target: ClockTarget) -> Route {
        let lane = target.lane();
        let bits = self.cmu.sys_clk_en().extract();

        let source = if bits.is_set(lane.pll) {
            Source::Pll
        } else if bits.is_set(lane.oscx4) {
            Source::OscX4
        } else if bits.is_set(lane.oscx2) {
            Source::OscX2
        } else if bits.is_set(lane.osc) {
            Source::Osc
        } else {
            Source::Slow
        };

        let divider = if bits.is_set(lane.bypass) || !bits.is_set(lane.rstn) {
            None
        } else {
            Some(self.cmu.clk_div().read(lane.div) as u8 + DIV_BIAS)
        };

        Route { source, divider }
    }

    /// Glitch-free switch of `target` to `route`. Does not touch PLL
    /// bookkeeping; the caller keeps the PLL running if `route` needs it.
    ///
    /// Source changes and path changes are separate steps, ordered so that
    /// the lane never runs faster than its start or end frequency (or the
    /// oscillator while parked).
    pub(crate) fn switch(&self, target: ClockTarget, route: Route) {
        let lane = target.lane();
        let en = self.cmu.sys_clk_en();
        let dis = self.cmu.sys_clk_dis();
        let div = self.cmu.clk_div();

        match route.divider {
            Some(divisor) => {
                let field = u32::from(divisor.saturating_sub(DIV_BIAS));
                if div.read(lane.div) != field {
                    if self.is_divided(&lane) {
                        self.switch(target, Route::OSC);
                    }
                    // On the undivided path now; the divider can be stopped.
                    if en.is_set(lane.rstn) {
                        dis.write(lane.rstn.val(1));
                    }
                    critical_section::with(|_| div.modify(lane.div.val(field)));
                }
                if !self.is_divided(&lane) {
                    en.write(lane.rstn.val(1));
                    dis.write(lane.bypass.val(1));
                }
                self.select(&lane, route.source);
            }
            None => {
                self.select(&lane, route.source);
                if !en.is_set(lane.bypass) {
                    en.write(lane.bypass.val(1));
                }
                if en.is_set(lane.rstn) {
                    dis.write(lane.rstn.val(1));
                }
            }
        }
    }

    fn is_divided(&self, lane: &Lane) -> bool {
        let bits = self.cmu.sys_clk_en().extract();
        bits.is_set(lane.rstn) && !bits.is_set(lane.bypass)
    }

    /// Moves the lane mux to `source`: new select on, then old selects off.
    fn select(&self, lane: &Lane, source: Source) {
        let en = self.cmu.sys_clk_en();
        let old = en.get() & lane.selects();
        let new = lane.select(source);
        if old == new {
            return;
        }
        if new != 0 {
            en.set(new);
        }
        if old & !new != 0 {
            self.cmu.sys_clk_dis().set(old & !new);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::cell::Cell;

    use critical_section::Mutex;
    use std::vec::Vec;

    use super::{decode, ClockTarget, FrequencySelector, FrequencyTier, Route, Source};
    use crate::bus::RegisterMap;
    use crate::errorcode::ErrorCode;
    use crate::pll::{Pll, PllManager, PllTopology, PLL_COUNT};
    use crate::registers::{CMU_CLK_DIV, CMU_SYS_CLK_DIS, CMU_SYS_CLK_EN};
    use crate::sim::{FakeTimebase, SimBus};
    use crate::unit::Cmu;

    const MAP: RegisterMap = RegisterMap::DEFAULT;
    const TARGETS: [ClockTarget; 4] = [
        ClockTarget::Sys,
        ClockTarget::Dsp,
        ClockTarget::Mem,
        ClockTarget::Flash,
    ];

    struct Fixture {
        bus: SimBus,
        time: FakeTimebase,
        users: Mutex<Cell<[u8; PLL_COUNT]>>,
    }

    impl Fixture {
        fn new() -> Fixture {
            Fixture {
                bus: SimBus::new(),
                time: FakeTimebase::new(),
                users: Mutex::new(Cell::new([0; PLL_COUNT])),
            }
        }

        fn selector(&self) -> FrequencySelector<'_> {
            let cmu = Cmu::new(&self.bus, &self.time, MAP);
            FrequencySelector::new(
                cmu,
                PllManager::new(cmu, &self.users, &PllTopology::DEFAULT),
            )
        }

        fn pll(&self) -> PllManager<'_> {
            let cmu = Cmu::new(&self.bus, &self.time, MAP);
            PllManager::new(cmu, &self.users, &PllTopology::DEFAULT)
        }
    }

    #[test]
    fn tables_round_trip() {
        for target in TARGETS {
            let f = Fixture::new();
            let sel = f.selector();
            for tier in FrequencyTier::ALL {
                let before = sel.get_frequency(target);
                match target.encode(tier) {
                    Some(route) => {
                        assert_eq!(decode(route), Some(tier), "{:?} {:?}", target, tier);
                        assert_eq!(sel.set_frequency(target, tier), Ok(()));
                        assert_eq!(sel.get_frequency(target), Some(tier), "{:?}", target);
                        assert_eq!(sel.route(target), route);
                    }
                    None => {
                        f.bus.clear_log();
                        assert_eq!(
                            sel.set_frequency(target, tier),
                            Err(ErrorCode::NOSUPPORT)
                        );
                        assert_eq!(sel.get_frequency(target), before);
                        assert!(f.bus.log().is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn system_subset() {
        let f = Fixture::new();
        let sel = f.selector();
        assert_eq!(
            sel.set_system_frequency(FrequencyTier::Mhz208),
            Err(ErrorCode::NOSUPPORT)
        );
        assert_eq!(
            sel.set_system_frequency(FrequencyTier::Mhz780),
            Err(ErrorCode::NOSUPPORT)
        );
        assert_eq!(
            sel.set_flash_frequency(FrequencyTier::Mhz390),
            Err(ErrorCode::NOSUPPORT)
        );
        assert_eq!(sel.set_dsp_frequency(FrequencyTier::Mhz780), Ok(()));
        assert_eq!(sel.get_dsp_frequency(), Some(FrequencyTier::Mhz780));
    }

    #[test]
    fn reset_state_decodes_to_oscillator() {
        let f = Fixture::new();
        let sel = f.selector();
        assert_eq!(sel.get_system_frequency(), Some(FrequencyTier::Mhz26));
        assert_eq!(sel.get_memory_frequency(), Some(FrequencyTier::Mhz26));
        assert_eq!(sel.get_flash_frequency(), Some(FrequencyTier::Mhz26));
    }

    #[test]
    fn unknown_combination_decodes_to_none() {
        assert_eq!(decode(Route::divided(Source::Pll, 4)), None);
        assert_eq!(decode(Route::divided(Source::Slow, 2)), None);
    }

    fn source_hz(source: Source) -> u64 {
        match source {
            Source::Slow => 32_768,
            Source::Osc => 26_000_000,
            Source::OscX2 => 52_000_000,
            Source::OscX4 => 104_000_000,
            Source::Pll => 780_000_000,
        }
    }

    /// Replays the lane strobes and divider writes of one transition and
    /// checks the switching rules after every write.
    fn check_transition(
        target: ClockTarget,
        log: &[(usize, u32)],
        start: u32,
        start_div: u32,
        limit_hz: u64,
    ) {
        let lane = target.lane();
        let selects = lane.selects();
        let bypass = lane.bypass.val(1).value;
        let rstn = lane.rstn.val(1).value;

        let mut state = start;
        let mut div = start_div;
        let mut last_enable: Option<u32> = None;
        for &(addr, value) in log {
            if addr == MAP.cmu + CMU_SYS_CLK_EN {
                state |= value;
                last_enable = Some(value);
            } else if addr == MAP.cmu + CMU_SYS_CLK_DIS {
                state &= !value;
                if value & selects != 0 {
                    // Whatever is still selected was asserted by the write
                    // right before this one.
                    let enabled = last_enable.unwrap_or(0);
                    assert_eq!(state & selects & !enabled, 0, "{:?}", target);
                }
                last_enable = None;
            } else if addr == MAP.cmu + CMU_CLK_DIV {
                div = value;
                continue;
            } else {
                continue;
            }

            assert!(
                state & bypass != 0 || state & rstn != 0,
                "{:?}: divided path selected with divider in reset",
                target
            );

            let source = [Source::Pll, Source::OscX4, Source::OscX2, Source::Osc]
                .into_iter()
                .find(|s| state & lane.select(*s) != 0)
                .unwrap_or(Source::Slow);
            let hz = if state & bypass != 0 {
                source_hz(source)
            } else {
                source_hz(source) / u64::from(lane.div.read(div) + 2)
            };
            assert!(hz <= limit_hz, "{:?} ran at {} Hz", target, hz);
        }
    }

    #[test]
    fn every_transition_is_glitch_free() {
        for target in TARGETS {
            for from in FrequencyTier::ALL {
                for to in FrequencyTier::ALL {
                    if target.encode(from).is_none() || target.encode(to).is_none() {
                        continue;
                    }
                    let f = Fixture::new();
                    let sel = f.selector();
                    sel.set_frequency(target, from).unwrap();

                    let start = f.bus.peek(MAP.cmu + CMU_SYS_CLK_EN);
                    let start_div = f.bus.peek(MAP.cmu + CMU_CLK_DIV);
                    let limit = u64::from(from.hz().max(to.hz()).max(26_000_000));
                    f.bus.clear_log();
                    sel.set_frequency(target, to).unwrap();
                    check_transition(target, &f.bus.log(), start, start_div, limit);
                    assert_eq!(sel.get_frequency(target), Some(to));
                }
            }
        }
    }

    #[test]
    fn retune_parks_on_oscillator() {
        let f = Fixture::new();
        let sel = f.selector();
        sel.set_system_frequency(FrequencyTier::Mhz390).unwrap();
        f.bus.clear_log();
        sel.set_system_frequency(FrequencyTier::Mhz260).unwrap();

        let en: Vec<u32> = f.bus.writes_to(MAP.cmu + CMU_SYS_CLK_EN);
        // Park on the oscillator, retune, then back onto the PLL.
        assert_eq!(en, [1 << 0, 1 << 4, 1 << 5, 1 << 3]);
        assert_eq!(sel.get_system_frequency(), Some(FrequencyTier::Mhz260));
    }

    #[test]
    fn pll_held_only_while_on_pll_path() {
        let f = Fixture::new();
        let sel = f.selector();
        let pll = f.pll();

        sel.set_system_frequency(FrequencyTier::Mhz156).unwrap();
        assert!(pll.is_enabled(Pll::Bb));
        assert_eq!(pll.users(Pll::Bb), 1 << 0);

        sel.set_flash_frequency(FrequencyTier::Mhz78).unwrap();
        assert_eq!(pll.users(Pll::Bb), (1 << 0) | (1 << 1));

        sel.set_system_frequency(FrequencyTier::Mhz390).unwrap();
        assert_eq!(pll.users(Pll::Bb), (1 << 0) | (1 << 1));

        sel.set_system_frequency(FrequencyTier::Mhz26).unwrap();
        assert_eq!(pll.users(Pll::Bb), 1 << 1);
        sel.set_flash_frequency(FrequencyTier::Mhz52).unwrap();
        assert_eq!(pll.users(Pll::Bb), 0);
        assert!(!pll.is_enabled(Pll::Bb));
    }

    #[test]
    fn pll_enabled_before_switching_onto_it() {
        let f = Fixture::new();
        let sel = f.selector();
        sel.set_memory_frequency(FrequencyTier::Mhz390).unwrap();

        let log = f.bus.log();
        let pll_on = log
            .iter()
            .position(|&(a, v)| a == MAP.aon + crate::registers::AON_PLL_EN && v == 1 << 20)
            .unwrap();
        let lane_on = log
            .iter()
            .position(|&(a, v)| a == MAP.cmu + CMU_SYS_CLK_EN && v & (1 << 19) != 0)
            .unwrap();
        assert!(pll_on < lane_on);
    }

    #[test]
    fn raw_tier_ids() {
        assert_eq!(FrequencyTier::try_from(3), Ok(FrequencyTier::Mhz26));
        assert_eq!(FrequencyTier::try_from(12), Err(ErrorCode::INVAL));
        assert!(FrequencyTier::Mhz6_5 < FrequencyTier::Mhz13);
        assert_eq!(FrequencyTier::Mhz390.hz(), 390_000_000);
    }
}
