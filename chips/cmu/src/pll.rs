// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Reference-counted PLL power management.
//!
//! Six logical PLLs are distributed from five physical PLL blocks. Each
//! logical PLL has a distribution enable bit of its own, while power and the
//! output divider reset belong to the physical block. Which logical PLL sits
//! on which block is described by a [`PllTopology`].
//!
//! Every logical PLL keeps a bitmap of the [`PllUser`]s that currently need
//! it. A PLL is physically started when its first user shows up and stopped
//! when its last user leaves, and a block is only powered down once none of
//! the logical PLLs sharing it have users left. The bitmaps are only touched
//! inside a critical section.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pll = manager.pll();
//! pll.enable(Pll::Bb, PllUser::Sys);
//! pll.enable(Pll::Bb, PllUser::Flash); // bookkeeping only
//! pll.disable(Pll::Bb, PllUser::Sys); // still running for Flash
//! pll.disable(Pll::Bb, PllUser::Flash); // powered down
//! ```

use core::cell::Cell;

use critical_section::Mutex;
use tock_registers::fields::Field;
use tock_registers::interfaces::{Readable, Writeable};

use crate::errorcode::ErrorCode;
use crate::registers::PLL_CTRL;
use crate::unit::Cmu;

pub const PLL_COUNT: usize = 6;

/// Time for a block to stabilize after power-on, with its divider in reset.
const PLL_POWER_SETTLE_US: u32 = 50;
/// Time for the output divider to settle after its reset is released.
const PLL_DIVIDER_SETTLE_US: u32 = 10;

/// Bitmap with every user set.
const USERS_ALL: u8 = (1 << PllUser::All as u8) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Pll {
    Usb = 0,
    Ddr = 1,
    Dsp = 2,
    Bb = 3,
    BbPsram = 4,
    Dsi = 5,
}

impl Pll {
    pub const ALL: [Pll; PLL_COUNT] = [
        Pll::Usb,
        Pll::Ddr,
        Pll::Dsp,
        Pll::Bb,
        Pll::BbPsram,
        Pll::Dsi,
    ];

    pub(crate) fn distribution(self) -> Field<u32, PLL_CTRL::Register> {
        match self {
            Pll::Usb => PLL_CTRL::EN_USB,
            Pll::Ddr => PLL_CTRL::EN_DDR,
            Pll::Dsp => PLL_CTRL::EN_DSP,
            Pll::Bb => PLL_CTRL::EN_BB,
            Pll::BbPsram => PLL_CTRL::EN_BB_PSRAM,
            Pll::Dsi => PLL_CTRL::EN_DSI,
        }
    }
}

impl TryFrom<u8> for Pll {
    type Error = ErrorCode;

    fn try_from(id: u8) -> Result<Pll, ErrorCode> {
        Pll::ALL.get(id as usize).copied().ok_or(ErrorCode::INVAL)
    }
}

/// Clients that hold a PLL running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PllUser {
    Sys = 0,
    Flash = 1,
    Psram = 2,
    Usb = 3,
    Dsp = 4,
    Dsi = 5,
    /// Every user at once: forces the PLL on, or forces it off and drops all
    /// bookkeeping.
    All = 6,
}

impl PllUser {
    pub fn mask(self) -> u8 {
        match self {
            PllUser::All => USERS_ALL,
            user => 1 << user as u8,
        }
    }
}

impl TryFrom<u8> for PllUser {
    type Error = ErrorCode;

    fn try_from(id: u8) -> Result<PllUser, ErrorCode> {
        match id {
            0 => Ok(PllUser::Sys),
            1 => Ok(PllUser::Flash),
            2 => Ok(PllUser::Psram),
            3 => Ok(PllUser::Usb),
            4 => Ok(PllUser::Dsp),
            5 => Ok(PllUser::Dsi),
            6 => Ok(PllUser::All),
            _ => Err(ErrorCode::INVAL),
        }
    }
}

/// A physical PLL block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllBlock {
    Usb,
    Ddr,
    Dsp,
    Bb,
    Dsi,
}

impl PllBlock {
    fn power(self) -> Field<u32, PLL_CTRL::Register> {
        match self {
            PllBlock::Usb => PLL_CTRL::PU_USB,
            PllBlock::Ddr => PLL_CTRL::PU_DDR,
            PllBlock::Dsp => PLL_CTRL::PU_DSP,
            PllBlock::Bb => PLL_CTRL::PU_BB,
            PllBlock::Dsi => PLL_CTRL::PU_DSI,
        }
    }

    fn divider_reset(self) -> Field<u32, PLL_CTRL::Register> {
        match self {
            PllBlock::Usb => PLL_CTRL::RSTN_USB,
            PllBlock::Ddr => PLL_CTRL::RSTN_DDR,
            PllBlock::Dsp => PLL_CTRL::RSTN_DSP,
            PllBlock::Bb => PLL_CTRL::RSTN_BB,
            PllBlock::Dsi => PLL_CTRL::RSTN_DSI,
        }
    }
}

/// Placements the hardware can actually wire up. A topology that puts a
/// logical PLL anywhere else is rejected.
const PLACEMENTS: [(Pll, PllBlock); 7] = [
    (Pll::Usb, PllBlock::Usb),
    (Pll::Ddr, PllBlock::Ddr),
    (Pll::Dsp, PllBlock::Dsp),
    (Pll::Bb, PllBlock::Bb),
    (Pll::BbPsram, PllBlock::Bb),
    (Pll::Dsi, PllBlock::Dsi),
    (Pll::Dsi, PllBlock::Usb),
];

/// Which physical block backs each logical PLL, indexed by [`Pll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PllTopology {
    blocks: [PllBlock; PLL_COUNT],
}

impl PllTopology {
    /// BB_PSRAM is a second output of the BB block; every other PLL owns its
    /// block.
    pub const DEFAULT: PllTopology = PllTopology::new([
        PllBlock::Usb,
        PllBlock::Ddr,
        PllBlock::Dsp,
        PllBlock::Bb,
        PllBlock::Bb,
        PllBlock::Dsi,
    ]);

    /// Parts without a DSI PLL derive the DSI clock from the USB block.
    pub const SHARED_USB_DSI: PllTopology = PllTopology::new([
        PllBlock::Usb,
        PllBlock::Ddr,
        PllBlock::Dsp,
        PllBlock::Bb,
        PllBlock::Bb,
        PllBlock::Usb,
    ]);

    pub const fn new(blocks: [PllBlock; PLL_COUNT]) -> PllTopology {
        PllTopology { blocks }
    }

    pub fn block(&self, pll: Pll) -> PllBlock {
        self.blocks[pll as usize]
    }

    /// Other logical PLLs on the same block as `pll`.
    pub fn sharers(&self, pll: Pll) -> impl Iterator<Item = Pll> + '_ {
        let block = self.block(pll);
        Pll::ALL
            .into_iter()
            .filter(move |&other| other != pll && self.block(other) == block)
    }

    pub fn validate(&self) -> Result<(), ErrorCode> {
        for pll in Pll::ALL {
            let placement = (pll, self.block(pll));
            if !PLACEMENTS.contains(&placement) {
                error!("pll {:?} cannot run from block {:?}", pll, placement.1);
                return Err(ErrorCode::TOPOLOGY);
            }
        }
        Ok(())
    }
}

impl Default for PllTopology {
    fn default() -> Self {
        PllTopology::DEFAULT
    }
}

/// Starts the block behind `pll` if it is not running yet, or always when
/// `force` is set, then enables the `pll` output.
pub(crate) fn power_up(cmu: &Cmu, topology: &PllTopology, pll: Pll, force: bool) {
    let block = topology.block(pll);
    let en = cmu.pll_en();
    let dis = cmu.pll_dis();

    if force || !en.is_set(block.power()) {
        debug!("pll block {:?} power up", block);
        dis.write(block.divider_reset().val(1));
        en.write(block.power().val(1));
        cmu.time().delay_us(PLL_POWER_SETTLE_US);
        en.write(block.divider_reset().val(1));
        cmu.time().delay_us(PLL_DIVIDER_SETTLE_US);
    }
    en.write(pll.distribution().val(1));
}

/// Disables the `pll` output, and powers its block down unless a sharer
/// still needs it.
pub(crate) fn power_down(cmu: &Cmu, topology: &PllTopology, pll: Pll, block_in_use: bool) {
    let block = topology.block(pll);
    let dis = cmu.pll_dis();

    dis.write(pll.distribution().val(1));
    if !block_in_use {
        debug!("pll block {:?} power down", block);
        dis.write(block.power().val(1) + block.divider_reset().val(1));
    }
}

pub struct PllManager<'a> {
    cmu: Cmu<'a>,
    users: &'a Mutex<Cell<[u8; PLL_COUNT]>>,
    topology: &'a PllTopology,
}

impl<'a> PllManager<'a> {
    pub fn new(
        cmu: Cmu<'a>,
        users: &'a Mutex<Cell<[u8; PLL_COUNT]>>,
        topology: &'a PllTopology,
    ) -> PllManager<'a> {
        PllManager {
            cmu,
            users,
            topology,
        }
    }

    /// Registers `user` on `pll`, starting it if it had no users.
    ///
    /// Enabling with [`PllUser::All`] always runs the start sequence.
    /// Enabling a user that already holds the PLL only updates bookkeeping.
    pub fn enable(&self, pll: Pll, user: PllUser) {
        critical_section::with(|cs| {
            let cell = self.users.borrow(cs);
            let mut users = cell.get();
            let idx = pll as usize;

            if users[idx] == 0 || user == PllUser::All {
                power_up(&self.cmu, self.topology, pll, user == PllUser::All);
            }
            users[idx] |= user.mask();
            cell.set(users);
        });
    }

    /// Releases `user` from `pll`, stopping it once no users are left.
    ///
    /// Releasing [`PllUser::All`] clears every user and always stops the PLL.
    /// Releasing a user that does not hold the PLL does nothing.
    pub fn disable(&self, pll: Pll, user: PllUser) {
        critical_section::with(|cs| {
            let cell = self.users.borrow(cs);
            let mut users = cell.get();
            let idx = pll as usize;

            if user != PllUser::All && users[idx] & user.mask() == 0 {
                return;
            }
            users[idx] &= !user.mask();
            if users[idx] == 0 {
                let block_in_use = self
                    .topology
                    .sharers(pll)
                    .any(|other| users[other as usize] != 0);
                power_down(&self.cmu, self.topology, pll, block_in_use);
            }
            cell.set(users);
        });
    }

    /// Live distribution status. Can briefly disagree with [`Self::users`]
    /// while another context is in the middle of a transition.
    pub fn is_enabled(&self, pll: Pll) -> bool {
        self.cmu.pll_en().is_set(pll.distribution())
    }

    pub fn users(&self, pll: Pll) -> u8 {
        critical_section::with(|cs| self.users.borrow(cs).get()[pll as usize])
    }

    pub fn is_in_use(&self, pll: Pll) -> bool {
        self.users(pll) != 0
    }

    pub fn topology(&self) -> &PllTopology {
        self.topology
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use critical_section::Mutex;
    use tock_registers::interfaces::Readable;

    use super::{Pll, PllBlock, PllManager, PllTopology, PllUser, PLL_COUNT};
    use crate::bus::RegisterMap;
    use crate::errorcode::ErrorCode;
    use crate::registers::{AON_PLL_DIS, AON_PLL_EN};
    use crate::sim::{FakeTimebase, SimBus};
    use crate::unit::Cmu;

    const MAP: RegisterMap = RegisterMap::DEFAULT;

    fn users() -> Mutex<Cell<[u8; PLL_COUNT]>> {
        Mutex::new(Cell::new([0; PLL_COUNT]))
    }

    /// Bookkeeping and hardware agree for every PLL.
    fn check_consistent(bus: &SimBus, mgr: &PllManager) {
        let time = FakeTimebase::new();
        let cmu = Cmu::new(bus, &time, MAP);
        let topology = mgr.topology();
        for pll in Pll::ALL {
            let block = topology.block(pll);
            let block_needed = mgr.is_in_use(pll)
                || topology.sharers(pll).any(|other| mgr.is_in_use(other));
            assert_eq!(mgr.is_enabled(pll), mgr.is_in_use(pll), "{:?}", pll);
            assert_eq!(
                cmu.pll_en().is_set(block.power()),
                block_needed,
                "{:?}",
                block
            );
        }
    }

    #[test]
    fn shared_users_scenario() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Bb, PllUser::Sys);
        assert_eq!(mgr.users(Pll::Bb), 1 << 0);
        assert!(mgr.is_enabled(Pll::Bb));
        check_consistent(&bus, &mgr);

        bus.clear_log();
        mgr.enable(Pll::Bb, PllUser::Flash);
        assert_eq!(mgr.users(Pll::Bb), (1 << 0) | (1 << 1));
        assert!(bus.log().is_empty());
        check_consistent(&bus, &mgr);

        mgr.disable(Pll::Bb, PllUser::Sys);
        assert_eq!(mgr.users(Pll::Bb), 1 << 1);
        assert!(mgr.is_enabled(Pll::Bb));
        assert!(bus.log().is_empty());
        check_consistent(&bus, &mgr);

        mgr.disable(Pll::Bb, PllUser::Flash);
        assert_eq!(mgr.users(Pll::Bb), 0);
        let en = bus.peek(MAP.aon + AON_PLL_EN);
        assert_eq!(en & (1 << 19), 0, "distribution still on");
        assert_eq!(en & (1 << 3), 0, "block still powered");
        check_consistent(&bus, &mgr);
    }

    #[test]
    fn power_up_sequence_order() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Dsp, PllUser::Dsp);
        assert_eq!(
            bus.log(),
            [
                (MAP.aon + AON_PLL_DIS, 1 << 10),
                (MAP.aon + AON_PLL_EN, 1 << 2),
                (MAP.aon + AON_PLL_EN, 1 << 10),
                (MAP.aon + AON_PLL_EN, 1 << 18),
            ]
        );
        assert_eq!(time.micros.get(), 60);

        bus.clear_log();
        mgr.disable(Pll::Dsp, PllUser::Dsp);
        assert_eq!(
            bus.log(),
            [
                (MAP.aon + AON_PLL_DIS, 1 << 18),
                (MAP.aon + AON_PLL_DIS, (1 << 2) | (1 << 10)),
            ]
        );
    }

    #[test]
    fn repeated_enable_is_bookkeeping_only() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Usb, PllUser::Usb);
        let before = bus.peek(MAP.aon + AON_PLL_EN);
        bus.clear_log();
        mgr.enable(Pll::Usb, PllUser::Usb);
        mgr.enable(Pll::Usb, PllUser::Usb);
        assert!(bus.log().is_empty());
        assert_eq!(bus.peek(MAP.aon + AON_PLL_EN), before);
        assert_eq!(mgr.users(Pll::Usb), 1 << 3);
    }

    #[test]
    fn releasing_absent_user_is_noop() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.disable(Pll::Ddr, PllUser::Psram);
        assert!(bus.log().is_empty());
        assert_eq!(mgr.users(Pll::Ddr), 0);

        mgr.enable(Pll::Ddr, PllUser::Psram);
        bus.clear_log();
        mgr.disable(Pll::Ddr, PllUser::Sys);
        assert!(bus.log().is_empty());
        assert!(mgr.is_enabled(Pll::Ddr));
        check_consistent(&bus, &mgr);
    }

    #[test]
    fn reference_counting() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Dsi, PllUser::Dsi);
        mgr.enable(Pll::Dsi, PllUser::Sys);
        mgr.disable(Pll::Dsi, PllUser::Dsi);
        assert!(mgr.is_enabled(Pll::Dsi));
        check_consistent(&bus, &mgr);
        mgr.disable(Pll::Dsi, PllUser::Sys);
        assert!(!mgr.is_enabled(Pll::Dsi));
        check_consistent(&bus, &mgr);
    }

    #[test]
    fn all_user_forces_state() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Ddr, PllUser::All);
        assert_eq!(mgr.users(Pll::Ddr), 0x3f);
        mgr.disable(Pll::Ddr, PllUser::Flash);
        assert!(mgr.is_enabled(Pll::Ddr));
        check_consistent(&bus, &mgr);

        mgr.enable(Pll::Ddr, PllUser::Sys);
        mgr.disable(Pll::Ddr, PllUser::All);
        assert_eq!(mgr.users(Pll::Ddr), 0);
        assert!(!mgr.is_enabled(Pll::Ddr));
        check_consistent(&bus, &mgr);
    }

    #[test]
    fn all_user_restarts_running_pll() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Usb, PllUser::Usb);
        bus.clear_log();
        time.micros.set(0);
        mgr.enable(Pll::Usb, PllUser::All);
        assert_eq!(
            bus.log(),
            [
                (MAP.aon + AON_PLL_DIS, 1 << 8),
                (MAP.aon + AON_PLL_EN, 1 << 0),
                (MAP.aon + AON_PLL_EN, 1 << 8),
                (MAP.aon + AON_PLL_EN, 1 << 16),
            ]
        );
        assert_eq!(time.micros.get(), 60);
        assert_eq!(mgr.users(Pll::Usb), PllUser::Usb.mask() | PllUser::All.mask());
        check_consistent(&bus, &mgr);
    }

    #[test]
    fn shared_block_stays_powered_for_sharer() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(Cmu::new(&bus, &time, MAP), &users, &PllTopology::DEFAULT);

        mgr.enable(Pll::Bb, PllUser::Sys);
        mgr.enable(Pll::BbPsram, PllUser::Psram);
        mgr.disable(Pll::BbPsram, PllUser::Psram);
        assert!(!mgr.is_enabled(Pll::BbPsram));
        assert!(mgr.is_enabled(Pll::Bb));
        check_consistent(&bus, &mgr);

        mgr.disable(Pll::Bb, PllUser::Sys);
        assert_eq!(bus.peek(MAP.aon + AON_PLL_EN), 0);
    }

    #[test]
    fn second_sharer_does_not_reset_running_block() {
        let bus = SimBus::new();
        let time = FakeTimebase::new();
        let users = users();
        let mgr = PllManager::new(
            Cmu::new(&bus, &time, MAP),
            &users,
            &PllTopology::SHARED_USB_DSI,
        );

        mgr.enable(Pll::Usb, PllUser::Usb);
        bus.clear_log();
        mgr.enable(Pll::Dsi, PllUser::Dsi);
        assert_eq!(bus.log(), [(MAP.aon + AON_PLL_EN, 1 << 21)]);

        mgr.disable(Pll::Usb, PllUser::Usb);
        assert!(mgr.is_enabled(Pll::Dsi));
        check_consistent(&bus, &mgr);
    }

    #[test]
    fn raw_ids_are_validated() {
        assert_eq!(Pll::try_from(4), Ok(Pll::BbPsram));
        assert_eq!(Pll::try_from(6), Err(ErrorCode::INVAL));
        assert_eq!(PllUser::try_from(6), Ok(PllUser::All));
        assert_eq!(PllUser::try_from(7), Err(ErrorCode::INVAL));
    }

    #[test]
    fn topology_validation() {
        assert_eq!(PllTopology::DEFAULT.validate(), Ok(()));
        assert_eq!(PllTopology::SHARED_USB_DSI.validate(), Ok(()));

        let ddr_on_dsp = PllTopology::new([
            PllBlock::Usb,
            PllBlock::Dsp,
            PllBlock::Dsp,
            PllBlock::Bb,
            PllBlock::Bb,
            PllBlock::Dsi,
        ]);
        assert_eq!(ddr_on_dsp.validate(), Err(ErrorCode::TOPOLOGY));

        let psram_alone = PllTopology::new([
            PllBlock::Usb,
            PllBlock::Ddr,
            PllBlock::Dsp,
            PllBlock::Bb,
            PllBlock::Dsi,
            PllBlock::Dsi,
        ]);
        assert_eq!(psram_alone.validate(), Err(ErrorCode::TOPOLOGY));
    }
}
