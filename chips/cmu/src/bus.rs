// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Register bus glue.
//!
//! The drivers in this crate never dereference a register address directly.
//! Every access goes through a [`RegisterBus`], which is a volatile MMIO
//! window on hardware ([`MmioBus`]) and a recording model under test. On top
//! of the bus, [`BusRegister`] implements the `tock-registers` accessor
//! traits so that bitfields declared with `register_bitfields!` work the same
//! way they do on a memory-mapped register struct.

use core::marker::PhantomData;

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::RegisterLongName;

/// Addressable 32-bit register space.
pub trait RegisterBus {
    fn read(&self, addr: usize) -> u32;
    fn write(&self, addr: usize, value: u32);
}

/// Volatile memory-mapped register access.
pub struct MmioBus(());

impl MmioBus {
    /// # Safety
    ///
    /// Every address later passed to the bus must be a valid, aligned device
    /// register. Only one `MmioBus` should drive a given register block.
    pub const unsafe fn new() -> MmioBus {
        MmioBus(())
    }
}

impl RegisterBus for MmioBus {
    #[inline]
    fn read(&self, addr: usize) -> u32 {
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline]
    fn write(&self, addr: usize, value: u32) {
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

/// One register on a bus, typed by its bitfield layout.
pub struct BusRegister<'a, R: RegisterLongName = ()> {
    bus: &'a dyn RegisterBus,
    addr: usize,
    associated_register: PhantomData<R>,
}

impl<'a, R: RegisterLongName> BusRegister<'a, R> {
    pub const fn new(bus: &'a dyn RegisterBus, addr: usize) -> Self {
        BusRegister {
            bus,
            addr,
            associated_register: PhantomData,
        }
    }

    pub fn addr(&self) -> usize {
        self.addr
    }
}

impl<R: RegisterLongName> Readable for BusRegister<'_, R> {
    type T = u32;
    type R = R;

    #[inline]
    fn get(&self) -> u32 {
        self.bus.read(self.addr)
    }
}

impl<R: RegisterLongName> Writeable for BusRegister<'_, R> {
    type T = u32;
    type R = R;

    #[inline]
    fn set(&self, value: u32) {
        self.bus.write(self.addr, value);
    }
}

/// Base addresses of every register group this crate drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterMap {
    /// Core clock management unit
    pub cmu: usize,
    /// Always-on clock management unit
    pub aon: usize,
    /// Bluetooth subsystem clock unit
    pub bt_cmu: usize,
    /// WLAN subsystem clock unit
    pub wlan_cmu: usize,
    /// NVIC interrupt set-enable bank (ISER0, ISER1)
    pub nvic_iser: usize,
    /// Cortex-M system control register
    pub scb_scr: usize,
}

impl RegisterMap {
    pub const DEFAULT: RegisterMap = RegisterMap {
        cmu: 0x4000_0000,
        aon: 0x4008_0000,
        bt_cmu: 0x4010_0000,
        wlan_cmu: 0x4018_0000,
        nvic_iser: 0xE000_E100,
        scb_scr: 0xE000_ED10,
    };
}

impl Default for RegisterMap {
    fn default() -> Self {
        RegisterMap::DEFAULT
    }
}
