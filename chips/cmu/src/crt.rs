// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Section initialization from linker-script symbols.
//!
//! The optional regions follow the `boot-core`, `psram`, `psram-hs` and
//! `secure` features, which must match the memory layout of the linker
//! script in use.

use core::ptr::{addr_of, addr_of_mut};

use soc_rt0::{BootLayout, Region};

extern "C" {
    // Symbols defined in the linker file
    static _etext: u32;
    static mut _srelocate: u32;
    static mut _erelocate: u32;
    static mut _szero: u32;
    static mut _ezero: u32;
    static _sifast: u32;
    static mut _sfast: u32;
    static mut _efast: u32;

    #[cfg(feature = "boot-core")]
    static _siboot: u32;
    #[cfg(feature = "boot-core")]
    static mut _sboot: u32;
    #[cfg(feature = "boot-core")]
    static mut _eboot: u32;

    #[cfg(feature = "psram")]
    static _sipsram: u32;
    #[cfg(feature = "psram")]
    static mut _spsram: u32;
    #[cfg(feature = "psram")]
    static mut _epsram: u32;

    #[cfg(feature = "psram-hs")]
    static _sipsram_hs: u32;
    #[cfg(feature = "psram-hs")]
    static mut _spsram_hs: u32;
    #[cfg(feature = "psram-hs")]
    static mut _epsram_hs: u32;

    #[cfg(feature = "secure")]
    static _sinsc: u32;
    #[cfg(feature = "secure")]
    static mut _snsc: u32;
    #[cfg(feature = "secure")]
    static mut _ensc: u32;
}

/// # Safety
///
/// Only the reset handler may call this, once, before any static is read.
pub unsafe fn layout() -> BootLayout {
    #[allow(unused_mut)]
    let mut layout = BootLayout {
        sram_data: Some(Region::copy(
            addr_of!(_etext),
            addr_of_mut!(_srelocate),
            addr_of_mut!(_erelocate),
        )),
        sram_bss: Some(Region::zero(addr_of_mut!(_szero), addr_of_mut!(_ezero))),
        sram_fast: Some(Region::copy(
            addr_of!(_sifast),
            addr_of_mut!(_sfast),
            addr_of_mut!(_efast),
        )),
        ..BootLayout::EMPTY
    };

    #[cfg(feature = "boot-core")]
    {
        layout.boot_core = Some(Region::copy(
            addr_of!(_siboot),
            addr_of_mut!(_sboot),
            addr_of_mut!(_eboot),
        ));
    }
    #[cfg(feature = "psram")]
    {
        layout.psram = Some(Region::copy(
            addr_of!(_sipsram),
            addr_of_mut!(_spsram),
            addr_of_mut!(_epsram),
        ));
    }
    #[cfg(feature = "psram-hs")]
    {
        layout.psram_hs = Some(Region::copy(
            addr_of!(_sipsram_hs),
            addr_of_mut!(_spsram_hs),
            addr_of_mut!(_epsram_hs),
        ));
    }
    #[cfg(feature = "secure")]
    {
        layout.secure = Some(Region::copy(
            addr_of!(_sinsc),
            addr_of_mut!(_snsc),
            addr_of_mut!(_ensc),
        ));
    }

    layout
}

/// Copies and zeroes every section the image carries.
///
/// # Safety
///
/// Only the reset handler may call this, once, before any static is read.
#[no_mangle]
pub unsafe extern "C" fn init() {
    layout().apply();
}
