// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Boot-time section loader (`rt0`) helpers.
//!
//! These run before `.data` and `.bss` are valid, so nothing in here may touch
//! a static, and the copy loops use volatile word accesses so that the
//! compiler cannot turn them into calls to `memcpy`/`memset`, which may not
//! be resident in RAM yet.
//!
//! A [`BootLayout`] collects the regions a given build places outside of
//! flash. Every region is optional; [`BootLayout::apply`] visits them in a
//! fixed order:
//!
//! 1. boot-core section
//! 2. primary SRAM data
//! 3. primary SRAM bss (zero-fill)
//! 4. fast-access SRAM sub-region (copied after bss is cleared)
//! 5. PSRAM
//! 6. high-speed PSRAM
//! 7. secure / non-secure-callable region

#![no_std]

/// Copies words from `src` into `[dst, dst_end)`, lowest address first.
///
/// Nothing happens when the destination range is empty or when `src` already
/// is `dst` (execute-in-place images link their data at the load address).
///
/// # Safety
///
/// `src` must be readable for the length of the destination range, the
/// destination range must be writable, and both must be word aligned.
#[inline(never)]
pub unsafe fn copy_region(mut src: *const u32, mut dst: *mut u32, dst_end: *mut u32) {
    if core::ptr::eq(src, dst) {
        return;
    }
    while dst < dst_end {
        dst.write_volatile(src.read_volatile());
        dst = dst.offset(1);
        src = src.offset(1);
    }
}

/// Sets every word in `[start, end)` to zero, lowest address first.
///
/// # Safety
///
/// The range must be writable and word aligned.
#[inline(never)]
pub unsafe fn zero_region(mut start: *mut u32, end: *mut u32) {
    while start < end {
        // `volatile` to make sure it doesn't get optimized out
        start.write_volatile(0);
        start = start.offset(1);
    }
}

/// How a region is brought up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// Copy the image stored at `load` into the run range.
    Copy { load: *const u32 },
    /// Fill the run range with zeros.
    Zero,
}

/// One linker-described image: where it runs and how it gets there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: *mut u32,
    pub end: *mut u32,
}

impl Region {
    pub const fn copy(load: *const u32, start: *mut u32, end: *mut u32) -> Region {
        Region {
            kind: RegionKind::Copy { load },
            start,
            end,
        }
    }

    pub const fn zero(start: *mut u32, end: *mut u32) -> Region {
        Region {
            kind: RegionKind::Zero,
            start,
            end,
        }
    }

    /// Number of words in the run range.
    pub fn words(&self) -> usize {
        (self.end as usize).saturating_sub(self.start as usize) / core::mem::size_of::<u32>()
    }

    /// # Safety
    ///
    /// See [`copy_region`] and [`zero_region`].
    pub unsafe fn load(&self) {
        match self.kind {
            RegionKind::Copy { load } => copy_region(load, self.start, self.end),
            RegionKind::Zero => zero_region(self.start, self.end),
        }
    }
}

/// The set of regions one build needs initialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootLayout {
    pub boot_core: Option<Region>,
    pub sram_data: Option<Region>,
    pub sram_bss: Option<Region>,
    pub sram_fast: Option<Region>,
    pub psram: Option<Region>,
    pub psram_hs: Option<Region>,
    pub secure: Option<Region>,
}

impl BootLayout {
    pub const EMPTY: BootLayout = BootLayout {
        boot_core: None,
        sram_data: None,
        sram_bss: None,
        sram_fast: None,
        psram: None,
        psram_hs: None,
        secure: None,
    };

    fn ordered(&self) -> [Option<Region>; 7] {
        [
            self.boot_core,
            self.sram_data,
            self.sram_bss,
            self.sram_fast,
            self.psram,
            self.psram_hs,
            self.secure,
        ]
    }

    /// Initializes every present region in boot order.
    ///
    /// # Safety
    ///
    /// Must run once, before anything reads a static, with every region
    /// describing valid memory.
    pub unsafe fn apply(&self) {
        for region in self.ordered().iter().flatten() {
            region.load();
        }
    }
}
