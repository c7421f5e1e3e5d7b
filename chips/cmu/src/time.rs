// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Timing and CPU capabilities used by the clock sequences.

/// Free-running tick source and busy-wait delays.
///
/// `ticks()` counts in the same unit as the LPU ready and lock timeouts
/// (the 32 kHz always-on clock on hardware) and wraps at `u32::MAX`.
pub trait Timebase {
    fn ticks(&self) -> u32;

    /// Spin for at least `cycles` CPU cycles.
    fn delay_cycles(&self, cycles: u32);

    /// Spin for at least `us` microseconds at the current system clock.
    fn delay_us(&self, us: u32);
}

/// The processor operations the low-power sequence needs.
pub trait Cpu {
    /// Stall until an interrupt is pending.
    fn wait_for_interrupt(&self);
}

/// Cortex-M core.
///
/// The system clock rate is only used to turn microsecond delays into cycle
/// counts for `cortex_m::asm::delay`; boards update it after a frequency
/// switch.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub struct CortexM {
    sys_hz: core::cell::Cell<u32>,
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl CortexM {
    pub const fn new(sys_hz: u32) -> CortexM {
        CortexM {
            sys_hz: core::cell::Cell::new(sys_hz),
        }
    }

    pub fn set_sys_hz(&self, sys_hz: u32) {
        self.sys_hz.set(sys_hz);
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl Cpu for CortexM {
    fn wait_for_interrupt(&self) {
        cortex_m::asm::dsb();
        cortex_m::asm::wfi();
    }
}

/// Busy-wait delays on the Cortex-M core, with ticks read from an
/// always-on counter register.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub struct CortexMTimebase<'a> {
    pub core: &'a CortexM,
    pub bus: &'a dyn crate::bus::RegisterBus,
    pub counter_addr: usize,
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl Timebase for CortexMTimebase<'_> {
    fn ticks(&self) -> u32 {
        self.bus.read(self.counter_addr)
    }

    fn delay_cycles(&self, cycles: u32) {
        cortex_m::asm::delay(cycles);
    }

    fn delay_us(&self, us: u32) {
        let per_us = self.core.sys_hz.get() / 1_000_000;
        cortex_m::asm::delay(per_us.max(1).saturating_mul(us));
    }
}
