// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Clock, power and reset management for the application SoC.
//!
//! Everything is reached through one [`ClockPowerManager`], which owns the
//! PLL reference counts and the low-power unit state and hands out drivers
//! for each concern:
//!
//! - [`ClockGate`]: module clock gating across the bus domains
//! - [`ResetController`]: module reset assert, release and pulse
//! - [`PllManager`]: reference-counted PLL power
//! - [`FrequencySelector`]: system, DSP, memory and flash clock frequency
//! - [`Dividers`]: peripheral clock dividers
//! - [`LowPowerUnit`]: sleep entry and wake-up
//! - [`Subsystems`]: DSP, Bluetooth and WLAN core start and stop
//!
//! Registers are reached through a [`RegisterBus`]; [`MmioBus`] is the
//! hardware implementation.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
mod fmt;

pub mod bus;
pub mod divider;
pub mod errorcode;
pub mod freq;
pub mod gate;
pub mod lpu;
pub mod manager;
pub mod module;
pub mod pll;
pub mod registers;
pub mod reset;
pub mod subsys;
pub mod time;
pub mod unit;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod crt;

#[cfg(test)]
mod sim;

pub use crate::bus::{MmioBus, RegisterBus, RegisterMap};
pub use crate::divider::{Dividers, PeripheralDivider};
pub use crate::errorcode::ErrorCode;
pub use crate::freq::{ClockTarget, FrequencySelector, FrequencyTier, Route, Source};
pub use crate::gate::{ClockGate, GateMode};
pub use crate::lpu::{LowPowerUnit, LpuConfig, LpuMode, LpuState, SleepMode};
pub use crate::manager::{ClockPowerManager, PowerConfig};
pub use crate::module::{
    AonModule, ApModule, Domain, HModule, ModuleId, OModule, PModule, QModule, XModule,
};
pub use crate::pll::{Pll, PllBlock, PllManager, PllTopology, PllUser};
pub use crate::reset::ResetController;
pub use crate::subsys::{Subsystem, Subsystems};
pub use crate::time::{Cpu, Timebase};

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use crate::crt::init;
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use crate::time::{CortexM, CortexMTimebase};
