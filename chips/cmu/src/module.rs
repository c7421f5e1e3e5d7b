// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Gated modules, partitioned by the bus domain that clocks them.

use crate::bus::RegisterMap;
use crate::errorcode::ErrorCode;
use crate::registers::{
    AON_DOMAIN, CMU_AP_DOMAIN, CMU_H_DOMAIN, CMU_O_DOMAIN, CMU_P_DOMAIN, CMU_Q_DOMAIN,
    CMU_X_DOMAIN,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Domain {
    /// AHB high-speed
    H,
    /// APB peripheral
    P,
    /// Audio
    O,
    /// Memory
    Q,
    /// Media
    X,
    /// Application processor
    Ap,
    /// Always-on
    Aon,
}

impl Domain {
    /// Base address of the domain's gate/reset register block.
    pub fn block(self, map: &RegisterMap) -> usize {
        match self {
            Domain::H => map.cmu + CMU_H_DOMAIN,
            Domain::P => map.cmu + CMU_P_DOMAIN,
            Domain::O => map.cmu + CMU_O_DOMAIN,
            Domain::Q => map.cmu + CMU_Q_DOMAIN,
            Domain::X => map.cmu + CMU_X_DOMAIN,
            Domain::Ap => map.cmu + CMU_AP_DOMAIN,
            Domain::Aon => map.aon + AON_DOMAIN,
        }
    }

    /// Writes to the always-on domain cross into a slow clock and must be
    /// read back before they are guaranteed to have landed.
    pub fn is_slow(self) -> bool {
        self == Domain::Aon
    }
}

macro_rules! domain_modules {
    ($(#[$attr:meta])* $name:ident { $($(#[$vattr:meta])* $variant:ident = $bit:literal),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vattr])* $variant = $bit),+
        }

        impl TryFrom<u8> for $name {
            type Error = ErrorCode;

            fn try_from(bit: u8) -> Result<Self, ErrorCode> {
                match bit {
                    $($bit => Ok($name::$variant),)+
                    _ => Err(ErrorCode::INVAL),
                }
            }
        }
    };
}

domain_modules!(
    /// High-speed bus clients
    HModule {
        /// AHB to APB bridge. Gating it would cut the CPU off from the CMU
        /// itself.
        Bridge = 0,
        Dma = 1,
        Sdmmc = 2,
        Usb = 3,
        Psram = 4,
        Flash = 5,
        Crypto = 6,
        Display = 7,
    }
);

domain_modules!(PModule {
    Uart0 = 0,
    Uart1 = 1,
    Uart2 = 2,
    Spi0 = 3,
    Spi1 = 4,
    I2c0 = 5,
    I2c1 = 6,
    Timer0 = 7,
    Timer1 = 8,
    Pwm = 9,
    Gpio = 10,
    Wdt = 11,
});

domain_modules!(OModule {
    I2s0 = 0,
    I2s1 = 1,
    Pcm = 2,
    Spdif = 3,
    Codec = 4,
});

domain_modules!(QModule {
    Ddr = 0,
    MemCtrl = 1,
    SramFast = 2,
});

domain_modules!(XModule {
    Camera = 0,
    Dsi = 1,
    Gpu = 2,
});

domain_modules!(ApModule {
    Dsp = 0,
    Mailbox = 1,
    Trace = 2,
});

domain_modules!(AonModule {
    Rtc = 0,
    PowerCtl = 1,
    WakeupTimer = 2,
    Iomux = 3,
});

/// A clock-gated, resettable module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModuleId {
    H(HModule),
    P(PModule),
    O(OModule),
    Q(QModule),
    X(XModule),
    Ap(ApModule),
    Aon(AonModule),
}

impl ModuleId {
    /// The module whose clock must never be gated.
    pub const PROTECTED: ModuleId = ModuleId::H(HModule::Bridge);

    /// Builds a module id from a domain and a bit index.
    pub fn from_raw(domain: Domain, bit: u8) -> Result<ModuleId, ErrorCode> {
        Ok(match domain {
            Domain::H => ModuleId::H(HModule::try_from(bit)?),
            Domain::P => ModuleId::P(PModule::try_from(bit)?),
            Domain::O => ModuleId::O(OModule::try_from(bit)?),
            Domain::Q => ModuleId::Q(QModule::try_from(bit)?),
            Domain::X => ModuleId::X(XModule::try_from(bit)?),
            Domain::Ap => ModuleId::Ap(ApModule::try_from(bit)?),
            Domain::Aon => ModuleId::Aon(AonModule::try_from(bit)?),
        })
    }

    pub fn domain(self) -> Domain {
        match self {
            ModuleId::H(_) => Domain::H,
            ModuleId::P(_) => Domain::P,
            ModuleId::O(_) => Domain::O,
            ModuleId::Q(_) => Domain::Q,
            ModuleId::X(_) => Domain::X,
            ModuleId::Ap(_) => Domain::Ap,
            ModuleId::Aon(_) => Domain::Aon,
        }
    }

    pub fn bit(self) -> usize {
        (match self {
            ModuleId::H(m) => m as u8,
            ModuleId::P(m) => m as u8,
            ModuleId::O(m) => m as u8,
            ModuleId::Q(m) => m as u8,
            ModuleId::X(m) => m as u8,
            ModuleId::Ap(m) => m as u8,
            ModuleId::Aon(m) => m as u8,
        }) as usize
    }

    pub fn mask(self) -> u32 {
        1 << self.bit()
    }

    pub fn is_protected(self) -> bool {
        self == ModuleId::PROTECTED
    }
}
