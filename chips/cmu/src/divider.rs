// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Peripheral clock dividers.
//!
//! Each divider is a field in PERIPH_DIV0 or PERIPH_DIV1 that stores the
//! divisor minus a fixed bias. Fields of different peripherals share a
//! register, so every update is a read-modify-write under a critical
//! section.

use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable};
use tock_registers::RegisterLongName;

use crate::bus::BusRegister;
use crate::errorcode::ErrorCode;
use crate::registers::{PERIPH_DIV0, PERIPH_DIV1};
use crate::unit::Cmu;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralDivider {
    Timer,
    Uart,
    Spi,
    Sdmmc,
    I2s,
    Pcm,
    Spdif,
    Flash,
}

impl PeripheralDivider {
    /// Stored field value is divisor - `bias()`.
    pub fn bias(self) -> u32 {
        match self {
            PeripheralDivider::Flash => 2,
            _ => 1,
        }
    }

    /// Largest divisor the field can hold.
    pub fn max_divisor(self) -> u32 {
        let mask = match self {
            PeripheralDivider::Timer => PERIPH_DIV0::TIMER.mask,
            PeripheralDivider::Uart => PERIPH_DIV0::UART.mask,
            PeripheralDivider::Spi => PERIPH_DIV0::SPI.mask,
            PeripheralDivider::Sdmmc => PERIPH_DIV0::SDMMC.mask,
            PeripheralDivider::I2s => PERIPH_DIV1::I2S.mask,
            PeripheralDivider::Pcm => PERIPH_DIV1::PCM.mask,
            PeripheralDivider::Spdif => PERIPH_DIV1::SPDIF.mask,
            PeripheralDivider::Flash => PERIPH_DIV1::FLASH.mask,
        };
        mask + self.bias()
    }
}

pub struct Dividers<'a> {
    cmu: Cmu<'a>,
}

impl<'a> Dividers<'a> {
    pub fn new(cmu: Cmu<'a>) -> Dividers<'a> {
        Dividers { cmu }
    }

    /// Programs `divider` to divide its source clock by `divisor`.
    ///
    /// # Errors
    ///
    /// + [`ErrorCode::INVAL`]: `divisor` does not fit the field. Nothing is
    ///   written.
    pub fn set_divider(&self, divider: PeripheralDivider, divisor: u32) -> Result<(), ErrorCode> {
        let bias = divider.bias();
        if divisor < bias || divisor > divider.max_divisor() {
            return Err(ErrorCode::INVAL);
        }
        let stored = divisor - bias;

        match divider {
            PeripheralDivider::Timer => store(self.cmu.periph_div0(), PERIPH_DIV0::TIMER, stored),
            PeripheralDivider::Uart => store(self.cmu.periph_div0(), PERIPH_DIV0::UART, stored),
            PeripheralDivider::Spi => store(self.cmu.periph_div0(), PERIPH_DIV0::SPI, stored),
            PeripheralDivider::Sdmmc => store(self.cmu.periph_div0(), PERIPH_DIV0::SDMMC, stored),
            PeripheralDivider::I2s => store(self.cmu.periph_div1(), PERIPH_DIV1::I2S, stored),
            PeripheralDivider::Pcm => store(self.cmu.periph_div1(), PERIPH_DIV1::PCM, stored),
            PeripheralDivider::Spdif => store(self.cmu.periph_div1(), PERIPH_DIV1::SPDIF, stored),
            PeripheralDivider::Flash => store(self.cmu.periph_div1(), PERIPH_DIV1::FLASH, stored),
        }
        Ok(())
    }

    /// The divisor `divider` currently applies.
    pub fn get_divider(&self, divider: PeripheralDivider) -> u32 {
        let stored = match divider {
            PeripheralDivider::Timer => self.cmu.periph_div0().read(PERIPH_DIV0::TIMER),
            PeripheralDivider::Uart => self.cmu.periph_div0().read(PERIPH_DIV0::UART),
            PeripheralDivider::Spi => self.cmu.periph_div0().read(PERIPH_DIV0::SPI),
            PeripheralDivider::Sdmmc => self.cmu.periph_div0().read(PERIPH_DIV0::SDMMC),
            PeripheralDivider::I2s => self.cmu.periph_div1().read(PERIPH_DIV1::I2S),
            PeripheralDivider::Pcm => self.cmu.periph_div1().read(PERIPH_DIV1::PCM),
            PeripheralDivider::Spdif => self.cmu.periph_div1().read(PERIPH_DIV1::SPDIF),
            PeripheralDivider::Flash => self.cmu.periph_div1().read(PERIPH_DIV1::FLASH),
        };
        stored + divider.bias()
    }
}

fn store<R: RegisterLongName>(reg: BusRegister<'_, R>, field: Field<u32, R>, value: u32) {
    critical_section::with(|_| reg.modify(field.val(value)));
}
