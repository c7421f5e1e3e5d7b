// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Standard error enum for clock, power and reset operations

/// Errors returned by the CMU drivers.
///
/// Every error except [`ErrorCode::TIMEOUT`] is reported before any register
/// is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum ErrorCode {
    /// An invalid parameter was passed: an unknown module, PLL, user or tier
    /// index, or a divisor that does not fit its register field
    INVAL = 5,
    /// The requested frequency has no source/divider mapping for this clock
    NOSUPPORT = 9,
    /// A wake-up status bit never showed up; the operation still completed
    TIMEOUT = 13,
    /// A PLL sharing table combines logical PLLs the hardware cannot share
    TOPOLOGY = 14,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}
