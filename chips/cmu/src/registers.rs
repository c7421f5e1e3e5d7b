// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Register offsets and bitfields of the clock management units.
//!
//! Offsets are relative to the group base in [`RegisterMap`](crate::bus::RegisterMap).
//!
//! Every gating domain (H, P, O, Q, X and AP inside the CMU, the AON domain,
//! and each of the BT/WLAN units) exposes the same six-register block:
//!
//! | offset | name      | write                | read                 |
//! |--------|-----------|----------------------|----------------------|
//! | 0x00   | ENABLE    | 1 = enable clock     | live clock status    |
//! | 0x04   | DISABLE   | 1 = disable clock    | 0                    |
//! | 0x08   | MODE      | 1 = auto, 0 = manual | stored value         |
//! | 0x0C   | RST_SET   | 1 = assert reset     | live reset status    |
//! | 0x10   | RST_CLR   | 1 = release reset    | 0                    |
//! | 0x14   | RST_PULSE | 1 = auto pulse       | 0                    |
//!
//! The top-level clock enables, the source selects and the AON PLL controls
//! use the same ENABLE/DISABLE strobe pair convention.

use tock_registers::register_bitfields;

pub const DOMAIN_ENABLE: usize = 0x00;
pub const DOMAIN_DISABLE: usize = 0x04;
pub const DOMAIN_MODE: usize = 0x08;
pub const DOMAIN_RST_SET: usize = 0x0C;
pub const DOMAIN_RST_CLR: usize = 0x10;
pub const DOMAIN_RST_PULSE: usize = 0x14;

// Domain blocks inside the core CMU.
pub const CMU_H_DOMAIN: usize = 0x000;
pub const CMU_P_DOMAIN: usize = 0x020;
pub const CMU_O_DOMAIN: usize = 0x040;
pub const CMU_Q_DOMAIN: usize = 0x060;
pub const CMU_X_DOMAIN: usize = 0x080;
pub const CMU_AP_DOMAIN: usize = 0x0A0;

pub const CMU_TOP_CLK_EN: usize = 0x100;
pub const CMU_TOP_CLK_DIS: usize = 0x104;
pub const CMU_SYS_CLK_EN: usize = 0x110;
pub const CMU_SYS_CLK_DIS: usize = 0x114;
pub const CMU_CLK_DIV: usize = 0x118;
pub const CMU_PERIPH_DIV0: usize = 0x120;
pub const CMU_PERIPH_DIV1: usize = 0x124;

// The AON domain block sits at the start of the AON-CMU.
pub const AON_DOMAIN: usize = 0x000;
pub const AON_PLL_EN: usize = 0x040;
pub const AON_PLL_DIS: usize = 0x044;
pub const AON_CODEC_DIV: usize = 0x050;
pub const AON_WAKEUP_CLK_CFG: usize = 0x060;
pub const AON_WAKEUP_MASK0: usize = 0x064;
pub const AON_WAKEUP_MASK1: usize = 0x068;
pub const AON_SLEEP_CTRL: usize = 0x06C;
pub const AON_WAKE_STATUS: usize = 0x070;
pub const AON_STATUS: usize = 0x074;

// BT and WLAN clock units carry a single domain block at their base.
pub const SUBSYS_DOMAIN: usize = 0x000;

register_bitfields![u32,
    pub TOP_CLK [
        /// High-speed memory bus clock
        MEM_HS OFFSET(0) NUMBITS(1) [],
        /// High-speed flash bus clock
        FLASH_HS OFFSET(1) NUMBITS(1) [],
        AUDIO OFFSET(2) NUMBITS(1) [],
        DISPLAY OFFSET(3) NUMBITS(1) [],
        USB OFFSET(4) NUMBITS(1) [],
        PSRAM OFFSET(5) NUMBITS(1) [],
        SDMMC OFFSET(6) NUMBITS(1) [],
        CAMERA OFFSET(7) NUMBITS(1) []
    ],

    /// Source select lanes for the system, DSP, memory and flash clocks.
    ///
    /// The mux picks the highest-priority select that is set: PLL, then
    /// OSCX4, OSCX2, OSC. With none set the lane runs from the 32 kHz clock.
    /// BYPASS routes the undivided source to the output; RSTN releases the
    /// divider from reset.
    pub SYS_CLK [
        SYS_OSC OFFSET(0) NUMBITS(1) [],
        SYS_OSCX2 OFFSET(1) NUMBITS(1) [],
        SYS_OSCX4 OFFSET(2) NUMBITS(1) [],
        SYS_PLL OFFSET(3) NUMBITS(1) [],
        SYS_BYPASS OFFSET(4) NUMBITS(1) [],
        SYS_RSTN OFFSET(5) NUMBITS(1) [],

        DSP_OSC OFFSET(8) NUMBITS(1) [],
        DSP_OSCX2 OFFSET(9) NUMBITS(1) [],
        DSP_OSCX4 OFFSET(10) NUMBITS(1) [],
        DSP_PLL OFFSET(11) NUMBITS(1) [],
        DSP_BYPASS OFFSET(12) NUMBITS(1) [],
        DSP_RSTN OFFSET(13) NUMBITS(1) [],

        MEM_OSC OFFSET(16) NUMBITS(1) [],
        MEM_OSCX2 OFFSET(17) NUMBITS(1) [],
        MEM_OSCX4 OFFSET(18) NUMBITS(1) [],
        MEM_PLL OFFSET(19) NUMBITS(1) [],
        MEM_BYPASS OFFSET(20) NUMBITS(1) [],
        MEM_RSTN OFFSET(21) NUMBITS(1) [],

        FLASH_OSC OFFSET(24) NUMBITS(1) [],
        FLASH_OSCX2 OFFSET(25) NUMBITS(1) [],
        FLASH_OSCX4 OFFSET(26) NUMBITS(1) [],
        FLASH_PLL OFFSET(27) NUMBITS(1) [],
        FLASH_BYPASS OFFSET(28) NUMBITS(1) [],
        FLASH_RSTN OFFSET(29) NUMBITS(1) []
    ],

    /// Divided-path ratios. Stored value is divisor - 2.
    pub CLK_DIV [
        SYS OFFSET(0) NUMBITS(4) [],
        DSP OFFSET(4) NUMBITS(4) [],
        MEM OFFSET(8) NUMBITS(4) [],
        FLASH OFFSET(12) NUMBITS(4) []
    ],

    pub PERIPH_DIV0 [
        TIMER OFFSET(0) NUMBITS(8) [],
        UART OFFSET(8) NUMBITS(6) [],
        SPI OFFSET(16) NUMBITS(6) [],
        SDMMC OFFSET(24) NUMBITS(5) []
    ],

    pub PERIPH_DIV1 [
        I2S OFFSET(0) NUMBITS(8) [],
        PCM OFFSET(8) NUMBITS(8) [],
        SPDIF OFFSET(16) NUMBITS(6) [],
        FLASH OFFSET(24) NUMBITS(4) []
    ],

    /// AON PLL control strobe pair.
    ///
    /// Power and divider-reset bits are per physical PLL block; distribution
    /// enables are per logical PLL.
    pub PLL_CTRL [
        PU_USB OFFSET(0) NUMBITS(1) [],
        PU_DDR OFFSET(1) NUMBITS(1) [],
        PU_DSP OFFSET(2) NUMBITS(1) [],
        PU_BB OFFSET(3) NUMBITS(1) [],
        PU_DSI OFFSET(4) NUMBITS(1) [],

        RSTN_USB OFFSET(8) NUMBITS(1) [],
        RSTN_DDR OFFSET(9) NUMBITS(1) [],
        RSTN_DSP OFFSET(10) NUMBITS(1) [],
        RSTN_BB OFFSET(11) NUMBITS(1) [],
        RSTN_DSI OFFSET(12) NUMBITS(1) [],

        EN_USB OFFSET(16) NUMBITS(1) [],
        EN_DDR OFFSET(17) NUMBITS(1) [],
        EN_DSP OFFSET(18) NUMBITS(1) [],
        EN_BB OFFSET(19) NUMBITS(1) [],
        EN_BB_PSRAM OFFSET(20) NUMBITS(1) [],
        EN_DSI OFFSET(21) NUMBITS(1) []
    ],

    pub CODEC_DIV [
        /// Run the codec path from the AON oscillator
        SEL_AON_OSC OFFSET(0) NUMBITS(1) [],
        DIV OFFSET(4) NUMBITS(4) [],
        /// Run the codec path from the audio PLL output
        SEL_PLL OFFSET(8) NUMBITS(1) []
    ],

    pub WAKEUP_CLK_CFG [
        /// 26 MHz oscillator ready wait, in 32 kHz ticks
        READY_TIMER OFFSET(0) NUMBITS(10) [],
        /// PLL lock wait, in 32 kHz ticks
        LOCK_TIMER OFFSET(10) NUMBITS(10) [],
        AUTO_26M OFFSET(20) NUMBITS(1) [],
        AUTO_PLL OFFSET(21) NUMBITS(1) []
    ],

    /// Gate and reset bits of the BT and WLAN clock units.
    pub SUBSYS [
        CPU OFFSET(0) NUMBITS(1) [],
        /// Radio front end
        RF OFFSET(1) NUMBITS(1) [],
        /// Modem / MAC-PHY
        MODEM OFFSET(2) NUMBITS(1) []
    ],

    pub SLEEP_CTRL [
        RAM_RET_AUTO OFFSET(0) NUMBITS(1) [],
        RAM_RET_HOLD OFFSET(1) NUMBITS(1) []
    ],

    pub WAKE_STATUS [
        OSC_READY OFFSET(0) NUMBITS(1) [],
        PLL_LOCKED OFFSET(1) NUMBITS(1) []
    ],

    pub SCR [
        SLEEPONEXIT OFFSET(1) NUMBITS(1) [],
        SLEEPDEEP OFFSET(2) NUMBITS(1) []
    ]
];
