// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! NBLC Build Configuration Constants - Single Source of Truth
//!
//! This module centralizes the fixed memory-layout convention and the
//! identity defaults of the stack. **NEVER hardcode elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (partition offsets,
//!   identity tags, option ranges)
//! - **Level 2 (Dynamic)**: per-session values (`BuildSession`) resolved
//!   from the static table plus target geometry
//!
//! The partition offsets are a layout convention shared by every supported
//! target: bootloaders, upgrade tooling and prebuilt stack images all
//! assume them. They are relative to the target flash base and must never
//! be derived from target geometry.

// =======================================================================
// Flash Partition Layout (fixed convention, offsets from flash base)
// =======================================================================

/// User application partition offset from flash base.
pub const USER_APP_OFFSET: u32 = 0x0001_0000;

/// User application partition size (bytes).
pub const USER_APP_SIZE: u32 = 0x0004_0000;

/// Firmware stack (protocol v1.4) partition offset from flash base.
pub const FW_STACK_V14_OFFSET: u32 = 0x0009_0000;

/// Firmware stack (protocol v1.4) partition size (bytes).
pub const FW_STACK_V14_SIZE: u32 = 0x0002_2000;

/// PHY layer partition offset from flash base.
pub const PHY_LAYER_OFFSET: u32 = 0x000B_8000;

/// PHY layer partition size (bytes).
pub const PHY_LAYER_SIZE: u32 = 0x0001_8000;

/// Firmware stack (protocol v1.3) partition offset from flash base.
pub const FW_STACK_V13_OFFSET: u32 = 0x000D_0000;

/// Firmware stack (protocol v1.3) partition size (bytes).
pub const FW_STACK_V13_SIZE: u32 = 0x0002_0000;

// =======================================================================
// RAM Reservation
// =======================================================================

/// Default firmware-stack RAM reservation, taken from the top of RAM on
/// service-node builds (bytes).
///
/// Never validated against the full target matrix; sessions may override
/// it via [`crate::BuildSession::set_stack_ram_reserve`].
pub const STACK_RAM_RESERVE_DEFAULT: u32 = 0x8000;

// =======================================================================
// Firmware Upgrade Partition
// =======================================================================

/// Upgrade scratch-partition size for base-node builds (bytes).
pub const UPGRADE_REGION_SIZE_BASE: u32 = 0x0006_0000;

/// Upgrade scratch-partition size for service-node builds (bytes).
pub const UPGRADE_REGION_SIZE_SERVICE: u32 = 0x0004_0000;

/// Staging buffer for flash writes during an upgrade (bytes).
///
/// Must be equal to or larger than the flash block write size.
pub const UPGRADE_WRITE_BUFFER_SIZE: u32 = 0x100;

/// Staging buffer for flash reads during an upgrade (bytes).
pub const UPGRADE_READ_BUFFER_SIZE: u32 = 0x100;

// =======================================================================
// Firmware Identity
// =======================================================================

/// Width of the identity/metadata tag field burned into image headers.
///
/// Shorter strings are NUL-padded; longer strings are a configuration bug.
pub const TAG_LEN: usize = 16;

/// Firmware version tag, base node, protocol v1.3.
pub const FW_VERSION_BASE_V13: &str = "B13.01.01";

/// Firmware version tag, base node, protocol v1.4 (hybrid-capable).
pub const FW_VERSION_BASE_V14: &str = "HB14.01.01";

/// Firmware version tag, service node, protocol v1.3.
pub const FW_VERSION_SERVICE_V13: &str = "S13.01.01";

/// Firmware version tag, service node, protocol v1.4 (hybrid-capable).
pub const FW_VERSION_SERVICE_V14: &str = "HS14.01.01";

/// Default firmware vendor tag.
pub const FW_VENDOR_DEFAULT: &str = "NBLC";

/// Default parameter-base vendor identifier.
pub const PIB_VENDOR_DEFAULT: u16 = 0x0000;

/// Default parameter-base model identifier.
pub const PIB_MODEL_DEFAULT: u16 = 0x3940;

// =======================================================================
// Option Ranges
// =======================================================================

/// Highest selectable MAC security profile.
pub const SECURITY_PROFILE_MAX: u8 = 2;

/// Highest supported registered-node count for a base node.
pub const MAX_NODE_COUNT_LIMIT: u16 = 2000;

/// Default registered-node count for a base node.
pub const MAX_NODE_COUNT_DEFAULT: u16 = 15;

// =======================================================================
// Derived Addresses (Helpers)
// =======================================================================

/// Absolute start address of the user application partition.
///
/// # Examples
///
/// ```
/// assert_eq!(nblc_config::config::user_app_start(0), 0x1_0000);
/// assert_eq!(nblc_config::config::user_app_start(0x0100_0000), 0x0101_0000);
/// ```
#[inline]
#[must_use]
pub const fn user_app_start(flash_base: u32) -> u32 {
    flash_base + USER_APP_OFFSET
}

/// Absolute start address of the v1.4 firmware-stack partition.
#[inline]
#[must_use]
pub const fn fw_stack_v14_start(flash_base: u32) -> u32 {
    flash_base + FW_STACK_V14_OFFSET
}

/// Absolute start address of the PHY layer partition.
#[inline]
#[must_use]
pub const fn phy_layer_start(flash_base: u32) -> u32 {
    flash_base + PHY_LAYER_OFFSET
}

/// Absolute start address of the v1.3 firmware-stack partition.
#[inline]
#[must_use]
pub const fn fw_stack_v13_start(flash_base: u32) -> u32 {
    flash_base + FW_STACK_V13_OFFSET
}

// =======================================================================
// Tests
// =======================================================================
