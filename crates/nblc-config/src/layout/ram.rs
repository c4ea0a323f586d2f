// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RAM linker window.
//!
//! Service-node builds share RAM with the prebuilt firmware stack, which
//! claims a fixed window at the top; the application gets the remainder
//! as its linker (origin, length) pair. Base-node builds own all of RAM.

use crate::resolver::ConfigBranch;
use crate::{Error, Result};

/// Linker (origin, length) pair for the application RAM window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamWindow {
    /// First usable RAM address for the application.
    pub origin: u32,
    /// Usable length in bytes.
    pub length: u32,
    /// Bytes reserved for the firmware stack above the window (0 on
    /// base-node builds).
    pub reserved: u32,
}

impl RamWindow {
    /// First address of the firmware-stack reservation, if any.
    #[must_use]
    pub fn reserved_origin(&self) -> Option<u32> {
        (self.reserved > 0).then(|| self.origin + self.length)
    }
}

/// Compute the application RAM window for a branch.
///
/// # Errors
///
/// [`Error::LayoutOverflow`] when the requested stack reservation does
/// not fit in target RAM at all.
pub fn compute_ram_window(
    branch: ConfigBranch,
    ram_base: u32,
    ram_size: u32,
    stack_reserve: u32,
) -> Result<RamWindow> {
    let reserved = match branch {
        ConfigBranch::ServiceApp { .. } | ConfigBranch::ServiceBin { .. } => stack_reserve,
        ConfigBranch::Unconfigured | ConfigBranch::Base { .. } => 0,
    };

    if reserved > ram_size {
        log::error!(
            "[layout] stack RAM reservation {:#x} exceeds target RAM size {:#x}",
            reserved,
            ram_size
        );
        return Err(Error::LayoutOverflow {
            region: "stack-ram",
            end: u64::from(ram_base) + u64::from(reserved),
            limit: u64::from(ram_base) + u64::from(ram_size),
        });
    }

    Ok(RamWindow {
        origin: ram_base,
        length: ram_size - reserved,
        reserved,
    })
}
