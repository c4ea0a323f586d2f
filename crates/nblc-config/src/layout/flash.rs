// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flash region table.
//!
//! A configured service branch gets the full four-entry table with the
//! active flags set for the selected build flavor; a base branch owns the
//! whole image and gets an empty table with the load address at the raw
//! flash base. Inactive entries stay in the table so collaborators (the
//! upgrade service, the host programmer view) can still see where a
//! partition *would* live.

use super::Tag;
use crate::config;
use crate::model::ProtocolVersion;
use crate::resolver::ConfigBranch;
use crate::{Error, Result};

// =======================================================================
// Region Identity
// =======================================================================

/// Identity of one conventional flash partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    /// User application partition.
    UserApp,
    /// Prebuilt firmware stack, protocol v1.4.
    FwStackV14,
    /// PHY layer partition.
    PhyLayer,
    /// Prebuilt firmware stack, protocol v1.3.
    FwStackV13,
}

impl RegionId {
    /// Every conventional partition, in address order.
    pub const ALL: [RegionId; 4] = [
        RegionId::UserApp,
        RegionId::FwStackV14,
        RegionId::PhyLayer,
        RegionId::FwStackV13,
    ];

    /// Short identifier used in logs, facts and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionId::UserApp => "user-app",
            RegionId::FwStackV14 => "fw-stack-1.4",
            RegionId::PhyLayer => "phy-layer",
            RegionId::FwStackV13 => "fw-stack-1.3",
        }
    }

    /// Conventional offset of this partition from the flash base.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u32 {
        match self {
            RegionId::UserApp => config::USER_APP_OFFSET,
            RegionId::FwStackV14 => config::FW_STACK_V14_OFFSET,
            RegionId::PhyLayer => config::PHY_LAYER_OFFSET,
            RegionId::FwStackV13 => config::FW_STACK_V13_OFFSET,
        }
    }

    /// Conventional size of this partition.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u32 {
        match self {
            RegionId::UserApp => config::USER_APP_SIZE,
            RegionId::FwStackV14 => config::FW_STACK_V14_SIZE,
            RegionId::PhyLayer => config::PHY_LAYER_SIZE,
            RegionId::FwStackV13 => config::FW_STACK_V13_SIZE,
        }
    }

    /// The stack partition matching a protocol version.
    #[must_use]
    pub fn fw_stack(version: ProtocolVersion) -> RegionId {
        match version {
            ProtocolVersion::V1_3 => RegionId::FwStackV13,
            ProtocolVersion::V1_4 => RegionId::FwStackV14,
        }
    }
}

// =======================================================================
// Region Table
// =======================================================================

/// One resolved flash partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Partition identity.
    pub id: RegionId,
    /// Absolute start address.
    pub start: u32,
    /// Size in bytes.
    pub size: u32,
    /// Whether this partition is part of the current build flavor.
    pub active: bool,
    /// Metadata tag burned into the partition's image header.
    pub tag: Tag,
}

impl MemoryRegion {
    /// One-past-the-end address.
    #[inline]
    #[must_use]
    pub fn end(&self) -> u64 {
        u64::from(self.start) + u64::from(self.size)
    }

    /// Whether two regions share any address.
    #[must_use]
    pub fn overlaps(&self, other: &MemoryRegion) -> bool {
        u64::from(self.start) < other.end() && u64::from(other.start) < self.end()
    }
}

/// The resolved region table plus the build's own load address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTable {
    regions: Vec<MemoryRegion>,
    load_address: u32,
}

impl RegionTable {
    /// All entries, active and inactive, in address order.
    #[inline]
    #[must_use]
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// Active entries only.
    pub fn active(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.iter().filter(|r| r.active)
    }

    /// Look up one entry.
    #[must_use]
    pub fn get(&self, id: RegionId) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Absolute address the produced image is linked/loaded at.
    #[inline]
    #[must_use]
    pub fn load_address(&self) -> u32 {
        self.load_address
    }
}

// =======================================================================
// Computation
// =======================================================================

/// Compute the region table for a branch against a flash window.
///
/// Pure and total over configured branches; `Unconfigured` yields an
/// empty table loading at the flash base.
///
/// # Errors
///
/// [`Error::LayoutOverflow`] when any *active* region ends past the flash
/// window. Inactive entries are allowed to fall outside small targets:
/// only partitions the build actually uses must fit.
pub fn compute_regions(
    branch: ConfigBranch,
    flash_base: u32,
    flash_size: u32,
    version_tag: &str,
) -> Result<RegionTable> {
    let table = match branch {
        // A base node owns the whole image: no partitioning, load at the
        // raw flash base.
        ConfigBranch::Unconfigured | ConfigBranch::Base { .. } => RegionTable {
            regions: Vec::new(),
            load_address: flash_base,
        },
        ConfigBranch::ServiceApp { version } => RegionTable {
            regions: build_entries(flash_base, version, version_tag, &[
                RegionId::UserApp,
                RegionId::PhyLayer,
                RegionId::fw_stack(version),
            ]),
            load_address: config::user_app_start(flash_base),
        },
        // The prebuilt stack binary is its own build product: its load
        // address is the stack partition for the selected version, and
        // no other partition is active.
        ConfigBranch::ServiceBin { version } => RegionTable {
            regions: build_entries(flash_base, version, version_tag, &[RegionId::fw_stack(
                version,
            )]),
            load_address: flash_base + RegionId::fw_stack(version).offset(),
        },
    };

    validate(&table, flash_base, flash_size)?;
    Ok(table)
}

/// Build the full four-entry table with the given ids marked active.
fn build_entries(
    flash_base: u32,
    version: ProtocolVersion,
    version_tag: &str,
    active: &[RegionId],
) -> Vec<MemoryRegion> {
    RegionId::ALL
        .iter()
        .map(|&id| {
            let tag = if id == RegionId::fw_stack(version) {
                Tag::new(version_tag)
            } else {
                Tag::new(id.as_str())
            };
            MemoryRegion {
                id,
                start: flash_base + id.offset(),
                size: id.size(),
                active: active.contains(&id),
                tag,
            }
        })
        .collect()
}

/// Check the active entries against the flash window and each other.
fn validate(table: &RegionTable, flash_base: u32, flash_size: u32) -> Result<()> {
    let limit = u64::from(flash_base) + u64::from(flash_size);

    for region in table.active() {
        if region.end() > limit {
            log::error!(
                "[layout] region {} ends at {:#x}, past flash limit {:#x}",
                region.id.as_str(),
                region.end(),
                limit
            );
            return Err(Error::LayoutOverflow {
                region: region.id.as_str(),
                end: region.end(),
                limit,
            });
        }
    }

    // The fixed offset table never produces overlap; the check runs on
    // every computed table regardless.
    let active: Vec<&MemoryRegion> = table.active().collect();
    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            if a.overlaps(b) {
                log::error!(
                    "[layout] regions {} and {} overlap",
                    a.id.as_str(),
                    b.id.as_str()
                );
                return Err(Error::LayoutOverflow {
                    region: a.id.as_str(),
                    end: a.end(),
                    limit: u64::from(b.start),
                });
            }
        }
    }

    Ok(())
}

// =======================================================================
// Tests
// =======================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MEG: u32 = 0x0010_0000;

    fn service_app(version: ProtocolVersion) -> ConfigBranch {
        ConfigBranch::ServiceApp { version }
    }

    #[test]
    fn test_service_app_v14_reference_layout() {
        let table =
            compute_regions(service_app(ProtocolVersion::V1_4), 0, MEG, "HS14.01.01").unwrap();

        let app = table.get(RegionId::UserApp).unwrap();
        assert!(app.active);
        assert_eq!((app.start, app.size), (0x1_0000, 0x4_0000));

        let stack = table.get(RegionId::FwStackV14).unwrap();
        assert!(stack.active);
        assert_eq!((stack.start, stack.size), (0x9_0000, 0x2_2000));

        let phy = table.get(RegionId::PhyLayer).unwrap();
        assert!(phy.active);
        assert_eq!((phy.start, phy.size), (0xB_8000, 0x1_8000));

        let old_stack = table.get(RegionId::FwStackV13).unwrap();
        assert!(!old_stack.active);

        assert_eq!(table.load_address(), 0x1_0000);
    }

    #[test]
    fn test_service_app_v13_swaps_stack_region() {
        let table =
            compute_regions(service_app(ProtocolVersion::V1_3), 0, MEG, "S13.01.01").unwrap();
        assert!(table.get(RegionId::FwStackV13).unwrap().active);
        assert!(!table.get(RegionId::FwStackV14).unwrap().active);
    }

    #[test]
    fn test_service_bin_loads_at_stack_partition() {
        let table = compute_regions(
            ConfigBranch::ServiceBin {
                version: ProtocolVersion::V1_4,
            },
            0,
            MEG,
            "HS14.01.01",
        )
        .unwrap();
        assert_eq!(table.load_address(), 0x9_0000);
        assert_eq!(table.active().count(), 1);

        let table = compute_regions(
            ConfigBranch::ServiceBin {
                version: ProtocolVersion::V1_3,
            },
            0,
            MEG,
            "S13.01.01",
        )
        .unwrap();
        assert_eq!(table.load_address(), 0xD_0000);
    }

    #[test]
    fn test_base_has_no_partitions() {
        let table = compute_regions(
            ConfigBranch::Base {
                version: ProtocolVersion::V1_3,
                slave_mode: true,
            },
            0,
            MEG,
            "B13.01.01",
        )
        .unwrap();
        assert!(table.regions().is_empty());
        assert_eq!(table.load_address(), 0);

        let table = compute_regions(
            ConfigBranch::Base {
                version: ProtocolVersion::V1_4,
                slave_mode: false,
            },
            0x0100_0000,
            MEG,
            "HB14.01.01",
        )
        .unwrap();
        assert_eq!(table.load_address(), 0x0100_0000);
    }

    #[test]
    fn test_offsets_shift_with_base_only() {
        let base = 0x0040_0000;
        let table =
            compute_regions(service_app(ProtocolVersion::V1_4), base, MEG, "HS14.01.01").unwrap();
        assert_eq!(table.get(RegionId::UserApp).unwrap().start, base + 0x1_0000);
        assert_eq!(table.load_address(), base + 0x1_0000);
    }

    #[test]
    fn test_active_regions_disjoint_and_in_bounds() {
        for version in [ProtocolVersion::V1_3, ProtocolVersion::V1_4] {
            let table = compute_regions(service_app(version), 0, MEG, "tag").unwrap();
            let active: Vec<_> = table.active().collect();
            for (i, a) in active.iter().enumerate() {
                assert!(a.end() <= u64::from(MEG));
                for b in &active[i + 1..] {
                    assert!(!a.overlaps(b), "{:?} overlaps {:?}", a.id, b.id);
                }
            }
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        // 512 KiB of flash cannot hold the upper partitions; the first
        // offender in address order is the PHY layer.
        let err = compute_regions(service_app(ProtocolVersion::V1_3), 0, 0x8_0000, "S13.01.01")
            .unwrap_err();
        match err {
            Error::LayoutOverflow { region, end, limit } => {
                assert_eq!(region, "phy-layer");
                assert_eq!(end, 0xD_0000);
                assert_eq!(limit, 0x8_0000);
            }
            other => panic!("expected LayoutOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_inactive_regions_may_exceed_small_targets() {
        // 0xB0000 of flash: the v1.4 app build fits (v1.3 stack entry is
        // inactive and lies past the end), v1.3 does not.
        assert!(compute_regions(service_app(ProtocolVersion::V1_4), 0, 0xDA000, "t").is_ok());
        assert!(compute_regions(service_app(ProtocolVersion::V1_3), 0, 0xDA000, "t").is_err());
    }

    #[test]
    fn test_stack_region_carries_version_tag() {
        let table =
            compute_regions(service_app(ProtocolVersion::V1_4), 0, MEG, "HS14.01.01").unwrap();
        assert_eq!(
            table.get(RegionId::FwStackV14).unwrap().tag.as_str(),
            "HS14.01.01"
        );
    }
}
