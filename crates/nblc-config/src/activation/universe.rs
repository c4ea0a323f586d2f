// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The managed component universe and the per-branch target set.

use crate::model::ProtocolVersion;
use crate::resolver::{ConfigBranch, Resolved};
use crate::{Error, Result};

// =======================================================================
// Component Identity
// =======================================================================

/// Identity of one managed component or file-set.
///
/// The universe is closed: adding a component is a compile-time-checked
/// change to this enum and to [`target_components`], never a silently
/// ignored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentId {
    // --- Source bundles -------------------------------------------------
    /// Stack API surface (headers + glue sources).
    StackApi,
    /// HAL wrapper sources binding the stack to the platform.
    HalWrapper,
    /// Management-plane headers (base-node coordination surface).
    MgmtPlane,
    /// Consumer-side API client sources (service application builds).
    ApiClient,

    // --- Sibling services ----------------------------------------------
    /// Random-source service.
    SrvRandom,
    /// Queue service.
    SrvQueue,
    /// Log/report service.
    SrvLogReport,
    /// CRC service.
    SrvCrc,
    /// Security primitives service.
    SrvSecurity,
    /// Non-volatile storage service.
    SrvStorage,
    /// Shared diagnostic transport (host-link port multiplexer).
    SrvDiagTransport,

    // --- PHY abstraction ------------------------------------------------
    /// Power-line PHY abstraction layer.
    PalPlc,
    /// RF PHY abstraction layer.
    PalRf,
    /// Serial PHY abstraction layer.
    PalSerial,
    /// Multi-PHY mux sources (needed once two or more interfaces are in).
    PalMerge,

    // --- Sniffer instrumentation ----------------------------------------
    /// PLC frame sniffer service.
    SnifferPlc,
    /// RF frame sniffer service.
    SnifferRf,
    /// Serial frame sniffer service.
    SnifferSerial,

    // --- Prebuilt stack libraries ---------------------------------------
    /// Base node, protocol v1.3.
    LibBaseV13,
    /// Base node, protocol v1.3, slave sub-mode.
    LibBaseV13Slave,
    /// Base node, protocol v1.4.
    LibBaseV14,
    /// Service node, protocol v1.3.
    LibServiceV13,
    /// Service node, protocol v1.4.
    LibServiceV14,
}

impl ComponentId {
    /// Every managed component.
    pub const ALL: [ComponentId; 23] = [
        ComponentId::StackApi,
        ComponentId::HalWrapper,
        ComponentId::MgmtPlane,
        ComponentId::ApiClient,
        ComponentId::SrvRandom,
        ComponentId::SrvQueue,
        ComponentId::SrvLogReport,
        ComponentId::SrvCrc,
        ComponentId::SrvSecurity,
        ComponentId::SrvStorage,
        ComponentId::SrvDiagTransport,
        ComponentId::PalPlc,
        ComponentId::PalRf,
        ComponentId::PalSerial,
        ComponentId::PalMerge,
        ComponentId::SnifferPlc,
        ComponentId::SnifferRf,
        ComponentId::SnifferSerial,
        ComponentId::LibBaseV13,
        ComponentId::LibBaseV13Slave,
        ComponentId::LibBaseV14,
        ComponentId::LibServiceV13,
        ComponentId::LibServiceV14,
    ];

    /// Short identifier used in logs, facts and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentId::StackApi => "stack-api",
            ComponentId::HalWrapper => "hal-wrapper",
            ComponentId::MgmtPlane => "mgmt-plane",
            ComponentId::ApiClient => "api-client",
            ComponentId::SrvRandom => "srv-random",
            ComponentId::SrvQueue => "srv-queue",
            ComponentId::SrvLogReport => "srv-log-report",
            ComponentId::SrvCrc => "srv-crc",
            ComponentId::SrvSecurity => "srv-security",
            ComponentId::SrvStorage => "srv-storage",
            ComponentId::SrvDiagTransport => "srv-diag-transport",
            ComponentId::PalPlc => "pal-plc",
            ComponentId::PalRf => "pal-rf",
            ComponentId::PalSerial => "pal-serial",
            ComponentId::PalMerge => "pal-merge",
            ComponentId::SnifferPlc => "sniffer-plc",
            ComponentId::SnifferRf => "sniffer-rf",
            ComponentId::SnifferSerial => "sniffer-serial",
            ComponentId::LibBaseV13 => "lib-base-1.3",
            ComponentId::LibBaseV13Slave => "lib-base-1.3-slave",
            ComponentId::LibBaseV14 => "lib-base-1.4",
            ComponentId::LibServiceV13 => "lib-service-1.3",
            ComponentId::LibServiceV14 => "lib-service-1.4",
        }
    }

    /// Whether this component is a prebuilt stack library.
    #[inline]
    #[must_use]
    pub fn is_library(&self) -> bool {
        matches!(
            self,
            ComponentId::LibBaseV13
                | ComponentId::LibBaseV13Slave
                | ComponentId::LibBaseV14
                | ComponentId::LibServiceV13
                | ComponentId::LibServiceV14
        )
    }

    #[inline]
    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

// =======================================================================
// Component Set
// =======================================================================

/// Compact set over the managed universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentSet(u32);

impl ComponentSet {
    /// The empty set.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Insert a component.
    #[inline]
    pub fn insert(&mut self, id: ComponentId) {
        self.0 |= id.bit();
    }

    /// Remove a component.
    #[inline]
    pub fn remove(&mut self, id: ComponentId) {
        self.0 &= !id.bit();
    }

    /// Membership test.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.0 & id.bit() != 0
    }

    /// Number of members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in universe order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        ComponentId::ALL.into_iter().filter(|id| self.contains(*id))
    }
}

impl FromIterator<ComponentId> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

// =======================================================================
// Target Set
// =======================================================================

/// Compute the complete target activation set for a resolution.
///
/// Recomputed in full on every change; nothing is patched incrementally.
#[must_use]
pub fn target_components(resolved: &Resolved) -> ComponentSet {
    let mut set = ComponentSet::new();

    let branch = resolved.branch;
    if !branch.is_configured() {
        // Safe floor: nothing selected, nothing enabled.
        return set;
    }

    // Source bundle + prebuilt library, keyed by (role, project).
    match branch {
        ConfigBranch::Base {
            version,
            slave_mode,
        } => {
            set.insert(ComponentId::StackApi);
            set.insert(ComponentId::HalWrapper);
            // A v1.3 slave base node has no coordination surface.
            if !slave_mode {
                set.insert(ComponentId::MgmtPlane);
            }
            set.insert(match (version, slave_mode) {
                (ProtocolVersion::V1_3, true) => ComponentId::LibBaseV13Slave,
                (ProtocolVersion::V1_3, false) => ComponentId::LibBaseV13,
                (ProtocolVersion::V1_4, _) => ComponentId::LibBaseV14,
            });
        }
        ConfigBranch::ServiceApp { version } => {
            set.insert(ComponentId::ApiClient);
            set.insert(match version {
                ProtocolVersion::V1_3 => ComponentId::LibServiceV13,
                ProtocolVersion::V1_4 => ComponentId::LibServiceV14,
            });
        }
        ConfigBranch::ServiceBin { .. } => {
            // The stack itself is the build product: sources, no library.
            set.insert(ComponentId::StackApi);
            set.insert(ComponentId::HalWrapper);
        }
        ConfigBranch::Unconfigured => unreachable!("handled above"),
    }

    // Sibling services ride along with every configured branch. The
    // diagnostic transport is host-link plumbing the prebuilt stack
    // binary does not carry.
    set.insert(ComponentId::SrvRandom);
    set.insert(ComponentId::SrvQueue);
    set.insert(ComponentId::SrvLogReport);
    set.insert(ComponentId::SrvCrc);
    set.insert(ComponentId::SrvSecurity);
    set.insert(ComponentId::SrvStorage);
    let diag = !matches!(branch, ConfigBranch::ServiceBin { .. });
    if diag {
        set.insert(ComponentId::SrvDiagTransport);
    }

    // PHY abstraction layers follow the effective interface enables; the
    // mux sources are only needed once two interfaces coexist.
    if resolved.phy_plc {
        set.insert(ComponentId::PalPlc);
    }
    if resolved.phy_rf {
        set.insert(ComponentId::PalRf);
    }
    if resolved.phy_serial {
        set.insert(ComponentId::PalSerial);
    }
    let interfaces =
        usize::from(resolved.phy_plc) + usize::from(resolved.phy_rf) + usize::from(resolved.phy_serial);
    if interfaces >= 2 {
        set.insert(ComponentId::PalMerge);
    }

    // Sniffer gate, evaluated per interface: instrumentation needs the
    // interface itself and the shared diagnostic transport.
    if resolved.sniffer && diag {
        if resolved.phy_plc {
            set.insert(ComponentId::SnifferPlc);
        }
        if resolved.phy_rf {
            set.insert(ComponentId::SnifferRf);
        }
        if resolved.phy_serial {
            set.insert(ComponentId::SnifferSerial);
        }
    }

    set
}

/// Final cross-check: exactly one build flavor.
///
/// A target set may carry at most one prebuilt library, and a branch that
/// builds the stack from source must carry none. Unreachable from
/// [`target_components`]; the engine still runs it on every reconcile and
/// repairs by disabling rather than leaving two flavors active.
///
/// # Errors
///
/// [`Error::ActivationConflict`] naming the two clashing components.
pub fn verify_flavor(set: &ComponentSet, branch: ConfigBranch) -> Result<()> {
    let mut libs = set.iter().filter(ComponentId::is_library);

    let Some(first) = libs.next() else {
        return Ok(());
    };
    if let Some(second) = libs.next() {
        return Err(Error::ActivationConflict { first, second });
    }
    if matches!(branch, ConfigBranch::ServiceBin { .. }) {
        // Library + stack sources in one image.
        return Err(Error::ActivationConflict {
            first,
            second: ComponentId::StackApi,
        });
    }
    Ok(())
}

// =======================================================================
// Tests
// =======================================================================
