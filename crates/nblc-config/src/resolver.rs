// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mode/version resolution.
//!
//! Collapses the four selection axes into one [`ConfigBranch`] and derives
//! the read-only values that follow from it (firmware version tag,
//! security-profile lock, PHY operation mode, option visibility). The
//! resolver is pure: it touches neither the memory layout nor the
//! activation state, and it is total: every input normalizes to *some*
//! branch, with [`ConfigBranch::Unconfigured`] as the safe floor.
//!
//! # Normalization rules
//!
//! - A base node is always a unified build; the project axis is ignored.
//! - Slave mode exists only for base nodes on protocol v1.3; any other
//!   combination forces it off.
//! - A unified service build and the application side of a split service
//!   build are the same branch: both consume the stack prebuilt at its
//!   conventional partition.

use crate::config;
use crate::model::{ChipFamily, NodeRole, ProjectType, ProtocolVersion, Selection};

// =======================================================================
// Branch
// =======================================================================

/// One valid configuration branch.
///
/// The forced normalizations above are already applied: a value of this
/// enum never encodes a contradictory combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigBranch {
    /// Nothing selected yet (or an unusable combination); all dependent
    /// options hidden, no regions, no active components.
    Unconfigured,
    /// Base-node unified image.
    Base {
        /// Protocol generation.
        version: ProtocolVersion,
        /// v1.3 slave sub-mode.
        slave_mode: bool,
    },
    /// Service-node application consuming the prebuilt stack.
    ServiceApp {
        /// Protocol generation.
        version: ProtocolVersion,
    },
    /// Service-node prebuilt stack binary itself.
    ServiceBin {
        /// Protocol generation.
        version: ProtocolVersion,
    },
}

impl ConfigBranch {
    /// Whether this branch describes an actual build.
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !matches!(self, ConfigBranch::Unconfigured)
    }

    /// Node role, if configured.
    #[must_use]
    pub fn role(&self) -> Option<NodeRole> {
        match self {
            ConfigBranch::Unconfigured => None,
            ConfigBranch::Base { .. } => Some(NodeRole::Base),
            ConfigBranch::ServiceApp { .. } | ConfigBranch::ServiceBin { .. } => {
                Some(NodeRole::Service)
            }
        }
    }

    /// Protocol version, if configured.
    #[must_use]
    pub fn version(&self) -> Option<ProtocolVersion> {
        match self {
            ConfigBranch::Unconfigured => None,
            ConfigBranch::Base { version, .. }
            | ConfigBranch::ServiceApp { version }
            | ConfigBranch::ServiceBin { version } => Some(*version),
        }
    }

    /// Whether the v1.3 base-node slave sub-mode is on.
    #[inline]
    #[must_use]
    pub fn slave_mode(&self) -> bool {
        matches!(
            self,
            ConfigBranch::Base {
                slave_mode: true,
                ..
            }
        )
    }

    /// Short identifier used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigBranch::Unconfigured => "unconfigured",
            ConfigBranch::Base {
                slave_mode: false, ..
            } => "base",
            ConfigBranch::Base {
                slave_mode: true, ..
            } => "base-slave",
            ConfigBranch::ServiceApp { .. } => "service-app",
            ConfigBranch::ServiceBin { .. } => "service-bin",
        }
    }
}

// =======================================================================
// Derived Values
// =======================================================================

/// PHY operation mode derived from the version axis and the interface
/// enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyOperationMode {
    /// PLC and RF simultaneously (v1.4 only).
    Hybrid,
    /// PLC only.
    Plc,
    /// RF only (v1.4 only).
    Rf,
}

impl PhyOperationMode {
    /// Short identifier used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PhyOperationMode::Hybrid => "hybrid",
            PhyOperationMode::Plc => "plc",
            PhyOperationMode::Rf => "rf",
        }
    }
}

/// An option value together with its lock state.
///
/// `read_only` mirrors the host wizard's locked rendering: the value is
/// forced by the current branch and must not be edited until the branch
/// releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locked<T> {
    /// Effective value.
    pub value: T,
    /// Whether the current branch forces the value.
    pub read_only: bool,
}

impl<T> Locked<T> {
    #[inline]
    fn free(value: T) -> Self {
        Self {
            value,
            read_only: false,
        }
    }

    #[inline]
    fn forced(value: T) -> Self {
        Self {
            value,
            read_only: true,
        }
    }
}

/// Output of a resolution: the branch plus every value derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Normalized branch.
    pub branch: ConfigBranch,
    /// Effective PHY interface enables (RF already stripped on v1.3).
    pub phy_plc: bool,
    /// Effective RF enable.
    pub phy_rf: bool,
    /// Effective serial enable.
    pub phy_serial: bool,
    /// Sniffer instrumentation opt-in (carried through unchanged).
    pub sniffer: bool,
    /// Derived PHY operation mode with its lock state.
    pub phy_mode: Locked<PhyOperationMode>,
    /// MAC security profile with its lock state (forced 0 on v1.3).
    pub security_profile: Locked<u8>,
    /// Maximum registered-node count; `None` when the option is hidden
    /// for this branch.
    pub max_nodes: Option<u16>,
    /// Firmware version tag (role x version).
    pub fw_version_tag: &'static str,
    /// Firmware vendor tag.
    pub fw_vendor: &'static str,
    /// Firmware model tag (from the chip family).
    pub fw_model: &'static str,
    /// Parameter-base vendor identifier.
    pub pib_vendor: u16,
    /// Parameter-base model identifier.
    pub pib_model: u16,
}

impl Resolved {
    /// The distinguished output for an unusable selection: everything
    /// hidden, nothing active.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            branch: ConfigBranch::Unconfigured,
            phy_plc: false,
            phy_rf: false,
            phy_serial: false,
            sniffer: false,
            phy_mode: Locked::forced(PhyOperationMode::Plc),
            security_profile: Locked::forced(0),
            max_nodes: None,
            fw_version_tag: "",
            fw_vendor: config::FW_VENDOR_DEFAULT,
            fw_model: "",
            pib_vendor: config::PIB_VENDOR_DEFAULT,
            pib_model: config::PIB_MODEL_DEFAULT,
        }
    }
}

// =======================================================================
// Resolution
// =======================================================================

/// Resolve a raw selection against a target chip family.
///
/// Total over all inputs: contradictions are normalized (and logged at
/// debug level), out-of-range option values are clamped, and nothing
/// here can fail.
///
/// # Examples
///
/// ```
/// use nblc_config::{resolve, ChipFamily, NodeRole, ProtocolVersion, Selection};
///
/// let sel = Selection::new(NodeRole::Base, ProtocolVersion::V1_4);
/// let resolved = resolve(&sel, ChipFamily::Mt);
/// assert_eq!(resolved.fw_version_tag, "HB14.01.01");
/// assert!(resolved.security_profile.value <= 2);
/// ```
#[must_use]
pub fn resolve(sel: &Selection, family: ChipFamily) -> Resolved {
    let branch = normalize(sel);

    // PHY enables: RF exists only on v1.4. PLC and serial pass through.
    let version = branch.version().unwrap_or(ProtocolVersion::V1_4);
    let phy_rf = sel.phy.rf && version.supports_rf();
    if sel.phy.rf && !phy_rf {
        log::debug!("[resolver] RF interface dropped: not available in protocol v1.3");
    }
    let phy_plc = sel.phy.plc;
    let phy_serial = sel.phy.serial;

    // Operation mode follows the effective interfaces; v1.3 locks it.
    let phy_mode = match version {
        ProtocolVersion::V1_3 => Locked::forced(PhyOperationMode::Plc),
        ProtocolVersion::V1_4 => Locked::free(match (phy_plc, phy_rf) {
            (true, true) => PhyOperationMode::Hybrid,
            (false, true) => PhyOperationMode::Rf,
            _ => PhyOperationMode::Plc,
        }),
    };

    // v1.3 has no MAC security: profile forced to 0 and locked. v1.4
    // unlocks the option without inventing a value.
    let security_profile = match version {
        ProtocolVersion::V1_3 => {
            if sel.security_profile != 0 {
                log::debug!(
                    "[resolver] security profile {} forced to 0 on protocol v1.3",
                    sel.security_profile
                );
            }
            Locked::forced(0)
        }
        ProtocolVersion::V1_4 => {
            Locked::free(sel.security_profile.min(config::SECURITY_PROFILE_MAX))
        }
    };

    // Node count is a base-node option; a split-binary service build
    // carries it forced to 0 so the prebuilt image reserves nothing.
    let max_nodes = match branch {
        ConfigBranch::Base { .. } => {
            Some(sel.max_nodes.min(config::MAX_NODE_COUNT_LIMIT))
        }
        ConfigBranch::ServiceBin { .. } => Some(0),
        _ => None,
    };

    let fw_version_tag = version_tag(branch);

    Resolved {
        branch,
        phy_plc,
        phy_rf,
        phy_serial,
        sniffer: sel.phy.sniffer,
        phy_mode,
        security_profile,
        max_nodes,
        fw_version_tag,
        fw_vendor: config::FW_VENDOR_DEFAULT,
        fw_model: family.default_model_tag(),
        pib_vendor: config::PIB_VENDOR_DEFAULT,
        pib_model: family.default_pib_model(),
    }
}

/// Collapse the raw axes into a branch, applying the forcing rules.
fn normalize(sel: &Selection) -> ConfigBranch {
    match sel.role {
        NodeRole::Base => {
            if sel.project != ProjectType::Unified {
                log::debug!(
                    "[resolver] project type {} ignored for a base node",
                    sel.project.as_str()
                );
            }
            // Slave mode survives only on v1.3.
            let slave_mode = sel.slave_mode && sel.version == ProtocolVersion::V1_3;
            if sel.slave_mode && !slave_mode {
                log::debug!("[resolver] slave mode dropped: requires protocol v1.3");
            }
            ConfigBranch::Base {
                version: sel.version,
                slave_mode,
            }
        }
        NodeRole::Service => {
            if sel.slave_mode {
                log::debug!("[resolver] slave mode dropped: base-node feature");
            }
            match sel.project {
                ProjectType::Unified | ProjectType::SplitApplication => ConfigBranch::ServiceApp {
                    version: sel.version,
                },
                ProjectType::SplitBinary => ConfigBranch::ServiceBin {
                    version: sel.version,
                },
            }
        }
    }
}

/// Firmware version tag for a branch (role x version; packaging does not
/// change the firmware identity).
fn version_tag(branch: ConfigBranch) -> &'static str {
    match (branch.role(), branch.version()) {
        (Some(NodeRole::Base), Some(ProtocolVersion::V1_3)) => config::FW_VERSION_BASE_V13,
        (Some(NodeRole::Base), Some(ProtocolVersion::V1_4)) => config::FW_VERSION_BASE_V14,
        (Some(NodeRole::Service), Some(ProtocolVersion::V1_3)) => config::FW_VERSION_SERVICE_V13,
        (Some(NodeRole::Service), Some(ProtocolVersion::V1_4)) => config::FW_VERSION_SERVICE_V14,
        _ => "",
    }
}

// =======================================================================
// Tests
// =======================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn service(version: ProtocolVersion, project: ProjectType) -> Selection {
        Selection::new(NodeRole::Service, version).project(project)
    }

    #[test]
    fn test_base_forces_unified() {
        let sel = Selection::new(NodeRole::Base, ProtocolVersion::V1_4)
            .project(ProjectType::SplitBinary);
        let resolved = resolve(&sel, ChipFamily::Mt);
        assert_eq!(
            resolved.branch,
            ConfigBranch::Base {
                version: ProtocolVersion::V1_4,
                slave_mode: false
            }
        );
    }

    #[test]
    fn test_slave_mode_only_base_v13() {
        let sel = Selection::new(NodeRole::Base, ProtocolVersion::V1_3).slave_mode(true);
        assert!(resolve(&sel, ChipFamily::Mt).branch.slave_mode());

        let sel = Selection::new(NodeRole::Base, ProtocolVersion::V1_4).slave_mode(true);
        assert!(!resolve(&sel, ChipFamily::Mt).branch.slave_mode());

        let sel = service(ProtocolVersion::V1_3, ProjectType::Unified).slave_mode(true);
        assert!(!resolve(&sel, ChipFamily::Mt).branch.slave_mode());
    }

    #[test]
    fn test_unified_service_is_application_branch() {
        let unified = resolve(
            &service(ProtocolVersion::V1_4, ProjectType::Unified),
            ChipFamily::Mt,
        );
        let split = resolve(
            &service(ProtocolVersion::V1_4, ProjectType::SplitApplication),
            ChipFamily::Mt,
        );
        assert_eq!(unified.branch, split.branch);
        assert_eq!(
            unified.branch,
            ConfigBranch::ServiceApp {
                version: ProtocolVersion::V1_4
            }
        );
    }

    #[test]
    fn test_version_tags() {
        let cases = [
            (NodeRole::Base, ProtocolVersion::V1_3, "B13.01.01"),
            (NodeRole::Base, ProtocolVersion::V1_4, "HB14.01.01"),
            (NodeRole::Service, ProtocolVersion::V1_3, "S13.01.01"),
            (NodeRole::Service, ProtocolVersion::V1_4, "HS14.01.01"),
        ];
        for (role, version, tag) in cases {
            let resolved = resolve(&Selection::new(role, version), ChipFamily::Mt);
            assert_eq!(resolved.fw_version_tag, tag);
        }
    }

    #[test]
    fn test_tag_ignores_project_type() {
        for project in [
            ProjectType::Unified,
            ProjectType::SplitApplication,
            ProjectType::SplitBinary,
        ] {
            let resolved = resolve(&service(ProtocolVersion::V1_4, project), ChipFamily::Mt);
            assert_eq!(resolved.fw_version_tag, "HS14.01.01");
        }
    }

    #[test]
    fn test_v13_locks_security_profile() {
        let sel = service(ProtocolVersion::V1_3, ProjectType::Unified).security_profile(2);
        let resolved = resolve(&sel, ChipFamily::Mt);
        assert_eq!(resolved.security_profile.value, 0);
        assert!(resolved.security_profile.read_only);
    }

    #[test]
    fn test_v14_unlocks_security_profile() {
        let sel = service(ProtocolVersion::V1_4, ProjectType::Unified).security_profile(2);
        let resolved = resolve(&sel, ChipFamily::Mt);
        assert_eq!(resolved.security_profile.value, 2);
        assert!(!resolved.security_profile.read_only);
    }

    #[test]
    fn test_security_profile_clamped() {
        let sel = service(ProtocolVersion::V1_4, ProjectType::Unified).security_profile(9);
        let resolved = resolve(&sel, ChipFamily::Mt);
        assert_eq!(resolved.security_profile.value, crate::config::SECURITY_PROFILE_MAX);
    }

    #[test]
    fn test_v13_forces_plc_mode() {
        let sel = Selection::new(NodeRole::Base, ProtocolVersion::V1_3).rf(true);
        let resolved = resolve(&sel, ChipFamily::Mt);
        assert_eq!(resolved.phy_mode.value, PhyOperationMode::Plc);
        assert!(resolved.phy_mode.read_only);
        assert!(!resolved.phy_rf);
    }

    #[test]
    fn test_v14_operation_modes() {
        let hybrid = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4).rf(true),
            ChipFamily::Mt,
        );
        assert_eq!(hybrid.phy_mode.value, PhyOperationMode::Hybrid);
        assert!(!hybrid.phy_mode.read_only);

        let rf_only = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4)
                .plc(false)
                .rf(true),
            ChipFamily::Mt,
        );
        assert_eq!(rf_only.phy_mode.value, PhyOperationMode::Rf);

        let plc_only = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4),
            ChipFamily::Mt,
        );
        assert_eq!(plc_only.phy_mode.value, PhyOperationMode::Plc);
    }

    #[test]
    fn test_max_nodes_visibility() {
        let base = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4).max_nodes(100),
            ChipFamily::Mt,
        );
        assert_eq!(base.max_nodes, Some(100));

        let app = resolve(
            &service(ProtocolVersion::V1_4, ProjectType::SplitApplication),
            ChipFamily::Mt,
        );
        assert_eq!(app.max_nodes, None);

        let bin = resolve(
            &service(ProtocolVersion::V1_4, ProjectType::SplitBinary).max_nodes(100),
            ChipFamily::Mt,
        );
        assert_eq!(bin.max_nodes, Some(0));
    }

    #[test]
    fn test_max_nodes_clamped() {
        let base = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4).max_nodes(u16::MAX),
            ChipFamily::Mt,
        );
        assert_eq!(base.max_nodes, Some(crate::config::MAX_NODE_COUNT_LIMIT));
    }

    #[test]
    fn test_identity_defaults_follow_family() {
        let mt = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4),
            ChipFamily::Mt,
        );
        assert_eq!(mt.fw_model, "NBLC-MT");
        let sg = resolve(
            &Selection::new(NodeRole::Base, ProtocolVersion::V1_4),
            ChipFamily::Sg,
        );
        assert_eq!(sg.fw_model, "NBLC-SG");
        assert_eq!(sg.fw_vendor, crate::config::FW_VENDOR_DEFAULT);
    }

    #[test]
    fn test_unconfigured_hides_everything() {
        let resolved = Resolved::unconfigured();
        assert!(!resolved.branch.is_configured());
        assert_eq!(resolved.max_nodes, None);
        assert!(!resolved.phy_plc && !resolved.phy_rf && !resolved.phy_serial);
        assert_eq!(resolved.fw_version_tag, "");
    }
}
