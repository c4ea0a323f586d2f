// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Selection axes and target-board description.
//!
//! A [`Selection`] carries the raw user choices exactly as made in the
//! host tool; nothing here is validated or normalized. Normalization is
//! the resolver's job, so a `Selection` can always be constructed, stored
//! and replayed even when it describes a combination the stack does not
//! support.

use crate::config;

#[cfg(feature = "profile-loaders")]
use serde::{Deserialize, Serialize};

// =======================================================================
// Selection Axes
// =======================================================================

/// Role a device takes in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "profile-loaders", derive(Serialize, Deserialize))]
pub enum NodeRole {
    /// Coordinates the network and manages registered service nodes.
    Base,
    /// Participates in a network coordinated by a base node.
    Service,
}

impl NodeRole {
    /// Short identifier used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Base => "base",
            NodeRole::Service => "service",
        }
    }
}

/// How the stack and the user application are packaged together.
///
/// Only meaningful for service nodes; a base node is always a single
/// unified image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "profile-loaders", derive(Serialize, Deserialize))]
pub enum ProjectType {
    /// Application and stack in one project.
    Unified,
    /// Application side of a split build: the stack is consumed as a
    /// prebuilt image at its conventional flash partition.
    SplitApplication,
    /// Stack side of a split build: this project *is* the prebuilt stack
    /// binary, loaded at its conventional flash partition.
    SplitBinary,
}

impl ProjectType {
    /// Short identifier used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Unified => "unified",
            ProjectType::SplitApplication => "split-app",
            ProjectType::SplitBinary => "split-bin",
        }
    }
}

/// Protocol generation the firmware implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "profile-loaders", derive(Serialize, Deserialize))]
pub enum ProtocolVersion {
    /// v1.3: PLC only, no MAC security, base nodes may run in slave mode.
    V1_3,
    /// v1.4: hybrid PLC/RF capable, MAC security profiles available.
    V1_4,
}

impl ProtocolVersion {
    /// Short identifier used in logs and CLI output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V1_3 => "1.3",
            ProtocolVersion::V1_4 => "1.4",
        }
    }

    /// Whether this generation supports the RF PHY at all.
    #[inline]
    #[must_use]
    pub fn supports_rf(&self) -> bool {
        matches!(self, ProtocolVersion::V1_4)
    }
}

// =======================================================================
// PHY Interface Selection
// =======================================================================

/// Per-interface PHY enables plus the sniffer opt-in.
///
/// The PLC interface defaults to enabled; it is the one interface every
/// supported board has. RF availability additionally depends on the
/// protocol version and is enforced at resolve time, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhySelection {
    /// Power-line PHY interface.
    pub plc: bool,
    /// Sub-GHz RF PHY interface (v1.4 only).
    pub rf: bool,
    /// Serial PHY interface (tunneling over a host link).
    pub serial: bool,
    /// Opt-in for per-interface frame sniffer instrumentation.
    pub sniffer: bool,
}

impl Default for PhySelection {
    fn default() -> Self {
        Self {
            plc: true,
            rf: false,
            serial: false,
            sniffer: false,
        }
    }
}

// =======================================================================
// Selection
// =======================================================================

/// Raw user choices for one build configuration.
///
/// # Examples
///
/// ```
/// use nblc_config::{NodeRole, ProjectType, ProtocolVersion, Selection};
///
/// let sel = Selection::new(NodeRole::Service, ProtocolVersion::V1_4)
///     .project(ProjectType::SplitApplication)
///     .security_profile(1)
///     .rf(true);
/// assert!(sel.phy.rf);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Node role axis.
    pub role: NodeRole,
    /// Project packaging axis.
    pub project: ProjectType,
    /// Protocol version axis.
    pub version: ProtocolVersion,
    /// Base-node slave sub-mode (v1.3 only).
    pub slave_mode: bool,
    /// Requested MAC security profile (0..=2).
    pub security_profile: u8,
    /// Requested maximum registered-node count.
    pub max_nodes: u16,
    /// PHY interface enables.
    pub phy: PhySelection,
}

impl Selection {
    /// Create a selection with defaults for everything except the two
    /// axes every configuration starts from.
    #[must_use]
    pub fn new(role: NodeRole, version: ProtocolVersion) -> Self {
        Self {
            role,
            project: ProjectType::Unified,
            version,
            slave_mode: false,
            security_profile: 0,
            max_nodes: config::MAX_NODE_COUNT_DEFAULT,
            phy: PhySelection::default(),
        }
    }

    /// Set the project packaging type.
    #[must_use]
    pub fn project(mut self, project: ProjectType) -> Self {
        self.project = project;
        self
    }

    /// Set the slave sub-mode flag.
    #[must_use]
    pub fn slave_mode(mut self, slave: bool) -> Self {
        self.slave_mode = slave;
        self
    }

    /// Set the requested MAC security profile.
    #[must_use]
    pub fn security_profile(mut self, profile: u8) -> Self {
        self.security_profile = profile;
        self
    }

    /// Set the requested maximum registered-node count.
    #[must_use]
    pub fn max_nodes(mut self, nodes: u16) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Enable/disable the RF PHY interface.
    #[must_use]
    pub fn rf(mut self, enabled: bool) -> Self {
        self.phy.rf = enabled;
        self
    }

    /// Enable/disable the serial PHY interface.
    #[must_use]
    pub fn serial(mut self, enabled: bool) -> Self {
        self.phy.serial = enabled;
        self
    }

    /// Enable/disable the PLC PHY interface.
    #[must_use]
    pub fn plc(mut self, enabled: bool) -> Self {
        self.phy.plc = enabled;
        self
    }

    /// Opt in to per-interface sniffer instrumentation.
    #[must_use]
    pub fn sniffer(mut self, enabled: bool) -> Self {
        self.phy.sniffer = enabled;
        self
    }

    /// Strict pre-check: report the normalizations `resolve` would apply
    /// silently.
    ///
    /// Resolution itself is total and never fails on axis values; callers
    /// that want to warn the user before a choice is quietly forced can
    /// run this first.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidAxisCombination`] describing the first
    /// forced adjustment.
    pub fn check(&self) -> crate::Result<()> {
        use crate::Error;

        if self.role == NodeRole::Base && self.project != ProjectType::Unified {
            return Err(Error::InvalidAxisCombination(format!(
                "base nodes are always unified builds ({} requested)",
                self.project.as_str()
            )));
        }
        if self.slave_mode && self.role == NodeRole::Service {
            return Err(Error::InvalidAxisCombination(
                "slave mode is a base-node feature".into(),
            ));
        }
        if self.slave_mode && self.version == ProtocolVersion::V1_4 {
            return Err(Error::InvalidAxisCombination(
                "slave mode is only available in protocol v1.3".into(),
            ));
        }
        if self.version == ProtocolVersion::V1_3 && self.security_profile != 0 {
            return Err(Error::InvalidAxisCombination(format!(
                "protocol v1.3 has no MAC security (profile {} requested)",
                self.security_profile
            )));
        }
        if self.security_profile > config::SECURITY_PROFILE_MAX {
            return Err(Error::InvalidAxisCombination(format!(
                "security profile {} out of range 0..={}",
                self.security_profile,
                config::SECURITY_PROFILE_MAX
            )));
        }
        if self.max_nodes > config::MAX_NODE_COUNT_LIMIT {
            return Err(Error::InvalidAxisCombination(format!(
                "node count {} out of range 0..={}",
                self.max_nodes,
                config::MAX_NODE_COUNT_LIMIT
            )));
        }
        if self.phy.rf && !self.version.supports_rf() {
            return Err(Error::InvalidAxisCombination(
                "RF interface requires protocol v1.4".into(),
            ));
        }
        Ok(())
    }
}

// =======================================================================
// Target Description
// =======================================================================

/// Processor family of the target board.
///
/// Picks identity defaults (firmware model tag, parameter-base model);
/// it never alters the memory-layout rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "profile-loaders", derive(Serialize, Deserialize))]
pub enum ChipFamily {
    /// Metering-class parts.
    Mt,
    /// Smart-gateway-class parts.
    Sg,
}

impl ChipFamily {
    /// Default firmware model tag for this family.
    #[must_use]
    pub fn default_model_tag(&self) -> &'static str {
        match self {
            ChipFamily::Mt => "NBLC-MT",
            ChipFamily::Sg => "NBLC-SG",
        }
    }

    /// Default parameter-base model identifier for this family.
    #[must_use]
    pub fn default_pib_model(&self) -> u16 {
        // One shared parameter base today; the hook stays per-family
        // because vendor parts have diverged before.
        config::PIB_MODEL_DEFAULT
    }
}

/// Memory geometry and family of one target board.
///
/// This is the read-only fact set the engine pulls from the host; it is
/// never mutated by a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "profile-loaders", derive(Serialize, Deserialize))]
pub struct TargetProfile {
    /// Display name of the board/part.
    pub name: String,
    /// Processor family.
    pub chip_family: ChipFamily,
    /// First flash address.
    pub flash_base: u32,
    /// Flash size in bytes.
    pub flash_size: u32,
    /// First RAM address.
    pub ram_base: u32,
    /// RAM size in bytes.
    pub ram_size: u32,
}

impl TargetProfile {
    /// One-past-the-end flash address.
    #[inline]
    #[must_use]
    pub fn flash_end(&self) -> u64 {
        u64::from(self.flash_base) + u64::from(self.flash_size)
    }
}

#[cfg(feature = "profile-loaders")]
impl TargetProfile {
    /// Parse a profile from a YAML document.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ProfileParse`] when the document does not describe
    /// a profile.
    pub fn from_yaml(doc: &str) -> crate::Result<Self> {
        serde_yaml::from_str(doc).map_err(|e| crate::Error::ProfileParse(e.to_string()))
    }

    /// Load a profile from a YAML file.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ProfileIo`] on read failure,
    /// [`crate::Error::ProfileParse`] on malformed content.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let doc = std::fs::read_to_string(path)?;
        Self::from_yaml(&doc)
    }
}
