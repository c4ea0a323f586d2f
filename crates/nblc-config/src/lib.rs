// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # NBLC Build Configurator
//!
//! Configuration-resolution engine for firmware builds of the NBLC
//! narrowband PLC/RF communication stack. Turns a small set of user
//! choices (node role, project packaging, protocol version, slave mode)
//! into a consistent memory layout and a consistent activation state for
//! the stack's build components, with correct rollback when a choice
//! changes.
//!
//! ## Quick Start
//!
//! ```rust
//! use nblc_config::{
//!     BuildSession, ChipFamily, NodeRole, ProjectType, ProtocolVersion, Selection,
//!     TargetProfile,
//! };
//!
//! let profile = TargetProfile {
//!     name: "evb-mt-1m".into(),
//!     chip_family: ChipFamily::Mt,
//!     flash_base: 0x0100_0000,
//!     flash_size: 0x0010_0000,
//!     ram_base: 0x2000_0000,
//!     ram_size: 0x0004_0000,
//! };
//! let session = BuildSession::new(profile);
//!
//! let sel = Selection::new(NodeRole::Service, ProtocolVersion::V1_4)
//!     .project(ProjectType::SplitApplication)
//!     .security_profile(1);
//! let resolution = session.apply(&sel)?;
//!
//! assert_eq!(resolution.regions.load_address(), 0x0101_0000);
//! assert_eq!(resolution.resolved.fw_version_tag, "HS14.01.01");
//! # Ok::<(), nblc_config::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        Host tool surface                     |
//! |        axis selections in   |   facts / region table out     |
//! +--------------------------------------------------------------+
//! |                         BuildSession                         |
//! |   resolve -> layout -> reconcile -> publish  (synchronous)   |
//! +--------------+----------------+---------------+--------------+
//! |   resolver   |     layout     |  activation   |    notify    |
//! |  branch and  |  flash regions |  component    |  typed fact  |
//! |  derived     |  + RAM window  |  diffing      |  channel     |
//! |  options     |                |               |              |
//! +--------------+----------------+---------------+--------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BuildSession`] | Per-project context; runs the pipeline |
//! | [`Selection`] | Raw user choices, never validated in place |
//! | [`ConfigBranch`] | Normalized configuration branch |
//! | [`RegionTable`] | Resolved flash partitions + load address |
//! | [`ActivationDiff`] | Minimal enable/disable instruction list |
//! | [`Fact`] | Typed value pushed to sibling components |

/// Activation graph engine (component universe, diffing).
pub mod activation;
/// Fixed layout convention and identity constants.
pub mod config;
/// Memory layout computation (flash regions, RAM window).
pub mod layout;
/// Selection axes and target-board description.
pub mod model;
/// Cross-component fact channel.
pub mod notify;
/// Mode/version resolution.
pub mod resolver;
/// Build session pipeline.
pub mod session;

pub use activation::{
    Action, ActivationCommand, ActivationDiff, ActivationEngine, ComponentId, ComponentSet,
};
pub use layout::{MemoryRegion, RamWindow, RegionId, RegionTable, Tag};
pub use model::{
    ChipFamily, NodeRole, PhySelection, ProjectType, ProtocolVersion, Selection, TargetProfile,
};
pub use notify::{Fact, FactId, FactReply, FactRequest, FactSink, Notifier};
pub use resolver::{resolve, ConfigBranch, Locked, PhyOperationMode, Resolved};
pub use session::{BuildSession, Resolution};

// =======================================================================
// Errors
// =======================================================================

/// Errors surfaced by the configurator.
///
/// Nothing here aborts the host process: normalization handles bad axis
/// input silently, and the remaining conditions are blocking
/// *configuration* errors the host renders and recovers from.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Selection Errors
    // ========================================================================
    /// A combination the resolver would silently normalize; only returned
    /// by the strict [`Selection::check`] pre-check.
    InvalidAxisCombination(String),

    // ========================================================================
    // Layout Errors
    // ========================================================================
    /// An active region (or the RAM reservation) does not fit the target.
    LayoutOverflow {
        /// Offending region identifier.
        region: &'static str,
        /// One-past-the-end address of the region.
        end: u64,
        /// One-past-the-end address of the target window.
        limit: u64,
    },

    // ========================================================================
    // Activation Errors
    // ========================================================================
    /// Two build flavors required at once. The bundle rules never
    /// produce this; the engine still verifies every target set.
    ActivationConflict {
        /// First flavor found.
        first: ComponentId,
        /// Clashing flavor.
        second: ComponentId,
    },
    /// A fact sink tried to start a resolution from inside a publish.
    ReentrantResolve,

    // ========================================================================
    // Fact Errors
    // ========================================================================
    /// A fact name outside the published set.
    UnknownFact(String),

    // ========================================================================
    // Profile Errors
    // ========================================================================
    /// Target profile file could not be read.
    ProfileIo(std::io::Error),
    /// Target profile document is malformed.
    ProfileParse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidAxisCombination(msg) => {
                write!(f, "invalid axis combination: {}", msg)
            }
            Error::LayoutOverflow { region, end, limit } => write!(
                f,
                "layout overflow: {} ends at {:#x}, past limit {:#x}",
                region, end, limit
            ),
            Error::ActivationConflict { first, second } => write!(
                f,
                "activation conflict: {} and {} are both required",
                first.as_str(),
                second.as_str()
            ),
            Error::ReentrantResolve => write!(f, "re-entrant resolution refused"),
            Error::UnknownFact(name) => write!(f, "unknown fact: {}", name),
            Error::ProfileIo(e) => write!(f, "profile read failed: {}", e),
            Error::ProfileParse(msg) => write!(f, "profile parse failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProfileIo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::ProfileIo(e)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::LayoutOverflow {
            region: "phy-layer",
            end: 0xD_0000,
            limit: 0x8_0000,
        };
        assert_eq!(
            err.to_string(),
            "layout overflow: phy-layer ends at 0xd0000, past limit 0x80000"
        );

        let err = Error::ActivationConflict {
            first: ComponentId::LibBaseV13,
            second: ComponentId::LibBaseV14,
        };
        assert!(err.to_string().contains("lib-base-1.3"));
        assert!(err.to_string().contains("lib-base-1.4"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::ProfileIo(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
