// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-component fact channel.
//!
//! Sibling components that are not part of the activation graph (PHY
//! drivers, the upgrade service, linker-script generation) still have to
//! stay consistent with a resolution. They get there through *facts*:
//! small named values pushed synchronously after the layout has been
//! validated, in pipeline order.
//!
//! Every request kind is a closed enum matched exhaustively: adding a
//! kind is a compile-time-checked change, not a string that falls through
//! a default branch. The only stringly surface is [`FactId::from_name`],
//! for callers that genuinely start from text (CLI, host queries); it
//! answers unknown names with an error instead of silence.

use dashmap::DashMap;

use crate::layout::{RamWindow, RegionId, Tag};
use crate::{Error, Result};

// =======================================================================
// Facts
// =======================================================================

/// Key of one published fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactId {
    /// One region-table entry.
    Region(RegionId),
    /// Absolute address the build links/loads at.
    LoadAddress,
    /// Application RAM linker window.
    RamWindow,
    /// Upgrade scratch-partition size for the current role.
    UpgradeRegionSize,
    /// Static addressing window handed to the PHY driver.
    PhyStaticAddress,
    /// Firmware version tag (NUL-padded field).
    FirmwareVersion,
    /// Whether the v1.3 base slave sub-mode is on.
    SlaveMode,
    /// Maximum registered-node count.
    MaxNodeCount,
}

impl FactId {
    /// Stable text name (CLI queries, logs).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            FactId::Region(RegionId::UserApp) => "region.user-app",
            FactId::Region(RegionId::FwStackV14) => "region.fw-stack-1.4",
            FactId::Region(RegionId::PhyLayer) => "region.phy-layer",
            FactId::Region(RegionId::FwStackV13) => "region.fw-stack-1.3",
            FactId::LoadAddress => "load-address",
            FactId::RamWindow => "ram-window",
            FactId::UpgradeRegionSize => "upgrade-region-size",
            FactId::PhyStaticAddress => "phy-static-address",
            FactId::FirmwareVersion => "firmware-version",
            FactId::SlaveMode => "slave-mode",
            FactId::MaxNodeCount => "max-node-count",
        }
    }

    /// Parse a text name back into a fact id.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownFact`] for names outside the published set.
    pub fn from_name(name: &str) -> Result<Self> {
        let id = match name {
            "region.user-app" => FactId::Region(RegionId::UserApp),
            "region.fw-stack-1.4" => FactId::Region(RegionId::FwStackV14),
            "region.phy-layer" => FactId::Region(RegionId::PhyLayer),
            "region.fw-stack-1.3" => FactId::Region(RegionId::FwStackV13),
            "load-address" => FactId::LoadAddress,
            "ram-window" => FactId::RamWindow,
            "upgrade-region-size" => FactId::UpgradeRegionSize,
            "phy-static-address" => FactId::PhyStaticAddress,
            "firmware-version" => FactId::FirmwareVersion,
            "slave-mode" => FactId::SlaveMode,
            "max-node-count" => FactId::MaxNodeCount,
            other => return Err(Error::UnknownFact(other.to_string())),
        };
        Ok(id)
    }
}

/// One published fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    /// Region-table entry (address, size, activity).
    Region {
        /// Which partition.
        id: RegionId,
        /// Absolute start address.
        start: u32,
        /// Size in bytes.
        size: u32,
        /// Part of the current build flavor.
        active: bool,
    },
    /// Absolute load/link address.
    LoadAddress(u32),
    /// Application RAM linker window.
    RamWindow(RamWindow),
    /// Upgrade scratch-partition size (bytes).
    UpgradeRegionSize(u32),
    /// Static PHY addressing window start.
    PhyStaticAddress(u32),
    /// Firmware version tag, padded to the image-header field width.
    FirmwareVersion(Tag),
    /// Slave sub-mode flag.
    SlaveMode(bool),
    /// Maximum registered-node count.
    MaxNodeCount(u16),
}

impl Fact {
    /// Key this fact publishes under.
    #[must_use]
    pub fn id(&self) -> FactId {
        match self {
            Fact::Region { id, .. } => FactId::Region(*id),
            Fact::LoadAddress(_) => FactId::LoadAddress,
            Fact::RamWindow(_) => FactId::RamWindow,
            Fact::UpgradeRegionSize(_) => FactId::UpgradeRegionSize,
            Fact::PhyStaticAddress(_) => FactId::PhyStaticAddress,
            Fact::FirmwareVersion(_) => FactId::FirmwareVersion,
            Fact::SlaveMode(_) => FactId::SlaveMode,
            Fact::MaxNodeCount(_) => FactId::MaxNodeCount,
        }
    }
}

// =======================================================================
// Request/Reply
// =======================================================================

/// Request a sibling can make over the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactRequest {
    /// Read the current value of a fact.
    Query(FactId),
    /// The PHY configurator detached; its facts no longer apply.
    DetachPhy,
}

/// Reply to a [`FactRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactReply {
    /// Request handled.
    Success,
    /// Request handled, value attached.
    Value(Fact),
    /// Request understood but could not be served.
    Failure,
    /// Receiver does not implement this request kind.
    Unimplemented,
}

/// Receiver side of the channel.
///
/// Sinks are plain synchronous callbacks; publishing never suspends and
/// never re-enters the resolution pipeline (the session guards against
/// that independently).
pub trait FactSink: Send {
    /// A fact changed value.
    fn on_fact(&mut self, fact: &Fact);

    /// A directed request; default is to not implement any kind.
    fn on_request(&mut self, request: &FactRequest) -> FactReply {
        let _ = request;
        FactReply::Unimplemented
    }
}

// =======================================================================
// Notifier
// =======================================================================

/// Pure transport with idempotent publishing.
///
/// Keeps only the last value per fact so an unchanged re-publish is
/// swallowed before it reaches any sink; call ordering otherwise follows
/// publish order exactly.
pub struct Notifier {
    published: DashMap<FactId, Fact>,
    sinks: Vec<Box<dyn FactSink>>,
}

impl Notifier {
    /// Empty notifier with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            published: DashMap::new(),
            sinks: Vec::new(),
        }
    }

    /// Attach a sink; it will see every *subsequent* fact change.
    pub fn add_sink(&mut self, sink: Box<dyn FactSink>) {
        self.sinks.push(sink);
    }

    /// Publish one fact, forwarding to sinks only on change.
    pub fn publish(&mut self, fact: Fact) {
        let id = fact.id();
        if self.published.get(&id).is_some_and(|prev| *prev == fact) {
            log::debug!("[notify] {} unchanged, suppressed", id.name());
            return;
        }
        self.published.insert(id, fact.clone());
        for sink in &mut self.sinks {
            sink.on_fact(&fact);
        }
    }

    /// Last published value of a fact.
    #[must_use]
    pub fn get(&self, id: FactId) -> Option<Fact> {
        self.published.get(&id).map(|f| f.clone())
    }

    /// Serve a request from the published store.
    ///
    /// `Query` answers from the store (`Failure` when nothing has been
    /// published under that id yet); every other kind is for sibling
    /// receivers, so the core answers `Unimplemented`.
    #[must_use]
    pub fn answer(&self, request: &FactRequest) -> FactReply {
        match request {
            FactRequest::Query(id) => match self.get(*id) {
                Some(fact) => FactReply::Value(fact),
                None => FactReply::Failure,
            },
            FactRequest::DetachPhy => FactReply::Unimplemented,
        }
    }

    /// Drop all published values (session teardown).
    pub fn clear(&mut self) {
        self.published.clear();
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

// =======================================================================
// Tests
// =======================================================================
