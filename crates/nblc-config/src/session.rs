// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Build session: the four-stage resolution pipeline.
//!
//! One [`BuildSession`] per host project. Every trigger (an axis change
//! in the wizard surface) runs resolve -> layout -> reconcile -> publish
//! synchronously and to completion; there is no incremental update path
//! and no callback cascade. All state lives on the session, with no module
//! globals.
//!
//! Re-entrancy is refused, not queued: a fact sink that reacts to a
//! publish by starting another resolution gets
//! [`Error::ReentrantResolve`]. Sinks may update their own derived
//! values; they must not drive the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::activation::{target_components, ActivationDiff, ActivationEngine};
use crate::config;
use crate::layout::{compute_ram_window, compute_regions, RamWindow, RegionId, RegionTable, Tag};
use crate::model::{NodeRole, Selection, TargetProfile};
use crate::notify::{Fact, FactReply, FactRequest, FactSink, Notifier};
use crate::resolver::{resolve, Resolved};
use crate::{Error, Result};

// =======================================================================
// Resolution Snapshot
// =======================================================================

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Branch and derived option values.
    pub resolved: Resolved,
    /// Flash region table and load address.
    pub regions: RegionTable,
    /// Application RAM linker window.
    pub ram: RamWindow,
    /// Instructions emitted to the host activation primitive.
    pub diff: ActivationDiff,
}

// =======================================================================
// Session
// =======================================================================

/// Per-project configuration context.
///
/// # Examples
///
/// ```
/// use nblc_config::{
///     BuildSession, ChipFamily, NodeRole, ProtocolVersion, Selection, TargetProfile,
/// };
///
/// let profile = TargetProfile {
///     name: "evb-mt-1m".into(),
///     chip_family: ChipFamily::Mt,
///     flash_base: 0,
///     flash_size: 0x0010_0000,
///     ram_base: 0x2000_0000,
///     ram_size: 0x0004_0000,
/// };
/// let session = BuildSession::new(profile);
///
/// let sel = Selection::new(NodeRole::Service, ProtocolVersion::V1_4);
/// let resolution = session.apply(&sel).unwrap();
/// assert_eq!(resolution.regions.load_address(), 0x1_0000);
/// ```
pub struct BuildSession {
    profile: TargetProfile,
    stack_ram_reserve: u32,
    engine: Mutex<ActivationEngine>,
    notifier: Mutex<Notifier>,
    snapshot: ArcSwapOption<Resolution>,
    resolving: AtomicBool,
}

impl BuildSession {
    /// Session against one target profile, nothing resolved yet.
    #[must_use]
    pub fn new(profile: TargetProfile) -> Self {
        log::info!(
            "[session] new build session for target '{}' (flash {:#x}+{:#x})",
            profile.name,
            profile.flash_base,
            profile.flash_size
        );
        Self {
            profile,
            stack_ram_reserve: config::STACK_RAM_RESERVE_DEFAULT,
            engine: Mutex::new(ActivationEngine::new()),
            notifier: Mutex::new(Notifier::new()),
            snapshot: ArcSwapOption::empty(),
            resolving: AtomicBool::new(false),
        }
    }

    /// Target profile this session configures against.
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// Override the firmware-stack RAM reservation (bytes).
    ///
    /// Takes effect on the next [`apply`](Self::apply).
    pub fn set_stack_ram_reserve(&mut self, bytes: u32) {
        self.stack_ram_reserve = bytes;
    }

    /// Attach a fact sink (PHY driver shim, linker-script generator, ...).
    pub fn add_sink(&self, sink: Box<dyn FactSink>) {
        self.notifier.lock().add_sink(sink);
    }

    /// Latest resolution, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Resolution>> {
        self.snapshot.load_full()
    }

    /// Serve a sibling's fact request from the published store.
    #[must_use]
    pub fn answer(&self, request: &FactRequest) -> FactReply {
        self.notifier.lock().answer(request)
    }

    /// Run the full pipeline for one selection.
    ///
    /// Synchronous and atomic per trigger: on success the activation
    /// state, the published facts and the snapshot all describe the new
    /// selection; on error nothing was changed.
    ///
    /// # Errors
    ///
    /// - [`Error::LayoutOverflow`] when the selection does not fit the
    ///   target; the previous resolution stays in place.
    /// - [`Error::ReentrantResolve`] when called from inside a fact sink.
    pub fn apply(&self, sel: &Selection) -> Result<Arc<Resolution>> {
        let _guard = ResolveGuard::enter(&self.resolving)?;

        // Stage 1: collapse the axes and derive option state.
        let resolved = resolve(sel, self.profile.chip_family);
        log::info!("[session] resolving branch '{}'", resolved.branch.as_str());

        // Stage 2: memory layout, validated before anything is published.
        let regions = compute_regions(
            resolved.branch,
            self.profile.flash_base,
            self.profile.flash_size,
            resolved.fw_version_tag,
        )?;
        let ram = compute_ram_window(
            resolved.branch,
            self.profile.ram_base,
            self.profile.ram_size,
            self.stack_ram_reserve,
        )?;

        // Stage 3: reconcile the activation graph.
        let diff = self
            .engine
            .lock()
            .reconcile(target_components(&resolved), resolved.branch);

        // Stage 4: push the facts, regions first.
        self.publish_facts(&resolved, &regions, ram);

        let resolution = Arc::new(Resolution {
            resolved,
            regions,
            ram,
            diff,
        });
        self.snapshot.store(Some(Arc::clone(&resolution)));
        Ok(resolution)
    }

    /// Drop back to the unconfigured floor: disable every managed
    /// component, forget published facts and the snapshot.
    ///
    /// Mirrors the host's project-teardown hook; also the right call when
    /// the wizard clears the selection.
    pub fn reset(&self) -> ActivationDiff {
        log::info!("[session] reset: disabling all managed components");
        let diff = self.engine.lock().reconcile_empty();
        self.notifier.lock().clear();
        self.snapshot.store(None);
        diff
    }

    fn publish_facts(&self, resolved: &Resolved, regions: &RegionTable, ram: RamWindow) {
        let mut notifier = self.notifier.lock();

        for region in regions.regions() {
            notifier.publish(Fact::Region {
                id: region.id,
                start: region.start,
                size: region.size,
                active: region.active,
            });
        }
        notifier.publish(Fact::LoadAddress(regions.load_address()));
        notifier.publish(Fact::RamWindow(ram));

        let upgrade_size = match resolved.branch.role() {
            Some(NodeRole::Base) => config::UPGRADE_REGION_SIZE_BASE,
            _ => config::UPGRADE_REGION_SIZE_SERVICE,
        };
        notifier.publish(Fact::UpgradeRegionSize(upgrade_size));

        if let Some(phy) = regions.get(RegionId::PhyLayer) {
            notifier.publish(Fact::PhyStaticAddress(phy.start));
        }

        notifier.publish(Fact::FirmwareVersion(Tag::new(resolved.fw_version_tag)));
        notifier.publish(Fact::SlaveMode(resolved.branch.slave_mode()));
        if let Some(nodes) = resolved.max_nodes {
            notifier.publish(Fact::MaxNodeCount(nodes));
        }
    }
}

/// RAII re-entrancy flag.
struct ResolveGuard<'a>(&'a AtomicBool);

impl<'a> ResolveGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Result<Self> {
        if flag.swap(true, Ordering::Acquire) {
            log::warn!("[session] re-entrant resolve refused");
            return Err(Error::ReentrantResolve);
        }
        Ok(Self(flag))
    }
}

impl Drop for ResolveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// =======================================================================
// Tests
// =======================================================================
