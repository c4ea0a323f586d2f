// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Full pipeline integration tests
//!
//! Drives a [`BuildSession`] the way the host wizard does: one trigger per
//! axis change, snapshot/facts/activation checked after each.

use std::sync::{Arc, Mutex};

use nblc_config::{
    BuildSession, ChipFamily, ComponentId, Fact, FactId, FactReply, FactRequest, FactSink,
    NodeRole, ProjectType, ProtocolVersion, RegionId, Selection, TargetProfile,
};

fn profile() -> TargetProfile {
    TargetProfile {
        name: "evb-mt-1m".into(),
        chip_family: ChipFamily::Mt,
        flash_base: 0,
        flash_size: 0x0010_0000,
        ram_base: 0x2000_0000,
        ram_size: 0x0004_0000,
    }
}

/// Sink recording every fact delivery.
struct Recorder(Arc<Mutex<Vec<Fact>>>);

impl FactSink for Recorder {
    fn on_fact(&mut self, fact: &Fact) {
        self.0.lock().unwrap().push(fact.clone());
    }
}

#[test]
fn test_reconcile_idempotent_per_trigger() {
    let session = BuildSession::new(profile());
    let sel = Selection::new(NodeRole::Service, ProtocolVersion::V1_4);

    let first = session.apply(&sel).unwrap();
    assert!(!first.diff.is_empty());

    // Same selection again: the activation diff must be empty the second
    // time, and the region table identical.
    let second = session.apply(&sel).unwrap();
    assert!(second.diff.is_empty());
    assert_eq!(first.regions, second.regions);
}

#[test]
fn test_role_switch_round_trip() {
    let session = BuildSession::new(profile());
    let service = Selection::new(NodeRole::Service, ProtocolVersion::V1_4)
        .project(ProjectType::SplitApplication);
    let base = Selection::new(NodeRole::Base, ProtocolVersion::V1_3).slave_mode(true);

    let before = session.apply(&service).unwrap();
    session.apply(&base).unwrap();
    let after = session.apply(&service).unwrap();

    // Service -> Base -> Service restores exactly the original state.
    assert_eq!(before.regions, after.regions);
    assert_eq!(before.resolved, after.resolved);

    // And a fourth apply of the same selection proves the activation set
    // settled back to the original (no residue from the base branch).
    assert!(session.apply(&service).unwrap().diff.is_empty());
}

#[test]
fn test_base_slave_reference_scenario() {
    let session = BuildSession::new(profile());
    let resolution = session
        .apply(&Selection::new(NodeRole::Base, ProtocolVersion::V1_3).slave_mode(true))
        .unwrap();

    // Load at the raw flash base, empty region table.
    assert_eq!(resolution.regions.load_address(), 0);
    assert!(resolution.regions.regions().is_empty());

    // Slave bundle: stack wrapper without the management plane.
    let enabled: Vec<ComponentId> = resolution.diff.enabled().collect();
    assert!(enabled.contains(&ComponentId::StackApi));
    assert!(enabled.contains(&ComponentId::HalWrapper));
    assert!(!enabled.contains(&ComponentId::MgmtPlane));
    assert!(enabled.contains(&ComponentId::LibBaseV13Slave));
}

#[test]
fn test_security_profile_lock_cycle() {
    let session = BuildSession::new(profile());
    let v14 = Selection::new(NodeRole::Service, ProtocolVersion::V1_4).security_profile(2);
    let v13 = Selection::new(NodeRole::Service, ProtocolVersion::V1_3).security_profile(2);

    let open = session.apply(&v14).unwrap();
    assert_eq!(open.resolved.security_profile.value, 2);
    assert!(!open.resolved.security_profile.read_only);

    // v1.3 forces 0 and locks the option.
    let locked = session.apply(&v13).unwrap();
    assert_eq!(locked.resolved.security_profile.value, 0);
    assert!(locked.resolved.security_profile.read_only);

    // Back to v1.4: unlocked again, user value honored.
    let reopened = session.apply(&v14).unwrap();
    assert!(!reopened.resolved.security_profile.read_only);
    assert_eq!(reopened.resolved.security_profile.value, 2);
}

#[test]
fn test_facts_reach_sinks_and_queries() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let session = BuildSession::new(profile());
    session.add_sink(Box::new(Recorder(Arc::clone(&log))));

    session
        .apply(
            &Selection::new(NodeRole::Service, ProtocolVersion::V1_4)
                .project(ProjectType::SplitApplication),
        )
        .unwrap();

    // The PHY driver's static addressing window is the PHY partition.
    match session.answer(&FactRequest::Query(FactId::PhyStaticAddress)) {
        FactReply::Value(Fact::PhyStaticAddress(addr)) => assert_eq!(addr, 0xB_8000),
        other => panic!("expected PHY static address, got {other:?}"),
    }

    // The upgrade service sees the service-node scratch size.
    match session.answer(&FactRequest::Query(FactId::UpgradeRegionSize)) {
        FactReply::Value(Fact::UpgradeRegionSize(size)) => assert_eq!(size, 0x4_0000),
        other => panic!("expected upgrade size, got {other:?}"),
    }

    // Version tag is padded to the image-header field width.
    match session.answer(&FactRequest::Query(FactId::FirmwareVersion)) {
        FactReply::Value(Fact::FirmwareVersion(tag)) => {
            assert_eq!(tag.as_str(), "HS14.01.01");
            assert_eq!(tag.as_bytes().len(), 16);
        }
        other => panic!("expected firmware version, got {other:?}"),
    }

    let delivered = log.lock().unwrap();
    assert!(delivered
        .iter()
        .any(|f| matches!(f, Fact::Region { id: RegionId::UserApp, active: true, .. })));
}

#[test]
fn test_republish_suppressed_across_triggers() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let session = BuildSession::new(profile());
    session.add_sink(Box::new(Recorder(Arc::clone(&log))));

    let sel = Selection::new(NodeRole::Service, ProtocolVersion::V1_4);
    session.apply(&sel).unwrap();
    let first_count = log.lock().unwrap().len();

    // Identical selection: every fact value is unchanged, so nothing is
    // forwarded again.
    session.apply(&sel).unwrap();
    assert_eq!(log.lock().unwrap().len(), first_count);
}

#[test]
fn test_upgrade_size_follows_role() {
    let session = BuildSession::new(profile());

    session
        .apply(&Selection::new(NodeRole::Base, ProtocolVersion::V1_4))
        .unwrap();
    match session.answer(&FactRequest::Query(FactId::UpgradeRegionSize)) {
        FactReply::Value(Fact::UpgradeRegionSize(size)) => assert_eq!(size, 0x6_0000),
        other => panic!("expected upgrade size, got {other:?}"),
    }

    session
        .apply(&Selection::new(NodeRole::Service, ProtocolVersion::V1_4))
        .unwrap();
    match session.answer(&FactRequest::Query(FactId::UpgradeRegionSize)) {
        FactReply::Value(Fact::UpgradeRegionSize(size)) => assert_eq!(size, 0x4_0000),
        other => panic!("expected upgrade size, got {other:?}"),
    }
}

#[test]
fn test_reset_is_complement_of_current_state() {
    let session = BuildSession::new(profile());
    let resolution = session
        .apply(&Selection::new(NodeRole::Base, ProtocolVersion::V1_4).rf(true))
        .unwrap();
    let enabled: Vec<ComponentId> = resolution.diff.enabled().collect();

    let diff = session.reset();
    let disabled: Vec<ComponentId> = diff.disabled().collect();
    assert_eq!(enabled, disabled);
    assert_eq!(diff.enabled().count(), 0);

    // After teardown the store is empty too.
    assert_eq!(
        session.answer(&FactRequest::Query(FactId::LoadAddress)),
        FactReply::Failure
    );
}

#[cfg(feature = "profile-loaders")]
#[test]
fn test_profile_file_to_resolution() {
    use std::io::Write;

    // 16 MiB flash base, 2 MiB flash, 512 KiB RAM.
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "name: evb-sg-2m\nchip_family: Sg\nflash_base: 16777216\n\
         flash_size: 2097152\nram_base: 536870912\nram_size: 524288\n"
    )
    .unwrap();

    let profile = TargetProfile::load(file.path()).unwrap();
    assert_eq!(profile.chip_family, ChipFamily::Sg);

    let session = BuildSession::new(profile);
    let resolution = session
        .apply(&Selection::new(NodeRole::Service, ProtocolVersion::V1_4))
        .unwrap();
    assert_eq!(resolution.regions.load_address(), 0x0101_0000);
    assert_eq!(resolution.resolved.fw_model, "NBLC-SG");
}
