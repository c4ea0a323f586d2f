// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tracked activation state and reconciliation.

use super::universe::{verify_flavor, ComponentId, ComponentSet};
use crate::resolver::ConfigBranch;

// =======================================================================
// Diff
// =======================================================================

/// Direction of one activation instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Turn the component's file-set/capability on.
    Enable,
    /// Turn it off.
    Disable,
}

/// One instruction for the host's activation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationCommand {
    /// Target component.
    pub component: ComponentId,
    /// Direction.
    pub action: Action,
}

/// Minimal instruction list moving the tracked state to a target set.
///
/// Disables are ordered before enables so a bundle switch never has two
/// flavors active at once; a component present in both the old and the
/// new set produces no instruction at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationDiff {
    commands: Vec<ActivationCommand>,
}

impl ActivationDiff {
    /// All instructions, disables first.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[ActivationCommand] {
        &self.commands
    }

    /// Whether the reconcile was a no-op.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Components being enabled.
    pub fn enabled(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.commands
            .iter()
            .filter(|c| c.action == Action::Enable)
            .map(|c| c.component)
    }

    /// Components being disabled.
    pub fn disabled(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.commands
            .iter()
            .filter(|c| c.action == Action::Disable)
            .map(|c| c.component)
    }
}

// =======================================================================
// Engine
// =======================================================================

/// Owns the one piece of persistent state in the configurator: which
/// managed components are currently enabled.
///
/// Everything else is derived and recomputed per trigger; this table must
/// be diffed because the host primitive is not idempotent.
#[derive(Debug, Default)]
pub struct ActivationEngine {
    active: ComponentSet,
}

impl ActivationEngine {
    /// Engine with nothing enabled (fresh host project).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently enabled components.
    #[inline]
    #[must_use]
    pub fn active(&self) -> ComponentSet {
        self.active
    }

    /// Reconcile the tracked state against a branch's target set.
    ///
    /// Never fails: a flavor conflict in the target is logged and
    /// repaired by disabling the extra flavor before diffing.
    pub fn reconcile(&mut self, target: ComponentSet, branch: ConfigBranch) -> ActivationDiff {
        let target = match verify_flavor(&target, branch) {
            Ok(()) => target,
            Err(err) => {
                log::error!("[activation] {err}; disabling the conflicting flavor");
                repair_flavor(target, branch)
            }
        };

        let mut commands = Vec::new();
        for id in ComponentId::ALL {
            if self.active.contains(id) && !target.contains(id) {
                commands.push(ActivationCommand {
                    component: id,
                    action: Action::Disable,
                });
            }
        }
        for id in ComponentId::ALL {
            if !self.active.contains(id) && target.contains(id) {
                commands.push(ActivationCommand {
                    component: id,
                    action: Action::Enable,
                });
            }
        }

        if !commands.is_empty() {
            log::info!(
                "[activation] {} -> {} components ({} instructions)",
                self.active.len(),
                target.len(),
                commands.len()
            );
        }

        self.active = target;
        ActivationDiff { commands }
    }

    /// Disable every managed component (teardown / unconfigured floor).
    pub fn reconcile_empty(&mut self) -> ActivationDiff {
        self.reconcile(ComponentSet::new(), ConfigBranch::Unconfigured)
    }
}

/// Keep the first library in universe order, drop the rest; a
/// source-flavor branch keeps none.
fn repair_flavor(set: ComponentSet, branch: ConfigBranch) -> ComponentSet {
    let source_build = matches!(branch, ConfigBranch::ServiceBin { .. });
    let mut repaired = set;
    let mut kept_one = false;
    for id in set.iter().filter(ComponentId::is_library) {
        if source_build || kept_one {
            repaired.remove(id);
        } else {
            kept_one = true;
        }
    }
    repaired
}

// =======================================================================
// Tests
// =======================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProtocolVersion;

    fn branch() -> ConfigBranch {
        ConfigBranch::Base {
            version: ProtocolVersion::V1_4,
            slave_mode: false,
        }
    }

    fn set(ids: &[ComponentId]) -> ComponentSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_first_reconcile_enables_everything() {
        let mut engine = ActivationEngine::new();
        let target = set(&[ComponentId::StackApi, ComponentId::SrvQueue]);
        let diff = engine.reconcile(target, branch());
        assert_eq!(diff.enabled().count(), 2);
        assert_eq!(diff.disabled().count(), 0);
        assert_eq!(engine.active(), target);
    }

    #[test]
    fn test_second_reconcile_is_noop() {
        let mut engine = ActivationEngine::new();
        let target = set(&[ComponentId::StackApi, ComponentId::SrvQueue]);
        engine.reconcile(target, branch());
        let diff = engine.reconcile(target, branch());
        assert!(diff.is_empty());
    }

    #[test]
    fn test_shared_component_not_cycled() {
        let mut engine = ActivationEngine::new();
        engine.reconcile(
            set(&[ComponentId::StackApi, ComponentId::MgmtPlane]),
            branch(),
        );
        let diff = engine.reconcile(
            set(&[ComponentId::StackApi, ComponentId::ApiClient]),
            branch(),
        );

        // StackApi is in both sets: no instruction for it in either
        // direction.
        assert!(diff
            .commands()
            .iter()
            .all(|c| c.component != ComponentId::StackApi));
        assert_eq!(diff.disabled().collect::<Vec<_>>(), [ComponentId::MgmtPlane]);
        assert_eq!(diff.enabled().collect::<Vec<_>>(), [ComponentId::ApiClient]);
    }

    #[test]
    fn test_disables_ordered_before_enables() {
        let mut engine = ActivationEngine::new();
        engine.reconcile(set(&[ComponentId::LibBaseV14]), branch());
        let diff = engine.reconcile(
            set(&[ComponentId::LibBaseV13]),
            ConfigBranch::Base {
                version: ProtocolVersion::V1_3,
                slave_mode: false,
            },
        );
        let actions: Vec<Action> = diff.commands().iter().map(|c| c.action).collect();
        assert_eq!(actions, [Action::Disable, Action::Enable]);
    }

    #[test]
    fn test_reconcile_empty_is_complement() {
        let mut engine = ActivationEngine::new();
        engine.reconcile(
            set(&[ComponentId::StackApi, ComponentId::SrvCrc, ComponentId::PalPlc]),
            branch(),
        );
        let diff = engine.reconcile_empty();
        assert_eq!(diff.disabled().count(), 3);
        assert_eq!(diff.enabled().count(), 0);
        assert!(engine.active().is_empty());
    }

    #[test]
    fn test_conflicting_target_repaired() {
        let mut engine = ActivationEngine::new();
        let diff = engine.reconcile(
            set(&[ComponentId::LibBaseV13, ComponentId::LibBaseV14]),
            branch(),
        );
        // Only the first flavor in universe order survives.
        assert_eq!(diff.enabled().collect::<Vec<_>>(), [ComponentId::LibBaseV13]);
        assert!(!engine.active().contains(ComponentId::LibBaseV14));
    }

    #[test]
    fn test_source_build_sheds_library() {
        let mut engine = ActivationEngine::new();
        let bin = ConfigBranch::ServiceBin {
            version: ProtocolVersion::V1_4,
        };
        let diff = engine.reconcile(
            set(&[ComponentId::StackApi, ComponentId::LibServiceV14]),
            bin,
        );
        assert_eq!(diff.enabled().collect::<Vec<_>>(), [ComponentId::StackApi]);
    }
}
