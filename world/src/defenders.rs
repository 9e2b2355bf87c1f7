//! Authoritative defender state management utilities.

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec3;
use rampart_core::{DefenderId, DefenderKind, DefenderSnapshot, UnitId};

/// Mutable state of a defender stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct DefenderState {
    /// Kind of defender that was constructed.
    pub(crate) kind: DefenderKind,
    /// World-space position of the defender base.
    pub(crate) position: Vec3,
    /// Heading in radians around the vertical axis.
    pub(crate) heading: f32,
    /// Unit currently tracked, if any.
    pub(crate) target: Option<UnitId>,
    /// Time remaining until the next shot is ready.
    pub(crate) ready_in: Duration,
    /// Whether the defender has discharged at least once.
    pub(crate) has_fired_once: bool,
}

/// Registry that stores defenders and manages identifier allocation.
#[derive(Debug, Default)]
pub(crate) struct DefenderRegistry {
    entries: BTreeMap<DefenderId, DefenderState>,
    next_defender_id: u32,
}

impl DefenderRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a freshly constructed defender and returns its identifier.
    pub(crate) fn insert(&mut self, kind: DefenderKind, position: Vec3, heading: f32) -> DefenderId {
        let id = DefenderId::new(self.next_defender_id);
        self.next_defender_id = self.next_defender_id.saturating_add(1);
        let _ = self.entries.insert(
            id,
            DefenderState {
                kind,
                position,
                heading,
                target: None,
                ready_in: Duration::ZERO,
                has_fired_once: false,
            },
        );
        id
    }

    /// Removes a defender, returning its final state when it existed.
    pub(crate) fn remove(&mut self, id: DefenderId) -> Option<DefenderState> {
        self.entries.remove(&id)
    }

    /// Shared access to a stored defender.
    pub(crate) fn get(&self, id: DefenderId) -> Option<&DefenderState> {
        self.entries.get(&id)
    }

    /// Mutable access to a stored defender.
    pub(crate) fn get_mut(&mut self, id: DefenderId) -> Option<&mut DefenderState> {
        self.entries.get_mut(&id)
    }

    /// Iterator over defenders in deterministic identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (DefenderId, &DefenderState)> {
        self.entries.iter().map(|(id, state)| (*id, state))
    }

    /// Mutable iterator over defenders in deterministic identifier order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (DefenderId, &mut DefenderState)> {
        self.entries.iter_mut().map(|(id, state)| (*id, state))
    }

    /// Reports whether any stored defender overlaps the candidate footprint.
    pub(crate) fn overlaps(&self, position: Vec3, collision_radius: f32) -> bool {
        self.entries.values().any(|state| {
            state.position.distance(position) < collision_radius + state.kind.collision_radius()
        })
    }

    /// Captures snapshots of every stored defender.
    pub(crate) fn snapshots(&self) -> Vec<DefenderSnapshot> {
        self.entries
            .iter()
            .map(|(id, state)| DefenderSnapshot {
                id: *id,
                kind: state.kind,
                position: state.position,
                heading: state.heading,
                target: state.target,
                ready_in: state.ready_in,
                has_fired_once: state.has_fired_once,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::DefenderRegistry;
    use glam::Vec3;
    use rampart_core::DefenderKind;

    #[test]
    fn identifiers_are_never_reused() {
        let mut registry = DefenderRegistry::new();
        let first = registry.insert(DefenderKind::Cannon, Vec3::ZERO, 0.0);
        assert!(registry.remove(first).is_some());
        let second = registry.insert(DefenderKind::Cannon, Vec3::ZERO, 0.0);
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
    }

    #[test]
    fn overlap_uses_combined_collision_radii() {
        let mut registry = DefenderRegistry::new();
        let _ = registry.insert(DefenderKind::Cannon, Vec3::new(50.0, 10.0, 50.0), 0.0);

        // Cannon collision radius is 12, so 12 + 12 = 24 is the threshold.
        let near = Vec3::new(70.0, 10.0, 50.0);
        let far = Vec3::new(80.0, 10.0, 50.0);
        assert!(registry.overlaps(near, DefenderKind::Cannon.collision_radius()));
        assert!(!registry.overlaps(far, DefenderKind::Cannon.collision_radius()));
    }

    #[test]
    fn snapshots_follow_identifier_order() {
        let mut registry = DefenderRegistry::new();
        let first = registry.insert(DefenderKind::Beam, Vec3::ZERO, 0.0);
        let second = registry.insert(DefenderKind::Missile, Vec3::ONE, 1.0);
        let snapshots = registry.snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, first);
        assert_eq!(snapshots[1].id, second);
    }
}
