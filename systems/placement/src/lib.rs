#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command surface translating build, upgrade, and sale requests into world
//! commands.
//!
//! Human players and external controllers issue the same requests through
//! the same entry point; requests are processed strictly in arrival order,
//! which is the serialization policy when two sources act within one tick.
//! The system owns the transient interaction state: the staged blueprint
//! awaiting confirmation and the currently selected defender.

use glam::Vec3;
use rampart_core::{Command, DefenderId, DefenderKind, Event};

/// Requests accepted from input, UI, or controller collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlacementRequest {
    /// Stages a blueprint at the provided location.
    Blueprint {
        /// Kind of defender to construct.
        kind: DefenderKind,
        /// World-space position under the pointer.
        position: Vec3,
        /// Heading the defender is constructed with.
        heading: f32,
        /// Whether terrain flatness and proximity checks gate the build.
        enforce_spatial_check: bool,
    },
    /// Confirms the staged blueprint.
    Confirm,
    /// Discards the staged blueprint.
    Cancel,
    /// Requests an upgrade of the referenced defender.
    Upgrade {
        /// Defender targeted for the upgrade.
        defender: DefenderId,
    },
    /// Requests a sale of the referenced defender.
    Sell {
        /// Defender targeted for the sale.
        defender: DefenderId,
    },
    /// Selects the referenced defender, or deselects it when already chosen.
    ToggleSelection {
        /// Defender under the pointer.
        defender: DefenderId,
    },
}

/// Blueprint staged by a placement request, awaiting confirmation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingPlacement {
    /// Kind of defender to construct.
    pub kind: DefenderKind,
    /// World-space position of the staged blueprint.
    pub position: Vec3,
    /// Heading the defender is constructed with.
    pub heading: f32,
    /// Whether terrain flatness and proximity checks gate the build.
    pub enforce_spatial_check: bool,
}

/// Placement system holding blueprint and selection state.
#[derive(Debug, Default)]
pub struct Placement {
    pending: Option<PendingPlacement>,
    selected: Option<DefenderId>,
}

impl Placement {
    /// Creates a new placement system with nothing staged or selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blueprint currently awaiting confirmation, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingPlacement> {
        self.pending.as_ref()
    }

    /// Defender currently selected for upgrade or sale panels, if any.
    #[must_use]
    pub fn selected(&self) -> Option<DefenderId> {
        self.selected
    }

    /// Consumes world events and caller requests to emit build commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        requests: &[PlacementRequest],
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::DefenderSold { defender, .. }
                | Event::DefenderUpgraded { defender, .. } => {
                    // The referenced defender no longer exists; keeping the
                    // selection would leave a dangling reference.
                    if self.selected == Some(*defender) {
                        self.selected = None;
                    }
                }
                _ => {}
            }
        }

        for request in requests {
            match *request {
                PlacementRequest::Blueprint {
                    kind,
                    position,
                    heading,
                    enforce_spatial_check,
                } => {
                    if self.pending.is_none() {
                        self.pending = Some(PendingPlacement {
                            kind,
                            position,
                            heading,
                            enforce_spatial_check,
                        });
                        self.selected = None;
                    }
                }
                PlacementRequest::Confirm => {
                    if let Some(pending) = self.pending.take() {
                        out.push(Command::PlaceDefender {
                            kind: pending.kind,
                            position: pending.position,
                            heading: pending.heading,
                            enforce_spatial_check: pending.enforce_spatial_check,
                        });
                    }
                }
                PlacementRequest::Cancel => self.pending = None,
                PlacementRequest::Upgrade { defender } => {
                    out.push(Command::UpgradeDefender { defender });
                }
                PlacementRequest::Sell { defender } => {
                    out.push(Command::SellDefender { defender });
                }
                PlacementRequest::ToggleSelection { defender } => {
                    self.selected = if self.selected == Some(defender) {
                        None
                    } else {
                        Some(defender)
                    };
                }
            }
        }
    }
}
