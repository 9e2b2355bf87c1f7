#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps defender target locks consistent with the field.
//!
//! Each tick the system drops locks on units that moved out of range and
//! scans the live units for better candidates. A candidate only displaces
//! the current lock when it is closer by more than the defender's switch
//! margin, so two units at similar distances never cause oscillation.

use glam::Vec3;
use rampart_core::{Command, DefenderView, Event, UnitId, UnitView};

/// Targeting system that reuses a scratch buffer across scans.
#[derive(Debug, Default)]
pub struct Targeting {
    candidates: Vec<Candidate>,
}

impl Targeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit retarget commands.
    ///
    /// Scans run once per observed tick; without a `TimeAdvanced` event the
    /// call leaves the output untouched.
    pub fn handle(
        &mut self,
        events: &[Event],
        defenders: &DefenderView,
        units: &UnitView,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        self.candidates.clear();
        self.candidates.extend(units.iter().map(|unit| Candidate {
            id: unit.id,
            position: unit.position,
        }));

        for defender in defenders.iter() {
            let range = defender.kind.firing_range();
            let margin = defender.kind.switch_margin();

            let mut selection: Option<(UnitId, f32)> = defender.target.and_then(|target| {
                units
                    .find(target)
                    .map(|unit| (target, unit.position.distance(defender.position)))
            });

            let mut lock_lost = defender.target.is_some() && selection.is_none();
            if let Some((_, distance)) = selection {
                if distance > range {
                    selection = None;
                    lock_lost = true;
                }
            }

            for candidate in &self.candidates {
                let distance = candidate.position.distance(defender.position);
                if distance > range {
                    continue;
                }
                let switch = match selection {
                    None => true,
                    Some((_, current_distance)) => distance + margin < current_distance,
                };
                if switch {
                    selection = Some((candidate.id, distance));
                }
            }

            match selection {
                Some((unit, _)) if defender.target != Some(unit) => {
                    out.push(Command::AcquireTarget {
                        defender: defender.id,
                        unit,
                    });
                }
                None if lock_lost => out.push(Command::ClearTarget {
                    defender: defender.id,
                }),
                _ => {}
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    id: UnitId,
    position: Vec3,
}
