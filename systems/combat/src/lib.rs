#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits firing commands for defenders holding targets.
//!
//! Projectile defenders fire whenever their rate timer has elapsed; beam
//! defenders re-apply their continuous damage every tick a lock is held.
//! Firing cadence is therefore independent from the aim update, which the
//! world performs on its own while executing ticks.

use rampart_core::{Command, DefenderView, Event, FireMode};

/// Combat system that queues firing commands for engaged defenders.
#[derive(Debug, Default)]
pub struct Combat;

impl Combat {
    /// Creates a new combat system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits fire commands for every defender that is ready and engaged.
    pub fn handle(&mut self, events: &[Event], defenders: &DefenderView, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for defender in defenders.iter() {
            let Some(target) = defender.target else {
                continue;
            };
            match defender.kind.fire_mode() {
                FireMode::Projectile { .. } => {
                    if defender.ready_in.is_zero() {
                        out.push(Command::FireProjectile {
                            defender: defender.id,
                            target,
                        });
                    }
                }
                FireMode::Beam { .. } => out.push(Command::ApplyBeam {
                    defender: defender.id,
                    target,
                }),
            }
        }
    }
}
