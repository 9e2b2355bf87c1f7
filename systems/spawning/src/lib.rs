#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave-driven spawn scheduler for hostile units.
//!
//! The scheduler walks the level's wave list as a plain state machine:
//! waiting for a wave's pre-delay, then emitting its units one spawn
//! interval at a time. The in-progress spawn sequence is a small state
//! record polled once per tick; suspension between emissions is
//! cooperative, never blocking, so the rest of the simulation keeps
//! updating while a wave trickles in. Once the list is exhausted and the
//! field is clear the scheduler declares victory exactly once.

use std::time::Duration;

use rampart_core::{
    level::{LevelDefinition, UnitRouteAssignment, WaveDefinition},
    Command, Event, RouteId, UnitKind,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawn scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    waves: Vec<WaveDefinition>,
    assignments: Vec<UnitRouteAssignment>,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from explicit wave data.
    #[must_use]
    pub const fn new(
        waves: Vec<WaveDefinition>,
        assignments: Vec<UnitRouteAssignment>,
        rng_seed: u64,
    ) -> Self {
        Self {
            waves,
            assignments,
            rng_seed,
        }
    }

    /// Extracts the scheduling configuration from a level definition.
    #[must_use]
    pub fn from_level(level: &LevelDefinition) -> Self {
        Self::new(level.waves.clone(), level.unit_routes.clone(), level.seed)
    }
}

/// Pure system that deterministically emits spawn commands per the schedule.
#[derive(Debug)]
pub struct Spawning {
    waves: Vec<WaveDefinition>,
    assignments: Vec<UnitRouteAssignment>,
    rng: ChaCha8Rng,
    wave_index: usize,
    wave_timer: Duration,
    sequence: Option<SpawnSequence>,
    victory_declared: bool,
    halted: bool,
}

impl Spawning {
    /// Creates a new scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let wave_timer = config
            .waves
            .first()
            .map(WaveDefinition::delay)
            .unwrap_or_default();
        Self {
            waves: config.waves,
            assignments: config.assignments,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            wave_index: 0,
            wave_timer,
            sequence: None,
            victory_declared: false,
            halted: false,
        }
    }

    /// Index of the wave the scheduler will start next.
    ///
    /// Equals the wave count once the whole schedule has been emitted.
    #[must_use]
    pub fn wave_index(&self) -> usize {
        self.wave_index
    }

    /// Reports whether every wave has been fully emitted.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.wave_index >= self.waves.len() && self.sequence.is_none()
    }

    /// Consumes events and the live hostile count to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], hostiles: usize, out: &mut Vec<Command>) {
        if self.halted {
            return;
        }

        let mut dt = Duration::ZERO;
        let mut tick_observed = false;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => {
                    tick_observed = true;
                    dt = dt.saturating_add(*step);
                }
                Event::GameWon | Event::GameLost => {
                    self.halted = true;
                    return;
                }
                _ => {}
            }
        }
        if !tick_observed {
            return;
        }

        if self.sequence.is_some() {
            self.advance_sequence(dt, out);
            return;
        }

        if self.wave_index < self.waves.len() {
            let wave = &self.waves[self.wave_index];
            // A gated wave holds even when its delay already ran out.
            if wave.wait_for_clear && hostiles > 0 {
                return;
            }
            if !self.wave_timer.is_zero() {
                self.wave_timer = self.wave_timer.saturating_sub(dt);
                if !self.wave_timer.is_zero() {
                    return;
                }
            }
            // Pre-load the next wave's delay before this one starts spawning.
            self.wave_timer = self
                .waves
                .get(self.wave_index + 1)
                .map(WaveDefinition::delay)
                .unwrap_or_default();
            self.sequence = Some(SpawnSequence {
                cursor: 0,
                until_next: Duration::ZERO,
            });
            self.advance_sequence(Duration::ZERO, out);
        } else if hostiles == 0 && !self.victory_declared {
            self.victory_declared = true;
            out.push(Command::DeclareVictory);
        }
    }

    fn advance_sequence(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(wave) = self.waves.get(self.wave_index) else {
            self.sequence = None;
            return;
        };
        let interval = wave.spawn_interval();

        let mut finished = false;
        if let Some(sequence) = &mut self.sequence {
            sequence.until_next = sequence.until_next.saturating_sub(dt);
            while sequence.until_next.is_zero() {
                match wave.units.get(sequence.cursor) {
                    Some(&kind) => {
                        sequence.cursor += 1;
                        sequence.until_next = interval;
                        if let Some(route) = choose_route(&self.assignments, &mut self.rng, kind) {
                            out.push(Command::SpawnUnit { kind, route });
                        }
                    }
                    None => {
                        finished = true;
                        break;
                    }
                }
            }
        }

        if finished {
            self.sequence = None;
            self.wave_index += 1;
        }
    }
}

/// Cooperative spawn-in-progress record polled once per tick.
#[derive(Clone, Copy, Debug)]
struct SpawnSequence {
    cursor: usize,
    until_next: Duration,
}

fn choose_route(
    assignments: &[UnitRouteAssignment],
    rng: &mut ChaCha8Rng,
    kind: UnitKind,
) -> Option<RouteId> {
    let routes = assignments
        .iter()
        .find(|assignment| assignment.kind == kind)
        .map(|assignment| assignment.routes.as_slice())
        .unwrap_or(&[]);
    if routes.is_empty() {
        debug_assert!(false, "wave units are validated to have routes");
        return None;
    }
    let index = rng.gen_range(0..routes.len());
    Some(RouteId::new(routes[index]))
}
