#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Rampart Defence levels headless.
//!
//! The binary loads a TOML level definition, drives the fixed-delta
//! simulation loop until the level resolves, and persists campaign
//! progress when the level is won.

mod campaign;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use rampart_core::{level::LevelDefinition, Command, Event, Outcome};
use rampart_system_combat::Combat;
use rampart_system_placement::{Placement, PlacementRequest};
use rampart_system_spawning::{Config as SpawnConfig, Spawning};
use rampart_system_targeting::Targeting;
use rampart_system_telemetry::Telemetry;
use rampart_world::{apply, query, World};

/// Command-line arguments accepted by the headless driver.
#[derive(Debug, Parser)]
#[command(name = "rampart", about = "Runs a Rampart Defence level headless")]
struct Args {
    /// Path to the TOML level definition.
    level: PathBuf,
    /// Simulation tick rate in ticks per second.
    #[arg(long, default_value_t = 30)]
    tick_rate: u32,
    /// Upper bound on simulated ticks before the run is abandoned.
    #[arg(long, default_value_t = 36_000)]
    max_ticks: u64,
    /// Overrides the level's spawn lottery seed.
    #[arg(long)]
    seed: Option<u64>,
    /// File storing the highest level reached across runs.
    #[arg(long, default_value = "campaign-progress.txt")]
    campaign: PathBuf,
}

/// Fixed-delta clock driving every per-tick update.
#[derive(Clone, Copy, Debug)]
struct SimulationClock {
    dt: Duration,
    ticks_remaining: u64,
}

impl SimulationClock {
    fn new(tick_rate: u32, max_ticks: u64) -> Self {
        Self {
            dt: Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))),
            ticks_remaining: max_ticks,
        }
    }

    fn next_tick(&mut self) -> Option<Duration> {
        if self.ticks_remaining == 0 {
            return None;
        }
        self.ticks_remaining -= 1;
        Some(self.dt)
    }
}

/// Entry point for the Rampart Defence command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.level)
        .with_context(|| format!("reading level file {}", args.level.display()))?;
    let mut level: LevelDefinition = toml::from_str(&raw).context("parsing level definition")?;
    if let Some(seed) = args.seed {
        level.seed = seed;
    }

    let mut world = World::from_level(&level).context("building world from level")?;
    let clock = SimulationClock::new(args.tick_rate, args.max_ticks);
    let outcome = run_level(&mut world, &level, clock);

    let economy = query::economy(&world);
    match outcome {
        Some(Outcome::Won) => {
            let next = level.level_number.saturating_add(1);
            let highest = campaign::record_level_reached(&args.campaign, next)
                .context("saving campaign progress")?;
            println!(
                "level {} won: {} kills, {} lives left, {} currency banked",
                level.level_number, economy.kills, economy.lives, economy.currency
            );
            println!("campaign progress: level {highest} unlocked");
        }
        Some(Outcome::Lost) => {
            println!(
                "level {} lost after {} kills",
                level.level_number, economy.kills
            );
        }
        None => println!("tick limit reached before the level resolved"),
    }
    Ok(())
}

fn run_level(
    world: &mut World,
    level: &LevelDefinition,
    mut clock: SimulationClock,
) -> Option<Outcome> {
    let mut spawning = Spawning::new(SpawnConfig::from_level(level));
    let mut targeting = Targeting::new();
    let mut combat = Combat::new();
    let mut placement = Placement::new();
    let mut telemetry = Telemetry::new();

    let mut events: Vec<Event> = Vec::new();
    let mut commands: Vec<Command> = Vec::new();

    // Stage the level's pre-placed defenders through the ordinary placement
    // surface, one confirmed blueprint at a time, in arrival order.
    let requests: Vec<PlacementRequest> = level
        .defenders
        .iter()
        .flat_map(|definition| {
            [
                PlacementRequest::Blueprint {
                    kind: definition.kind,
                    position: Vec3::from_array(definition.position),
                    heading: definition.heading,
                    enforce_spatial_check: true,
                },
                PlacementRequest::Confirm,
            ]
        })
        .collect();
    placement.handle(&events, &requests, &mut commands);
    for command in commands.drain(..) {
        apply(world, command, &mut events);
    }
    for event in &events {
        if let Event::PlacementRejected { kind, reason, .. } = event {
            log::warn!("pre-placed {kind:?} rejected: {reason:?}");
        }
    }

    while let Some(dt) = clock.next_tick() {
        events.clear();
        apply(world, Command::Tick { dt }, &mut events);

        let units = query::unit_view(world);
        let defenders = query::defender_view(world);
        spawning.handle(&events, query::hostile_count(world), &mut commands);
        targeting.handle(&events, &defenders, &units, &mut commands);
        combat.handle(&events, &defenders, &mut commands);
        for command in commands.drain(..) {
            apply(world, command, &mut events);
        }

        let defenders = query::defender_view(world);
        let mut published = Vec::new();
        telemetry.handle(&events, &defenders, &mut published);
        for event in published {
            if let Event::TelemetryUpdated { report } = event {
                log::debug!(
                    "tick {}: {} kills, {:.0} damage dealt",
                    query::tick_index(world),
                    report.kills,
                    report.damage_dealt
                );
            }
        }

        if let Some(outcome) = query::outcome(world) {
            return Some(outcome);
        }
    }
    None
}
