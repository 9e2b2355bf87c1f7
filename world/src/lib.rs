#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rampart Defence.
//!
//! The world owns every mutable simulation collection: hostile units,
//! defenders, in-flight projectiles, and the treasury. Adapters and systems
//! never touch those collections directly; all mutation funnels through
//! [`apply`], which executes one [`Command`] at a time and reports what
//! happened through [`Event`] values. This keeps every tick single-writer
//! and guarantees that no system can observe a half-removed unit.

mod defenders;
mod economy;
mod terrain;

pub use terrain::ElevationField;

use std::time::Duration;

use glam::{Vec2, Vec3};
use rampart_core::{
    level::{LevelDefinition, LevelError},
    Command, DefenderId, Event, FireMode, Health, Outcome, PlacementError, ProjectileId, RouteId,
    UnitId, UnitKind, UpgradeError,
};

use crate::{defenders::DefenderRegistry, economy::Economy};

/// Distance at which a unit counts as having arrived at a waypoint.
const ARRIVAL_TOLERANCE: f32 = 15.0;
/// Distance at which a projectile counts as having contacted its target.
const CONTACT_RADIUS: f32 = 4.0;

/// Ordered waypoint sequence hostile units follow toward the base.
///
/// Routes are immutable after construction; units reference them by
/// [`RouteId`] and never own them.
#[derive(Clone, Debug)]
pub struct Route {
    waypoints: Vec<Vec3>,
}

impl Route {
    fn new(waypoints: Vec<Vec3>) -> Self {
        debug_assert!(!waypoints.is_empty(), "routes are validated as non-empty");
        Self { waypoints }
    }

    /// World-space spawn point of the route.
    #[must_use]
    pub fn start(&self) -> Vec3 {
        self.waypoints.first().copied().unwrap_or(Vec3::ZERO)
    }

    /// Waypoint at the provided index, if any.
    #[must_use]
    pub fn waypoint(&self, index: u32) -> Option<Vec3> {
        self.waypoints.get(index as usize).copied()
    }

    /// Number of waypoints in the route.
    #[must_use]
    pub fn waypoint_count(&self) -> u32 {
        self.waypoints.len() as u32
    }
}

/// Represents the authoritative Rampart Defence world state.
#[derive(Debug)]
pub struct World {
    routes: Vec<Route>,
    terrain: ElevationField,
    economy: Economy,
    speed_multiplier: f32,
    sell_return_percent: u32,
    units: Vec<UnitState>,
    next_unit_id: u32,
    defenders: DefenderRegistry,
    projectiles: Vec<ProjectileState>,
    next_projectile_id: u32,
    outcome: Option<Outcome>,
    tick_index: u64,
    tick_dt: Duration,
}

impl World {
    /// Creates a world from a level definition, validating it first.
    pub fn from_level(level: &LevelDefinition) -> Result<Self, LevelError> {
        level.validate()?;
        let routes = level
            .routes
            .iter()
            .map(|route| Route::new(route.waypoints.iter().copied().map(Vec3::from_array).collect()))
            .collect();
        Ok(Self {
            routes,
            terrain: ElevationField::from_definition(&level.terrain),
            economy: Economy::new(level.starting_currency, level.starting_lives),
            speed_multiplier: level.speed_multiplier,
            sell_return_percent: level.sell_return_percent,
            units: Vec::new(),
            next_unit_id: 0,
            defenders: DefenderRegistry::new(),
            projectiles: Vec::new(),
            next_projectile_id: 0,
            outcome: None,
            tick_index: 0,
            tick_dt: Duration::ZERO,
        })
    }

    fn allocate_unit_id(&mut self) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.saturating_add(1);
        id
    }

    fn allocate_projectile_id(&mut self) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.saturating_add(1);
        id
    }

    fn unit_index(&self, unit: UnitId) -> Option<usize> {
        self.units.iter().position(|state| state.id == unit)
    }

    /// Drops slow effects that no beam refreshed since the previous tick.
    fn expire_slows(&mut self) {
        for unit in &mut self.units {
            if unit.slow_refreshed {
                unit.slow_refreshed = false;
            } else {
                unit.slow_factor = 0.0;
            }
        }
    }

    fn advance_units(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let step_seconds = dt.as_secs_f32();
        let mut breached: Vec<UnitId> = Vec::new();

        for unit in &mut self.units {
            let Some(route) = self.routes.get(unit.route.get() as usize) else {
                continue;
            };
            let speed = unit.kind.base_speed()
                * self.speed_multiplier
                * (1.0 - unit.slow_factor).max(0.0);
            let travel = speed * step_seconds;

            match route.waypoint(unit.waypoint_index) {
                Some(waypoint) => {
                    let offset = waypoint - unit.position;
                    let distance = offset.length();
                    if distance <= ARRIVAL_TOLERANCE {
                        unit.waypoint_index = unit.waypoint_index.saturating_add(1);
                        if unit.waypoint_index >= route.waypoint_count() {
                            breached.push(unit.id);
                        }
                    } else {
                        unit.position += offset / distance * travel.min(distance);
                    }
                }
                None => breached.push(unit.id),
            }
        }

        for unit in breached {
            self.resolve_breach(unit, out_events);
        }
    }

    fn resolve_breach(&mut self, unit: UnitId, out_events: &mut Vec<Event>) {
        if !self.remove_unit(unit, out_events) {
            return;
        }
        let lives_remaining = self.economy.lose_life();
        out_events.push(Event::UnitReachedBase {
            unit,
            lives_remaining,
        });
        if lives_remaining == 0 && self.outcome.is_none() {
            self.outcome = Some(Outcome::Lost);
            out_events.push(Event::GameLost);
        }
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let step_seconds = dt.as_secs_f32();
        let mut projectiles = std::mem::take(&mut self.projectiles);
        let mut index = 0;

        while index < projectiles.len() {
            let projectile = &mut projectiles[index];
            let Some(target_index) = self.unit_index(projectile.target) else {
                out_events.push(Event::ProjectileExpired {
                    projectile: projectile.id,
                });
                let _ = projectiles.remove(index);
                continue;
            };

            let target_position = self.units[target_index].position;
            let offset = target_position - projectile.position;
            let distance = offset.length();
            let travel = projectile.speed * step_seconds;

            if distance - travel <= CONTACT_RADIUS {
                let resolved = *projectile;
                let _ = projectiles.remove(index);
                self.resolve_impact(&resolved, target_position, out_events);
                out_events.push(Event::ProjectileExpired {
                    projectile: resolved.id,
                });
                continue;
            }

            if distance > f32::EPSILON {
                projectile.position += offset / distance * travel;
            }
            index += 1;
        }

        self.projectiles = projectiles;
    }

    fn resolve_impact(
        &mut self,
        projectile: &ProjectileState,
        impact: Vec3,
        out_events: &mut Vec<Event>,
    ) {
        if projectile.explosion_radius > 0.0 {
            let affected: Vec<UnitId> = self
                .units
                .iter()
                .filter(|unit| unit.position.distance(impact) <= projectile.explosion_radius)
                .map(|unit| unit.id)
                .collect();
            for unit in affected {
                self.damage_unit(unit, projectile.damage, out_events);
            }
        } else {
            self.damage_unit(projectile.target, projectile.damage, out_events);
        }
    }

    fn damage_unit(&mut self, unit: UnitId, amount: f32, out_events: &mut Vec<Event>) {
        let Some(index) = self.unit_index(unit) else {
            return;
        };
        let removed = self.units[index].health.apply_damage(amount);
        if removed > 0.0 {
            out_events.push(Event::UnitDamaged {
                unit,
                amount: removed,
            });
        }
        if self.units[index].health.is_depleted() {
            let reward = self.units[index].kind.reward();
            self.economy.record_kill(reward);
            out_events.push(Event::UnitDied { unit, reward });
            let _ = self.remove_unit(unit, out_events);
        }
    }

    /// Removes a unit and synchronously drops every reference held to it.
    fn remove_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> bool {
        let Some(index) = self.unit_index(unit) else {
            return false;
        };
        let _ = self.units.remove(index);
        for (id, state) in self.defenders.iter_mut() {
            if state.target == Some(unit) {
                state.target = None;
                out_events.push(Event::TargetCleared { defender: id });
            }
        }
        true
    }

    fn update_defenders(&mut self, dt: Duration) {
        let step_seconds = dt.as_secs_f32();
        let units = &self.units;
        for (_, state) in self.defenders.iter_mut() {
            state.ready_in = state.ready_in.saturating_sub(dt);

            let Some(target) = state.target else {
                continue;
            };
            let Some(unit) = units.iter().find(|unit| unit.id == target) else {
                continue;
            };

            // Rotation stays in the horizontal plane; height is ignored.
            let offset = unit.position - state.position;
            let planar = Vec2::new(offset.x, offset.z);
            if planar.length_squared() <= f32::EPSILON {
                continue;
            }
            let desired = planar.x.atan2(planar.y);
            let blend = (state.kind.rotation_speed() * step_seconds).min(1.0);
            state.heading = wrap_angle(state.heading + wrap_angle(desired - state.heading) * blend);
        }
    }

    /// Clears the slow a beam defender was maintaining on the provided unit.
    fn release_slow(&mut self, defender: DefenderId, unit: UnitId) {
        let Some(state) = self.defenders.get(defender) else {
            return;
        };
        if !state.kind.is_beam() {
            return;
        }
        if let Some(index) = self.unit_index(unit) {
            self.units[index].slow_factor = 0.0;
            self.units[index].slow_refreshed = false;
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.tick_dt = dt;
            out_events.push(Event::TimeAdvanced { dt });
            if world.outcome.is_none() {
                world.expire_slows();
                world.advance_units(dt, out_events);
                world.advance_projectiles(dt, out_events);
                world.update_defenders(dt);
            }
        }
        Command::SpawnUnit { kind, route } => {
            if world.outcome.is_some() {
                return;
            }
            let Some(start) = world.routes.get(route.get() as usize).map(Route::start) else {
                log::warn!("spawn request references unknown route {}", route.get());
                return;
            };
            let id = world.allocate_unit_id();
            world.units.push(UnitState {
                id,
                kind,
                route,
                position: start,
                waypoint_index: 0,
                health: Health::at_maximum(kind.max_health()),
                slow_factor: 0.0,
                slow_refreshed: false,
            });
            out_events.push(Event::UnitSpawned {
                unit: id,
                kind,
                route,
            });
        }
        Command::AcquireTarget { defender, unit } => {
            if world.unit_index(unit).is_none() {
                return;
            }
            let Some(previous) = world.defenders.get(defender).map(|state| state.target) else {
                return;
            };
            if previous == Some(unit) {
                return;
            }
            if let Some(previous_unit) = previous {
                world.release_slow(defender, previous_unit);
            }
            if let Some(state) = world.defenders.get_mut(defender) {
                state.target = Some(unit);
            }
            out_events.push(Event::TargetAcquired { defender, unit });
        }
        Command::ClearTarget { defender } => {
            let Some(previous) = world.defenders.get(defender).and_then(|state| state.target)
            else {
                return;
            };
            world.release_slow(defender, previous);
            if let Some(state) = world.defenders.get_mut(defender) {
                state.target = None;
            }
            out_events.push(Event::TargetCleared { defender });
        }
        Command::FireProjectile { defender, target } => {
            if world.outcome.is_some() || world.unit_index(target).is_none() {
                return;
            }
            let Some(state) = world.defenders.get(defender) else {
                return;
            };
            if !state.ready_in.is_zero() {
                return;
            }
            let FireMode::Projectile {
                fire_rate,
                damage,
                speed,
                explosion_radius,
            } = state.kind.fire_mode()
            else {
                return;
            };
            let position = state.position;
            let id = world.allocate_projectile_id();
            world.projectiles.push(ProjectileState {
                id,
                position,
                speed,
                damage,
                explosion_radius,
                target,
            });
            if let Some(state) = world.defenders.get_mut(defender) {
                state.ready_in = cooldown_for(fire_rate);
                state.has_fired_once = true;
            }
            out_events.push(Event::ProjectileFired {
                projectile: id,
                defender,
                target,
            });
        }
        Command::ApplyBeam { defender, target } => {
            if world.outcome.is_some() {
                return;
            }
            let Some(state) = world.defenders.get(defender) else {
                return;
            };
            if state.target != Some(target) {
                return;
            }
            let FireMode::Beam {
                damage_per_second,
                slow_factor,
            } = state.kind.fire_mode()
            else {
                return;
            };
            let dt = world.tick_dt.as_secs_f32();
            if let Some(state) = world.defenders.get_mut(defender) {
                state.has_fired_once = true;
            }
            if let Some(index) = world.unit_index(target) {
                let unit = &mut world.units[index];
                unit.slow_factor = unit.slow_factor.max(slow_factor);
                unit.slow_refreshed = true;
            }
            world.damage_unit(target, damage_per_second * dt, out_events);
        }
        Command::PlaceDefender {
            kind,
            position,
            heading,
            enforce_spatial_check,
        } => {
            if enforce_spatial_check {
                if !world.terrain.is_flat_circle(position, kind.footprint_radius()) {
                    out_events.push(Event::PlacementRejected {
                        kind,
                        position,
                        reason: PlacementError::IllegalLocation,
                    });
                    return;
                }
                if world.defenders.overlaps(position, kind.collision_radius()) {
                    out_events.push(Event::PlacementRejected {
                        kind,
                        position,
                        reason: PlacementError::TooCloseToExisting,
                    });
                    return;
                }
            }
            if !world.economy.can_afford(kind.cost()) {
                out_events.push(Event::PlacementRejected {
                    kind,
                    position,
                    reason: PlacementError::InsufficientFunds,
                });
                return;
            }
            world.economy.debit(kind.cost());
            let defender = world.defenders.insert(kind, position, heading);
            out_events.push(Event::DefenderPlaced {
                defender,
                kind,
                position,
            });
        }
        Command::UpgradeDefender { defender } => {
            let Some(state) = world.defenders.get(defender) else {
                out_events.push(Event::UpgradeRejected {
                    defender,
                    reason: UpgradeError::MissingDefender,
                });
                return;
            };
            let Some(upgraded_kind) = state.kind.upgrade() else {
                out_events.push(Event::UpgradeRejected {
                    defender,
                    reason: UpgradeError::NoUpgradeAvailable,
                });
                return;
            };
            let cost = state.kind.upgrade_cost();
            if !world.economy.can_afford(cost) {
                out_events.push(Event::UpgradeRejected {
                    defender,
                    reason: UpgradeError::InsufficientFunds,
                });
                return;
            }
            let position = state.position;
            let heading = state.heading;
            let previous_target = state.target;
            if let Some(unit) = previous_target {
                world.release_slow(defender, unit);
            }
            world.economy.debit(cost);
            let _ = world.defenders.remove(defender);
            let upgraded = world.defenders.insert(upgraded_kind, position, heading);
            out_events.push(Event::DefenderUpgraded {
                defender,
                upgraded,
                kind: upgraded_kind,
            });
        }
        Command::SellDefender { defender } => {
            let Some(state) = world.defenders.get(defender) else {
                out_events.push(Event::SellRejected { defender });
                return;
            };
            let refund = sell_refund(state.kind.cost(), world.sell_return_percent);
            if let Some(unit) = state.target {
                world.release_slow(defender, unit);
            }
            let _ = world.defenders.remove(defender);
            world.economy.credit(refund);
            out_events.push(Event::DefenderSold { defender, refund });
        }
        Command::DeclareVictory => {
            if world.outcome.is_none() && world.units.is_empty() {
                world.outcome = Some(Outcome::Won);
                out_events.push(Event::GameWon);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use rampart_core::{
        DefenderId, DefenderView, EconomySnapshot, Outcome, ProjectileSnapshot, ProjectileView,
        UnitSnapshot, UnitView,
    };

    use super::{Route, World};

    /// Captures a read-only view of the hostile units on the field.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(
            world
                .units
                .iter()
                .map(|unit| UnitSnapshot {
                    id: unit.id,
                    kind: unit.kind,
                    position: unit.position,
                    health: unit.health,
                    route: unit.route,
                    waypoint_index: unit.waypoint_index,
                    slow_factor: unit.slow_factor,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of the defenders on the field.
    #[must_use]
    pub fn defender_view(world: &World) -> DefenderView {
        DefenderView::from_snapshots(world.defenders.snapshots())
    }

    /// Captures a read-only view of the in-flight projectiles.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(
            world
                .projectiles
                .iter()
                .map(|projectile| ProjectileSnapshot {
                    id: projectile.id,
                    position: projectile.position,
                    damage: projectile.damage,
                    explosion_radius: projectile.explosion_radius,
                    target: projectile.target,
                })
                .collect(),
        )
    }

    /// Captures the treasury balances.
    #[must_use]
    pub fn economy(world: &World) -> EconomySnapshot {
        world.economy.snapshot()
    }

    /// Terminal result of the run, once reached.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Number of hostile units currently on the field.
    #[must_use]
    pub fn hostile_count(world: &World) -> usize {
        world.units.len()
    }

    /// Routes hostile units follow toward the base.
    #[must_use]
    pub fn routes(world: &World) -> &[Route] {
        &world.routes
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether the footprint around `center` accepts a defender base.
    ///
    /// Placement previews use this before submitting a build command.
    #[must_use]
    pub fn is_flat_site(world: &World, center: Vec3, radius: i32) -> bool {
        world.terrain.is_flat_circle(center, radius)
    }

    /// Defender whose collision volume contains the provided ground point.
    ///
    /// Pointer-driven callers hit-test selection clicks through this query.
    #[must_use]
    pub fn defender_at(world: &World, point: Vec3) -> Option<DefenderId> {
        world
            .defenders
            .iter()
            .find(|(_, state)| state.position.distance(point) <= state.kind.collision_radius())
            .map(|(id, _)| id)
    }
}

#[derive(Clone, Copy, Debug)]
struct UnitState {
    id: UnitId,
    kind: UnitKind,
    route: RouteId,
    position: Vec3,
    waypoint_index: u32,
    health: Health,
    slow_factor: f32,
    slow_refreshed: bool,
}

#[derive(Clone, Copy, Debug)]
struct ProjectileState {
    id: ProjectileId,
    position: Vec3,
    speed: f32,
    damage: f32,
    explosion_radius: f32,
    target: UnitId,
}

fn cooldown_for(fire_rate: f32) -> Duration {
    if fire_rate > 0.0 {
        Duration::from_secs_f32(1.0 / fire_rate)
    } else {
        Duration::ZERO
    }
}

fn sell_refund(cost: u32, sell_return_percent: u32) -> u32 {
    (cost as f32 * sell_return_percent as f32 / 100.0).round() as u32
}

fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::PI;
    let mut wrapped = angle;
    while wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    while wrapped < -PI {
        wrapped += 2.0 * PI;
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::level::{
        LevelDefinition, RouteDefinition, TerrainDefinition, UnitRouteAssignment, WaveDefinition,
    };
    use rampart_core::DefenderKind;

    const DT: Duration = Duration::from_millis(100);

    fn test_level() -> LevelDefinition {
        LevelDefinition {
            level_number: 1,
            seed: 7,
            starting_currency: 400,
            starting_lives: 5,
            speed_multiplier: 1.0,
            sell_return_percent: 50,
            terrain: TerrainDefinition {
                resolution: 200,
                world_size: [200.0, 50.0, 200.0],
                base_height: 0.2,
                heights: Vec::new(),
            },
            routes: vec![
                RouteDefinition {
                    waypoints: vec![[20.0, 10.0, 100.0], [180.0, 10.0, 100.0]],
                },
                RouteDefinition {
                    waypoints: vec![[24.0, 10.0, 100.0], [180.0, 10.0, 104.0]],
                },
                RouteDefinition {
                    waypoints: vec![[60.0, 10.0, 160.0], [180.0, 10.0, 160.0]],
                },
            ],
            unit_routes: vec![
                UnitRouteAssignment {
                    kind: UnitKind::Scout,
                    routes: vec![0],
                },
                UnitRouteAssignment {
                    kind: UnitKind::Juggernaut,
                    routes: vec![0, 1, 2],
                },
            ],
            waves: vec![WaveDefinition {
                delay_seconds: 0.0,
                spawn_interval_seconds: 1.0,
                wait_for_clear: false,
                units: vec![UnitKind::Scout],
            }],
            defenders: Vec::new(),
        }
    }

    fn test_world() -> World {
        World::from_level(&test_level()).expect("test level is valid")
    }

    fn spawn(world: &mut World, kind: UnitKind, route: u32) -> UnitId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnUnit {
                kind,
                route: RouteId::new(route),
            },
            &mut events,
        );
        match events.first() {
            Some(Event::UnitSpawned { unit, .. }) => *unit,
            other => panic!("expected spawn event, got {other:?}"),
        }
    }

    fn place(world: &mut World, kind: DefenderKind, position: Vec3) -> DefenderId {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceDefender {
                kind,
                position,
                heading: 0.0,
                enforce_spatial_check: false,
            },
            &mut events,
        );
        match events.first() {
            Some(Event::DefenderPlaced { defender, .. }) => *defender,
            other => panic!("expected placement event, got {other:?}"),
        }
    }

    fn tick(world: &mut World) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Tick { dt: DT }, &mut events);
        events
    }

    #[test]
    fn spawned_unit_walks_toward_its_waypoint() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Scout, 0);
        let before = query::unit_view(&world)
            .find(unit)
            .expect("unit alive")
            .position;

        let _ = tick(&mut world);

        let after = query::unit_view(&world)
            .find(unit)
            .expect("unit alive")
            .position;
        assert!(after.x > before.x);
        let expected = UnitKind::Scout.base_speed() * DT.as_secs_f32();
        assert!((after.x - before.x - expected).abs() < 1e-3);
    }

    #[test]
    fn unit_reaching_route_end_costs_a_life() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Scout, 0);
        // Drop the unit within arrival tolerance of the final waypoint.
        if let Some(index) = world.unit_index(unit) {
            world.units[index].position = Vec3::new(175.0, 10.0, 100.0);
            world.units[index].waypoint_index = 1;
        }

        let events = tick(&mut world);
        assert!(events.iter().any(|event| matches!(
            event,
            Event::UnitReachedBase {
                lives_remaining: 4,
                ..
            }
        )));
        assert_eq!(query::economy(&world).lives, 4);
        assert_eq!(query::hostile_count(&world), 0);
    }

    #[test]
    fn losing_the_last_life_ends_the_game_once() {
        let mut world = test_world();
        let mut lost_events = 0;
        for _ in 0..5 {
            let unit = spawn(&mut world, UnitKind::Scout, 0);
            if let Some(index) = world.unit_index(unit) {
                world.units[index].waypoint_index = 2;
            }
            let events = tick(&mut world);
            lost_events += events
                .iter()
                .filter(|event| matches!(event, Event::GameLost))
                .count();
        }
        assert_eq!(lost_events, 1);
        // Once the run is lost no further unit can enter the field.
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnUnit {
                kind: UnitKind::Scout,
                route: RouteId::new(0),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::outcome(&world), Some(Outcome::Lost));
        assert_eq!(query::economy(&world).lives, 0);
    }

    #[test]
    fn cannon_projectile_kills_and_credits_the_reward() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Scout, 0);
        let defender = place(&mut world, DefenderKind::Cannon, Vec3::new(30.0, 10.0, 90.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AcquireTarget { defender, unit },
            &mut events,
        );

        // Scout health 100, cannon damage 50: two hits kill it.
        let mut died = false;
        for _ in 0..100 {
            events.clear();
            apply(
                &mut world,
                Command::FireProjectile {
                    defender,
                    target: unit,
                },
                &mut events,
            );
            apply(&mut world, Command::Tick { dt: DT }, &mut events);
            if events
                .iter()
                .any(|event| matches!(event, Event::UnitDied { .. }))
            {
                died = true;
                break;
            }
        }

        assert!(died, "projectiles should eventually destroy the scout");
        let economy = query::economy(&world);
        assert_eq!(economy.kills, 1);
        assert_eq!(economy.currency, 300 + UnitKind::Scout.reward());
        assert_eq!(query::hostile_count(&world), 0);
        // The defender's lock was dropped together with the unit.
        let snapshot = query::defender_view(&world)
            .find(defender)
            .copied()
            .expect("defender exists");
        assert_eq!(snapshot.target, None);
        assert!(snapshot.has_fired_once);
    }

    #[test]
    fn explosion_damages_only_units_inside_the_radius() {
        let mut world = test_world();
        let near = spawn(&mut world, UnitKind::Juggernaut, 0);
        let close = spawn(&mut world, UnitKind::Juggernaut, 1);
        let far = spawn(&mut world, UnitKind::Juggernaut, 2);
        let defender = place(&mut world, DefenderKind::Missile, Vec3::new(20.0, 10.0, 80.0));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AcquireTarget {
                defender,
                unit: near,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::FireProjectile {
                defender,
                target: near,
            },
            &mut events,
        );

        let mut resolved = false;
        for _ in 0..100 {
            events.clear();
            apply(&mut world, Command::Tick { dt: DT }, &mut events);
            if events
                .iter()
                .any(|event| matches!(event, Event::ProjectileExpired { .. }))
            {
                resolved = true;
                break;
            }
        }
        assert!(resolved, "rocket should reach its target");

        let view = query::unit_view(&world);
        let health = |id| view.find(id).expect("unit alive").health.current();
        let full = UnitKind::Juggernaut.max_health();
        assert!(health(near) < full);
        assert!(health(close) < full, "unit inside the burst takes damage");
        assert_eq!(health(far), full, "unit outside the burst is untouched");
    }

    #[test]
    fn projectile_expires_without_effect_when_target_dies_first() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Scout, 0);
        let defender = place(&mut world, DefenderKind::Cannon, Vec3::new(30.0, 10.0, 90.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AcquireTarget { defender, unit },
            &mut events,
        );
        apply(
            &mut world,
            Command::FireProjectile {
                defender,
                target: unit,
            },
            &mut events,
        );
        // The target is destroyed while the projectile is still in flight.
        world.damage_unit(unit, 1000.0, &mut events);
        assert_eq!(query::hostile_count(&world), 0);

        events.clear();
        apply(&mut world, Command::Tick { dt: DT }, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ProjectileExpired { .. })));
        assert!(query::projectile_view(&world).into_vec().is_empty());
    }

    #[test]
    fn beam_slow_expires_unless_refreshed() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Juggernaut, 0);
        let defender = place(&mut world, DefenderKind::Beam, Vec3::new(30.0, 10.0, 90.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AcquireTarget { defender, unit },
            &mut events,
        );
        let _ = tick(&mut world);
        apply(
            &mut world,
            Command::ApplyBeam {
                defender,
                target: unit,
            },
            &mut events,
        );

        let slowed = query::unit_view(&world)
            .find(unit)
            .expect("unit alive")
            .slow_factor;
        assert_eq!(slowed, 0.5);

        // One tick with a refresh keeps the slow alive.
        let _ = tick(&mut world);
        apply(
            &mut world,
            Command::ApplyBeam {
                defender,
                target: unit,
            },
            &mut events,
        );
        assert_eq!(
            query::unit_view(&world)
                .find(unit)
                .expect("unit alive")
                .slow_factor,
            0.5
        );

        // Two ticks without a refresh and the slow lapses.
        let _ = tick(&mut world);
        let _ = tick(&mut world);
        assert_eq!(
            query::unit_view(&world)
                .find(unit)
                .expect("unit alive")
                .slow_factor,
            0.0
        );
    }

    #[test]
    fn switching_a_beam_away_clears_the_old_slow() {
        let mut world = test_world();
        let first = spawn(&mut world, UnitKind::Juggernaut, 0);
        let second = spawn(&mut world, UnitKind::Juggernaut, 1);
        let defender = place(&mut world, DefenderKind::Beam, Vec3::new(30.0, 10.0, 90.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AcquireTarget {
                defender,
                unit: first,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ApplyBeam {
                defender,
                target: first,
            },
            &mut events,
        );
        assert!(
            query::unit_view(&world)
                .find(first)
                .expect("unit alive")
                .slow_factor
                > 0.0
        );

        apply(
            &mut world,
            Command::AcquireTarget {
                defender,
                unit: second,
            },
            &mut events,
        );
        assert_eq!(
            query::unit_view(&world)
                .find(first)
                .expect("unit alive")
                .slow_factor,
            0.0
        );
    }

    #[test]
    fn placement_rejections_leave_the_treasury_untouched() {
        let mut world = test_world();
        let mut events = Vec::new();

        // Road elevation: the sampled plateau sits at 10, the request at 2.
        apply(
            &mut world,
            Command::PlaceDefender {
                kind: DefenderKind::Cannon,
                position: Vec3::new(100.0, 2.0, 100.0),
                heading: 0.0,
                enforce_spatial_check: true,
            },
            &mut events,
        );
        assert!(events.iter().any(|event| matches!(
            event,
            Event::PlacementRejected {
                reason: PlacementError::IllegalLocation,
                ..
            }
        )));
        assert_eq!(query::economy(&world).currency, 400);

        events.clear();
        let _anchor = place(&mut world, DefenderKind::Cannon, Vec3::new(100.0, 10.0, 100.0));
        apply(
            &mut world,
            Command::PlaceDefender {
                kind: DefenderKind::Cannon,
                position: Vec3::new(106.0, 10.0, 100.0),
                heading: 0.0,
                enforce_spatial_check: true,
            },
            &mut events,
        );
        assert!(events.iter().any(|event| matches!(
            event,
            Event::PlacementRejected {
                reason: PlacementError::TooCloseToExisting,
                ..
            }
        )));

        events.clear();
        apply(
            &mut world,
            Command::PlaceDefender {
                kind: DefenderKind::MissileMk2,
                position: Vec3::new(160.0, 10.0, 40.0),
                heading: 0.0,
                enforce_spatial_check: true,
            },
            &mut events,
        );
        assert!(events.iter().any(|event| matches!(
            event,
            Event::PlacementRejected {
                reason: PlacementError::InsufficientFunds,
                ..
            }
        )));
        assert_eq!(query::economy(&world).currency, 300);
    }

    #[test]
    fn spatial_check_passes_on_the_flat_plateau() {
        let mut world = test_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceDefender {
                kind: DefenderKind::Cannon,
                position: Vec3::new(100.0, 10.0, 60.0),
                heading: 0.0,
                enforce_spatial_check: true,
            },
            &mut events,
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::DefenderPlaced { .. })));
        assert_eq!(query::economy(&world).currency, 300);
    }

    #[test]
    fn selling_returns_half_the_cost_and_rejects_stale_ids() {
        let mut world = test_world();
        let defender = place(&mut world, DefenderKind::Cannon, Vec3::new(100.0, 10.0, 100.0));
        assert_eq!(query::economy(&world).currency, 300);

        let mut events = Vec::new();
        apply(&mut world, Command::SellDefender { defender }, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::DefenderSold { refund: 50, .. })));
        assert_eq!(query::economy(&world).currency, 350);

        // Re-issuing the sale on the stale identifier credits nothing.
        events.clear();
        apply(&mut world, Command::SellDefender { defender }, &mut events);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::SellRejected { .. })));
        assert_eq!(query::economy(&world).currency, 350);
    }

    #[test]
    fn upgrade_replaces_the_defender_in_place() {
        let mut world = test_world();
        let defender = place(&mut world, DefenderKind::Cannon, Vec3::new(100.0, 10.0, 100.0));

        let mut events = Vec::new();
        apply(&mut world, Command::UpgradeDefender { defender }, &mut events);

        let upgraded = match events.first() {
            Some(Event::DefenderUpgraded { upgraded, kind, .. }) => {
                assert_eq!(*kind, DefenderKind::CannonMk2);
                *upgraded
            }
            other => panic!("expected upgrade event, got {other:?}"),
        };
        assert_ne!(upgraded, defender);
        let view = query::defender_view(&world);
        assert!(view.find(defender).is_none());
        let snapshot = view.find(upgraded).expect("upgraded defender exists");
        assert_eq!(snapshot.position, Vec3::new(100.0, 10.0, 100.0));
        assert_eq!(
            query::economy(&world).currency,
            400 - DefenderKind::Cannon.cost() - DefenderKind::Cannon.upgrade_cost()
        );

        // The upgraded variant has no further upgrade.
        events.clear();
        apply(
            &mut world,
            Command::UpgradeDefender { defender: upgraded },
            &mut events,
        );
        assert!(events.iter().any(|event| matches!(
            event,
            Event::UpgradeRejected {
                reason: UpgradeError::NoUpgradeAvailable,
                ..
            }
        )));
    }

    #[test]
    fn victory_requires_an_empty_field() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Scout, 0);
        let mut events = Vec::new();
        apply(&mut world, Command::DeclareVictory, &mut events);
        assert!(events.is_empty());
        assert_eq!(query::outcome(&world), None);

        world.damage_unit(unit, 1000.0, &mut events);
        events.clear();
        apply(&mut world, Command::DeclareVictory, &mut events);
        assert_eq!(events, vec![Event::GameWon]);
        assert_eq!(query::outcome(&world), Some(Outcome::Won));

        // Declaring again is a no-op.
        events.clear();
        apply(&mut world, Command::DeclareVictory, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn defender_heading_turns_toward_its_target() {
        let mut world = test_world();
        let unit = spawn(&mut world, UnitKind::Juggernaut, 2);
        let defender = place(&mut world, DefenderKind::Cannon, Vec3::new(60.0, 10.0, 100.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AcquireTarget { defender, unit },
            &mut events,
        );

        let before = query::defender_view(&world)
            .find(defender)
            .copied()
            .expect("defender exists")
            .heading;
        let _ = tick(&mut world);
        let after = query::defender_view(&world)
            .find(defender)
            .copied()
            .expect("defender exists")
            .heading;
        // The unit sits at a positive z offset, so the heading grows from 0.
        assert_eq!(before, 0.0);
        assert!(after > 0.0);
    }

    #[test]
    fn queries_expose_routes_sites_and_hit_tests() {
        let mut world = test_world();
        assert_eq!(query::routes(&world).len(), 3);
        assert_eq!(
            query::routes(&world)[0].start(),
            Vec3::new(20.0, 10.0, 100.0)
        );

        assert!(query::is_flat_site(&world, Vec3::new(100.0, 10.0, 60.0), 7));
        assert!(!query::is_flat_site(&world, Vec3::new(100.0, 2.0, 60.0), 7));

        let defender = place(&mut world, DefenderKind::Cannon, Vec3::new(100.0, 10.0, 100.0));
        // Cannon collision radius is 12.
        assert_eq!(
            query::defender_at(&world, Vec3::new(108.0, 10.0, 100.0)),
            Some(defender)
        );
        assert_eq!(query::defender_at(&world, Vec3::new(130.0, 10.0, 100.0)), None);
    }

    #[test]
    fn sell_refund_rounds_to_nearest() {
        assert_eq!(sell_refund(100, 50), 50);
        assert_eq!(sell_refund(250, 50), 125);
        assert_eq!(sell_refund(105, 50), 53);
        assert_eq!(sell_refund(100, 0), 0);
    }
}
