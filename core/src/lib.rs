#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

pub mod level;

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a hostile unit enter the field on the given route.
    SpawnUnit {
        /// Kind of unit to spawn.
        kind: UnitKind,
        /// Route the unit will follow toward the base.
        route: RouteId,
    },
    /// Requests that a defender lock onto the provided unit.
    AcquireTarget {
        /// Defender whose target changes.
        defender: DefenderId,
        /// Unit the defender should track.
        unit: UnitId,
    },
    /// Requests that a defender drop its current target.
    ClearTarget {
        /// Defender whose target is released.
        defender: DefenderId,
    },
    /// Requests that a ready defender discharge a projectile at its target.
    FireProjectile {
        /// Defender performing the shot.
        defender: DefenderId,
        /// Unit the projectile will home toward.
        target: UnitId,
    },
    /// Requests one tick worth of continuous beam damage against a target.
    ApplyBeam {
        /// Beam defender applying the damage.
        defender: DefenderId,
        /// Unit receiving damage and the slow effect.
        target: UnitId,
    },
    /// Requests construction of a defender at the provided location.
    PlaceDefender {
        /// Kind of defender to construct.
        kind: DefenderKind,
        /// World-space position of the defender base.
        position: Vec3,
        /// Initial heading in radians around the vertical axis.
        heading: f32,
        /// Whether terrain flatness and proximity checks gate the build.
        enforce_spatial_check: bool,
    },
    /// Requests replacement of a defender with its upgraded variant.
    UpgradeDefender {
        /// Defender targeted for the upgrade.
        defender: DefenderId,
    },
    /// Requests removal of a defender in exchange for a partial refund.
    SellDefender {
        /// Defender targeted for the sale.
        defender: DefenderId,
    },
    /// Declares that every wave was cleared and no hostile remains.
    DeclareVictory,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a hostile unit entered the field.
    UnitSpawned {
        /// Identifier assigned to the spawned unit.
        unit: UnitId,
        /// Kind of the spawned unit.
        kind: UnitKind,
        /// Route the unit follows.
        route: RouteId,
    },
    /// Reports damage applied to a hostile unit.
    UnitDamaged {
        /// Unit that took the damage.
        unit: UnitId,
        /// Amount of health removed after clamping.
        amount: f32,
    },
    /// Reports that a hostile unit was destroyed.
    UnitDied {
        /// Unit that was destroyed.
        unit: UnitId,
        /// Currency credited for the kill.
        reward: u32,
    },
    /// Reports that a hostile unit reached the protected base.
    UnitReachedBase {
        /// Unit that completed its route.
        unit: UnitId,
        /// Lives remaining after the breach.
        lives_remaining: u32,
    },
    /// Confirms that a defender locked onto a unit.
    TargetAcquired {
        /// Defender that acquired the target.
        defender: DefenderId,
        /// Unit now tracked by the defender.
        unit: UnitId,
    },
    /// Confirms that a defender released its target.
    TargetCleared {
        /// Defender that dropped its target.
        defender: DefenderId,
    },
    /// Confirms that a projectile was discharged.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Defender that fired it.
        defender: DefenderId,
        /// Unit the projectile homes toward.
        target: UnitId,
    },
    /// Reports that a projectile left the field, on impact or target loss.
    ProjectileExpired {
        /// Projectile that was removed.
        projectile: ProjectileId,
    },
    /// Confirms that a defender was constructed.
    DefenderPlaced {
        /// Identifier assigned to the defender by the world.
        defender: DefenderId,
        /// Kind of defender that was constructed.
        kind: DefenderKind,
        /// World-space position of the defender base.
        position: Vec3,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Kind of defender requested for placement.
        kind: DefenderKind,
        /// Position provided in the placement request.
        position: Vec3,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a defender was replaced by its upgraded variant.
    DefenderUpgraded {
        /// Identifier of the defender that was consumed.
        defender: DefenderId,
        /// Identifier assigned to the upgraded replacement.
        upgraded: DefenderId,
        /// Kind of the replacement defender.
        kind: DefenderKind,
    },
    /// Reports that an upgrade request was rejected.
    UpgradeRejected {
        /// Defender targeted by the request.
        defender: DefenderId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a defender was sold.
    DefenderSold {
        /// Defender that was removed.
        defender: DefenderId,
        /// Currency credited for the sale.
        refund: u32,
    },
    /// Reports that a sale request referenced a defender that no longer exists.
    SellRejected {
        /// Identifier provided in the stale request.
        defender: DefenderId,
    },
    /// Announces that every wave was cleared and the level is won.
    GameWon,
    /// Announces that the base lost its last life.
    GameLost,
    /// Publishes a refreshed score report.
    TelemetryUpdated {
        /// Aggregated counters for the run so far.
        report: ScoreReport,
    },
}

/// Unique identifier assigned to a hostile unit.
///
/// Identifiers are allocated monotonically and never reused within a run, so
/// a held identifier acts as a checked weak reference: a lookup performed
/// after the unit was destroyed simply fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a defender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefenderId(u32);

impl DefenderId {
    /// Creates a new defender identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a route within the level's immutable route table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(u32);

impl RouteId {
    /// Creates a new route identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Hit points of a hostile unit, clamped into `0..=maximum`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    maximum: f32,
}

impl Health {
    /// Creates a full health pool with the provided maximum.
    #[must_use]
    pub fn at_maximum(maximum: f32) -> Self {
        let maximum = maximum.max(0.0);
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Hit points currently remaining.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Upper bound of the health pool.
    #[must_use]
    pub const fn maximum(&self) -> f32 {
        self.maximum
    }

    /// Remaining health expressed as a `0..=1` fraction of the maximum.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.maximum <= 0.0 {
            return 0.0;
        }
        self.current / self.maximum
    }

    /// Removes the provided amount of health and returns the clamped loss.
    ///
    /// Negative amounts are ignored; the pool never drops below zero and
    /// never rises above the maximum.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        let before = self.current;
        self.current = (self.current - amount).clamp(0.0, self.maximum);
        before - self.current
    }

    /// Reports whether the pool is empty.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Kinds of hostile units that can traverse routes toward the base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// Fast, fragile runner.
    Scout,
    /// Standard line infantry.
    Grunt,
    /// Slow unit with a deep health pool.
    Juggernaut,
}

impl UnitKind {
    /// Maximum health for freshly spawned units of this kind.
    #[must_use]
    pub const fn max_health(self) -> f32 {
        match self {
            Self::Scout => 100.0,
            Self::Grunt => 260.0,
            Self::Juggernaut => 700.0,
        }
    }

    /// Movement speed in world units per second before multipliers.
    #[must_use]
    pub const fn base_speed(self) -> f32 {
        match self {
            Self::Scout => 22.0,
            Self::Grunt => 14.0,
            Self::Juggernaut => 9.0,
        }
    }

    /// Currency credited when a unit of this kind is destroyed.
    #[must_use]
    pub const fn reward(self) -> u32 {
        match self {
            Self::Scout => 20,
            Self::Grunt => 45,
            Self::Juggernaut => 120,
        }
    }
}

/// Kinds of defenders that can be constructed on the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefenderKind {
    /// Single-target cannon with a steady fire rate.
    Cannon,
    /// Upgraded cannon with faster, harder shots.
    CannonMk2,
    /// Launcher firing slow rockets with an area-damage burst.
    Missile,
    /// Upgraded launcher with a wider burst.
    MissileMk2,
    /// Continuous beam that damages and slows a single target.
    Beam,
    /// Upgraded beam with a stronger slow and higher output.
    BeamMk2,
}

/// Firing behaviour of a defender kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FireMode {
    /// Discrete homing projectiles on a rate timer.
    Projectile {
        /// Shots per second.
        fire_rate: f32,
        /// Damage applied per hit.
        damage: f32,
        /// Projectile travel speed in world units per second.
        speed: f32,
        /// Area-damage radius around the impact point; zero hits one target.
        explosion_radius: f32,
    },
    /// Continuous damage applied every tick a target is held.
    Beam {
        /// Damage applied per second of contact.
        damage_per_second: f32,
        /// Multiplicative movement penalty applied while the beam holds.
        slow_factor: f32,
    },
}

impl DefenderKind {
    /// Construction cost in currency.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Cannon => 100,
            Self::CannonMk2 => 220,
            Self::Missile => 250,
            Self::MissileMk2 => 470,
            Self::Beam => 180,
            Self::BeamMk2 => 340,
        }
    }

    /// Cost of replacing this defender with its upgraded variant.
    #[must_use]
    pub const fn upgrade_cost(self) -> u32 {
        match self {
            Self::Cannon => 120,
            Self::Missile => 220,
            Self::Beam => 160,
            Self::CannonMk2 | Self::MissileMk2 | Self::BeamMk2 => 0,
        }
    }

    /// Upgraded variant this kind can be replaced with, if any.
    #[must_use]
    pub const fn upgrade(self) -> Option<Self> {
        match self {
            Self::Cannon => Some(Self::CannonMk2),
            Self::Missile => Some(Self::MissileMk2),
            Self::Beam => Some(Self::BeamMk2),
            Self::CannonMk2 | Self::MissileMk2 | Self::BeamMk2 => None,
        }
    }

    /// Maximum distance at which targets are acquired and engaged.
    #[must_use]
    pub const fn firing_range(self) -> f32 {
        match self {
            Self::Cannon => 100.0,
            Self::CannonMk2 => 110.0,
            Self::Missile => 120.0,
            Self::MissileMk2 => 130.0,
            Self::Beam => 90.0,
            Self::BeamMk2 => 100.0,
        }
    }

    /// Interpolation rate used when turning toward the target bearing.
    #[must_use]
    pub const fn rotation_speed(self) -> f32 {
        match self {
            Self::Cannon | Self::CannonMk2 => 10.0,
            Self::Missile | Self::MissileMk2 => 8.0,
            Self::Beam | Self::BeamMk2 => 12.0,
        }
    }

    /// Distance advantage a candidate needs before the defender retargets.
    ///
    /// Without the margin two units straddling the same distance would make
    /// the defender oscillate between them every scan.
    #[must_use]
    pub const fn switch_margin(self) -> f32 {
        10.0
    }

    /// Radius of flat ground required under the defender base.
    #[must_use]
    pub const fn footprint_radius(self) -> i32 {
        match self {
            Self::Missile | Self::MissileMk2 => 8,
            _ => 7,
        }
    }

    /// Radius used when checking overlap against other defenders.
    #[must_use]
    pub const fn collision_radius(self) -> f32 {
        match self {
            Self::Missile | Self::MissileMk2 => 14.0,
            _ => 12.0,
        }
    }

    /// Firing behaviour of this kind.
    #[must_use]
    pub const fn fire_mode(self) -> FireMode {
        match self {
            Self::Cannon => FireMode::Projectile {
                fire_rate: 1.0,
                damage: 50.0,
                speed: 100.0,
                explosion_radius: 0.0,
            },
            Self::CannonMk2 => FireMode::Projectile {
                fire_rate: 2.0,
                damage: 60.0,
                speed: 120.0,
                explosion_radius: 0.0,
            },
            Self::Missile => FireMode::Projectile {
                fire_rate: 0.5,
                damage: 80.0,
                speed: 70.0,
                explosion_radius: 15.0,
            },
            Self::MissileMk2 => FireMode::Projectile {
                fire_rate: 0.8,
                damage: 100.0,
                speed: 80.0,
                explosion_radius: 20.0,
            },
            Self::Beam => FireMode::Beam {
                damage_per_second: 30.0,
                slow_factor: 0.5,
            },
            Self::BeamMk2 => FireMode::Beam {
                damage_per_second: 55.0,
                slow_factor: 0.6,
            },
        }
    }

    /// Reports whether this kind fires a continuous beam.
    #[must_use]
    pub const fn is_beam(self) -> bool {
        matches!(self, Self::Beam | Self::BeamMk2)
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The footprint is not flat, out of bounds, or on the reserved road.
    IllegalLocation,
    /// Another defender overlaps the requested location.
    TooCloseToExisting,
    /// The build cost exceeds the available currency.
    InsufficientFunds,
}

/// Reasons an upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No defender with the provided identifier exists.
    MissingDefender,
    /// The defender's kind has no upgraded variant.
    NoUpgradeAvailable,
    /// The upgrade cost exceeds the available currency.
    InsufficientFunds,
}

/// Terminal result of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every wave was cleared and the base survived.
    Won,
    /// The base lost its last life.
    Lost,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Kind of the unit.
    pub kind: UnitKind,
    /// World-space position of the unit.
    pub position: Vec3,
    /// Remaining health pool.
    pub health: Health,
    /// Route the unit follows.
    pub route: RouteId,
    /// Index of the waypoint the unit currently travels toward.
    pub waypoint_index: u32,
    /// Movement penalty currently in effect; zero when unslowed.
    pub slow_factor: f32,
}

/// Read-only snapshot describing all hostile units on the field.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided unit, if it is still alive.
    #[must_use]
    pub fn find(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of units captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single defender's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderSnapshot {
    /// Identifier allocated to the defender by the world.
    pub id: DefenderId,
    /// Kind of defender that was constructed.
    pub kind: DefenderKind,
    /// World-space position of the defender base.
    pub position: Vec3,
    /// Heading in radians around the vertical axis.
    pub heading: f32,
    /// Unit currently tracked, if any.
    pub target: Option<UnitId>,
    /// Time remaining until the next shot is ready.
    pub ready_in: Duration,
    /// Whether the defender has discharged at least once this run.
    pub has_fired_once: bool,
}

/// Read-only snapshot describing all defenders on the field.
#[derive(Clone, Debug, Default)]
pub struct DefenderView {
    snapshots: Vec<DefenderSnapshot>,
}

impl DefenderView {
    /// Creates a new defender view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DefenderSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured defender snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DefenderSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided defender, if it still exists.
    #[must_use]
    pub fn find(&self, defender: DefenderId) -> Option<&DefenderSnapshot> {
        self.snapshots
            .binary_search_by_key(&defender, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DefenderSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of an in-flight projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile by the world.
    pub id: ProjectileId,
    /// World-space position of the projectile.
    pub position: Vec3,
    /// Damage applied on impact.
    pub damage: f32,
    /// Area-damage radius around the impact point; zero hits one target.
    pub explosion_radius: f32,
    /// Unit the projectile homes toward.
    pub target: UnitId,
}

/// Read-only snapshot describing all in-flight projectiles.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new projectile view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured projectile snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Snapshot of the treasury and base health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    /// Currency available for construction.
    pub currency: u32,
    /// Lives remaining before the base falls.
    pub lives: u32,
    /// Hostile units destroyed so far.
    pub kills: u32,
}

/// Aggregated counters published by the telemetry system.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreReport {
    /// Total health removed from hostile units.
    pub damage_dealt: f32,
    /// Hostile units destroyed.
    pub kills: u32,
    /// Currency credited from kills.
    pub reward_earned: u32,
    /// Lives lost to units reaching the base.
    pub lives_lost: u32,
    /// Defenders successfully constructed.
    pub defenders_built: u32,
    /// Placement requests rejected by validation.
    pub placements_rejected: u32,
    /// Upgrades successfully applied.
    pub upgrades_applied: u32,
    /// Defenders sold back to the treasury.
    pub defenders_sold: u32,
    /// Defenders on the field that have not yet discharged.
    pub defenders_yet_to_fire: u32,
    /// Terminal result of the run, once reached.
    pub outcome: Option<Outcome>,
}

#[cfg(test)]
mod tests {
    use super::{
        DefenderId, DefenderKind, FireMode, Health, Outcome, PlacementError, RouteId, UnitId,
        UnitKind, UpgradeError,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_round_trip_through_bincode() {
        assert_round_trip(&UnitId::new(7));
        assert_round_trip(&DefenderId::new(11));
        assert_round_trip(&RouteId::new(2));
    }

    #[test]
    fn kind_enums_round_trip_through_bincode() {
        assert_round_trip(&UnitKind::Juggernaut);
        assert_round_trip(&DefenderKind::MissileMk2);
        assert_round_trip(&PlacementError::TooCloseToExisting);
        assert_round_trip(&UpgradeError::NoUpgradeAvailable);
        assert_round_trip(&Outcome::Lost);
    }

    #[test]
    fn health_clamps_damage_at_zero() {
        let mut health = Health::at_maximum(100.0);
        assert_eq!(health.apply_damage(30.0), 30.0);
        assert_eq!(health.current(), 70.0);

        let removed = health.apply_damage(500.0);
        assert_eq!(removed, 70.0);
        assert_eq!(health.current(), 0.0);
        assert!(health.is_depleted());
    }

    #[test]
    fn health_ignores_negative_damage() {
        let mut health = Health::at_maximum(100.0);
        assert_eq!(health.apply_damage(-25.0), 0.0);
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn health_ratio_spans_unit_interval() {
        let mut health = Health::at_maximum(200.0);
        assert_eq!(health.ratio(), 1.0);
        let _ = health.apply_damage(50.0);
        assert_eq!(health.ratio(), 0.75);
    }

    #[test]
    fn upgrade_chain_terminates_at_upgraded_variants() {
        assert_eq!(DefenderKind::Cannon.upgrade(), Some(DefenderKind::CannonMk2));
        assert_eq!(DefenderKind::CannonMk2.upgrade(), None);
        assert_eq!(DefenderKind::Beam.upgrade(), Some(DefenderKind::BeamMk2));
        assert_eq!(DefenderKind::BeamMk2.upgrade(), None);
    }

    #[test]
    fn beam_kinds_report_beam_mode() {
        assert!(DefenderKind::Beam.is_beam());
        assert!(DefenderKind::BeamMk2.is_beam());
        assert!(!DefenderKind::Cannon.is_beam());
        match DefenderKind::Missile.fire_mode() {
            FireMode::Projectile {
                explosion_radius, ..
            } => assert!(explosion_radius > 0.0),
            FireMode::Beam { .. } => panic!("missile launcher is not a beam"),
        }
    }
}
