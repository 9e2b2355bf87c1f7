//! Immutable level data consumed by the world and the spawn scheduler.
//!
//! Level definitions arrive from external storage (the CLI adapter reads
//! them from TOML files), get validated once, and are then treated as
//! read-only for the rest of the run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DefenderKind, UnitKind};

/// Errors raised when a level definition fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum LevelError {
    /// The route table is empty.
    #[error("level defines no routes")]
    NoRoutes,
    /// A route holds no waypoints.
    #[error("route {index} has no waypoints")]
    EmptyRoute {
        /// Index of the offending route.
        index: usize,
    },
    /// The heightmap sample count does not match the declared resolution.
    #[error("terrain heightmap holds {actual} samples, expected {expected}")]
    HeightmapSizeMismatch {
        /// Sample count implied by the resolution.
        expected: usize,
        /// Sample count actually provided.
        actual: usize,
    },
    /// The terrain extent is degenerate on at least one axis.
    #[error("terrain world size must be positive on every axis")]
    InvalidTerrainSize,
    /// A route assignment points outside the route table.
    #[error("unit kind {kind:?} references route index {index} outside the route table")]
    UnknownRouteIndex {
        /// Kind carrying the assignment.
        kind: UnitKind,
        /// Offending route index.
        index: u32,
    },
    /// A wave schedules a unit kind that has no assigned routes.
    #[error("wave {wave} spawns {kind:?} but no routes are assigned to that kind")]
    UnroutedWaveUnit {
        /// Index of the offending wave.
        wave: usize,
        /// Kind without a route assignment.
        kind: UnitKind,
    },
    /// The sale refund percentage exceeds the full construction cost.
    #[error("sell return percent {percent} exceeds 100")]
    InvalidSellReturn {
        /// Offending percentage.
        percent: u32,
    },
    /// The global speed multiplier would freeze or reverse movement.
    #[error("speed multiplier {multiplier} is not positive")]
    InvalidSpeedMultiplier {
        /// Offending multiplier.
        multiplier: f32,
    },
}

/// Complete description of a playable level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Position of the level within the campaign, starting at 1.
    pub level_number: u32,
    /// Seed driving the deterministic route lottery.
    pub seed: u64,
    /// Currency available when the level begins.
    pub starting_currency: u32,
    /// Lives the base can lose before the level is failed.
    pub starting_lives: u32,
    /// Global speed multiplier applied to every spawned unit.
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f32,
    /// Percent of the construction cost refunded on sale.
    #[serde(default = "default_sell_return_percent")]
    pub sell_return_percent: u32,
    /// Sampled elevation grid the defenders are placed on.
    pub terrain: TerrainDefinition,
    /// Routes hostile units follow toward the base.
    pub routes: Vec<RouteDefinition>,
    /// Route assignments per unit kind.
    pub unit_routes: Vec<UnitRouteAssignment>,
    /// Ordered wave schedule.
    pub waves: Vec<WaveDefinition>,
    /// Defenders constructed before the first tick.
    #[serde(default)]
    pub defenders: Vec<DefenderPlacementDefinition>,
}

impl LevelDefinition {
    /// Checks the definition for internal consistency.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.routes.is_empty() {
            return Err(LevelError::NoRoutes);
        }
        for (index, route) in self.routes.iter().enumerate() {
            if route.waypoints.is_empty() {
                return Err(LevelError::EmptyRoute { index });
            }
        }

        self.terrain.validate()?;

        if self.sell_return_percent > 100 {
            return Err(LevelError::InvalidSellReturn {
                percent: self.sell_return_percent,
            });
        }
        if !(self.speed_multiplier > 0.0) {
            return Err(LevelError::InvalidSpeedMultiplier {
                multiplier: self.speed_multiplier,
            });
        }

        let route_count = self.routes.len() as u32;
        for assignment in &self.unit_routes {
            for &index in &assignment.routes {
                if index >= route_count {
                    return Err(LevelError::UnknownRouteIndex {
                        kind: assignment.kind,
                        index,
                    });
                }
            }
        }

        for (wave_index, wave) in self.waves.iter().enumerate() {
            for &kind in &wave.units {
                if self.routes_for(kind).is_empty() {
                    return Err(LevelError::UnroutedWaveUnit {
                        wave: wave_index,
                        kind,
                    });
                }
            }
        }

        Ok(())
    }

    /// Route indices the provided unit kind may spawn on.
    #[must_use]
    pub fn routes_for(&self, kind: UnitKind) -> &[u32] {
        self.unit_routes
            .iter()
            .find(|assignment| assignment.kind == kind)
            .map(|assignment| assignment.routes.as_slice())
            .unwrap_or(&[])
    }
}

/// Sampled elevation grid description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainDefinition {
    /// Number of samples along each edge of the square heightmap.
    pub resolution: u32,
    /// World-space extent of the terrain: `[width, vertical scale, length]`.
    pub world_size: [f32; 3],
    /// Uniform normalized height used when `heights` is empty.
    #[serde(default)]
    pub base_height: f32,
    /// Row-major normalized height samples in `0..=1`; empty means uniform.
    #[serde(default)]
    pub heights: Vec<f32>,
}

impl TerrainDefinition {
    fn validate(&self) -> Result<(), LevelError> {
        if self.world_size.iter().any(|extent| !(*extent > 0.0)) {
            return Err(LevelError::InvalidTerrainSize);
        }
        if !self.heights.is_empty() {
            let expected = self.resolution as usize * self.resolution as usize;
            if self.heights.len() != expected {
                return Err(LevelError::HeightmapSizeMismatch {
                    expected,
                    actual: self.heights.len(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered waypoint list a hostile unit walks from spawn to base.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// World-space waypoints from spawn point to base.
    pub waypoints: Vec<[f32; 3]>,
}

/// Routes a unit kind is allowed to spawn on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRouteAssignment {
    /// Kind the assignment applies to.
    pub kind: UnitKind,
    /// Indices into the level's route table.
    pub routes: Vec<u32>,
}

/// One scheduled batch of hostile units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Seconds to wait after the previous wave before this one begins.
    pub delay_seconds: f32,
    /// Seconds between consecutive spawns within the wave.
    pub spawn_interval_seconds: f32,
    /// Holds the wave until every hostile from earlier waves is gone.
    #[serde(default)]
    pub wait_for_clear: bool,
    /// Ordered unit kinds emitted by the wave.
    pub units: Vec<UnitKind>,
}

impl WaveDefinition {
    /// Pre-wave delay as a duration.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f32(self.delay_seconds.max(0.0))
    }

    /// Intra-wave spawn interval as a duration.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_secs_f32(self.spawn_interval_seconds.max(0.0))
    }
}

/// Defender constructed before the simulation starts ticking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenderPlacementDefinition {
    /// Kind of defender to construct.
    pub kind: DefenderKind,
    /// World-space position of the defender base.
    pub position: [f32; 3],
    /// Initial heading in radians around the vertical axis.
    #[serde(default)]
    pub heading: f32,
}

fn default_speed_multiplier() -> f32 {
    1.0
}

fn default_sell_return_percent() -> u32 {
    50
}
