#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic telemetry system aggregating run statistics from events.
//!
//! External observers such as score panels and reward-granting controllers
//! read the published [`ScoreReport`] instead of hooking individual
//! lifecycle events, which keeps subscription deterministic and leak-free
//! across level reloads. The report includes the count of defenders that have not
//! discharged yet; the core exposes that flag without acting on it.

use rampart_core::{DefenderView, Event, Outcome, ScoreReport};

/// Pure system that folds world events into a cumulative score report.
#[derive(Debug, Default)]
pub struct Telemetry {
    report: ScoreReport,
    dirty: bool,
}

impl Telemetry {
    /// Creates a new telemetry system with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently aggregated report.
    #[must_use]
    pub fn last_report(&self) -> &ScoreReport {
        &self.report
    }

    /// Consumes world events and publishes refreshed reports.
    ///
    /// A `TelemetryUpdated` event is emitted at most once per observed tick
    /// and only when a counter changed since the previous publication.
    pub fn handle(&mut self, events: &[Event], defenders: &DefenderView, out: &mut Vec<Event>) {
        let mut tick_observed = false;

        for event in events {
            match event {
                Event::TimeAdvanced { .. } => tick_observed = true,
                Event::UnitDamaged { amount, .. } => {
                    self.report.damage_dealt += amount;
                    self.dirty = true;
                }
                Event::UnitDied { reward, .. } => {
                    self.report.kills = self.report.kills.saturating_add(1);
                    self.report.reward_earned = self.report.reward_earned.saturating_add(*reward);
                    self.dirty = true;
                }
                Event::UnitReachedBase { .. } => {
                    self.report.lives_lost = self.report.lives_lost.saturating_add(1);
                    self.dirty = true;
                }
                Event::ProjectileFired { .. } => self.dirty = true,
                Event::DefenderPlaced { .. } => {
                    self.report.defenders_built = self.report.defenders_built.saturating_add(1);
                    self.dirty = true;
                }
                Event::PlacementRejected { .. } => {
                    self.report.placements_rejected =
                        self.report.placements_rejected.saturating_add(1);
                    self.dirty = true;
                }
                Event::DefenderUpgraded { .. } => {
                    self.report.upgrades_applied = self.report.upgrades_applied.saturating_add(1);
                    self.dirty = true;
                }
                Event::DefenderSold { .. } => {
                    self.report.defenders_sold = self.report.defenders_sold.saturating_add(1);
                    self.dirty = true;
                }
                Event::GameWon => {
                    self.report.outcome = Some(Outcome::Won);
                    self.dirty = true;
                }
                Event::GameLost => {
                    self.report.outcome = Some(Outcome::Lost);
                    self.dirty = true;
                }
                _ => {}
            }
        }

        if !tick_observed || !self.dirty {
            return;
        }

        self.report.defenders_yet_to_fire = defenders
            .iter()
            .filter(|defender| !defender.has_fired_once)
            .count() as u32;
        self.dirty = false;
        out.push(Event::TelemetryUpdated {
            report: self.report.clone(),
        });
    }
}
