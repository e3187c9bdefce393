//! Trip lifecycle and metered fare state.
//!
//! ```text
//! idle --start--> active <--toggle_rest--> resting
//!                    \                       /
//!                     +------drop_off-------+--> completed --reset--> idle
//! any state --cancel--> idle
//! ```
//!
//! Events that are not valid for the current status are ignored and reported
//! as [`Transition::Ignored`]; the state is left untouched. Timestamps are
//! milliseconds on the session clock.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fare::{CumulativeAdditions, DemandTier, FareBreakdown, FareConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    #[default]
    Idle,
    Active,
    Resting,
    Completed,
}

/// Lifecycle fields. `rest_start_ms` is set exactly while resting and
/// `start_ms` is set from the start of a trip until it is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripState {
    pub status: TripStatus,
    pub start_ms: Option<u64>,
    pub rest_start_ms: Option<u64>,
    pub total_rest_ms: u64,
}

/// Outcome of an operation on the trip machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn is_applied(self) -> bool {
        self == Transition::Applied
    }
}

/// Record of a finished trip, produced on drop-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub started_at_ms: u64,
    pub completed_at_ms: u64,
    pub distance_km: f64,
    pub total_rest_ms: u64,
    pub fare: FareBreakdown,
}

impl TripSummary {
    pub fn elapsed_ms(&self) -> u64 {
        self.completed_at_ms.saturating_sub(self.started_at_ms)
    }

    /// Time spent driving, excluding rests.
    pub fn active_ms(&self) -> u64 {
        self.elapsed_ms().saturating_sub(self.total_rest_ms)
    }
}

#[derive(Debug, Clone)]
pub struct TripMachine {
    config: FareConfig,
    state: TripState,
    distance_m: f64,
    demand: DemandTier,
    additions: CumulativeAdditions,
    fare: FareBreakdown,
    completed_at_ms: Option<u64>,
}

impl TripMachine {
    pub fn new(config: FareConfig) -> Self {
        Self {
            config,
            state: TripState::default(),
            distance_m: 0.0,
            demand: DemandTier::default(),
            additions: CumulativeAdditions::default(),
            fare: FareBreakdown::default(),
            completed_at_ms: None,
        }
    }

    pub fn state(&self) -> TripState {
        self.state
    }

    pub fn status(&self) -> TripStatus {
        self.state.status
    }

    pub fn fare(&self) -> FareBreakdown {
        self.fare
    }

    pub fn fare_config(&self) -> &FareConfig {
        &self.config
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn demand(&self) -> DemandTier {
        self.demand
    }

    pub fn additions(&self) -> &CumulativeAdditions {
        &self.additions
    }

    pub fn start_trip(&mut self, now_ms: u64) -> Transition {
        if self.state.status != TripStatus::Idle {
            return self.ignored("start_trip");
        }
        self.state = TripState {
            status: TripStatus::Active,
            start_ms: Some(now_ms),
            rest_start_ms: None,
            total_rest_ms: 0,
        };
        self.distance_m = 0.0;
        self.completed_at_ms = None;
        self.recompute_fare();
        info!(at_ms = now_ms, total = self.fare.total, "trip started");
        Transition::Applied
    }

    pub fn toggle_rest(&mut self, now_ms: u64) -> Transition {
        match self.state.status {
            TripStatus::Active => {
                self.state.status = TripStatus::Resting;
                self.state.rest_start_ms = Some(now_ms);
                debug!(at_ms = now_ms, "rest started");
                Transition::Applied
            }
            TripStatus::Resting => {
                self.close_rest(now_ms);
                self.state.status = TripStatus::Active;
                debug!(at_ms = now_ms, total_rest_ms = self.state.total_rest_ms, "rest ended");
                Transition::Applied
            }
            TripStatus::Idle | TripStatus::Completed => self.ignored("toggle_rest"),
        }
    }

    /// Confirmed drop-off. Freezes distance and fare.
    pub fn drop_off(&mut self, now_ms: u64) -> Transition {
        match self.state.status {
            TripStatus::Active | TripStatus::Resting => {
                self.close_rest(now_ms);
                self.recompute_fare();
                self.state.status = TripStatus::Completed;
                self.completed_at_ms = Some(now_ms);
                info!(
                    at_ms = now_ms,
                    distance_km = self.distance_km(),
                    total = self.fare.total,
                    "trip completed"
                );
                Transition::Applied
            }
            TripStatus::Idle | TripStatus::Completed => self.ignored("drop_off"),
        }
    }

    /// Abandon the trip from any status, discarding surcharges and additions.
    pub fn cancel(&mut self) -> Transition {
        info!(status = ?self.state.status, "trip canceled");
        self.clear();
        Transition::Applied
    }

    /// Return a completed trip to idle.
    pub fn reset_trip(&mut self) -> Transition {
        if self.state.status != TripStatus::Completed {
            return self.ignored("reset_trip");
        }
        self.clear();
        Transition::Applied
    }

    /// Add driven distance. Only counted while active; negative or
    /// non-finite increments are dropped so the odometer stays monotonic.
    pub fn add_distance(&mut self, meters: f64) -> Transition {
        if self.state.status != TripStatus::Active || !meters.is_finite() || meters <= 0.0 {
            return Transition::Ignored;
        }
        self.distance_m += meters;
        self.recompute_fare();
        Transition::Applied
    }

    /// Replace the demand surcharge.
    pub fn select_demand(&mut self, tier: DemandTier) -> Transition {
        if self.state.status == TripStatus::Completed {
            return self.ignored("select_demand");
        }
        self.demand = tier;
        self.recompute_fare();
        Transition::Applied
    }

    /// Additions that would push the running sum past `u64::MAX` are ignored.
    pub fn add_cumulative(&mut self, amount: u64) -> Transition {
        if self.state.status == TripStatus::Completed
            || self.additions.total().checked_add(amount).is_none()
        {
            return self.ignored("add_cumulative");
        }
        self.additions.add(amount);
        self.recompute_fare();
        Transition::Applied
    }

    pub fn undo_cumulative(&mut self) -> Transition {
        if self.state.status == TripStatus::Completed || self.additions.undo().is_none() {
            return self.ignored("undo_cumulative");
        }
        self.recompute_fare();
        Transition::Applied
    }

    pub fn clear_cumulative(&mut self) -> Transition {
        if self.state.status == TripStatus::Completed {
            return self.ignored("clear_cumulative");
        }
        self.additions.clear();
        self.recompute_fare();
        Transition::Applied
    }

    /// Wall time since the trip started, frozen at drop-off.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let Some(start) = self.state.start_ms else {
            return 0;
        };
        self.completed_at_ms.unwrap_or(now_ms).saturating_sub(start)
    }

    /// Elapsed time minus rests, including a rest still in progress.
    pub fn active_ms(&self, now_ms: u64) -> u64 {
        let ongoing_rest = self
            .state
            .rest_start_ms
            .map(|rest_start| now_ms.saturating_sub(rest_start))
            .unwrap_or(0);
        self.elapsed_ms(now_ms)
            .saturating_sub(self.state.total_rest_ms + ongoing_rest)
    }

    /// Summary of the completed trip, if there is one.
    pub fn summary(&self) -> Option<TripSummary> {
        if self.state.status != TripStatus::Completed {
            return None;
        }
        Some(TripSummary {
            started_at_ms: self.state.start_ms?,
            completed_at_ms: self.completed_at_ms?,
            distance_km: self.distance_km(),
            total_rest_ms: self.state.total_rest_ms,
            fare: self.fare,
        })
    }

    fn close_rest(&mut self, now_ms: u64) {
        if let Some(rest_start) = self.state.rest_start_ms.take() {
            self.state.total_rest_ms += now_ms.saturating_sub(rest_start);
        }
    }

    fn recompute_fare(&mut self) {
        if !matches!(self.state.status, TripStatus::Active | TripStatus::Resting) {
            return;
        }
        self.fare = FareBreakdown::compute(
            &self.config,
            self.distance_km(),
            self.demand,
            &self.additions,
        );
    }

    fn clear(&mut self) {
        self.state = TripState::default();
        self.distance_m = 0.0;
        self.demand = DemandTier::default();
        self.additions.clear();
        self.fare = FareBreakdown::default();
        self.completed_at_ms = None;
    }

    fn ignored(&self, event: &'static str) -> Transition {
        debug!(event, status = ?self.state.status, "ignoring trip event");
        Transition::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> TripMachine {
        TripMachine::new(FareConfig::default())
    }

    #[test]
    fn start_sets_timestamp_and_base_fare() {
        let mut trip = machine();
        assert_eq!(trip.start_trip(1_000), Transition::Applied);
        let state = trip.state();
        assert_eq!(state.status, TripStatus::Active);
        assert_eq!(state.start_ms, Some(1_000));
        assert_eq!(state.rest_start_ms, None);
        assert_eq!(trip.fare().total, 2000);
    }

    #[test]
    fn rest_time_accumulates() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.toggle_rest(10_000);
        assert_eq!(trip.state().rest_start_ms, Some(10_000));
        trip.toggle_rest(15_000);
        let state = trip.state();
        assert_eq!(state.status, TripStatus::Active);
        assert_eq!(state.total_rest_ms, 5_000);
        assert_eq!(state.rest_start_ms, None);
        assert_eq!(trip.active_ms(20_000), 15_000);
    }

    #[test]
    fn active_time_excludes_ongoing_rest() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.toggle_rest(4_000);
        assert_eq!(trip.elapsed_ms(9_000), 9_000);
        assert_eq!(trip.active_ms(9_000), 4_000);
    }

    #[test]
    fn idle_ignores_rest_and_drop_off() {
        let mut trip = machine();
        let before = trip.state();
        assert_eq!(trip.toggle_rest(5), Transition::Ignored);
        assert_eq!(trip.drop_off(5), Transition::Ignored);
        assert_eq!(trip.reset_trip(), Transition::Ignored);
        assert_eq!(trip.state(), before);
    }

    #[test]
    fn start_is_ignored_once_running() {
        let mut trip = machine();
        trip.start_trip(1);
        assert_eq!(trip.start_trip(50), Transition::Ignored);
        assert_eq!(trip.state().start_ms, Some(1));
    }

    #[test]
    fn distance_only_counts_while_active() {
        let mut trip = machine();
        assert_eq!(trip.add_distance(100.0), Transition::Ignored);
        trip.start_trip(0);
        assert_eq!(trip.add_distance(100.0), Transition::Applied);
        trip.toggle_rest(10);
        assert_eq!(trip.add_distance(500.0), Transition::Ignored);
        trip.toggle_rest(20);
        assert_eq!(trip.add_distance(-20.0), Transition::Ignored);
        assert!((trip.distance_km() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn end_to_end_fare_example() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.add_distance(100.0);
        assert_eq!(trip.fare().total, 2060);
        trip.select_demand(DemandTier(1000));
        assert_eq!(trip.fare().total, 3060);
        trip.add_cumulative(500);
        assert_eq!(trip.fare().total, 3560);
    }

    #[test]
    fn demand_replaces_previous_tier() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.select_demand(DemandTier(1500));
        trip.select_demand(DemandTier(500));
        assert_eq!(trip.fare().demand_surcharge, 500);
        assert_eq!(trip.fare().total, 2500);
    }

    #[test]
    fn undo_and_clear_cumulative_additions() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.add_cumulative(500);
        trip.add_cumulative(1000);
        assert_eq!(trip.undo_cumulative(), Transition::Applied);
        assert_eq!(trip.additions().total(), 500);
        assert_eq!(trip.fare().cumulative_additions, 500);
        trip.clear_cumulative();
        assert_eq!(trip.additions().total(), 0);
        assert!(trip.additions().history().is_empty());
        assert_eq!(trip.undo_cumulative(), Transition::Ignored);
    }

    #[test]
    fn fare_is_frozen_after_drop_off() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.add_distance(2_500.0);
        trip.select_demand(DemandTier(1000));
        trip.drop_off(60_000);
        let frozen = trip.fare();
        assert_eq!(frozen.total, 2000 + 1500 + 1000);

        assert_eq!(trip.add_distance(1_000.0), Transition::Ignored);
        assert_eq!(trip.select_demand(DemandTier(3000)), Transition::Ignored);
        assert_eq!(trip.add_cumulative(500), Transition::Ignored);
        assert_eq!(trip.undo_cumulative(), Transition::Ignored);
        assert_eq!(trip.clear_cumulative(), Transition::Ignored);
        assert_eq!(trip.toggle_rest(70_000), Transition::Ignored);
        assert_eq!(trip.fare(), frozen);
        assert_eq!(trip.elapsed_ms(120_000), 60_000);
    }

    #[test]
    fn drop_off_while_resting_closes_rest() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.toggle_rest(1_000);
        trip.drop_off(4_000);
        let state = trip.state();
        assert_eq!(state.status, TripStatus::Completed);
        assert_eq!(state.rest_start_ms, None);
        assert_eq!(state.total_rest_ms, 3_000);
        let summary = trip.summary().expect("summary");
        assert_eq!(summary.elapsed_ms(), 4_000);
        assert_eq!(summary.active_ms(), 1_000);
    }

    #[test]
    fn cancel_clears_everything_from_any_status() {
        let mut trip = machine();
        trip.select_demand(DemandTier(500));
        trip.add_cumulative(200);
        trip.start_trip(0);
        trip.add_distance(300.0);
        trip.toggle_rest(10);
        assert_eq!(trip.cancel(), Transition::Applied);
        assert_eq!(trip.state(), TripState::default());
        assert_eq!(trip.demand(), DemandTier::default());
        assert!(trip.additions().is_empty());
        assert_eq!(trip.distance_km(), 0.0);
        assert_eq!(trip.fare(), FareBreakdown::default());
    }

    #[test]
    fn reset_returns_completed_trip_to_idle() {
        let mut trip = machine();
        trip.start_trip(0);
        trip.drop_off(10);
        assert!(trip.summary().is_some());
        assert_eq!(trip.reset_trip(), Transition::Applied);
        assert_eq!(trip.status(), TripStatus::Idle);
        assert!(trip.summary().is_none());
        assert_eq!(trip.start_trip(20), Transition::Applied);
    }

    #[test]
    fn surcharges_chosen_before_start_apply_at_start() {
        let mut trip = machine();
        trip.select_demand(DemandTier(1000));
        trip.add_cumulative(300);
        assert_eq!(trip.fare().total, 0);
        trip.start_trip(0);
        assert_eq!(trip.fare().total, 3300);
    }

    #[test]
    fn oversized_addition_is_ignored_and_fare_stays_put() {
        let mut trip = machine();
        trip.start_trip(0);
        assert_eq!(trip.add_cumulative(u64::MAX - 100), Transition::Applied);
        assert_eq!(trip.fare().total, u64::MAX);
        assert_eq!(trip.add_cumulative(500), Transition::Ignored);
        assert_eq!(trip.additions().history(), &[u64::MAX - 100]);
        assert_eq!(trip.undo_cumulative(), Transition::Applied);
        assert_eq!(trip.fare().total, 2000);
    }
}
