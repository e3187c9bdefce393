//! Completed-trip log for the lifetime of a session. Not persisted.

use crate::trip::TripSummary;

#[derive(Debug, Clone, Default)]
pub struct TripLog {
    completed_trips: Vec<TripSummary>,
}

impl TripLog {
    pub fn record(&mut self, summary: TripSummary) {
        self.completed_trips.push(summary);
    }

    pub fn completed_trips(&self) -> &[TripSummary] {
        &self.completed_trips
    }

    pub fn len(&self) -> usize {
        self.completed_trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed_trips.is_empty()
    }

    /// Sum of confirmed fares.
    pub fn total_earnings(&self) -> u64 {
        self.completed_trips.iter().map(|trip| trip.fare.total).sum()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.completed_trips.iter().map(|trip| trip.distance_km).sum()
    }

    /// Driving time across all trips, excluding rests.
    pub fn total_active_ms(&self) -> u64 {
        self.completed_trips.iter().map(TripSummary::active_ms).sum()
    }
}
