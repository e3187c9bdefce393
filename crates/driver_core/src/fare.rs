//! Fare calculation for a metered trip.
//!
//! Formula: `total = base_fare + round(distance_km * rate_per_km) + demand + additions`
//!
//! Amounts are whole currency units (kyat). The breakdown is recomputed from
//! its inputs on every change rather than patched incrementally. Sums
//! saturate instead of wrapping.

use serde::{Deserialize, Serialize};

/// Flat fare charged as soon as a trip starts.
pub const DEFAULT_BASE_FARE: u64 = 2000;

/// Charge per kilometer driven.
pub const DEFAULT_RATE_PER_KM: u64 = 600;

/// Surcharge tiers offered by the demand-pricing dialog.
pub const DEFAULT_DEMAND_TIERS: [u64; 6] = [0, 500, 1000, 1500, 2000, 3000];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FareConfig {
    pub base_fare: u64,
    pub rate_per_km: u64,
    pub demand_tiers: Vec<u64>,
    pub currency: String,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_fare: DEFAULT_BASE_FARE,
            rate_per_km: DEFAULT_RATE_PER_KM,
            demand_tiers: DEFAULT_DEMAND_TIERS.to_vec(),
            currency: "MMK".to_string(),
        }
    }
}

impl FareConfig {
    /// Demand tier at `index` in the configured list.
    pub fn demand_tier(&self, index: usize) -> Option<DemandTier> {
        self.demand_tiers.get(index).copied().map(DemandTier)
    }
}

/// Operator-selected surcharge. Selecting a tier replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DemandTier(pub u64);

/// Ad-hoc increments added on top of the metered fare, undoable in LIFO order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CumulativeAdditions {
    history: Vec<u64>,
}

impl CumulativeAdditions {
    pub fn add(&mut self, amount: u64) {
        self.history.push(amount);
    }

    /// Remove the most recent addition, returning it.
    pub fn undo(&mut self) -> Option<u64> {
        self.history.pop()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Sum of all additions, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.history
            .iter()
            .fold(0u64, |total, amount| total.saturating_add(*amount))
    }

    pub fn history(&self) -> &[u64] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_fare: u64,
    pub distance_charge: u64,
    pub demand_surcharge: u64,
    pub cumulative_additions: u64,
    pub total: u64,
}

impl FareBreakdown {
    pub fn compute(
        config: &FareConfig,
        distance_km: f64,
        demand: DemandTier,
        additions: &CumulativeAdditions,
    ) -> Self {
        let distance_charge = distance_charge(config.rate_per_km, distance_km);
        let cumulative_additions = additions.total();
        Self {
            base_fare: config.base_fare,
            distance_charge,
            demand_surcharge: demand.0,
            cumulative_additions,
            total: config
                .base_fare
                .saturating_add(distance_charge)
                .saturating_add(demand.0)
                .saturating_add(cumulative_additions),
        }
    }
}

/// Rounded to the nearest whole unit; negative or NaN distances charge nothing.
fn distance_charge(rate_per_km: u64, distance_km: f64) -> u64 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0;
    }
    (distance_km * rate_per_km as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_sums_all_components() {
        let config = FareConfig::default();
        let mut additions = CumulativeAdditions::default();
        let fare = FareBreakdown::compute(&config, 0.1, DemandTier::default(), &additions);
        assert_eq!(fare.distance_charge, 60);
        assert_eq!(fare.total, 2060);

        let fare = FareBreakdown::compute(&config, 0.1, DemandTier(1000), &additions);
        assert_eq!(fare.total, 3060);

        additions.add(500);
        let fare = FareBreakdown::compute(&config, 0.1, DemandTier(1000), &additions);
        assert_eq!(fare.cumulative_additions, 500);
        assert_eq!(fare.total, 3560);
    }

    #[test]
    fn fare_never_decreases_with_distance() {
        let config = FareConfig::default();
        let additions = CumulativeAdditions::default();
        let mut previous = 0;
        for step in 0..500 {
            let km = step as f64 * 0.037;
            let total = FareBreakdown::compute(&config, km, DemandTier(500), &additions).total;
            assert!(total >= previous, "fare dropped at {km} km");
            previous = total;
        }
    }

    #[test]
    fn invalid_distance_charges_nothing() {
        let config = FareConfig::default();
        let additions = CumulativeAdditions::default();
        for km in [-1.0, f64::NAN, f64::INFINITY] {
            let fare = FareBreakdown::compute(&config, km, DemandTier::default(), &additions);
            assert_eq!(fare.total, DEFAULT_BASE_FARE);
        }
    }

    #[test]
    fn additions_undo_in_lifo_order_and_clear() {
        let mut additions = CumulativeAdditions::default();
        additions.add(500);
        additions.add(1000);
        assert_eq!(additions.undo(), Some(1000));
        assert_eq!(additions.total(), 500);
        additions.clear();
        assert_eq!(additions.total(), 0);
        assert!(additions.is_empty());
        assert_eq!(additions.undo(), None);
    }

    #[test]
    fn demand_tiers_come_from_config() {
        let config = FareConfig::default();
        assert_eq!(config.demand_tier(2), Some(DemandTier(1000)));
        assert_eq!(config.demand_tier(42), None);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let config = FareConfig::default();
        let mut additions = CumulativeAdditions::default();
        additions.add(u64::MAX - 100);
        additions.add(500);
        assert_eq!(additions.total(), u64::MAX);

        let fare = FareBreakdown::compute(&config, 1e30, DemandTier(u64::MAX), &additions);
        assert_eq!(fare.total, u64::MAX);
    }
}
