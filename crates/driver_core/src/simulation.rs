//! Route walker: replays a drive along a route path as timestamped fixes.
//!
//! Used for demos, benchmarks and end-to-end tests in place of a live
//! location provider. Positions are sampled at a fixed speed and interval;
//! optional jitter displaces each sample by a random offset of up to
//! `jitter_m` meters. With a seed the run is reproducible.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::{DriverAction, EventQueue, SessionEvent};
use crate::directions::RawRouteResponse;
use crate::geo::{distance_meters, Coordinate};
use crate::location::PositionFix;
use crate::polyline::encode_polyline;
use crate::route::{RawStep, Route};

/// Meters per degree of latitude, used to turn jitter offsets into degrees.
const METERS_PER_DEGREE: f64 = 111_320.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    pub speed_kmh: f64,
    pub interval_ms: u64,
    pub jitter_m: f64,
    pub seed: Option<u64>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            speed_kmh: 30.0,
            interval_ms: 3_000,
            jitter_m: 0.0,
            seed: None,
        }
    }
}

pub struct RouteWalker {
    path: Vec<Coordinate>,
    config: WalkerConfig,
    rng: StdRng,
}

impl RouteWalker {
    pub fn new(path: Vec<Coordinate>, config: WalkerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { path, config, rng }
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Meters covered between consecutive fixes.
    pub fn step_m(&self) -> f64 {
        self.config.speed_kmh / 3.6 * self.config.interval_ms as f64 / 1000.0
    }

    /// Fixes for one pass over the path, the first at `start_ms`. The last
    /// fix always lies on the path's final point (plus jitter).
    pub fn fixes(&mut self, start_ms: u64) -> Vec<PositionFix> {
        let step_m = self.step_m();
        if step_m <= 0.0 || !step_m.is_finite() {
            return Vec::new();
        }
        let samples = sample_path(&self.path, step_m);
        let mut fixes = Vec::with_capacity(samples.len());
        for (idx, position) in samples.into_iter().enumerate() {
            let coordinate = self.jitter(position);
            let timestamp_ms = start_ms + idx as u64 * self.config.interval_ms;
            fixes.push(PositionFix::new(coordinate, timestamp_ms));
        }
        fixes
    }

    /// Queue a whole trip: start at `start_ms`, one fix per interval, then a
    /// drop-off at the final fix. Returns the drop-off timestamp.
    pub fn schedule_trip(&mut self, queue: &mut EventQueue, start_ms: u64) -> u64 {
        queue.schedule(SessionEvent::Action {
            at_ms: start_ms,
            action: DriverAction::StartTrip,
        });
        let fixes = self.fixes(start_ms);
        let end_ms = fixes.last().map_or(start_ms, |fix| fix.timestamp_ms);
        for fix in fixes {
            queue.schedule(SessionEvent::Position(fix));
        }
        queue.schedule(SessionEvent::Action {
            at_ms: end_ms,
            action: DriverAction::DropOff,
        });
        end_ms
    }

    fn jitter(&mut self, position: Coordinate) -> Coordinate {
        if self.config.jitter_m <= 0.0 {
            return position;
        }
        let angle = self.rng.gen_range(0.0..TAU);
        let radius = self.rng.gen_range(0.0..=self.config.jitter_m);
        let north_m = radius * angle.cos();
        let east_m = radius * angle.sin();
        let meters_per_lon_degree = METERS_PER_DEGREE * position.latitude.to_radians().cos().max(1e-6);
        Coordinate::new(
            position.latitude + north_m / METERS_PER_DEGREE,
            position.longitude + east_m / meters_per_lon_degree,
        )
    }
}

/// Points every `step_m` meters along `path`, starting at its first point and
/// ending at its last.
fn sample_path(path: &[Coordinate], step_m: f64) -> Vec<Coordinate> {
    let Some(first) = path.first() else {
        return Vec::new();
    };
    let mut samples = vec![*first];
    // Distance travelled since the last emitted sample.
    let mut carried = 0.0;
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let segment = distance_meters(a, b);
        if segment == 0.0 {
            continue;
        }
        let mut along = step_m - carried;
        while along <= segment {
            samples.push(interpolate(a, b, along / segment));
            along += step_m;
        }
        carried = segment - (along - step_m);
    }
    if carried > 1e-3 {
        if let Some(last) = path.last() {
            samples.push(*last);
        }
    }
    samples
}

fn interpolate(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(
        a.latitude + (b.latitude - a.latitude) * t,
        a.longitude + (b.longitude - a.longitude) * t,
    )
}

/// Where the built-in demo route starts.
pub const DEMO_ORIGIN: Coordinate = Coordinate::new(16.8000, 96.1500);
/// Where the built-in demo route ends.
pub const DEMO_DESTINATION: Coordinate = Coordinate::new(16.8150, 96.1560);

/// Instruction anchors of the demo route, roughly 550-650 m apart.
pub fn demo_route_anchors() -> Vec<Coordinate> {
    vec![
        DEMO_ORIGIN,
        Coordinate::new(16.8050, 96.1500),
        Coordinate::new(16.8050, 96.1560),
        Coordinate::new(16.8100, 96.1560),
    ]
}

/// Full demo path: every anchor followed by the destination.
pub fn demo_route_path() -> Vec<Coordinate> {
    let mut path = demo_route_anchors();
    path.push(DEMO_DESTINATION);
    path
}

pub fn demo_steps() -> Vec<RawStep> {
    let anchors = demo_route_anchors();
    let step = |html: &str, distance: &str, maneuver: Option<&str>, anchor: Coordinate| RawStep {
        instruction_html: html.to_string(),
        distance_text: distance.to_string(),
        duration_text: "2 mins".to_string(),
        maneuver: maneuver.map(str::to_string),
        start_location: anchor,
    };
    vec![
        step("Head <b>north</b> on <b>Pyay Rd</b>", "0.6 km", None, anchors[0]),
        step("Turn <b>right</b> onto <b>Inya Rd</b>", "0.6 km", Some("turn-right"), anchors[1]),
        step(
            "Turn <b>left</b> onto <b>Kaba Aye Pagoda Rd</b>",
            "0.6 km",
            Some("turn-left"),
            anchors[2],
        ),
        step(
            "Keep <b>right</b> to stay on <b>Kaba Aye Pagoda Rd</b><div>Destination will be on the left</div>",
            "0.6 km",
            Some("keep-right"),
            anchors[3],
        ),
    ]
}

/// The demo route as a directions provider would return it.
pub fn demo_raw_response() -> RawRouteResponse {
    RawRouteResponse {
        polyline: encode_polyline(&demo_route_path()),
        steps: demo_steps(),
        bounds: None,
        distance_text: "2.3 km".to_string(),
        duration_text: "8 mins".to_string(),
    }
}

/// Route driven by `driver simulate` when no route file is given.
pub fn demo_route() -> Route {
    demo_raw_response().into_route()
}
