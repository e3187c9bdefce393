use driver_core::clock::EventQueue;
use driver_core::config::DriverConfig;
use driver_core::progress::ProgressMode;
use driver_core::session::NavigationSession;
use driver_core::simulation::{RouteWalker, WalkerConfig};
use driver_core::test_helpers::{sample_route, sample_route_path};

use super::events::route_ready;

/// Builder configuration for reproducible test sessions.
#[derive(Clone, Debug)]
pub struct TestSessionConfig {
    pub mode: ProgressMode,
    pub min_distance_m: f64,
    pub muted: bool,
    pub speed_kmh: f64,
    pub interval_ms: u64,
    pub jitter_m: f64,
    pub seed: u64,
}

impl Default for TestSessionConfig {
    fn default() -> Self {
        Self {
            mode: ProgressMode::Cursor,
            min_distance_m: 10.0,
            muted: false,
            speed_kmh: 36.0,
            interval_ms: 10_000,
            jitter_m: 0.0,
            seed: 42,
        }
    }
}

impl TestSessionConfig {
    pub fn driver_config(&self) -> DriverConfig {
        let mut config = DriverConfig::default();
        config.progress.mode = self.mode;
        config.location.min_distance_m = self.min_distance_m;
        config.voice.muted = self.muted;
        config
    }

    pub fn walker(&self) -> RouteWalker {
        RouteWalker::new(
            sample_route_path(),
            WalkerConfig {
                speed_kmh: self.speed_kmh,
                interval_ms: self.interval_ms,
                jitter_m: self.jitter_m,
                seed: Some(self.seed),
            },
        )
    }
}

/// Session plus a queue holding the sample route and a full trip along it.
/// Returns the drop-off timestamp.
pub fn sample_trip(config: &TestSessionConfig) -> (NavigationSession, EventQueue, u64) {
    let session = NavigationSession::open(config.driver_config());
    let mut queue = EventQueue::default();
    queue.schedule(route_ready(0, sample_route()));
    let end_ms = config.walker().schedule_trip(&mut queue, 0);
    (session, queue, end_ms)
}
