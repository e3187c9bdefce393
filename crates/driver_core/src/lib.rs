pub mod actor;
pub mod clock;
pub mod config;
pub mod directions;
pub mod error;
pub mod fare;
pub mod geo;
pub mod location;
pub mod polyline;
pub mod progress;
pub mod route;
pub mod runner;
pub mod session;
pub mod simulation;
pub mod speech;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
pub mod trip;
pub mod trip_log;
pub mod voice;
