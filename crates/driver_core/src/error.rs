use thiserror::Error;

use crate::polyline::PolylineError;

/// Failures surfaced by the provider boundary and configuration loading.
///
/// The trip state machine never produces one of these; unsupported transitions
/// are reported as [`crate::trip::Transition::Ignored`] instead.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("route calculation failed: {0}")]
    RouteCalculation(String),
    #[error("polyline decode failed: {0}")]
    PolylineDecode(#[from] PolylineError),
    #[error("speech unavailable: {0}")]
    SpeechUnavailable(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("navigation session is closed")]
    SessionClosed,
}

impl DriverError {
    /// Whether the UI should offer a retry affordance for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::PermissionDenied
                | DriverError::LocationUnavailable(_)
                | DriverError::RouteCalculation(_)
        )
    }
}
