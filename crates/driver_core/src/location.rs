//! Location provider boundary.
//!
//! The platform location service is consumed through [`LocationProvider`].
//! Updates arrive on a `tokio` channel owned by the returned subscription.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::LocationConfig;
use crate::error::DriverError;
use crate::geo::Coordinate;

/// A timestamped position report. `accuracy_m` is the reported error radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub timestamp_ms: u64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl PositionFix {
    pub fn new(coordinate: Coordinate, timestamp_ms: u64) -> Self {
        Self {
            coordinate,
            timestamp_ms,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscribeOptions {
    pub interval_ms: u64,
    pub min_distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Live position updates. Dropping the receiver does not unsubscribe; call
/// [`LocationProvider::unsubscribe`] with `id`.
#[derive(Debug)]
pub struct LocationSubscription {
    pub id: SubscriptionId,
    pub updates: mpsc::Receiver<PositionFix>,
}

pub trait LocationProvider: Send {
    fn request_permission(&mut self) -> PermissionStatus;

    fn subscribe(&mut self, options: SubscribeOptions) -> Result<LocationSubscription, DriverError>;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// One-shot position request bounded by `timeout`.
///
/// Fails with [`DriverError::PermissionDenied`] when permission is refused
/// and with [`DriverError::LocationUnavailable`] when no fix arrives in time.
pub async fn current_position(
    provider: &mut dyn LocationProvider,
    timeout: Duration,
) -> Result<PositionFix, DriverError> {
    if provider.request_permission() == PermissionStatus::Denied {
        return Err(DriverError::PermissionDenied);
    }
    let mut subscription = provider.subscribe(SubscribeOptions {
        interval_ms: 0,
        min_distance_m: 0.0,
    })?;
    let result = tokio::time::timeout(timeout, subscription.updates.recv()).await;
    provider.unsubscribe(subscription.id);

    match result {
        Ok(Some(fix)) => {
            debug!(timestamp_ms = fix.timestamp_ms, "current position acquired");
            Ok(fix)
        }
        Ok(None) => Err(DriverError::LocationUnavailable(
            "location provider closed the subscription".to_string(),
        )),
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "current position timed out");
            Err(DriverError::LocationUnavailable(format!(
                "no fix within {} ms",
                timeout.as_millis()
            )))
        }
    }
}

/// [`current_position`] bounded by the configured one-shot timeout.
pub async fn current_position_within(
    provider: &mut dyn LocationProvider,
    config: &LocationConfig,
) -> Result<PositionFix, DriverError> {
    current_position(provider, config.current_position_timeout()).await
}
