//! Test helpers for common test setup and utilities.
//!
//! Shared fixtures (a small route in Yangon) and in-memory providers used by
//! unit tests, integration tests and benches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::directions::RawRouteResponse;
use crate::error::DriverError;
use crate::geo::Coordinate;
use crate::location::{
    LocationProvider, LocationSubscription, PermissionStatus, PositionFix, SubscribeOptions,
    SubscriptionId,
};
use crate::route::{RawStep, Route};
use crate::simulation::{
    demo_raw_response, demo_route, demo_route_anchors, demo_route_path, demo_steps, DEMO_DESTINATION,
    DEMO_ORIGIN,
};
use crate::speech::SpeechProvider;
use crate::voice::Utterance;

/// Where the sample route starts.
pub const SAMPLE_ORIGIN: Coordinate = DEMO_ORIGIN;
/// Where the sample route ends.
pub const SAMPLE_DESTINATION: Coordinate = DEMO_DESTINATION;

/// Instruction anchors of the sample route (the built-in demo route).
pub fn sample_route_anchors() -> Vec<Coordinate> {
    demo_route_anchors()
}

pub fn sample_route_path() -> Vec<Coordinate> {
    demo_route_path()
}

pub fn sample_steps() -> Vec<RawStep> {
    demo_steps()
}

pub fn sample_raw_response() -> RawRouteResponse {
    demo_raw_response()
}

pub fn sample_route() -> Route {
    demo_route()
}

/// Speech provider calls as observed by [`RecordingSpeech`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCall {
    Speak(String),
    Stop,
}

#[derive(Debug, Default)]
struct SpeechState {
    calls: Vec<SpeechCall>,
    speaking: bool,
}

/// Records every call. Clones share the same log, so a test can keep one
/// clone while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    state: Arc<Mutex<SpeechState>>,
}

impl RecordingSpeech {
    pub fn calls(&self) -> Vec<SpeechCall> {
        self.lock().calls.clone()
    }

    /// Texts passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SpeechCall::Speak(text) => Some(text.clone()),
                SpeechCall::Stop => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, SpeechState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SpeechProvider for RecordingSpeech {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.calls.push(SpeechCall::Speak(utterance.text.clone()));
        state.speaking = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.calls.push(SpeechCall::Stop);
        state.speaking = false;
    }

    fn is_speaking(&self) -> bool {
        self.lock().speaking
    }
}

/// A device without a speech engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSpeech;

impl SpeechProvider for FailingSpeech {
    fn speak(&mut self, _utterance: &Utterance) -> Result<(), DriverError> {
        Err(DriverError::SpeechUnavailable("no speech engine".to_string()))
    }

    fn stop(&mut self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct LocationState {
    sender: Option<mpsc::Sender<PositionFix>>,
    next_id: u64,
    subscribed: Vec<SubscriptionId>,
    unsubscribed: Vec<SubscriptionId>,
}

/// Location provider fed by the test through a [`LocationFeed`].
#[derive(Debug)]
pub struct ScriptedLocation {
    permission: PermissionStatus,
    state: Arc<Mutex<LocationState>>,
}

/// Test side of a [`ScriptedLocation`].
#[derive(Debug, Clone)]
pub struct LocationFeed {
    state: Arc<Mutex<LocationState>>,
}

impl ScriptedLocation {
    pub fn new(permission: PermissionStatus) -> (Self, LocationFeed) {
        let state = Arc::new(Mutex::new(LocationState::default()));
        (
            Self {
                permission,
                state: Arc::clone(&state),
            },
            LocationFeed { state },
        )
    }

    pub fn granted() -> (Self, LocationFeed) {
        Self::new(PermissionStatus::Granted)
    }
}

impl LocationProvider for ScriptedLocation {
    fn request_permission(&mut self) -> PermissionStatus {
        self.permission
    }

    fn subscribe(&mut self, _options: SubscribeOptions) -> Result<LocationSubscription, DriverError> {
        if self.permission == PermissionStatus::Denied {
            return Err(DriverError::PermissionDenied);
        }
        let (sender, updates) = mpsc::channel(64);
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.sender = Some(sender);
        state.subscribed.push(id);
        Ok(LocationSubscription { id, updates })
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        let mut state = lock(&self.state);
        state.sender = None;
        state.unsubscribed.push(id);
    }
}

impl LocationFeed {
    /// Deliver a fix to the active subscription. Returns `false` when there
    /// is no subscriber.
    pub fn push(&self, fix: PositionFix) -> bool {
        let state = lock(&self.state);
        match &state.sender {
            Some(sender) => sender.try_send(fix).is_ok(),
            None => false,
        }
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionId> {
        lock(&self.state).subscribed.clone()
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        lock(&self.state).unsubscribed.clone()
    }
}

fn lock(state: &Mutex<LocationState>) -> MutexGuard<'_, LocationState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clock the test moves by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
