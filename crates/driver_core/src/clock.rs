//! Session clock and event queue.
//!
//! All session input is a typed [`SessionEvent`]: position updates, timer
//! ticks, driver actions and route results. The queue releases events in
//! timestamp order; events sharing a timestamp come out in the order they
//! were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::fare::DemandTier;
use crate::location::PositionFix;
use crate::route::Route;

pub const ONE_SEC_MS: u64 = 1000;

/// Source of session timestamps for inputs that do not carry their own.
///
/// Must tick on the same timeline as the location provider's fixes.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock in Unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Operator input from the navigation screen and its dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverAction {
    StartTrip,
    ToggleRest,
    /// Confirmed drop-off.
    DropOff,
    Cancel,
    ResetTrip,
    SelectDemand(DemandTier),
    AddCumulative(u64),
    UndoCumulative,
    ClearCumulative,
    SetMuted(bool),
}

/// Result of a directions request made on behalf of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteUpdate {
    Ready(Route),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Position(PositionFix),
    Tick { at_ms: u64 },
    Action { at_ms: u64, action: DriverAction },
    Route { at_ms: u64, update: RouteUpdate },
}

impl SessionEvent {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            SessionEvent::Position(fix) => fix.timestamp_ms,
            SessionEvent::Tick { at_ms }
            | SessionEvent::Action { at_ms, .. }
            | SessionEvent::Route { at_ms, .. } => *at_ms,
        }
    }
}

#[derive(Debug, Clone)]
struct Scheduled {
    timestamp: u64,
    seq: u64,
    event: SessionEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, seq).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Scheduled>,
}

impl EventQueue {
    /// Timestamp of the most recently released event.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue an event. Events timestamped before `now` are still accepted and
    /// released next; the session decides whether they are stale.
    pub fn schedule(&mut self, event: SessionEvent) {
        let scheduled = Scheduled {
            timestamp: event.timestamp_ms(),
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;
        self.events.push(scheduled);
    }

    pub fn pop_next(&mut self) -> Option<SessionEvent> {
        let scheduled = self.events.pop()?;
        self.now = self.now.max(scheduled.timestamp);
        Some(scheduled.event)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
