//! Navigation session: the single owner of trip, route progress and voice state.
//!
//! Every input arrives as a [`SessionEvent`] and is applied to completion
//! before the next one. The session never blocks and never talks to a
//! provider directly; speech decisions come back as [`VoiceCommand`]s for the
//! caller to dispatch.

use tracing::{debug, info, warn};

use crate::clock::{DriverAction, RouteUpdate, SessionEvent};
use crate::config::DriverConfig;
use crate::fare::FareBreakdown;
use crate::geo::{distance_meters, Coordinate};
use crate::location::PositionFix;
use crate::progress::{NavigationProgress, RouteProgressTracker};
use crate::route::{Instruction, Route};
use crate::trip::{Transition, TripMachine, TripState, TripStatus, TripSummary};
use crate::trip_log::TripLog;
use crate::voice::{AnnouncementGate, VoiceCommand};

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionOutput {
    /// Trip machine outcome for driver actions.
    pub transition: Option<Transition>,
    pub progress: Option<NavigationProgress>,
    pub voice: Vec<VoiceCommand>,
    /// Set when this event completed a trip.
    pub completed: Option<TripSummary>,
}

/// Read-only view of the session for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub trip: TripState,
    pub fare: FareBreakdown,
    pub distance_km: f64,
    pub elapsed_ms: u64,
    pub active_ms: u64,
    pub progress: NavigationProgress,
    pub current_instruction: Option<Instruction>,
    pub has_route: bool,
    pub muted: bool,
    pub completed_trips: usize,
}

#[derive(Debug)]
pub struct NavigationSession {
    config: DriverConfig,
    trip: TripMachine,
    tracker: Option<RouteProgressTracker>,
    gate: AnnouncementGate,
    last_fix_ms: Option<u64>,
    odometer_anchor: Option<Coordinate>,
    now_ms: u64,
    log: TripLog,
    open: bool,
}

impl NavigationSession {
    pub fn open(config: DriverConfig) -> Self {
        info!("navigation session opened");
        Self {
            trip: TripMachine::new(config.fare.clone()),
            gate: AnnouncementGate::new(config.voice.clone()),
            tracker: None,
            last_fix_ms: None,
            odometer_anchor: None,
            now_ms: 0,
            log: TripLog::default(),
            open: true,
            config,
        }
    }

    /// Tear down the session. Returns the command that silences speech;
    /// later events are ignored.
    pub fn close(&mut self) -> Vec<VoiceCommand> {
        if !self.open {
            return Vec::new();
        }
        self.open = false;
        self.tracker = None;
        info!(completed_trips = self.log.len(), "navigation session closed");
        vec![VoiceCommand::Stop]
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn trip(&self) -> &TripMachine {
        &self.trip
    }

    pub fn route(&self) -> Option<&Route> {
        self.tracker.as_ref().map(RouteProgressTracker::route)
    }

    pub fn log(&self) -> &TripLog {
        &self.log
    }

    pub fn into_log(self) -> TripLog {
        self.log
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn apply(&mut self, event: SessionEvent) -> SessionOutput {
        if !self.open {
            debug!("ignoring event on closed session");
            return SessionOutput::default();
        }
        self.now_ms = self.now_ms.max(event.timestamp_ms());
        match event {
            SessionEvent::Position(fix) => self.on_position(fix),
            SessionEvent::Tick { .. } => SessionOutput::default(),
            SessionEvent::Action { at_ms, action } => self.on_action(at_ms, action),
            SessionEvent::Route { update, .. } => self.on_route(update),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let progress = self
            .tracker
            .as_ref()
            .map(RouteProgressTracker::last_progress)
            .unwrap_or(NavigationProgress::NoInstruction);
        SessionSnapshot {
            trip: self.trip.state(),
            fare: self.trip.fare(),
            distance_km: self.trip.distance_km(),
            elapsed_ms: self.trip.elapsed_ms(self.now_ms),
            active_ms: self.trip.active_ms(self.now_ms),
            progress,
            current_instruction: self.current_instruction().map(|(i, _)| i.clone()),
            has_route: self.tracker.is_some(),
            muted: self.gate.is_muted(),
            completed_trips: self.log.len(),
        }
    }

    fn on_position(&mut self, fix: PositionFix) -> SessionOutput {
        if self.last_fix_ms.is_some_and(|last| fix.timestamp_ms <= last) {
            debug!(timestamp_ms = fix.timestamp_ms, "dropping stale position fix");
            return SessionOutput::default();
        }
        self.last_fix_ms = Some(fix.timestamp_ms);
        if self.config.location.is_accurate(fix.accuracy_m) {
            self.accumulate_distance(fix.coordinate);
        } else {
            debug!(accuracy_m = ?fix.accuracy_m, "fix too coarse for the odometer");
        }

        let mut output = SessionOutput::default();
        let Some(tracker) = self.tracker.as_mut() else {
            return output;
        };
        let progress = tracker.update(fix.coordinate);
        output.progress = Some(progress);

        if let NavigationProgress::OnRoute {
            current_instruction_index,
            distance_to_next_instruction_m,
            ..
        } = progress
        {
            if let Some(instruction) = tracker.route().instruction(current_instruction_index) {
                if let Some(utterance) = self.gate.evaluate(instruction, distance_to_next_instruction_m) {
                    tracker.mark_announced(current_instruction_index);
                    output.voice.push(VoiceCommand::Speak(utterance));
                }
            }
        }
        output
    }

    /// Distance counts only while the trip is active and the move exceeds the
    /// jitter threshold. Outside an active trip the anchor just follows the car.
    fn accumulate_distance(&mut self, position: Coordinate) {
        if self.trip.status() != TripStatus::Active {
            self.odometer_anchor = Some(position);
            return;
        }
        let Some(anchor) = self.odometer_anchor else {
            self.odometer_anchor = Some(position);
            return;
        };
        let meters = distance_meters(anchor, position);
        if meters < self.config.location.min_distance_m {
            return;
        }
        self.trip.add_distance(meters);
        self.odometer_anchor = Some(position);
    }

    fn on_action(&mut self, at_ms: u64, action: DriverAction) -> SessionOutput {
        let mut output = SessionOutput::default();
        let transition = match action {
            DriverAction::StartTrip => self.trip.start_trip(at_ms),
            DriverAction::ToggleRest => self.trip.toggle_rest(at_ms),
            DriverAction::DropOff => {
                let transition = self.trip.drop_off(at_ms);
                if transition.is_applied() {
                    if let Some(summary) = self.trip.summary() {
                        self.log.record(summary);
                        output.completed = Some(summary);
                    }
                    self.end_navigation(&mut output);
                }
                transition
            }
            DriverAction::Cancel => {
                let transition = self.trip.cancel();
                self.end_navigation(&mut output);
                transition
            }
            DriverAction::ResetTrip => self.trip.reset_trip(),
            DriverAction::SelectDemand(tier) => self.trip.select_demand(tier),
            DriverAction::AddCumulative(amount) => self.trip.add_cumulative(amount),
            DriverAction::UndoCumulative => self.trip.undo_cumulative(),
            DriverAction::ClearCumulative => self.trip.clear_cumulative(),
            DriverAction::SetMuted(muted) if muted == self.gate.is_muted() => {
                debug!(muted, "mute state unchanged");
                Transition::Ignored
            }
            DriverAction::SetMuted(muted) => {
                let current = self
                    .current_instruction()
                    .map(|(instruction, distance)| (instruction.clone(), distance));
                let command = self
                    .gate
                    .set_muted(muted, current.as_ref().map(|(i, d)| (i, *d)));
                output.voice.extend(command);
                Transition::Applied
            }
        };
        output.transition = Some(transition);
        output
    }

    fn on_route(&mut self, update: RouteUpdate) -> SessionOutput {
        match update {
            RouteUpdate::Ready(route) => {
                info!(
                    instructions = route.instructions().len(),
                    points = route.path().len(),
                    "route replaced"
                );
                self.tracker = Some(RouteProgressTracker::new(route, self.config.progress.mode));
                self.gate.reset();
            }
            RouteUpdate::Failed(reason) => {
                warn!(%reason, has_route = self.tracker.is_some(), "keeping previous route");
            }
        }
        SessionOutput::default()
    }

    /// The route is discarded once the trip ends or is canceled.
    fn end_navigation(&mut self, output: &mut SessionOutput) {
        if self.tracker.take().is_some() {
            output.voice.push(VoiceCommand::Stop);
        }
        self.gate.reset();
    }

    fn current_instruction(&self) -> Option<(&Instruction, f64)> {
        let tracker = self.tracker.as_ref()?;
        let progress = tracker.last_progress();
        let instruction = tracker.route().instruction(progress.current_index()?)?;
        Some((instruction, progress.distance_m()?))
    }
}
