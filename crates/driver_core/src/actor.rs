//! Session actor: one `tokio` task owns a [`NavigationSession`].
//!
//! Driver actions, route results and location fixes are funneled into the
//! task and applied one at a time. Callers talk to it through a cloneable
//! [`SessionHandle`] and observe it through `watch` snapshots. Speech
//! commands produced by the session are dispatched from inside the task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::{Clock, DriverAction, RouteUpdate, SessionEvent, SystemClock};
use crate::config::DriverConfig;
use crate::directions::{DirectionsProvider, RouteOptions};
use crate::error::DriverError;
use crate::geo::Coordinate;
use crate::location::{
    current_position_within, LocationProvider, PermissionStatus, PositionFix, SubscribeOptions,
    SubscriptionId,
};
use crate::session::{NavigationSession, SessionSnapshot};
use crate::speech::{dispatch, SpeechProvider};
use crate::trip_log::TripLog;

const COMMAND_BUFFER: usize = 32;

#[derive(Debug)]
enum SessionCommand {
    Action(DriverAction),
    Route(RouteUpdate),
    Tick,
    Close,
}

/// Builder for a session task.
pub struct SessionActor {
    config: DriverConfig,
    speech: Box<dyn SpeechProvider>,
    location: Option<Box<dyn LocationProvider>>,
    clock: Arc<dyn Clock>,
}

impl SessionActor {
    pub fn new(config: DriverConfig, speech: Box<dyn SpeechProvider>) -> Self {
        Self {
            config,
            speech,
            location: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Subscribe to live fixes from `location` when the task starts.
    pub fn with_location(mut self, location: Box<dyn LocationProvider>) -> Self {
        self.location = Some(location);
        self
    }

    /// Clock used to stamp driver actions and route results.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// One-shot fix from the configured location provider, e.g. to pick a
    /// route origin before the session starts. Bounded by
    /// `location.current_position_timeout_ms`.
    pub async fn current_position(&mut self) -> Result<PositionFix, DriverError> {
        let provider = self.location.as_deref_mut().ok_or_else(|| {
            DriverError::LocationUnavailable("no location provider configured".to_string())
        })?;
        current_position_within(provider, &self.config.location).await
    }

    /// Start the task. Must be called within a `tokio` runtime.
    ///
    /// Fails with [`DriverError::PermissionDenied`] when the location
    /// provider refuses permission; no task is started in that case. The
    /// join handle yields the session's trip log once it closes.
    pub fn spawn(self) -> Result<(SessionHandle, JoinHandle<TripLog>), DriverError> {
        let SessionActor {
            config,
            speech,
            mut location,
            clock,
        } = self;

        let mut subscription = None;
        if let Some(provider) = location.as_mut() {
            if provider.request_permission() == PermissionStatus::Denied {
                warn!("location permission denied; session not started");
                return Err(DriverError::PermissionDenied);
            }
            subscription = Some(provider.subscribe(SubscribeOptions {
                interval_ms: config.location.interval_ms,
                min_distance_m: config.location.min_distance_m,
            })?);
        }

        let session = NavigationSession::open(config);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots_tx, snapshots_rx) = watch::channel(session.snapshot());

        let (subscription_id, updates) = match subscription {
            Some(subscription) => (Some(subscription.id), Some(subscription.updates)),
            None => (None, None),
        };
        let task = SessionTask {
            session,
            speech,
            location,
            subscription_id,
            clock,
            snapshots: snapshots_tx,
        };
        let join = tokio::spawn(task.run(commands_rx, updates));

        Ok((
            SessionHandle {
                commands: commands_tx,
                snapshots: snapshots_rx,
            },
            join,
        ))
    }
}

struct SessionTask {
    session: NavigationSession,
    speech: Box<dyn SpeechProvider>,
    location: Option<Box<dyn LocationProvider>>,
    subscription_id: Option<SubscriptionId>,
    clock: Arc<dyn Clock>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionTask {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut updates: Option<mpsc::Receiver<PositionFix>>,
    ) -> TripLog {
        let mut location_open = updates.is_some();
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Close) | None => break,
                    Some(command) => self.on_command(command),
                },
                fix = next_fix(&mut updates), if location_open => match fix {
                    Some(fix) => self.apply(SessionEvent::Position(fix)),
                    None => {
                        warn!("location updates ended");
                        location_open = false;
                    }
                },
            }
        }
        self.shutdown()
    }

    fn on_command(&mut self, command: SessionCommand) {
        let at_ms = self.clock.now_ms();
        let event = match command {
            SessionCommand::Action(action) => SessionEvent::Action { at_ms, action },
            SessionCommand::Route(update) => SessionEvent::Route { at_ms, update },
            SessionCommand::Tick => SessionEvent::Tick { at_ms },
            SessionCommand::Close => return,
        };
        self.apply(event);
    }

    fn apply(&mut self, event: SessionEvent) {
        let output = self.session.apply(event);
        for command in &output.voice {
            dispatch(self.speech.as_mut(), command);
        }
        self.snapshots.send_replace(self.session.snapshot());
    }

    fn shutdown(mut self) -> TripLog {
        if let (Some(provider), Some(id)) = (self.location.as_mut(), self.subscription_id) {
            provider.unsubscribe(id);
        }
        for command in self.session.close() {
            dispatch(self.speech.as_mut(), &command);
        }
        self.snapshots.send_replace(self.session.snapshot());
        info!(completed_trips = self.session.log().len(), "session task finished");
        self.session.into_log()
    }
}

async fn next_fix(updates: &mut Option<mpsc::Receiver<PositionFix>>) -> Option<PositionFix> {
    match updates {
        Some(updates) => updates.recv().await,
        None => std::future::pending().await,
    }
}

/// Cloneable handle to a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, action: DriverAction) -> Result<(), DriverError> {
        self.dispatch(SessionCommand::Action(action)).await
    }

    /// Re-evaluate time-based state, e.g. for a once-per-second display.
    pub async fn tick(&self) -> Result<(), DriverError> {
        self.dispatch(SessionCommand::Tick).await
    }

    /// Hand a route result to the session.
    pub async fn update_route(&self, update: RouteUpdate) -> Result<(), DriverError> {
        self.dispatch(SessionCommand::Route(update)).await
    }

    /// Ask `provider` for a route off the session task and hand the result to
    /// the session. On failure the session keeps its previous route and the
    /// provider's error is returned.
    pub async fn calculate_route(
        &self,
        provider: Arc<dyn DirectionsProvider>,
        origin: Coordinate,
        destination: Coordinate,
        options: RouteOptions,
    ) -> Result<(), DriverError> {
        let result = tokio::task::spawn_blocking(move || {
            provider.calculate_route(origin, destination, &options)
        })
        .await
        .map_err(|err| DriverError::RouteCalculation(format!("directions task failed: {err}")))?;

        match result {
            Ok(response) => {
                debug!(steps = response.steps.len(), "route calculated");
                self.update_route(RouteUpdate::Ready(response.into_route())).await
            }
            Err(err) => {
                self.update_route(RouteUpdate::Failed(err.to_string())).await?;
                Err(err)
            }
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified after every applied event.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// End the session: unsubscribes location updates, silences speech and
    /// stops the task. Closing an already closed session is not an error.
    pub async fn close(&self) -> Result<(), DriverError> {
        match self.dispatch(SessionCommand::Close).await {
            Ok(()) | Err(DriverError::SessionClosed) => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn dispatch(&self, command: SessionCommand) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DriverError::SessionClosed)
    }
}
