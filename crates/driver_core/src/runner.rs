//! Session runner: drains an [`EventQueue`] into a [`NavigationSession`].
//!
//! Each step pops the next event and applies it to completion before the next
//! one is popped, so a replayed queue yields the same outputs every time.

use crate::clock::{EventQueue, SessionEvent};
use crate::session::{NavigationSession, SessionOutput};
use crate::trip::{Transition, TripSummary};
use crate::voice::VoiceCommand;

/// Aggregate of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub steps: usize,
    pub ignored_actions: usize,
    pub voice: Vec<VoiceCommand>,
    pub completed: Vec<TripSummary>,
}

impl RunReport {
    fn absorb(&mut self, output: SessionOutput) {
        self.steps += 1;
        if output.transition == Some(Transition::Ignored) {
            self.ignored_actions += 1;
        }
        self.voice.extend(output.voice);
        self.completed.extend(output.completed);
    }

    /// Texts of every utterance spoken during the run, in order.
    pub fn spoken_texts(&self) -> Vec<&str> {
        self.voice
            .iter()
            .filter_map(|command| match command {
                VoiceCommand::Speak(utterance) => Some(utterance.text.as_str()),
                VoiceCommand::Stop => None,
            })
            .collect()
    }
}

/// Runs one step. Returns the output, or `None` when the queue is empty.
pub fn run_next_event(session: &mut NavigationSession, queue: &mut EventQueue) -> Option<SessionOutput> {
    let event = queue.pop_next()?;
    Some(session.apply(event))
}

/// Runs one step and invokes `hook` with the event and the session after it
/// was applied.
pub fn run_next_event_with_hook<F>(
    session: &mut NavigationSession,
    queue: &mut EventQueue,
    mut hook: F,
) -> Option<SessionOutput>
where
    F: FnMut(&NavigationSession, &SessionEvent),
{
    let event = queue.pop_next()?;
    let output = session.apply(event.clone());
    hook(session, &event);
    Some(output)
}

/// Runs steps until the queue is empty or `max_steps` is reached.
pub fn run_until_empty(
    session: &mut NavigationSession,
    queue: &mut EventQueue,
    max_steps: usize,
) -> RunReport {
    run_until_empty_with_hook(session, queue, max_steps, |_, _| {})
}

/// Runs steps until empty and invokes `hook` after each step.
pub fn run_until_empty_with_hook<F>(
    session: &mut NavigationSession,
    queue: &mut EventQueue,
    max_steps: usize,
    mut hook: F,
) -> RunReport
where
    F: FnMut(&NavigationSession, &SessionEvent),
{
    let mut report = RunReport::default();
    while report.steps < max_steps {
        match run_next_event_with_hook(session, queue, &mut hook) {
            Some(output) => report.absorb(output),
            None => break,
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::DriverAction;
    use crate::config::DriverConfig;

    fn action(at_ms: u64, action: DriverAction) -> SessionEvent {
        SessionEvent::Action { at_ms, action }
    }

    #[test]
    fn drains_queue_in_order() {
        let mut session = NavigationSession::open(DriverConfig::default());
        let mut queue = EventQueue::default();
        queue.schedule(action(30_000, DriverAction::DropOff));
        queue.schedule(action(0, DriverAction::StartTrip));
        queue.schedule(action(10_000, DriverAction::AddCumulative(500)));

        let report = run_until_empty(&mut session, &mut queue, 100);
        assert_eq!(report.steps, 3);
        assert_eq!(report.ignored_actions, 0);
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].fare.total, 2500);
        assert!(queue.is_empty());
    }

    #[test]
    fn respects_max_steps() {
        let mut session = NavigationSession::open(DriverConfig::default());
        let mut queue = EventQueue::default();
        for at_ms in 0..10 {
            queue.schedule(SessionEvent::Tick { at_ms });
        }
        let report = run_until_empty(&mut session, &mut queue, 4);
        assert_eq!(report.steps, 4);
        assert_eq!(queue.len(), 6);
    }

    #[test]
    fn hook_sees_session_after_each_event() {
        let mut session = NavigationSession::open(DriverConfig::default());
        let mut queue = EventQueue::default();
        queue.schedule(action(0, DriverAction::StartTrip));
        queue.schedule(action(5, DriverAction::ToggleRest));

        let mut statuses = Vec::new();
        run_until_empty_with_hook(&mut session, &mut queue, 10, |session, _| {
            statuses.push(session.trip().status());
        });
        assert_eq!(
            statuses,
            vec![crate::trip::TripStatus::Active, crate::trip::TripStatus::Resting]
        );
    }

    #[test]
    fn counts_ignored_actions() {
        let mut session = NavigationSession::open(DriverConfig::default());
        let mut queue = EventQueue::default();
        queue.schedule(action(0, DriverAction::DropOff));
        queue.schedule(action(1, DriverAction::ToggleRest));
        let report = run_until_empty(&mut session, &mut queue, 10);
        assert_eq!(report.ignored_actions, 2);
        assert!(report.spoken_texts().is_empty());
    }
}
