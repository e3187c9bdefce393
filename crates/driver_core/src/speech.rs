//! Speech provider boundary.

use tracing::warn;

use crate::error::DriverError;
use crate::voice::{Utterance, VoiceCommand};

pub trait SpeechProvider: Send {
    /// Fire-and-forget playback of an utterance.
    fn speak(&mut self, utterance: &Utterance) -> Result<(), DriverError>;

    fn stop(&mut self);

    fn is_speaking(&self) -> bool;
}

/// Apply a gate decision to the provider.
///
/// A new utterance interrupts the one in flight. Speech failures degrade to
/// silent guidance and are only logged.
pub fn dispatch(provider: &mut dyn SpeechProvider, command: &VoiceCommand) {
    match command {
        VoiceCommand::Stop => provider.stop(),
        VoiceCommand::Speak(utterance) => {
            if provider.is_speaking() {
                provider.stop();
            }
            if let Err(err) = provider.speak(utterance) {
                warn!(error = %err, "voice guidance unavailable");
            }
        }
    }
}
