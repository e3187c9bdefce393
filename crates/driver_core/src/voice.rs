//! Voice-announcement gate.
//!
//! Decides when an instruction should be spoken given the distance to its
//! maneuver and the mute state. Each instruction is announced at most twice:
//! once when it first appears inside the early band and once when the driver
//! first crosses into the imminent band. An instruction first seen inside the
//! imminent band is announced once.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::route::Instruction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// BCP-47 language code handed to the speech provider.
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub imminent_distance_m: f64,
    pub early_distance_m: f64,
    /// Initial mute state of a new session.
    pub muted: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 0.9,
            pitch: 1.0,
            imminent_distance_m: 100.0,
            early_distance_m: 500.0,
            muted: false,
        }
    }
}

/// Text plus the speech parameters it should be spoken with.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
}

/// What the speech provider should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceCommand {
    Speak(Utterance),
    /// Cancel any in-flight speech.
    Stop,
}

#[derive(Debug, Clone)]
pub struct AnnouncementGate {
    config: VoiceConfig,
    muted: bool,
    last_announced_text: Option<String>,
    imminent_announced: bool,
}

impl AnnouncementGate {
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            muted: config.muted,
            config,
            last_announced_text: None,
            imminent_announced: false,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn last_announced_text(&self) -> Option<&str> {
        self.last_announced_text.as_deref()
    }

    /// Evaluate the current instruction. Returns the utterance to speak, if any,
    /// and records it so continued proximity does not repeat it.
    pub fn evaluate(&mut self, instruction: &Instruction, distance_m: f64) -> Option<Utterance> {
        if self.muted || !distance_m.is_finite() {
            return None;
        }
        let imminent = distance_m <= self.config.imminent_distance_m;
        let is_new = self.last_announced_text.as_deref() != Some(instruction.text.as_str());

        let speak = if is_new {
            distance_m <= self.config.early_distance_m
        } else {
            imminent && !self.imminent_announced
        };
        if !speak {
            return None;
        }

        self.last_announced_text = Some(instruction.text.clone());
        self.imminent_announced = imminent;
        debug!(text = %instruction.text, distance_m, imminent, "announcing instruction");
        Some(self.utterance(instruction, distance_m))
    }

    /// Change the mute state.
    ///
    /// Muting stops in-flight speech. Unmuting immediately re-announces
    /// `current` when an instruction is active.
    pub fn set_muted(
        &mut self,
        muted: bool,
        current: Option<(&Instruction, f64)>,
    ) -> Option<VoiceCommand> {
        if muted == self.muted {
            return None;
        }
        self.muted = muted;
        if muted {
            debug!("voice muted");
            return Some(VoiceCommand::Stop);
        }
        debug!("voice unmuted");
        let (instruction, distance_m) = current?;
        self.last_announced_text = Some(instruction.text.clone());
        self.imminent_announced = distance_m <= self.config.imminent_distance_m;
        Some(VoiceCommand::Speak(self.utterance(instruction, distance_m)))
    }

    /// Forget announcement history, e.g. after a route is replaced.
    pub fn reset(&mut self) {
        self.last_announced_text = None;
        self.imminent_announced = false;
    }

    fn utterance(&self, instruction: &Instruction, distance_m: f64) -> Utterance {
        Utterance {
            text: format_announcement(instruction, distance_m, self.config.imminent_distance_m),
            language: self.config.language.clone(),
            rate: self.config.rate,
            pitch: self.config.pitch,
        }
    }
}

/// Spoken form of an instruction. Inside the imminent band the distance
/// prefix is dropped; otherwise it is rounded to a speakable value.
pub fn format_announcement(instruction: &Instruction, distance_m: f64, imminent_m: f64) -> String {
    if distance_m <= imminent_m {
        return instruction.text.clone();
    }
    let distance = if distance_m >= 1000.0 {
        format!("{:.1} kilometers", distance_m / 1000.0)
    } else {
        format!("{} meters", ((distance_m / 10.0).round() as u64) * 10)
    };
    format!("In {distance}, {}", lowercase_first(&instruction.text))
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
