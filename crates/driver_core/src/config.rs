//! Session configuration loaded from JSON.
//!
//! Every field has a default, so an empty object is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::directions::DirectionsConfig;
use crate::error::DriverError;
use crate::fare::FareConfig;
use crate::progress::ProgressMode;
use crate::voice::VoiceConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub mode: ProgressMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Requested interval between position updates.
    pub interval_ms: u64,
    /// Fixes closer than this to the last applied fix are treated as jitter.
    pub min_distance_m: f64,
    /// Bound for a one-shot current-position request.
    pub current_position_timeout_ms: u64,
    /// Fixes reporting a worse accuracy radius do not move the odometer.
    pub max_accuracy_m: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3_000,
            min_distance_m: 10.0,
            current_position_timeout_ms: 15_000,
            max_accuracy_m: 50.0,
        }
    }
}

impl LocationConfig {
    pub fn current_position_timeout(&self) -> Duration {
        Duration::from_millis(self.current_position_timeout_ms)
    }

    /// Fixes without a reported accuracy are trusted.
    pub fn is_accurate(&self, accuracy_m: Option<f64>) -> bool {
        match accuracy_m {
            Some(radius) => radius <= self.max_accuracy_m,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub fare: FareConfig,
    pub progress: ProgressConfig,
    pub voice: VoiceConfig,
    pub location: LocationConfig,
    pub directions: DirectionsConfig,
}

impl DriverConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DriverError> {
        let config: DriverConfig =
            serde_json::from_str(json).map_err(|err| DriverError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DriverError> {
        let json = fs::read_to_string(path).map_err(|err| {
            DriverError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), DriverError> {
        if self.fare.rate_per_km == 0 {
            return Err(DriverError::Config("fare.rate_per_km must be positive".into()));
        }
        if self.voice.imminent_distance_m <= 0.0
            || self.voice.imminent_distance_m > self.voice.early_distance_m
        {
            return Err(DriverError::Config(
                "voice.imminent_distance_m must be positive and no larger than early_distance_m"
                    .into(),
            ));
        }
        if !(self.voice.rate > 0.0 && self.voice.pitch > 0.0) {
            return Err(DriverError::Config("voice.rate and voice.pitch must be positive".into()));
        }
        if self.location.current_position_timeout_ms == 0 {
            return Err(DriverError::Config(
                "location.current_position_timeout_ms must be positive".into(),
            ));
        }
        if self.location.min_distance_m < 0.0 {
            return Err(DriverError::Config("location.min_distance_m must not be negative".into()));
        }
        if self.location.max_accuracy_m.is_nan() || self.location.max_accuracy_m <= 0.0 {
            return Err(DriverError::Config("location.max_accuracy_m must be positive".into()));
        }
        if self.directions.cache_capacity == 0 {
            return Err(DriverError::Config("directions.cache_capacity must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = DriverConfig::from_json_str("{}").expect("config");
        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.fare.base_fare, 2000);
        assert_eq!(config.fare.rate_per_km, 600);
        assert_eq!(config.progress.mode, ProgressMode::Cursor);
        assert_eq!(config.location.current_position_timeout_ms, 15_000);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = DriverConfig::from_json_str(
            r#"{ "fare": { "rate_per_km": 750 }, "progress": { "mode": "nearest" }, "voice": { "language": "my-MM" } }"#,
        )
        .expect("config");
        assert_eq!(config.fare.rate_per_km, 750);
        assert_eq!(config.fare.base_fare, 2000);
        assert_eq!(config.progress.mode, ProgressMode::Nearest);
        assert_eq!(config.voice.language, "my-MM");
        assert_eq!(config.voice.imminent_distance_m, 100.0);
    }

    #[test]
    fn rejects_inverted_voice_bands() {
        let err = DriverConfig::from_json_str(
            r#"{ "voice": { "imminent_distance_m": 600, "early_distance_m": 500 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[test]
    fn rejects_zero_rate() {
        let err = DriverConfig::from_json_str(r#"{ "fare": { "rate_per_km": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("rate_per_km"));
    }

    #[test]
    fn location_timeout_and_accuracy_limits() {
        let config = DriverConfig::from_json_str(
            r#"{ "location": { "current_position_timeout_ms": 2500, "max_accuracy_m": 20 } }"#,
        )
        .expect("config");
        assert_eq!(config.location.current_position_timeout(), Duration::from_millis(2_500));
        assert!(config.location.is_accurate(None));
        assert!(config.location.is_accurate(Some(20.0)));
        assert!(!config.location.is_accurate(Some(35.0)));

        let err = DriverConfig::from_json_str(r#"{ "location": { "max_accuracy_m": 0 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("max_accuracy_m"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            DriverConfig::from_json_str("{ fare: "),
            Err(DriverError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "location": {{ "min_distance_m": 0 }} }}"#).expect("write");
        let config = DriverConfig::from_json_file(file.path()).expect("config");
        assert_eq!(config.location.min_distance_m, 0.0);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = DriverConfig::from_json_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }
}
