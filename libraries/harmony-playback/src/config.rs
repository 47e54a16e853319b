//! Session configuration

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Initial volume in percent (default: 100)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Leave the channel as soon as the queue runs dry (default: true)
    #[serde(default = "default_auto_leave_on_empty_queue")]
    pub auto_leave_on_empty_queue: bool,

    /// Leave after this long without playback, 0 disables (default: 5 minutes)
    #[serde(default = "default_auto_leave_on_idle_ms")]
    pub auto_leave_on_idle_ms: u64,

    /// How long to wait for the voice connection to become ready (default: 20s)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum number of played URLs remembered (default: 100)
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Event channel capacity per subscriber (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_initial_volume() -> f32 {
    100.0
}

fn default_auto_leave_on_empty_queue() -> bool {
    true
}

fn default_auto_leave_on_idle_ms() -> u64 {
    5 * 60_000
}

fn default_connect_timeout_ms() -> u64 {
    20_000
}

fn default_history_size() -> usize {
    100
}

fn default_event_capacity() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_initial_volume(),
            auto_leave_on_empty_queue: default_auto_leave_on_empty_queue(),
            auto_leave_on_idle_ms: default_auto_leave_on_idle_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            history_size: default_history_size(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables prefixed with `HARMONY_` override file values,
    /// e.g. `HARMONY_AUTO_LEAVE_ON_IDLE_MS=0`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = ::config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(PlayerError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(::config::File::from(path));
        }

        settings = settings.add_source(
            ::config::Environment::with_prefix("HARMONY").try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlayerError::config(e.to_string()))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| PlayerError::config(e.to_string()))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.initial_volume.is_finite() {
            return Err(PlayerError::config("initial_volume must be a number"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(PlayerError::config("connect_timeout_ms must be positive"));
        }
        if self.event_capacity == 0 {
            return Err(PlayerError::config("event_capacity must be positive"));
        }
        Ok(())
    }

    /// Idle auto-leave delay, `None` when disabled
    pub fn auto_leave_on_idle(&self) -> Option<Duration> {
        (self.auto_leave_on_idle_ms > 0).then(|| Duration::from_millis(self.auto_leave_on_idle_ms))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.initial_volume, 100.0);
        assert!(config.auto_leave_on_empty_queue);
        assert_eq!(config.auto_leave_on_idle(), Some(Duration::from_secs(300)));
        assert_eq!(config.connect_timeout(), Duration::from_secs(20));
        assert_eq!(config.history_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_idle_disables_auto_leave() {
        let config = SessionConfig {
            auto_leave_on_idle_ms: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.auto_leave_on_idle(), None);
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harmony.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "initial_volume = 50").unwrap();
        writeln!(file, "auto_leave_on_empty_queue = false").unwrap();
        writeln!(file, "auto_leave_on_idle_ms = 1500").unwrap();

        let config = SessionConfig::load(Some(&path)).unwrap();
        assert_eq!(config.initial_volume, 50.0);
        assert!(!config.auto_leave_on_empty_queue);
        assert_eq!(config.auto_leave_on_idle_ms, 1500);
        // Unset keys fall back to defaults
        assert_eq!(config.connect_timeout_ms, 20_000);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SessionConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(PlayerError::Config(_))));
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = SessionConfig {
            event_capacity: 0,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
