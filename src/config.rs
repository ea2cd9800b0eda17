//! Runtime tuning knobs.

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

/// Channel sizes and timings for the runtime tasks.
///
/// Missing fields take their [`Default`] values when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bound of the command queue into the store loop.
    pub command_queue_bound: usize,
    /// Capacity of the change-event broadcast channel.
    pub event_capacity: usize,
    /// How long preference writes are held so rapid updates coalesce.
    pub pref_debounce_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
            pref_debounce_ms: 300,
        }
    }
}

/// Failure to load a [`RuntimeConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The contents were not valid JSON for this type.
    Json(serde_json::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config read failed: {err}"),
            Self::Json(err) => write!(f, "config parse failed: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RuntimeConfig {
    /// Parses a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RuntimeConfig::from_json_str(r#"{"pref_debounce_ms": 5}"#).expect("parse");
        assert_eq!(cfg.pref_debounce_ms, 5);
        assert_eq!(cfg.command_queue_bound, RuntimeConfig::default().command_queue_bound);
    }
}
