//! Session tuning knobs

use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quiet period before the remote write, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Sync behaviour of one editing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Quiet period after the last edit before writing to the remote store
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum undo levels kept (0 = unlimited)
    #[serde(default)]
    pub max_history: usize,

    /// Remote writes slower than this count as failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_timeout_ms: Option<u64>,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl SyncConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: SyncConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if self.remote_timeout_ms == Some(0) {
            return Err(EditorError::Config(
                "remoteTimeoutMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn remote_timeout(&self) -> Option<Duration> {
        self.remote_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = millis(debounce);
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout_ms = Some(millis(timeout));
        self
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_history: 0,
            remote_timeout_ms: None,
        }
    }
}
