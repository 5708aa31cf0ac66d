//! Engine configuration with per-field serde defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Delay applied before each injected key event, to satisfy OS
/// event-coalescing requirements.
pub const DEFAULT_KEY_DELAY_MS: u64 = 100;

/// Wall-clock bound on external interpreter execution.
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Inter-event delay for injected key presses/releases (milliseconds).
    #[serde(default = "default_key_delay_ms", rename = "keyDelayMs")]
    pub key_delay_ms: u64,

    /// Timeout for subprocess-based script runtimes, in seconds.
    /// `null` disables the bound (a hung interpreter then blocks its
    /// invocation indefinitely).
    #[serde(default = "default_script_timeout_secs", rename = "scriptTimeoutSecs")]
    pub script_timeout_secs: Option<u64>,

    /// On a press failure partway through a shortcut, release already-pressed
    /// keys before surfacing the error.
    #[serde(default = "default_release_keys", rename = "releaseKeysOnFailure")]
    pub release_keys_on_failure: bool,
}

fn default_key_delay_ms() -> u64 {
    DEFAULT_KEY_DELAY_MS
}

fn default_script_timeout_secs() -> Option<u64> {
    Some(DEFAULT_SCRIPT_TIMEOUT_SECS)
}

fn default_release_keys() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_delay_ms: DEFAULT_KEY_DELAY_MS,
            script_timeout_secs: Some(DEFAULT_SCRIPT_TIMEOUT_SECS),
            release_keys_on_failure: true,
        }
    }
}

/// `~/.keydeck/config.json`, falling back to a relative path when no home
/// directory is resolvable.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".keydeck")
        .join("config.json")
}

impl EngineConfig {
    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn script_timeout(&self) -> Option<Duration> {
        self.script_timeout_secs.map(Duration::from_secs)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from a JSON file, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Config load failed, using defaults");
                Self::default()
            }
        }
    }
}
