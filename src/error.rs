//! Error taxonomy for the action execution engine.
//!
//! Pre-flight errors (`MissingParameter`, `UnsupportedPlatform`,
//! `UnsupportedType`, `KeyMapping`) are returned before any OS side effect is
//! attempted. Post-flight errors carry whatever the OS reported. Cleanup
//! failures are logged where they happen and never change a call's verdict.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("missing required parameter: {field}")]
    MissingParameter { field: &'static str },

    #[error("{script_type} scripts are not supported on {platform}")]
    UnsupportedPlatform {
        script_type: &'static str,
        platform: &'static str,
    },

    #[error("unsupported script type: '{value}'")]
    UnsupportedType { value: String },

    #[error("unrecognized key token '{token}'")]
    KeyMapping { token: String },

    #[error("failed to write temp script {path}: {source}")]
    TempFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {interpreter}: {source}")]
    Spawn {
        interpreter: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{interpreter} exited with code {exit_code}: {stderr}")]
    Subprocess {
        interpreter: &'static str,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("sandbox evaluation failed: {0}")]
    Sandbox(String),

    #[error("failed to remove temp script {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input injection failed: {0}")]
    InputInjection(String),
}

impl EngineError {
    /// Stable machine-readable tag, surfaced in `ExecutionResult.error.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. } => "missing_parameter",
            Self::UnsupportedPlatform { .. } => "unsupported_platform",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::KeyMapping { .. } => "key_mapping",
            Self::TempFile { .. } => "temp_file",
            Self::Spawn { .. } => "spawn",
            Self::Subprocess { .. } => "subprocess",
            Self::Timeout { .. } => "timeout",
            Self::Sandbox(_) => "sandbox",
            Self::Cleanup { .. } => "cleanup",
            Self::InputInjection(_) => "input_injection",
        }
    }

    /// True when the error was detected before any OS resource was touched.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. }
                | Self::UnsupportedPlatform { .. }
                | Self::UnsupportedType { .. }
                | Self::KeyMapping { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for silently logging recoverable failures with caller
/// location tracking.
pub trait ResultExt<T> {
    /// Log the error and return `None`. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as a warning and return `None`. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_errors_are_classified() {
        assert!(EngineError::MissingParameter { field: "script" }.is_preflight());
        assert!(EngineError::UnsupportedType {
            value: "ruby".into()
        }
        .is_preflight());
        assert!(EngineError::KeyMapping {
            token: "foobar".into()
        }
        .is_preflight());
        assert!(!EngineError::Timeout { elapsed_ms: 100 }.is_preflight());
        assert!(!EngineError::Sandbox("boom".into()).is_preflight());
    }

    #[test]
    fn display_includes_offending_value() {
        let err = EngineError::UnsupportedType {
            value: "ruby".into(),
        };
        assert_eq!(err.to_string(), "unsupported script type: 'ruby'");

        let err = EngineError::Subprocess {
            interpreter: "osascript",
            exit_code: 1,
            stdout: String::new(),
            stderr: "syntax error".into(),
        };
        assert!(err.to_string().contains("osascript"));
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn log_err_returns_none_on_failure() {
        let ok: std::result::Result<u32, &str> = Ok(7);
        assert_eq!(ok.log_err(), Some(7));
        let failed: std::result::Result<u32, &str> = Err("nope");
        assert_eq!(failed.log_err(), None);
    }
}
