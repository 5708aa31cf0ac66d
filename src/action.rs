//! Action and result types shared with the caller/UI layer.
//!
//! Wire shapes:
//!
//! ```json
//! { "action": "script", "scriptType": "javascript", "script": "...", "scriptParams": {} }
//! { "action": "shortcut", "keys": "Ctrl+Shift+A" }
//! ```
//!
//! `scriptType` stays a raw string here so unknown values reach the dispatcher
//! and come back as structured failures instead of deserialization errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// A declarative description of a side effect to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    Script {
        #[serde(rename = "scriptType", default)]
        script_type: String,
        #[serde(default)]
        script: String,
        #[serde(
            rename = "scriptParams",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        params: Option<Map<String, Value>>,
    },
    Shortcut {
        #[serde(default)]
        keys: String,
    },
}

/// Declared script runtime, matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptType {
    /// In-process JavaScript sandbox ("javascript" on the wire).
    Embedded,
    AppleScript,
    PowerShell,
    Bash,
}

impl ScriptType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "javascript" | "embedded" => Some(Self::Embedded),
            "applescript" => Some(Self::AppleScript),
            "powershell" => Some(Self::PowerShell),
            "bash" => Some(Self::Bash),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Embedded => "JavaScript",
            Self::AppleScript => "AppleScript",
            Self::PowerShell => "PowerShell",
            Self::Bash => "Bash",
        }
    }

    /// Tag used in temp file names.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Embedded => "js",
            Self::AppleScript => "applescript",
            Self::PowerShell => "powershell",
            Self::Bash => "bash",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Embedded => "js",
            Self::AppleScript => "scpt",
            Self::PowerShell => "ps1",
            Self::Bash => "sh",
        }
    }

    /// Interpreter binary for the external runtimes. Bash scripts are made
    /// executable and run directly.
    pub fn interpreter(self) -> &'static str {
        match self {
            Self::Embedded => "sandbox",
            Self::AppleScript => "osascript",
            Self::PowerShell => "powershell",
            Self::Bash => "bash",
        }
    }
}

/// Diagnostic detail attached to failure results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub detail: String,
}

/// The engine's normalized outcome, constructible from every code path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            stdout: None,
            stderr: None,
            error: None,
        }
    }

    pub fn with_output(message: impl Into<String>, stdout: String, stderr: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            stdout: (!stdout.is_empty()).then_some(stdout),
            stderr: (!stderr.is_empty()).then_some(stderr),
            error: None,
        }
    }

    /// Normalize an engine error into a failure result, preserving captured
    /// output where the error carries any.
    pub fn failure(err: &EngineError) -> Self {
        let (stdout, stderr) = match err {
            EngineError::Subprocess { stdout, stderr, .. } => (
                (!stdout.is_empty()).then(|| stdout.clone()),
                (!stderr.is_empty()).then(|| stderr.clone()),
            ),
            _ => (None, None),
        };
        Self {
            success: false,
            message: err.to_string(),
            stdout,
            stderr,
            error: Some(ErrorInfo {
                kind: err.kind().to_string(),
                detail: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_action_parses_wire_shape() {
        let action: Action = serde_json::from_str(
            r#"{"action":"script","scriptType":"bash","script":"echo hi","scriptParams":{"a":1}}"#,
        )
        .expect("parse script action");
        match action {
            Action::Script {
                script_type,
                script,
                params,
            } => {
                assert_eq!(script_type, "bash");
                assert_eq!(script, "echo hi");
                assert_eq!(params.expect("params")["a"], 1);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn shortcut_action_parses_wire_shape() {
        let action: Action =
            serde_json::from_str(r#"{"action":"shortcut","keys":"Ctrl+Shift+A"}"#)
                .expect("parse shortcut action");
        match action {
            Action::Shortcut { keys } => assert_eq!(keys, "Ctrl+Shift+A"),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn missing_fields_default_to_empty_not_error() {
        // Presence validation is the dispatcher's job, not serde's.
        let action: Action = serde_json::from_str(r#"{"action":"script"}"#).expect("parse");
        match action {
            Action::Script {
                script_type,
                script,
                params,
            } => {
                assert!(script_type.is_empty());
                assert!(script.is_empty());
                assert!(params.is_none());
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn script_type_parse_is_case_insensitive() {
        assert_eq!(ScriptType::parse("JAVASCRIPT"), Some(ScriptType::Embedded));
        assert_eq!(ScriptType::parse("javascript"), Some(ScriptType::Embedded));
        assert_eq!(
            ScriptType::parse(" AppleScript "),
            Some(ScriptType::AppleScript)
        );
        assert_eq!(ScriptType::parse("POWERshell"), Some(ScriptType::PowerShell));
        assert_eq!(ScriptType::parse("bash"), Some(ScriptType::Bash));
        assert_eq!(ScriptType::parse("ruby"), None);
        assert_eq!(ScriptType::parse(""), None);
    }

    #[test]
    fn result_serializes_without_empty_optionals() {
        let json = serde_json::to_value(ExecutionResult::ok("done")).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "done");
        assert!(json.get("stdout").is_none());
        assert!(json.get("stderr").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_result_carries_error_info() {
        let err = EngineError::UnsupportedType {
            value: "ruby".into(),
        };
        let result = ExecutionResult::failure(&err);
        assert!(!result.success);
        assert!(result.message.contains("ruby"));
        let info = result.error.expect("error info");
        assert_eq!(info.kind, "unsupported_type");
    }

    #[test]
    fn subprocess_failure_keeps_captured_streams() {
        let err = EngineError::Subprocess {
            interpreter: "bash",
            exit_code: 3,
            stdout: "partial".into(),
            stderr: "boom".into(),
        };
        let result = ExecutionResult::failure(&err);
        assert_eq!(result.stdout.as_deref(), Some("partial"));
        assert_eq!(result.stderr.as_deref(), Some("boom"));
    }
}
