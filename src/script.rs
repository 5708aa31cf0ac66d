//! Script runtime dispatch and the external interpreter runner.
//!
//! The dispatcher validates the declared type and routes to one of four
//! strategies: the in-process sandbox ([`crate::sandbox`]) or an external
//! interpreter (AppleScript via `osascript`, PowerShell, or Bash). External
//! runs write the script text to a uniquely named temp file, spawn the
//! interpreter against it, and remove the file on every exit path via an RAII
//! guard, including timeout and early-return paths.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::action::{ExecutionResult, ScriptType};
use crate::config::EngineConfig;
use crate::error::{EngineError, ResultExt};
use crate::platform::Platform;
use crate::sandbox;

/// Cap on captured stdout/stderr per stream, so a runaway interpreter cannot
/// exhaust memory.
const MAX_CAPTURE_BYTES: usize = 1024 * 1024;

/// Process-wide sequence number; combined with a millisecond timestamp it
/// keeps concurrent invocations' temp files from colliding.
static SCRIPT_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct ScriptRunner {
    config: EngineConfig,
}

impl ScriptRunner {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Validate and route a script action. All validation errors return
    /// before any filesystem or subprocess activity.
    #[instrument(skip(self, script, params), fields(script_type = %script_type, platform = %platform))]
    pub async fn run(
        &self,
        script_type: &str,
        script: &str,
        params: Option<&Map<String, Value>>,
        platform: Platform,
    ) -> Result<ExecutionResult, EngineError> {
        if script_type.trim().is_empty() {
            return Err(EngineError::MissingParameter {
                field: "scriptType",
            });
        }
        if script.trim().is_empty() {
            return Err(EngineError::MissingParameter { field: "script" });
        }

        let ty = ScriptType::parse(script_type).ok_or_else(|| EngineError::UnsupportedType {
            value: script_type.to_string(),
        })?;

        match ty {
            ScriptType::Embedded => sandbox::evaluate(script, params).await,
            ScriptType::AppleScript => {
                if !platform.is_macos_like() {
                    return Err(EngineError::UnsupportedPlatform {
                        script_type: ty.name(),
                        platform: platform.name(),
                    });
                }
                self.run_external(ty, script).await
            }
            ScriptType::PowerShell => {
                if !platform.is_windows_like() {
                    return Err(EngineError::UnsupportedPlatform {
                        script_type: ty.name(),
                        platform: platform.name(),
                    });
                }
                self.run_external(ty, script).await
            }
            ScriptType::Bash => {
                if platform.is_windows_like() {
                    return Err(EngineError::UnsupportedPlatform {
                        script_type: ty.name(),
                        platform: platform.name(),
                    });
                }
                self.run_external(ty, script).await
            }
        }
    }

    /// Temp file → subprocess → capture → cleanup-on-drop.
    async fn run_external(
        &self,
        ty: ScriptType,
        script: &str,
    ) -> Result<ExecutionResult, EngineError> {
        let temp = TempScript::create(ty.tag(), ty.extension(), script, ty == ScriptType::Bash)?;
        debug!(path = %temp.path().display(), "Temp script written");

        let mut cmd = match ty {
            ScriptType::AppleScript => {
                let mut cmd = Command::new("osascript");
                cmd.arg(temp.path());
                cmd
            }
            ScriptType::PowerShell => {
                let mut cmd = Command::new("powershell");
                cmd.args(["-ExecutionPolicy", "Bypass", "-File"]);
                cmd.arg(temp.path());
                cmd
            }
            // Bash scripts are chmod +x and run directly.
            ScriptType::Bash | ScriptType::Embedded => Command::new(temp.path()),
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let output = match self.config.script_timeout() {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    // The pending `output()` future is dropped here; with
                    // kill_on_drop the child dies, and `temp` still cleans up.
                    EngineError::Timeout {
                        elapsed_ms: start.elapsed().as_millis() as u64,
                    }
                })?,
            None => cmd.output().await,
        }
        .map_err(|err| EngineError::Spawn {
            interpreter: ty.interpreter(),
            source: err,
        })?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let stdout = capture(&output.stdout);
        let stderr = capture(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        if output.status.success() {
            info!(
                duration_ms = duration_ms,
                interpreter = ty.interpreter(),
                "Script completed"
            );
            Ok(ExecutionResult::with_output(
                format!("{} script completed", ty.name()),
                stdout,
                stderr,
            ))
        } else {
            warn!(
                duration_ms = duration_ms,
                interpreter = ty.interpreter(),
                exit_code = exit_code,
                "Script failed"
            );
            Err(EngineError::Subprocess {
                interpreter: ty.interpreter(),
                exit_code,
                stdout,
                stderr,
            })
        }
    }
}

fn capture(bytes: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > MAX_CAPTURE_BYTES {
        let mut cut = MAX_CAPTURE_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("\n[output truncated]");
    }
    text
}

/// Scoped temp script file: written on create, removed on drop. A removal
/// failure is logged and never changes the invocation's verdict.
pub(crate) struct TempScript {
    path: PathBuf,
}

impl TempScript {
    pub(crate) fn create(
        tag: &str,
        extension: &str,
        contents: &str,
        executable: bool,
    ) -> Result<Self, EngineError> {
        let seq = SCRIPT_SEQ.fetch_add(1, Ordering::Relaxed);
        let stamp = chrono::Utc::now().timestamp_millis();
        let path = std::env::temp_dir().join(format!(
            "keydeck-{}-{}-{}.{}",
            tag, stamp, seq, extension
        ));

        std::fs::write(&path, contents).map_err(|source| EngineError::TempFile {
            path: path.clone(),
            source,
        })?;

        if executable {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).map_err(
                    |source| EngineError::TempFile {
                        path: path.clone(),
                        source,
                    },
                )?;
            }
        }

        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempScript {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Err(source) if source.kind() != std::io::ErrorKind::NotFound => {
                Err(EngineError::Cleanup {
                    path: self.path.clone(),
                    source,
                })
            }
            _ => Ok(()),
        }
        .warn_on_err();
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod script_tests;
