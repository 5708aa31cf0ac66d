//! Top-level action dispatcher.
//!
//! [`Engine::execute`] is the single entry point callers use. It never
//! returns an error and never panics: every internal failure is normalized
//! into an [`ExecutionResult`] with `success = false`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::action::{Action, ExecutionResult};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::injector::{default_injector, KeyInjector};
use crate::platform::Platform;
use crate::script::ScriptRunner;
use crate::shortcut::ShortcutExecutor;

pub struct Engine {
    shortcuts: ShortcutExecutor,
    scripts: ScriptRunner,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_injector(config, default_injector())
    }

    /// Build an engine with an explicit key injector. Tests use this to
    /// observe injected events without touching the real input system.
    pub fn with_injector(config: EngineConfig, injector: Arc<dyn KeyInjector>) -> Self {
        Self {
            shortcuts: ShortcutExecutor::new(injector, config.clone()),
            scripts: ScriptRunner::new(config),
        }
    }

    /// Execute an action on the current host platform.
    pub async fn execute(&self, action: &Action) -> ExecutionResult {
        self.execute_on(action, Platform::current()).await
    }

    /// Execute an action as if running on `platform`. Platform gating and key
    /// resolution follow the argument, not the compile target.
    #[instrument(skip(self, action), fields(platform = %platform))]
    pub async fn execute_on(&self, action: &Action, platform: Platform) -> ExecutionResult {
        let start = Instant::now();
        let outcome = self.dispatch(action, platform).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(result) => {
                info!(duration_ms = duration_ms, success = result.success, message = %result.message, "Action finished");
                result
            }
            Err(err) => {
                warn!(duration_ms = duration_ms, kind = err.kind(), error = %err, "Action failed");
                ExecutionResult::failure(&err)
            }
        }
    }

    async fn dispatch(
        &self,
        action: &Action,
        platform: Platform,
    ) -> Result<ExecutionResult, EngineError> {
        match action {
            Action::Script {
                script_type,
                script,
                params,
            } => {
                self.scripts
                    .run(script_type, script, params.as_ref(), platform)
                    .await
            }
            Action::Shortcut { keys } => self.shortcuts.execute(keys, platform).await,
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
