//! Shortcut executor: press/release choreography over an injected key
//! capability.
//!
//! For a resolved chord the executor presses each modifier first to last,
//! presses then releases the primary key, and releases the modifiers in
//! reverse order. A fixed inter-event delay precedes every injected event.
//! The physical keyboard is the one shared mutable resource in the engine, so
//! invocations are serialized behind an async mutex; concurrent chords never
//! interleave.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::action::ExecutionResult;
use crate::config::EngineConfig;
use crate::error::{EngineError, ResultExt};
use crate::injector::KeyInjector;
use crate::keyspec::{KeyChord, KeyToken};
use crate::platform::Platform;

pub struct ShortcutExecutor {
    injector: Arc<dyn KeyInjector>,
    config: EngineConfig,
    keyboard: Mutex<()>,
}

impl ShortcutExecutor {
    pub fn new(injector: Arc<dyn KeyInjector>, config: EngineConfig) -> Self {
        Self {
            injector,
            config,
            keyboard: Mutex::new(()),
        }
    }

    /// Replay a shortcut spec. Parsing and key resolution happen before any
    /// event is injected, so a bad spec has zero side effects.
    #[instrument(skip(self), fields(keys = %keys, platform = %platform))]
    pub async fn execute(
        &self,
        keys: &str,
        platform: Platform,
    ) -> Result<ExecutionResult, EngineError> {
        let chord = KeyChord::parse(keys, platform)?;
        let start = Instant::now();

        let _keyboard = self.keyboard.lock().await;

        let mut held: Vec<&KeyToken> = Vec::new();
        for modifier in &chord.modifiers {
            self.pause().await;
            if let Err(err) = self.injector.press(modifier.code) {
                self.unwind(&held).await;
                return Err(EngineError::InputInjection(format!(
                    "press {}: {}",
                    modifier.name, err
                )));
            }
            debug!(key = %modifier.name, code = modifier.code, "Modifier pressed");
            held.push(modifier);
        }

        self.pause().await;
        if let Err(err) = self.injector.press(chord.primary.code) {
            self.unwind(&held).await;
            return Err(EngineError::InputInjection(format!(
                "press {}: {}",
                chord.primary.name, err
            )));
        }
        if let Err(err) = self.injector.release(chord.primary.code) {
            self.unwind(&held).await;
            return Err(EngineError::InputInjection(format!(
                "release {}: {}",
                chord.primary.name, err
            )));
        }
        debug!(key = %chord.primary.name, "Primary key tapped");

        // Strict reverse order of press.
        let mut release_failure: Option<EngineError> = None;
        for modifier in held.iter().rev() {
            self.pause().await;
            if let Err(err) = self.injector.release(modifier.code) {
                warn!(key = %modifier.name, error = %err, "Modifier release failed");
                release_failure.get_or_insert(EngineError::InputInjection(format!(
                    "release {}: {}",
                    modifier.name, err
                )));
            }
        }
        if let Some(err) = release_failure {
            return Err(err);
        }

        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            modifiers = chord.modifiers.len(),
            "Shortcut executed"
        );
        Ok(ExecutionResult::ok(format!("Shortcut '{}' executed", keys)))
    }

    /// Best-effort release of already-pressed keys after a mid-sequence
    /// failure, so the host keyboard is not left with stuck modifiers.
    async fn unwind(&self, held: &[&KeyToken]) {
        if !self.config.release_keys_on_failure {
            return;
        }
        for modifier in held.iter().rev() {
            self.injector
                .release(modifier.code)
                .map_err(|err| {
                    EngineError::InputInjection(format!("release {}: {}", modifier.name, err))
                })
                .warn_on_err();
        }
    }

    async fn pause(&self) {
        let delay = self.config.key_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
#[path = "shortcut_tests.rs"]
mod shortcut_tests;
