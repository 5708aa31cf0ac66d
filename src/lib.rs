//! keydeck - action execution engine for a hotkey-triggered launcher grid.
//!
//! The surrounding application shows a popup grid of user-defined buttons,
//! each bound to an [`Action`]: either a script to run in one of several
//! runtimes, or a keyboard shortcut to replay. This crate is the part that
//! turns those declarative actions into real OS side effects and reports a
//! structured [`ExecutionResult`] for every invocation, on every code path.

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod injector;
pub mod keyspec;
pub mod logging;
pub mod platform;
pub mod sandbox;
pub mod script;
pub mod shortcut;

pub use action::{Action, ExecutionResult, ScriptType};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use platform::Platform;
