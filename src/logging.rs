//! Dual-output logging: JSONL to file for tooling, pretty to stderr for
//! developers.
//!
//! ```rust,ignore
//! let _guard = keydeck::logging::init();
//! tracing::info!(event_type = "engine_start", "Engine ready");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Guard that must be kept alive for the duration of the program; dropping it
/// flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Directory for JSONL log output (`~/.keydeck/logs`).
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".keydeck")
        .join("logs")
}

/// Initialize the subscriber stack. Call once, early, and keep the returned
/// guard alive.
pub fn init() -> LoggingGuard {
    let dir = log_dir();
    if let Err(err) = fs::create_dir_all(&dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", err);
    }

    let log_path = dir.join("keydeck.jsonl");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    let (non_blocking_file, file_guard) = match file {
        Ok(file) => tracing_appender::non_blocking(file),
        Err(err) => {
            eprintln!("[LOGGING] Failed to open log file: {}", err);
            tracing_appender::non_blocking(std::io::sink())
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(
        event_type = "engine_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}
