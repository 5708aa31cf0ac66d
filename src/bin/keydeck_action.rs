//! Execute a single action from the command line.
//!
//! The action JSON comes from the first positional argument, or stdin when no
//! argument is given:
//!
//! ```text
//! keydeck-action '{"action":"shortcut","keys":"Ctrl+Shift+A"}'
//! echo '{"action":"script","scriptType":"bash","script":"echo hi"}' | keydeck-action
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use keydeck::{Action, Engine, EngineConfig};

#[derive(Parser, Debug)]
#[command(name = "keydeck-action", about = "Run one keydeck action and print the result as JSON")]
struct Cli {
    /// Action JSON; read from stdin when omitted.
    action: Option<String>,

    /// Path to a config file (defaults to ~/.keydeck/config.json).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let _logging = keydeck::logging::init();
    let cli = Cli::parse();

    let raw = match cli.action {
        Some(arg) => arg,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading action JSON from stdin")?;
            buf
        }
    };
    let action: Action = serde_json::from_str(raw.trim()).context("parsing action JSON")?;

    let config = match cli.config {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::load(&keydeck::config::default_config_path()),
    };

    let engine = Engine::new(config);
    let result = engine.execute(&action).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
