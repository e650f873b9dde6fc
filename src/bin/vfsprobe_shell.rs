//! vfsprobe-shell: Interactive probe driver
//!
//! Line-oriented shell over the command front-end. Registers an
//! in-memory backend as the process default, then reads sub-commands
//! (`create`, `destroy`, `configure`, `reset`, `report`) from stdin
//! and prints their results. Configured observer scripts are printed
//! to stdout with the five event fields appended.
//!
//! ## Configuration
//! - VFSPROBE_LOG: tracing filter (default: info)
//! - VFSPROBE_CONFIG: optional YAML config file
//! - VFSPROBE_BACKEND: name for the in-memory default backend
//! - VFSPROBE_PROMPT: prompt string

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::info;

use vfs_probe::bootstrap::init_tracing;
use vfs_probe::commands::{self, Command, ScriptEngine, ScriptEvent};
use vfs_probe::config::ShellConfig;
use vfs_probe::registry;
use vfs_probe::vfs::{MemVfs, Vfs};

/// Prints the configured script with the event fields appended, the
/// shell's stand-in for handing the event to a scripting environment.
struct StdoutEngine;

impl ScriptEngine for StdoutEngine {
    fn eval(&self, script: &str, event: &ScriptEvent<'_>) {
        println!(
            "{} {} {} {} {} {}",
            script, event.event, event.ticks, event.context, event.arg, event.offset
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ShellConfig::load()?;
    registry::register(
        Arc::new(MemVfs::new(config.backend.clone())) as Arc<dyn Vfs>,
        true,
    );
    info!(backend = %config.backend, "registered default in-memory backend");

    let engine: Arc<dyn ScriptEngine> = Arc::new(StdoutEngine);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        write!(stdout, "{}", config.prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match Command::parse(line).and_then(|command| commands::run(&command, &engine)) {
            Ok(result) => {
                if !result.is_empty() {
                    writeln!(stdout, "{result}")?;
                }
            }
            Err(err) => {
                writeln!(stdout, "error: {err}")?;
            }
        }
    }

    Ok(())
}
