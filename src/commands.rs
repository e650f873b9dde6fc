//! Line-oriented command front-end.
//!
//! The driver surface embedders and the shell binary share: one line
//! in, one probe operation out. `NAME` always resolves through the
//! backend registry and is checked to actually be a probe before any
//! probe-only state is touched, so a mistyped or foreign name comes
//! back as an error value, never a panic.
//!
//! Sub-commands:
//! - `create ?-default? NAME ?PARENT?` — wrap PARENT (or the default
//!   backend) in a new probe registered as NAME
//! - `destroy NAME` — unregister the probe and release its hook
//! - `configure NAME SCRIPT` — install SCRIPT as the observer (empty
//!   SCRIPT clears the hook)
//! - `reset NAME` — zero the probe's counters
//! - `report NAME` — one `name calls ticks` line per event kind

use std::sync::Arc;

use tracing::debug;

use crate::observer::Observer;
use crate::probe::{ProbeError, ProbeVfs};
use crate::registry;
use crate::report;
use crate::vfs::Vfs;

/// Errors from parsing or running a command line.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown sub-command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// One observed call, as handed to a [`ScriptEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEvent<'a> {
    pub event: &'static str,
    pub ticks: u64,
    pub context: &'a str,
    pub arg: i32,
    pub offset: i64,
}

/// Evaluates a configured script against each observed call. The shell
/// prints; an embedder can hand events to whatever scripting
/// environment hosts it.
pub trait ScriptEngine: Send + Sync {
    fn eval(&self, script: &str, event: &ScriptEvent<'_>);
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        name: String,
        parent: Option<String>,
        make_default: bool,
    },
    Destroy {
        name: String,
    },
    Configure {
        name: String,
        script: String,
    },
    Reset {
        name: String,
    },
    Report {
        name: String,
    },
}

/// First whitespace-delimited word and the rest of the line.
fn split_word(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(at) => (&line[..at], line[at..].trim_start()),
        None => (line, ""),
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        const CREATE_USAGE: &str = "create ?-default? NAME ?PARENT?";
        const DESTROY_USAGE: &str = "destroy NAME";
        const CONFIGURE_USAGE: &str = "configure NAME SCRIPT";
        const RESET_USAGE: &str = "reset NAME";
        const REPORT_USAGE: &str = "report NAME";

        let (sub, rest) = split_word(line);
        match sub {
            "create" => {
                let mut args: Vec<&str> = rest.split_whitespace().collect();
                let make_default = args.first() == Some(&"-default");
                if make_default {
                    args.remove(0);
                }
                match args.as_slice() {
                    [name] => Ok(Command::Create {
                        name: name.to_string(),
                        parent: None,
                        make_default,
                    }),
                    [name, parent] => Ok(Command::Create {
                        name: name.to_string(),
                        parent: Some(parent.to_string()),
                        make_default,
                    }),
                    _ => Err(CommandError::Usage(CREATE_USAGE)),
                }
            }
            "destroy" | "reset" | "report" => {
                let (name, extra) = split_word(rest);
                if name.is_empty() || !extra.is_empty() {
                    return Err(CommandError::Usage(match sub {
                        "destroy" => DESTROY_USAGE,
                        "reset" => RESET_USAGE,
                        _ => REPORT_USAGE,
                    }));
                }
                let name = name.to_string();
                Ok(match sub {
                    "destroy" => Command::Destroy { name },
                    "reset" => Command::Reset { name },
                    _ => Command::Report { name },
                })
            }
            "configure" => {
                // The script is the untouched rest of the line; it may
                // contain spaces, and may be empty to clear the hook.
                let (name, script) = split_word(rest);
                if name.is_empty() {
                    return Err(CommandError::Usage(CONFIGURE_USAGE));
                }
                Ok(Command::Configure {
                    name: name.to_string(),
                    script: script.to_string(),
                })
            }
            "" => Err(CommandError::Usage("SUB-COMMAND ...")),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Run one parsed command, returning its textual result.
pub fn run(command: &Command, engine: &Arc<dyn ScriptEngine>) -> Result<String, CommandError> {
    match command {
        Command::Create {
            name,
            parent,
            make_default,
        } => {
            let probe = ProbeVfs::create(name.clone(), parent.as_deref())?;
            if *make_default {
                registry::register(probe as Arc<dyn Vfs>, true);
            }
            Ok(name.clone())
        }
        Command::Destroy { name } => {
            ProbeVfs::find(name)?.destroy()?;
            Ok(String::new())
        }
        Command::Configure { name, script } => {
            let probe = ProbeVfs::find(name)?;
            if script.is_empty() {
                probe.configure(None);
            } else {
                let engine = Arc::clone(engine);
                let script = script.clone();
                probe.configure(Some(Observer::new(
                    move |kind, ticks, context, arg, offset| {
                        engine.eval(
                            &script,
                            &ScriptEvent {
                                event: kind.name(),
                                ticks,
                                context,
                                arg,
                                offset,
                            },
                        );
                    },
                )));
            }
            Ok(String::new())
        }
        Command::Reset { name } => {
            ProbeVfs::find(name)?.reset();
            Ok(String::new())
        }
        Command::Report { name } => {
            let probe = ProbeVfs::find(name)?;
            let lines: Vec<String> = report::report(&probe)
                .into_iter()
                .map(|stat| format!("{} {} {}", stat.name, stat.calls, stat.ticks))
                .collect();
            debug!(probe = %name, "reported counters");
            Ok(lines.join("\n"))
        }
    }
}
