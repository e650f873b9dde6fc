//! Command front-end round-trip tests.
//!
//! Exercises the same parse-and-run path the shell binary uses, with a
//! recording script engine in place of stdout.

use std::sync::{Arc, Mutex};

use serial_test::serial;

use vfs_probe::commands::{self, Command, CommandError, ScriptEngine, ScriptEvent};
use vfs_probe::{registry, EventKind, MemVfs, OpenFlags, ProbeError, ProbeVfs, Vfs};

/// Records every evaluation instead of running a script.
#[derive(Default)]
struct RecordingEngine {
    evals: Mutex<Vec<(String, String, String, i32, i64)>>,
}

impl ScriptEngine for RecordingEngine {
    fn eval(&self, script: &str, event: &ScriptEvent<'_>) {
        self.evals.lock().unwrap().push((
            script.to_string(),
            event.event.to_string(),
            event.context.to_string(),
            event.arg,
            event.offset,
        ));
    }
}

fn run_line(line: &str, engine: &Arc<dyn ScriptEngine>) -> Result<String, CommandError> {
    commands::run(&Command::parse(line)?, engine)
}

#[test]
#[serial]
fn test_create_report_reset_destroy_round_trip() {
    registry::register(Arc::new(MemVfs::new("cmd-mem-1")) as Arc<dyn Vfs>, true);
    let engine: Arc<dyn ScriptEngine> = Arc::new(RecordingEngine::default());

    assert_eq!(run_line("create c1 cmd-mem-1", &engine).unwrap(), "c1");

    let probe = ProbeVfs::find("c1").unwrap();
    let mut file = probe
        .open("c.db", OpenFlags::READ_WRITE | OpenFlags::CREATE)
        .unwrap()
        .file;
    file.write(b"1234", 0).unwrap();
    file.close().unwrap();

    let report = run_line("report c1", &engine).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), EventKind::COUNT);
    assert!(lines.iter().any(|line| line.starts_with("write 1 ")));
    assert!(lines.iter().any(|line| line.starts_with("open 1 ")));
    assert!(lines.iter().any(|line| line.starts_with("delete 0 ")));

    run_line("reset c1", &engine).unwrap();
    let report = run_line("report c1", &engine).unwrap();
    assert!(report.lines().all(|line| {
        let mut fields = line.split_whitespace();
        fields.next();
        fields.all(|field| field == "0")
    }));

    run_line("destroy c1", &engine).unwrap();
    assert!(matches!(
        run_line("destroy c1", &engine),
        Err(CommandError::Probe(ProbeError::NoSuchProbe(_)))
    ));

    registry::unregister("cmd-mem-1");
}

#[test]
#[serial]
fn test_create_default_makes_probe_the_default_backend() {
    registry::register(Arc::new(MemVfs::new("cmd-mem-2")) as Arc<dyn Vfs>, true);
    let engine: Arc<dyn ScriptEngine> = Arc::new(RecordingEngine::default());

    run_line("create -default c2", &engine).unwrap();
    assert_eq!(registry::find(None).expect("default resolves").name(), "c2");

    // A probe created without a parent name now wraps the probe.
    run_line("create c3", &engine).unwrap();
    let stacked = ProbeVfs::find("c3").unwrap();
    assert_eq!(stacked.parent().name(), "c2");

    run_line("destroy c3", &engine).unwrap();
    run_line("destroy c2", &engine).unwrap();
    registry::unregister("cmd-mem-2");
}

#[test]
#[serial]
fn test_configure_script_marshals_events() {
    registry::register(Arc::new(MemVfs::new("cmd-mem-3")) as Arc<dyn Vfs>, true);
    let recorder = Arc::new(RecordingEngine::default());
    let engine: Arc<dyn ScriptEngine> = Arc::clone(&recorder) as Arc<dyn ScriptEngine>;

    run_line("create c4", &engine).unwrap();
    run_line("configure c4 log every call", &engine).unwrap();

    let probe = ProbeVfs::find("c4").unwrap();
    probe
        .open("s.db", OpenFlags::READ_WRITE | OpenFlags::CREATE)
        .unwrap()
        .file
        .close()
        .unwrap();
    probe.delete("s.db", true).unwrap();

    {
        let evals = recorder.evals.lock().unwrap();
        assert!(evals
            .iter()
            .all(|(script, ..)| script == "log every call"));
        let deletes: Vec<_> = evals.iter().filter(|(_, name, ..)| name == "delete").collect();
        assert_eq!(deletes.len(), 1);
        let (_, _, context, arg, offset) = deletes[0];
        assert_eq!(context, "s.db");
        assert_eq!(*arg, 1);
        assert_eq!(*offset, 0);
    }

    // Empty script clears the hook; further traffic records nothing.
    run_line("configure c4", &engine).unwrap();
    let before = recorder.evals.lock().unwrap().len();
    probe.temp_name().unwrap();
    assert_eq!(recorder.evals.lock().unwrap().len(), before);

    run_line("destroy c4", &engine).unwrap();
    registry::unregister("cmd-mem-3");
}

#[test]
#[serial]
fn test_commands_reject_non_probe_backends() {
    registry::register(Arc::new(MemVfs::new("cmd-mem-4")) as Arc<dyn Vfs>, true);
    let engine: Arc<dyn ScriptEngine> = Arc::new(RecordingEngine::default());

    for line in [
        "destroy cmd-mem-4",
        "reset cmd-mem-4",
        "report cmd-mem-4",
        "configure cmd-mem-4 script",
    ] {
        assert!(matches!(
            run_line(line, &engine),
            Err(CommandError::Probe(ProbeError::NotAProbe(_)))
        ));
    }

    assert!(matches!(
        run_line("create nested missing-parent", &engine),
        Err(CommandError::Probe(ProbeError::BackendNotFound(_)))
    ));

    registry::unregister("cmd-mem-4");
}
