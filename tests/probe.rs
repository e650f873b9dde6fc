//! End-to-end probe instrumentation tests.
//!
//! Drives the public API the way an embedding application would: an
//! in-memory backend registered as the process default, probes created
//! over it by name, file traffic through the polymorphic interface,
//! and counters read back out. Tests share the process-wide registry,
//! so they are serialized.

use std::sync::{Arc, Mutex};

use serial_test::serial;

use vfs_probe::{
    registry, report, EventKind, MemVfs, Observer, OpenFlags, ProbeError, ProbeVfs, Vfs,
};

fn register_default_backend(name: &str) {
    registry::register(Arc::new(MemVfs::new(name.to_string())) as Arc<dyn Vfs>, true);
}

#[test]
#[serial]
fn test_write_read_counts_then_reset() {
    register_default_backend("e2e-mem-1");
    let probe = ProbeVfs::create("t1", None).expect("create over default backend");

    let mut file = probe
        .open("a.db", OpenFlags::READ_WRITE | OpenFlags::CREATE)
        .expect("open a.db")
        .file;

    let payload = [0xabu8; 100];
    assert_eq!(file.write(&payload, 0).unwrap(), 100);

    let mut readback = [0u8; 100];
    assert_eq!(file.read(&mut readback, 0).unwrap(), 100);
    assert_eq!(readback, payload);

    file.close().unwrap();

    assert_eq!(probe.stat(EventKind::Write).calls, 1);
    assert_eq!(probe.stat(EventKind::Read).calls, 1);
    assert_eq!(probe.stat(EventKind::Open).calls, 1);
    assert_eq!(probe.stat(EventKind::Close).calls, 1);

    probe.reset();
    assert_eq!(probe.stat(EventKind::Write).calls, 0);
    assert_eq!(probe.stat(EventKind::Write).ticks, 0);

    probe.destroy().unwrap();
    registry::unregister("e2e-mem-1");
}

#[test]
#[serial]
fn test_cumulative_ticks_sum_per_call_elapsed() {
    register_default_backend("e2e-mem-2");
    let probe = ProbeVfs::create("t-ticks", None).unwrap();

    let elapsed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&elapsed);
    probe.configure(Some(Observer::new(move |kind, ticks, _, _, _| {
        if kind == EventKind::Write {
            sink.lock().unwrap().push(ticks);
        }
    })));

    let mut file = probe
        .open("ticks.db", OpenFlags::READ_WRITE | OpenFlags::CREATE)
        .unwrap()
        .file;
    for i in 0..5u64 {
        file.write(b"0123456789", i * 10).unwrap();
    }
    file.close().unwrap();

    let per_call = elapsed.lock().unwrap();
    assert_eq!(per_call.len(), 5);
    let stat = probe.stat(EventKind::Write);
    assert_eq!(stat.calls, 5);
    assert_eq!(stat.ticks, per_call.iter().sum::<u64>());

    probe.destroy().unwrap();
    registry::unregister("e2e-mem-2");
}

#[test]
#[serial]
fn test_delete_observer_payload() {
    register_default_backend("e2e-mem-3");
    let probe = ProbeVfs::create("t-delete", None).unwrap();
    probe
        .open("x", OpenFlags::READ_WRITE | OpenFlags::CREATE)
        .unwrap()
        .file
        .close()
        .unwrap();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    probe.configure(Some(Observer::new(move |kind, _, context, arg, offset| {
        sink.lock()
            .unwrap()
            .push((kind.name(), context.to_string(), arg, offset));
    })));

    probe.delete("x", false).unwrap();

    let seen = calls.lock().unwrap();
    let deletes: Vec<_> = seen.iter().filter(|(name, ..)| *name == "delete").collect();
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0], &("delete", "x".to_string(), 0, 0));

    probe.destroy().unwrap();
    registry::unregister("e2e-mem-3");
}

#[test]
#[serial]
fn test_proxy_is_transparent_to_polymorphic_callers() {
    register_default_backend("e2e-mem-4");
    let probe = ProbeVfs::create("t-poly", None).unwrap();

    // Drive the probe strictly through the backend interface, the way
    // application code holding any backend would.
    let backend: Arc<dyn Vfs> = registry::find(Some("t-poly")).expect("probe resolves by name");

    let mut file = backend
        .open("poly.db", OpenFlags::READ_WRITE | OpenFlags::CREATE)
        .unwrap()
        .file;
    file.write(b"through the trait", 0).unwrap();
    assert_eq!(file.file_size().unwrap(), 17);
    file.close().unwrap();

    assert!(backend.access("poly.db", vfs_probe::AccessCheck::Exists).unwrap());
    let full = backend.full_pathname("poly.db").unwrap();
    assert_eq!(full, "/poly.db");

    // The instrumentation observed the trait-level traffic.
    assert_eq!(probe.stat(EventKind::Open).calls, 1);
    assert_eq!(probe.stat(EventKind::Write).calls, 1);
    assert_eq!(probe.stat(EventKind::FileSize).calls, 1);
    assert_eq!(probe.stat(EventKind::Access).calls, 1);
    assert_eq!(probe.stat(EventKind::FullPathname).calls, 1);

    probe.destroy().unwrap();
    registry::unregister("e2e-mem-4");
}

#[test]
#[serial]
fn test_full_report_enumeration() {
    register_default_backend("e2e-mem-5");
    let probe = ProbeVfs::create("t-report", None).unwrap();

    probe.temp_name().unwrap();
    let mut buf = [0u8; 16];
    probe.randomness(&mut buf).unwrap();
    probe.current_time().unwrap();

    let stats = report(&probe);
    assert_eq!(stats.len(), EventKind::COUNT);
    let by_name = |name: &str| {
        stats
            .iter()
            .find(|stat| stat.name == name)
            .expect("kind missing from report")
            .clone()
    };
    assert_eq!(by_name("get-temp-name").calls, 1);
    assert_eq!(by_name("randomness").calls, 1);
    assert_eq!(by_name("current-time").calls, 1);
    assert_eq!(by_name("write").calls, 0);

    probe.destroy().unwrap();
    registry::unregister("e2e-mem-5");
}

#[test]
#[serial]
fn test_destroy_unknown_is_lookup_failure() {
    register_default_backend("e2e-mem-6");
    let probe = ProbeVfs::create("t-gone", None).unwrap();

    probe.destroy().unwrap();
    assert!(matches!(probe.destroy(), Err(ProbeError::NoSuchProbe(_))));
    assert!(matches!(
        ProbeVfs::find("t-gone"),
        Err(ProbeError::NoSuchProbe(_))
    ));

    registry::unregister("e2e-mem-6");
}
