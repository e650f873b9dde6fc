//! vfs-probe - Storage backend instrumentation
//!
//! Wraps any registered storage backend in a transparent proxy that
//! times every operation at tick resolution, keeps per-operation call
//! and tick totals, and optionally reports each call to a swappable
//! observer hook. The proxy implements the same backend interface as
//! what it wraps and returns every result verbatim, so it can stand in
//! for the real backend anywhere one is used.

pub mod bootstrap;
pub mod clock;
pub mod commands;
pub mod config;
pub mod counters;
pub mod events;
pub mod observer;
pub mod probe;
pub mod registry;
pub mod report;
pub mod vfs;

pub use commands::{Command, CommandError, ScriptEngine, ScriptEvent};
pub use counters::Counters;
pub use events::{name_of, EventKind};
pub use observer::Observer;
pub use probe::{ProbeError, ProbeVfs};
pub use report::{report, EventStat};
pub use vfs::{
    AccessCheck, DeviceCaps, LockLevel, MemVfs, OpenFlags, OpenedFile, SyncFlags, Vfs, VfsError,
    VfsFile, VfsResult,
};
