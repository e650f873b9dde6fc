//! Instrumenting proxy backend.
//!
//! [`ProbeVfs`] wraps a registered parent backend and implements the
//! whole [`Vfs`] capability set by delegation: every instrumented call
//! samples the tick counter, runs the real operation with its
//! arguments unchanged, records the elapsed ticks and call count, lets
//! the observer hook see the call, and hands back the real result
//! untouched — error values included. Callers holding it as
//! `Arc<dyn Vfs>` cannot tell it from the parent.
//!
//! Wrapping is applied at composition time:
//!
//! ```no_run
//! use vfs_probe::{registry, MemVfs, ProbeVfs};
//! use std::sync::Arc;
//!
//! registry::register(Arc::new(MemVfs::new("mem")), true);
//! let probe = ProbeVfs::create("traced", None).unwrap();
//! // "traced" now resolves from the registry like any other backend.
//! ```

use std::any::Any;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::counters::Counters;
use crate::events::EventKind;
use crate::observer::Observer;
use crate::registry;
use crate::report::EventStat;
use crate::vfs::{
    AccessCheck, DlHandle, DlSymbol, OpenFlags, OpenedFile, Vfs, VfsResult,
};

mod file;

use file::ProbeFile;

/// Sample the clock, run the delegated call, record and notify, and
/// return the delegate's result verbatim.
macro_rules! timed {
    ($state:expr, $kind:expr, $ctx:expr, $arg:expr, $off:expr, $call:expr) => {{
        let start = crate::clock::ticks();
        let result = $call;
        let elapsed = crate::clock::elapsed_since(start);
        $state.observe($kind, elapsed, $ctx, $arg, $off);
        result
    }};
}

pub(crate) use timed;

/// Errors from the probe's own bookkeeping surface. Delegated
/// operations never produce these; their failures pass through as
/// [`crate::vfs::VfsError`] untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The parent backend to wrap does not exist in the registry.
    #[error("no such backend: {0}")]
    BackendNotFound(String),

    /// No backend with this name is registered.
    #[error("no such probe: {0}")]
    NoSuchProbe(String),

    /// The named backend exists but is not a probe wrapper.
    #[error("backend {0} is not a probe")]
    NotAProbe(String),
}

/// Bookkeeping shared between a probe and every file handle opened
/// through it. File handles reach back here for the counters and the
/// observer hook; the `Arc` keeps the state alive for handles that
/// outlive a destroyed probe.
pub(crate) struct ProbeState {
    counters: Counters,
    observer: Mutex<Option<Observer>>,
}

impl ProbeState {
    pub(crate) fn observe(
        &self,
        kind: EventKind,
        elapsed: u64,
        context: &str,
        arg: i32,
        offset: i64,
    ) {
        self.counters.record(kind, elapsed);
        let mut slot = self.observer.lock().expect("observer slot poisoned");
        if let Some(observer) = slot.as_mut() {
            observer.invoke(kind, elapsed, context, arg, offset);
        }
    }
}

/// An instrumenting wrapper around one parent backend.
pub struct ProbeVfs {
    name: String,
    parent: Arc<dyn Vfs>,
    state: Arc<ProbeState>,
    handle_size: usize,
}

impl std::fmt::Debug for ProbeVfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeVfs")
            .field("name", &self.name)
            .field("parent", &self.parent.name())
            .field("handle_size", &self.handle_size)
            .finish_non_exhaustive()
    }
}

impl ProbeVfs {
    /// Wrap the backend named `parent` (or the registry default) and
    /// register the wrapper under `name`, replacing any previous
    /// backend with that name.
    ///
    /// Fails without registering anything when the parent cannot be
    /// resolved.
    pub fn create(
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<Arc<ProbeVfs>, ProbeError> {
        let name = name.into();
        let parent_vfs = registry::find(parent).ok_or_else(|| {
            ProbeError::BackendNotFound(parent.unwrap_or("<default>").to_string())
        })?;

        let probe = Arc::new(ProbeVfs {
            name,
            handle_size: parent_vfs.handle_size() + std::mem::size_of::<ProbeFile>(),
            state: Arc::new(ProbeState {
                counters: Counters::new(),
                observer: Mutex::new(None),
            }),
            parent: parent_vfs,
        });

        registry::register(Arc::clone(&probe) as Arc<dyn Vfs>, false);
        info!(probe = %probe.name, parent = %probe.parent.name(), "created probe backend");
        Ok(probe)
    }

    /// Resolve a registered probe by name.
    ///
    /// A missing name is [`ProbeError::NoSuchProbe`]; a name bound to
    /// a backend that is not a probe is [`ProbeError::NotAProbe`] —
    /// the guard every name-addressed operation runs before touching
    /// probe-only state.
    pub fn find(name: &str) -> Result<Arc<ProbeVfs>, ProbeError> {
        let vfs =
            registry::find(Some(name)).ok_or_else(|| ProbeError::NoSuchProbe(name.to_string()))?;
        let any: Arc<dyn Any + Send + Sync> = vfs;
        any.downcast::<ProbeVfs>()
            .map_err(|_| ProbeError::NotAProbe(name.to_string()))
    }

    /// Unregister this probe and release its observer payload.
    ///
    /// Open file handles keep the shared bookkeeping alive, but the
    /// name stops resolving immediately; destroying twice reports
    /// [`ProbeError::NoSuchProbe`].
    pub fn destroy(&self) -> Result<(), ProbeError> {
        registry::unregister(&self.name)
            .ok_or_else(|| ProbeError::NoSuchProbe(self.name.clone()))?;
        self.configure(None);
        info!(probe = %self.name, "destroyed probe backend");
        Ok(())
    }

    /// Install, replace, or clear (`None`) the observer hook.
    ///
    /// The previous hook's payload is released before the new hook is
    /// in place, so a replaced observer can never fire again.
    pub fn configure(&self, observer: Option<Observer>) {
        let mut slot = self.state.observer.lock().expect("observer slot poisoned");
        let previous = slot.take();
        drop(previous);
        *slot = observer;
        debug!(probe = %self.name, "configured observer hook");
    }

    /// Zero every counter cell.
    pub fn reset(&self) {
        self.state.counters.reset();
    }

    /// Counter snapshot for one event kind.
    pub fn stat(&self, kind: EventKind) -> EventStat {
        let (calls, ticks) = self.state.counters.get(kind);
        EventStat {
            name: kind.name(),
            calls,
            ticks,
        }
    }

    /// Counter snapshot by integer code; `None` for codes outside the
    /// event registry, which is the enumeration stop sentinel.
    pub fn get(&self, code: u32) -> Option<EventStat> {
        EventKind::from_code(code).map(|kind| self.stat(kind))
    }

    /// The wrapped parent backend.
    pub fn parent(&self) -> &Arc<dyn Vfs> {
        &self.parent
    }
}

impl Vfs for ProbeVfs {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_size(&self) -> usize {
        self.handle_size
    }

    fn max_pathname(&self) -> usize {
        self.parent.max_pathname()
    }

    fn open(&self, path: &str, flags: OpenFlags) -> VfsResult<OpenedFile> {
        let result = timed!(
            self.state,
            EventKind::Open,
            path,
            flags.bits() as i32,
            0,
            self.parent.open(path, flags)
        );
        result.map(|opened| OpenedFile {
            file: Box::new(ProbeFile::new(
                opened.file,
                Arc::clone(&self.state),
                path.to_string(),
            )),
            flags: opened.flags,
        })
    }

    fn delete(&self, path: &str, sync_dir: bool) -> VfsResult<()> {
        timed!(
            self.state,
            EventKind::Delete,
            path,
            sync_dir as i32,
            0,
            self.parent.delete(path, sync_dir)
        )
    }

    fn access(&self, path: &str, check: AccessCheck) -> VfsResult<bool> {
        timed!(
            self.state,
            EventKind::Access,
            path,
            check.code(),
            0,
            self.parent.access(path, check)
        )
    }

    fn temp_name(&self) -> VfsResult<String> {
        timed!(self.state, EventKind::TempName, "", 0, 0, self.parent.temp_name())
    }

    fn full_pathname(&self, path: &str) -> VfsResult<String> {
        timed!(
            self.state,
            EventKind::FullPathname,
            path,
            0,
            0,
            self.parent.full_pathname(path)
        )
    }

    // Dynamic-library operations pass through uninstrumented.

    fn dl_open(&self, path: &str) -> Option<DlHandle> {
        self.parent.dl_open(path)
    }

    fn dl_error(&self) -> Option<String> {
        self.parent.dl_error()
    }

    fn dl_sym(&self, handle: &DlHandle, symbol: &str) -> Option<DlSymbol> {
        self.parent.dl_sym(handle, symbol)
    }

    fn dl_close(&self, handle: DlHandle) {
        self.parent.dl_close(handle)
    }

    fn randomness(&self, buf: &mut [u8]) -> VfsResult<usize> {
        let len = buf.len() as i32;
        timed!(
            self.state,
            EventKind::Randomness,
            "",
            len,
            0,
            self.parent.randomness(buf)
        )
    }

    fn sleep(&self, micros: u32) -> VfsResult<u32> {
        timed!(
            self.state,
            EventKind::Sleep,
            "",
            micros as i32,
            0,
            self.parent.sleep(micros)
        )
    }

    fn current_time(&self) -> VfsResult<f64> {
        timed!(
            self.state,
            EventKind::CurrentTime,
            "",
            0,
            0,
            self.parent.current_time()
        )
    }
}
