//! Swappable per-call observer hook.
//!
//! A probe can carry at most one [`Observer`]: a closure invoked
//! synchronously on the calling thread after every instrumented call,
//! once the delegated operation has already completed. The closure
//! owns whatever client state it captured; dropping the `Observer` is
//! the release of that state, and the probe drops it exactly once —
//! when the hook is replaced or cleared, or when the probe is
//! destroyed.
//!
//! The hook is invoked while the probe's observer slot is held, so
//! reconfiguring the hook from inside its own callback deadlocks.
//! Usage hazard, not guarded against.

use crate::events::EventKind;

/// Callback signature: event kind, elapsed ticks, contextual name
/// (file path for file operations, path argument for path-taking
/// backend operations, otherwise empty), an operation-specific 32-bit
/// argument, and an operation-specific 64-bit argument (the byte
/// offset for read/write, the new size for truncate, otherwise 0).
pub type ObserverFn = dyn FnMut(EventKind, u64, &str, i32, i64) + Send;

/// An observer callback together with the client state it owns.
pub struct Observer {
    callback: Box<ObserverFn>,
}

impl Observer {
    /// Wrap a callback. Client state travels inside the closure's
    /// captures and is released when the `Observer` is dropped.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(EventKind, u64, &str, i32, i64) + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    pub(crate) fn invoke(
        &mut self,
        kind: EventKind,
        elapsed: u64,
        context: &str,
        arg: i32,
        offset: i64,
    ) {
        (self.callback)(kind, elapsed, context, arg, offset);
    }
}
