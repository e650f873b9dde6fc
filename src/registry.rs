//! Process-wide backend registry.
//!
//! Backends are registered under their name and looked up by name (or
//! as the current default) from anywhere in the process. The registry
//! initializes on first use and every mutation happens under a single
//! lock, so concurrent registration is safe.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use crate::vfs::Vfs;

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Arc<dyn Vfs>>,
    default: Option<String>,
}

fn registry() -> &'static RwLock<Inner> {
    static REGISTRY: OnceLock<RwLock<Inner>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Inner::default()))
}

/// Register a backend under its own name, replacing any previous entry
/// with that name. The first backend registered becomes the default;
/// `make_default` promotes this one explicitly.
pub fn register(vfs: Arc<dyn Vfs>, make_default: bool) {
    let name = vfs.name().to_string();
    let mut inner = registry().write().expect("backend registry poisoned");
    if make_default || inner.default.is_none() {
        inner.default = Some(name.clone());
    }
    let replaced = inner.entries.insert(name.clone(), vfs).is_some();
    debug!(backend = %name, replaced, "registered backend");
}

/// Remove a backend by name, returning it if it was registered.
/// Removing the default leaves the registry with no default.
pub fn unregister(name: &str) -> Option<Arc<dyn Vfs>> {
    let mut inner = registry().write().expect("backend registry poisoned");
    let removed = inner.entries.remove(name);
    if removed.is_some() {
        if inner.default.as_deref() == Some(name) {
            inner.default = None;
        }
        debug!(backend = %name, "unregistered backend");
    }
    removed
}

/// Look up a backend by name; `None` resolves the current default.
pub fn find(name: Option<&str>) -> Option<Arc<dyn Vfs>> {
    let inner = registry().read().expect("backend registry poisoned");
    let name = match name {
        Some(name) => name,
        None => inner.default.as_deref()?,
    };
    inner.entries.get(name).map(Arc::clone)
}

/// Names of all registered backends, unordered.
pub fn names() -> Vec<String> {
    let inner = registry().read().expect("backend registry poisoned");
    inner.entries.keys().cloned().collect()
}
