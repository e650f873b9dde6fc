//! In-memory storage backend.
//!
//! The in-process double used by tests and the shell: a flat
//! path-to-bytes namespace with ladder-style file locking. Not a
//! durable backend; `sync` is a no-op that exists so wrappers have
//! something real to delegate to.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::RngCore;
use uuid::Uuid;

use super::{
    AccessCheck, DeviceCaps, LockLevel, OpenFlags, OpenedFile, SyncFlags, Vfs, VfsError, VfsFile,
    VfsResult,
};

const SECTOR_SIZE: u32 = 512;

/// Days between the Unix epoch and the Julian Day epoch.
const JULIAN_UNIX_EPOCH: f64 = 2_440_587.5;

type FileMap = Arc<Mutex<HashMap<String, Arc<Mutex<MemNode>>>>>;

/// One file's bytes plus the lock state shared by every open handle.
#[derive(Default)]
struct MemNode {
    data: Vec<u8>,
    shared: usize,
    reserved: bool,
    exclusive: bool,
}

/// In-memory backend instance.
pub struct MemVfs {
    name: String,
    files: FileMap,
}

impl MemVfs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Vfs for MemVfs {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_size(&self) -> usize {
        std::mem::size_of::<MemFile>()
    }

    fn open(&self, path: &str, flags: OpenFlags) -> VfsResult<OpenedFile> {
        let mut files = self.files.lock().expect("mem backend poisoned");

        let node = match files.get(path) {
            Some(node) => {
                if flags.contains(OpenFlags::CREATE) && flags.contains(OpenFlags::EXCLUSIVE) {
                    return Err(VfsError::AlreadyExists(path.to_string()));
                }
                Arc::clone(node)
            }
            None => {
                if !flags.contains(OpenFlags::CREATE) {
                    return Err(VfsError::NotFound(path.to_string()));
                }
                let node = Arc::new(Mutex::new(MemNode::default()));
                files.insert(path.to_string(), Arc::clone(&node));
                node
            }
        };

        Ok(OpenedFile {
            file: Box::new(MemFile {
                path: path.to_string(),
                node,
                files: Arc::clone(&self.files),
                lock: LockLevel::Unlocked,
                delete_on_close: flags.contains(OpenFlags::DELETE_ON_CLOSE),
            }),
            flags,
        })
    }

    fn delete(&self, path: &str, _sync_dir: bool) -> VfsResult<()> {
        let mut files = self.files.lock().expect("mem backend poisoned");
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| VfsError::NotFound(path.to_string()))
    }

    fn access(&self, path: &str, _check: AccessCheck) -> VfsResult<bool> {
        // Everything in the namespace is readable and writable, so all
        // three checks collapse to existence.
        let files = self.files.lock().expect("mem backend poisoned");
        Ok(files.contains_key(path))
    }

    fn temp_name(&self) -> VfsResult<String> {
        Ok(format!("tmp-{}", Uuid::new_v4().simple()))
    }

    fn full_pathname(&self, path: &str) -> VfsResult<String> {
        if path.starts_with('/') {
            Ok(path.to_string())
        } else {
            Ok(format!("/{path}"))
        }
    }

    fn randomness(&self, buf: &mut [u8]) -> VfsResult<usize> {
        rand::rng().fill_bytes(buf);
        Ok(buf.len())
    }

    fn sleep(&self, micros: u32) -> VfsResult<u32> {
        std::thread::sleep(Duration::from_micros(u64::from(micros)));
        Ok(micros)
    }

    fn current_time(&self) -> VfsResult<f64> {
        let millis = chrono::Utc::now().timestamp_millis();
        Ok(JULIAN_UNIX_EPOCH + millis as f64 / 86_400_000.0)
    }
}

/// One open handle onto a [`MemVfs`] file.
pub struct MemFile {
    path: String,
    node: Arc<Mutex<MemNode>>,
    files: FileMap,
    lock: LockLevel,
    delete_on_close: bool,
}

fn release_locks(held: LockLevel, node: &mut MemNode) {
    if held >= LockLevel::Shared {
        node.shared -= 1;
    }
    if held >= LockLevel::Reserved {
        node.reserved = false;
    }
    if held == LockLevel::Exclusive {
        node.exclusive = false;
    }
}

impl VfsFile for MemFile {
    fn close(&mut self) -> VfsResult<()> {
        let held = std::mem::replace(&mut self.lock, LockLevel::Unlocked);
        if held > LockLevel::Unlocked {
            let mut node = self.node.lock().expect("mem backend poisoned");
            release_locks(held, &mut node);
        }
        if self.delete_on_close {
            let mut files = self.files.lock().expect("mem backend poisoned");
            files.remove(&self.path);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        let node = self.node.lock().expect("mem backend poisoned");
        let offset = offset as usize;
        if offset >= node.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(node.data.len() - offset);
        buf[..n].copy_from_slice(&node.data[offset..offset + n]);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8], offset: u64) -> VfsResult<usize> {
        let mut node = self.node.lock().expect("mem backend poisoned");
        let offset = offset as usize;
        let end = offset + buf.len();
        if node.data.len() < end {
            node.data.resize(end, 0);
        }
        node.data[offset..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn truncate(&mut self, size: u64) -> VfsResult<()> {
        let mut node = self.node.lock().expect("mem backend poisoned");
        node.data.resize(size as usize, 0);
        Ok(())
    }

    fn sync(&mut self, _flags: SyncFlags) -> VfsResult<()> {
        Ok(())
    }

    fn file_size(&self) -> VfsResult<u64> {
        let node = self.node.lock().expect("mem backend poisoned");
        Ok(node.data.len() as u64)
    }

    fn lock(&mut self, level: LockLevel) -> VfsResult<()> {
        if level <= self.lock {
            return Ok(());
        }
        let mut node = self.node.lock().expect("mem backend poisoned");
        match (self.lock, level) {
            (LockLevel::Unlocked, LockLevel::Shared) => {
                if node.exclusive {
                    return Err(VfsError::LockBusy);
                }
                node.shared += 1;
            }
            (LockLevel::Shared, LockLevel::Reserved) => {
                if node.reserved || node.exclusive {
                    return Err(VfsError::LockBusy);
                }
                node.reserved = true;
            }
            (LockLevel::Shared | LockLevel::Reserved | LockLevel::Pending, LockLevel::Exclusive) => {
                // Our own shared reference is the one allowed to remain.
                if node.shared > 1 || node.exclusive || (node.reserved && self.lock < LockLevel::Reserved)
                {
                    return Err(VfsError::LockBusy);
                }
                node.reserved = true;
                node.exclusive = true;
            }
            (from, to) => {
                return Err(VfsError::InvalidLockTransition { from, to });
            }
        }
        self.lock = level;
        Ok(())
    }

    fn unlock(&mut self, level: LockLevel) -> VfsResult<()> {
        if level >= self.lock {
            return Ok(());
        }
        let mut node = self.node.lock().expect("mem backend poisoned");
        if self.lock == LockLevel::Exclusive {
            node.exclusive = false;
        }
        if self.lock >= LockLevel::Reserved && level < LockLevel::Reserved {
            node.reserved = false;
        }
        if level == LockLevel::Unlocked {
            node.shared -= 1;
        }
        self.lock = level;
        Ok(())
    }

    fn check_reserved_lock(&self) -> VfsResult<bool> {
        let node = self.node.lock().expect("mem backend poisoned");
        Ok(node.reserved || node.exclusive)
    }

    fn file_control(&mut self, op: u32, _arg: &mut dyn Any) -> VfsResult<()> {
        Err(VfsError::UnsupportedControl(op))
    }

    fn sector_size(&self) -> u32 {
        SECTOR_SIZE
    }

    fn device_characteristics(&self) -> DeviceCaps {
        DeviceCaps::ATOMIC_WRITE | DeviceCaps::SAFE_APPEND
    }
}
