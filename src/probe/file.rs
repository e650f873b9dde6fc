//! Instrumented file handle.

use std::any::Any;
use std::sync::Arc;

use super::{timed, ProbeState};
use crate::events::EventKind;
use crate::vfs::{DeviceCaps, LockLevel, SyncFlags, VfsFile, VfsResult};

/// Wrapper around one real file handle. Owns the real handle for its
/// whole lifetime and reaches back to the probe's shared bookkeeping
/// for every call; the stored path is the contextual name reported for
/// all file-level events.
pub(crate) struct ProbeFile {
    real: Box<dyn VfsFile>,
    state: Arc<ProbeState>,
    path: String,
}

impl ProbeFile {
    pub(crate) fn new(real: Box<dyn VfsFile>, state: Arc<ProbeState>, path: String) -> Self {
        Self { real, state, path }
    }
}

impl VfsFile for ProbeFile {
    fn close(&mut self) -> VfsResult<()> {
        // Always forwarded, so the real handle is never leaked.
        timed!(self.state, EventKind::Close, &self.path, 0, 0, self.real.close())
    }

    fn read(&mut self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        let len = buf.len() as i32;
        timed!(
            self.state,
            EventKind::Read,
            &self.path,
            len,
            offset as i64,
            self.real.read(buf, offset)
        )
    }

    fn write(&mut self, buf: &[u8], offset: u64) -> VfsResult<usize> {
        let len = buf.len() as i32;
        timed!(
            self.state,
            EventKind::Write,
            &self.path,
            len,
            offset as i64,
            self.real.write(buf, offset)
        )
    }

    fn truncate(&mut self, size: u64) -> VfsResult<()> {
        timed!(
            self.state,
            EventKind::Truncate,
            &self.path,
            0,
            size as i64,
            self.real.truncate(size)
        )
    }

    fn sync(&mut self, flags: SyncFlags) -> VfsResult<()> {
        timed!(
            self.state,
            EventKind::Sync,
            &self.path,
            flags.bits() as i32,
            0,
            self.real.sync(flags)
        )
    }

    fn file_size(&self) -> VfsResult<u64> {
        timed!(
            self.state,
            EventKind::FileSize,
            &self.path,
            0,
            0,
            self.real.file_size()
        )
    }

    fn lock(&mut self, level: LockLevel) -> VfsResult<()> {
        timed!(
            self.state,
            EventKind::Lock,
            &self.path,
            level.code(),
            0,
            self.real.lock(level)
        )
    }

    fn unlock(&mut self, level: LockLevel) -> VfsResult<()> {
        timed!(
            self.state,
            EventKind::Unlock,
            &self.path,
            level.code(),
            0,
            self.real.unlock(level)
        )
    }

    fn check_reserved_lock(&self) -> VfsResult<bool> {
        timed!(
            self.state,
            EventKind::CheckReservedLock,
            &self.path,
            0,
            0,
            self.real.check_reserved_lock()
        )
    }

    fn file_control(&mut self, op: u32, arg: &mut dyn Any) -> VfsResult<()> {
        timed!(
            self.state,
            EventKind::FileControl,
            &self.path,
            0,
            0,
            self.real.file_control(op, arg)
        )
    }

    fn sector_size(&self) -> u32 {
        timed!(
            self.state,
            EventKind::SectorSize,
            &self.path,
            0,
            0,
            self.real.sector_size()
        )
    }

    fn device_characteristics(&self) -> DeviceCaps {
        timed!(
            self.state,
            EventKind::DeviceCharacteristics,
            &self.path,
            0,
            0,
            self.real.device_characteristics()
        )
    }
}
