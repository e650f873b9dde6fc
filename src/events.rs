//! The fixed set of instrumentable backend operations.
//!
//! Every operation a probe can time and count has one [`EventKind`].
//! Codes and display names are stable for the process lifetime: the
//! code is the index into a probe's counters table, and the name is
//! what reports and observer callbacks carry.

use std::fmt;

/// One instrumentable operation, file-level or backend-level.
///
/// Codes start at 1 so that 0 is never a valid event, and run densely
/// to [`EventKind::CurrentTime`]; [`EventKind::from_code`] returns
/// `None` outside that range, which is what report enumeration uses as
/// its stop sentinel.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // File-level operations.
    Close = 1,
    Read = 2,
    Write = 3,
    Truncate = 4,
    Sync = 5,
    FileSize = 6,
    Lock = 7,
    Unlock = 8,
    CheckReservedLock = 9,
    FileControl = 10,
    SectorSize = 11,
    DeviceCharacteristics = 12,
    // Backend-level operations.
    Open = 13,
    Delete = 14,
    Access = 15,
    TempName = 16,
    FullPathname = 17,
    Randomness = 18,
    Sleep = 19,
    CurrentTime = 20,
}

impl EventKind {
    /// Number of distinct event kinds.
    pub const COUNT: usize = 20;

    /// All kinds in code order, for enumeration.
    pub const ALL: [EventKind; EventKind::COUNT] = [
        EventKind::Close,
        EventKind::Read,
        EventKind::Write,
        EventKind::Truncate,
        EventKind::Sync,
        EventKind::FileSize,
        EventKind::Lock,
        EventKind::Unlock,
        EventKind::CheckReservedLock,
        EventKind::FileControl,
        EventKind::SectorSize,
        EventKind::DeviceCharacteristics,
        EventKind::Open,
        EventKind::Delete,
        EventKind::Access,
        EventKind::TempName,
        EventKind::FullPathname,
        EventKind::Randomness,
        EventKind::Sleep,
        EventKind::CurrentTime,
    ];

    /// The stable integer identity of this kind.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a kind by its integer code.
    pub fn from_code(code: u32) -> Option<EventKind> {
        if code == 0 || code > EventKind::COUNT as u32 {
            return None;
        }
        Some(EventKind::ALL[code as usize - 1])
    }

    /// The stable display name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Close => "close",
            EventKind::Read => "read",
            EventKind::Write => "write",
            EventKind::Truncate => "truncate",
            EventKind::Sync => "sync",
            EventKind::FileSize => "filesize",
            EventKind::Lock => "lock",
            EventKind::Unlock => "unlock",
            EventKind::CheckReservedLock => "check-reserved-lock",
            EventKind::FileControl => "file-control",
            EventKind::SectorSize => "sector-size",
            EventKind::DeviceCharacteristics => "device-characteristics",
            EventKind::Open => "open",
            EventKind::Delete => "delete",
            EventKind::Access => "access",
            EventKind::TempName => "get-temp-name",
            EventKind::FullPathname => "full-pathname",
            EventKind::Randomness => "randomness",
            EventKind::Sleep => "sleep",
            EventKind::CurrentTime => "current-time",
        }
    }

    /// Zero-based counters-table index.
    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

/// Name lookup by raw code; `None` for codes outside the registry.
pub fn name_of(code: u32) -> Option<&'static str> {
    EventKind::from_code(code).map(EventKind::name)
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
