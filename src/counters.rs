//! Per-probe aggregate counters.
//!
//! One table per probe instance, one cell per [`EventKind`]: how many
//! times the operation ran and the total ticks spent inside the real
//! backend. Cells are updated with relaxed per-field atomic adds, so
//! concurrent callers never lose an update, but `reset` zeroes the two
//! fields of a cell independently: a `get` racing a `reset` may see a
//! call count from before the reset next to a tick total from after
//! it. That skew is accepted; the table is diagnostic state, not a
//! ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::events::EventKind;

struct CounterCell {
    calls: AtomicU64,
    ticks: AtomicU64,
}

impl CounterCell {
    const fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
        }
    }
}

/// Call-count and cumulative-tick table keyed by [`EventKind`].
pub struct Counters {
    cells: [CounterCell; EventKind::COUNT],
}

impl Counters {
    pub(crate) const fn new() -> Self {
        Self {
            cells: [const { CounterCell::new() }; EventKind::COUNT],
        }
    }

    /// Record one completed call: +1 to the count, `elapsed` to the ticks.
    pub(crate) fn record(&self, kind: EventKind, elapsed: u64) {
        let cell = &self.cells[kind.index()];
        cell.calls.fetch_add(1, Ordering::Relaxed);
        cell.ticks.fetch_add(elapsed, Ordering::Relaxed);
    }

    /// Read `(calls, ticks)` for one kind.
    pub fn get(&self, kind: EventKind) -> (u64, u64) {
        let cell = &self.cells[kind.index()];
        (
            cell.calls.load(Ordering::Relaxed),
            cell.ticks.load(Ordering::Relaxed),
        )
    }

    /// Zero every cell.
    pub fn reset(&self) {
        for cell in &self.cells {
            cell.calls.store(0, Ordering::Relaxed);
            cell.ticks.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let counters = Counters::new();
        counters.record(EventKind::Read, 10);
        counters.record(EventKind::Read, 32);
        counters.record(EventKind::Write, 7);

        assert_eq!(counters.get(EventKind::Read), (2, 42));
        assert_eq!(counters.get(EventKind::Write), (1, 7));
        assert_eq!(counters.get(EventKind::Sync), (0, 0));
    }

    #[test]
    fn test_reset_zeroes_every_cell() {
        let counters = Counters::new();
        for kind in EventKind::ALL {
            counters.record(kind, 5);
        }
        counters.reset();
        for kind in EventKind::ALL {
            assert_eq!(counters.get(kind), (0, 0));
        }
    }
}
