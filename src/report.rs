//! Externally consumable counter reports.

use crate::probe::ProbeVfs;

/// One event kind's aggregate: stable name, call count, cumulative
/// ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStat {
    pub name: &'static str,
    pub calls: u64,
    pub ticks: u64,
}

/// Snapshot every event kind's counters, in event-code order.
///
/// Enumerates codes from 1 until the probe reports the out-of-range
/// sentinel, so the result always covers the full event registry.
pub fn report(probe: &ProbeVfs) -> Vec<EventStat> {
    let mut stats = Vec::new();
    let mut code = 1;
    while let Some(stat) = probe.get(code) {
        stats.push(stat);
        code += 1;
    }
    stats
}
