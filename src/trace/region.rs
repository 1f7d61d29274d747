//! Trace region records

use crate::memory::{AddressRange, Lifespan, MemoryFlags, Snap};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a trace within a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraceId(pub(crate) u64);

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace#{}", self.0)
    }
}

/// Stable identifier of a region within its trace.
///
/// Identifiers are never reused, not even when the transaction that
/// allocated one is aborted or undone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub(crate) u64);

impl RegionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for RegionId {
    fn from(raw: u64) -> Self {
        RegionId(raw)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named, permission-flagged address range that exists over a lifespan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRegion {
    id: RegionId,

    /// The trace this region belongs to. Not persisted; reassigned when the
    /// owning trace is loaded.
    #[serde(skip)]
    trace: TraceId,

    name: String,
    range: AddressRange,
    flags: MemoryFlags,
    lifespan: Lifespan,
}

impl TraceRegion {
    pub(crate) fn from_parts(
        id: RegionId,
        trace: TraceId,
        name: &str,
        range: AddressRange,
        flags: MemoryFlags,
        lifespan: Lifespan,
    ) -> Self {
        TraceRegion {
            id,
            trace,
            name: name.to_string(),
            range,
            flags,
            lifespan,
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn trace(&self) -> TraceId {
        self.trace
    }

    pub(crate) fn set_trace(&mut self, trace: TraceId) {
        self.trace = trace;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> AddressRange {
        self.range
    }

    pub fn flags(&self) -> MemoryFlags {
        self.flags
    }

    pub fn lifespan(&self) -> Lifespan {
        self.lifespan
    }

    pub(crate) fn set_lifespan(&mut self, lifespan: Lifespan) {
        self.lifespan = lifespan;
    }

    pub fn is_alive_at(&self, snap: Snap) -> bool {
        self.lifespan.contains(snap)
    }

    /// Determine if this region and a prospective one would alias: their
    /// ranges overlap while both are alive.
    pub fn conflicts_with(&self, range: &AddressRange, lifespan: &Lifespan) -> bool {
        self.range.intersects(range) && self.lifespan.intersects(lifespan)
    }
}
