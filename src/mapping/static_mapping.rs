//! Committed static mapping records

use crate::memory::{AddressRange, Lifespan, StaticAddress};
use crate::trace::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a static mapping within its trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MappingId(u64);

impl MappingId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for MappingId {
    fn from(raw: u64) -> Self {
        MappingId(raw)
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binds a range of trace addresses to an equally long range of a program's
/// static addresses over a lifespan.
///
/// A mapping is a fixed offset, never a resize: both ranges always have the
/// same length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMapping {
    id: MappingId,
    trace_range: AddressRange,
    lifespan: Lifespan,

    /// Name of the program image the static side belongs to.
    program: String,

    static_space: String,
    static_range: AddressRange,
}

impl StaticMapping {
    /// Construct a mapping of `trace_range` onto the static addresses starting
    /// at `static_address`.
    ///
    /// Fails with `Error::LengthMismatch` if the static side would run off the
    /// end of its address space.
    pub fn new(
        id: MappingId,
        trace_range: AddressRange,
        lifespan: Lifespan,
        program: &str,
        static_address: StaticAddress,
    ) -> Result<Self> {
        let start = static_address.offset();
        let static_range = start
            .checked_add(span(&trace_range))
            .and_then(|end| AddressRange::new(start, end))
            .ok_or_else(|| Error::LengthMismatch {
                trace_length: trace_range.length(),
                static_length: (u64::MAX - start).saturating_add(1),
            })?;

        Ok(StaticMapping {
            id,
            trace_range,
            lifespan,
            program: program.to_string(),
            static_space: static_address.space().to_string(),
            static_range,
        })
    }

    pub fn id(&self) -> MappingId {
        self.id
    }

    pub fn trace_range(&self) -> AddressRange {
        self.trace_range
    }

    pub fn min_trace_address(&self) -> u64 {
        self.trace_range.min()
    }

    pub fn max_trace_address(&self) -> u64 {
        self.trace_range.max()
    }

    pub fn lifespan(&self) -> Lifespan {
        self.lifespan
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn static_address(&self) -> StaticAddress {
        StaticAddress::new(&self.static_space, self.static_range.min())
    }

    pub fn static_range(&self) -> AddressRange {
        self.static_range
    }

    pub fn length(&self) -> u64 {
        self.trace_range.length()
    }

    /// Determine if the two ranges have the same length, which loaded data
    /// cannot be trusted to guarantee.
    pub fn is_consistent(&self) -> bool {
        span(&self.trace_range) == span(&self.static_range)
    }

    /// Determine if two mappings would collide while both exist: either their
    /// trace ranges overlap, or they map onto overlapping static ranges of the
    /// same program.
    pub fn conflicts_with(&self, other: &StaticMapping) -> bool {
        if !self.lifespan.intersects(&other.lifespan) {
            return false;
        }

        let same_static_space = self.program == other.program && self.static_space == other.static_space;

        self.trace_range.intersects(&other.trace_range)
            || (same_static_space && self.static_range.intersects(&other.static_range))
    }

    /// Translate a trace address covered by this mapping into its static
    /// counterpart.
    pub fn to_static(&self, trace_address: u64) -> Option<StaticAddress> {
        if !self.trace_range.contains(trace_address) {
            return None;
        }

        let offset = self.static_range.min() + (trace_address - self.trace_range.min());

        Some(StaticAddress::new(&self.static_space, offset))
    }

    /// Translate a static address covered by this mapping back into the
    /// trace's address space.
    pub fn to_trace(&self, static_address: &StaticAddress) -> Option<u64> {
        if static_address.space() != self.static_space || !self.static_range.contains(static_address.offset()) {
            return None;
        }

        Some(self.trace_range.min() + (static_address.offset() - self.static_range.min()))
    }
}

/// Distance from the first address of a range to its last. Unlike the length
/// this never saturates, so it tells the full address space apart from a
/// range one byte shorter.
fn span(range: &AddressRange) -> u64 {
    range.max() - range.min()
}
