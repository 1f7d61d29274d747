//! Error type for trace mutation

use crate::mapping::MappingId;
use crate::memory::{AddressRange, Snap};
use crate::trace::RegionId;
use std::{fmt, result};
use thiserror::Error;

/// Whatever already occupies an address range that something else wanted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Occupant {
    Region(RegionId),
    Mapping(MappingId),
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occupant::Region(id) => write!(f, "region {}", id),
            Occupant::Mapping(id) => write!(f, "mapping {}", id),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two live regions, or two mappings, would alias.
    #[error("{range} overlaps {existing}")]
    Overlap {
        range: AddressRange,
        existing: Occupant,
    },

    /// The region's lifespan was already closed.
    #[error("region {0} has already been destroyed")]
    AlreadyDestroyed(RegionId),

    #[error("region {0} does not exist")]
    UnknownRegion(RegionId),

    /// A lifespan would end before it starts.
    #[error("lifespan cannot end at {end} when it starts at {start}")]
    InvalidLifespan { start: Snap, end: Snap },

    /// The trace and static sides of a mapping differ in length, or the
    /// static side does not fit in its address space.
    #[error("trace range is {trace_length:#x} bytes but static range is {static_length:#x} bytes")]
    LengthMismatch {
        trace_length: u64,
        static_length: u64,
    },

    /// Another transaction changed a region this one staged edits against.
    #[error("region {0} was modified by a concurrent transaction")]
    ConcurrentModification(RegionId),

    /// Every region or mapping id has been handed out.
    #[error("the trace has run out of {0} ids")]
    IdsExhausted(&'static str),

    #[error("there is nothing to undo")]
    NothingToUndo,

    #[error("there is nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = result::Result<T, Error>;
