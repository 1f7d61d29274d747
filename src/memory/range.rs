//! Closed address intervals

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// A closed, non-empty range of addresses within a single address space.
///
/// Both ends are inclusive, so a range always covers at least one address.
/// There is deliberately no way to express an empty range: operations that
/// could produce one yield `None` instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u64, u64)", into = "(u64, u64)")]
pub struct AddressRange {
    min: u64,
    max: u64,
}

impl AddressRange {
    /// Construct a range from its inclusive bounds.
    ///
    /// Yields `None` if `min` is greater than `max`.
    pub fn new(min: u64, max: u64) -> Option<Self> {
        if min <= max {
            Some(AddressRange { min, max })
        } else {
            None
        }
    }

    /// Construct a range from a start address and a length in bytes.
    ///
    /// Zero-length ranges and ranges which wrap around the end of the address
    /// space are rejected.
    pub fn from_start_length(start: u64, length: u64) -> Option<Self> {
        let last = length.checked_sub(1)?;
        let max = start.checked_add(last)?;

        Some(AddressRange { min: start, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// The number of addresses covered by this range.
    ///
    /// The one range that spans the whole 64-bit space saturates to
    /// `u64::MAX`.
    pub fn length(&self) -> u64 {
        (self.max - self.min).saturating_add(1)
    }

    pub fn contains(&self, addr: u64) -> bool {
        self.min <= addr && addr <= self.max
    }

    pub fn intersects(&self, other: &AddressRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

impl TryFrom<(u64, u64)> for AddressRange {
    type Error = String;

    fn try_from((min, max): (u64, u64)) -> Result<Self, Self::Error> {
        AddressRange::new(min, max)
            .ok_or_else(|| format!("range minimum {:#x} exceeds maximum {:#x}", min, max))
    }
}

impl From<AddressRange> for (u64, u64) {
    fn from(range: AddressRange) -> Self {
        (range.min, range.max)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:08x}, {:08x}]", self.min, self.max)
    }
}
