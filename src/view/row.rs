//! Display rows

use crate::memory::{AddressRange, Lifespan, MemoryFlags, Snap};
use crate::trace::{RegionId, TraceRegion};

/// One region, flattened into the fields a region table shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionRow {
    region: RegionId,
    name: String,
    range: AddressRange,
    flags: MemoryFlags,
    lifespan: Lifespan,
}

impl RegionRow {
    pub fn from_region(region: &TraceRegion) -> Self {
        RegionRow {
            region: region.id(),
            name: region.name().to_string(),
            range: region.range(),
            flags: region.flags(),
            lifespan: region.lifespan(),
        }
    }

    pub fn region(&self) -> RegionId {
        self.region
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Also the address to navigate to when the row is activated.
    pub fn min_address(&self) -> u64 {
        self.range.min()
    }

    pub fn max_address(&self) -> u64 {
        self.range.max()
    }

    pub fn range(&self) -> AddressRange {
        self.range
    }

    pub fn length(&self) -> u64 {
        self.range.length()
    }

    pub fn created_snap(&self) -> Snap {
        self.lifespan.start()
    }

    pub fn destroyed_snap(&self) -> Option<Snap> {
        self.lifespan.end()
    }

    /// The destroyed snap as shown in a table: blank while still alive.
    pub fn destroyed_snap_text(&self) -> String {
        self.lifespan
            .end()
            .map_or_else(String::new, |snap| snap.to_string())
    }

    pub fn lifespan(&self) -> Lifespan {
        self.lifespan
    }

    pub fn flags(&self) -> MemoryFlags {
        self.flags
    }

    pub fn is_read(&self) -> bool {
        self.flags.contains(MemoryFlags::READ)
    }

    pub fn is_write(&self) -> bool {
        self.flags.contains(MemoryFlags::WRITE)
    }

    pub fn is_execute(&self) -> bool {
        self.flags.contains(MemoryFlags::EXECUTE)
    }
}

/// The address ranges covered by a selection of rows, lowest first, for
/// handing to a listing as its selection.
pub fn select_addresses(rows: &[RegionRow]) -> Vec<AddressRange> {
    let mut ranges: Vec<AddressRange> = rows.iter().map(|r| r.range()).collect();

    ranges.sort_by_key(|r| (r.min(), r.max()));
    ranges.dedup();
    ranges
}
