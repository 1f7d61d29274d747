//! Scoped transactions

use crate::mapping::{MappingId, StaticMapping};
use crate::memory::{AddressRange, Lifespan, MemoryFlags, Snap, StaticAddress};
use crate::trace::operation::Operation;
use crate::trace::state::{find_mapping_conflict, find_region_conflict};
use crate::trace::{Error, Occupant, RegionId, Result, Trace, TraceRegion};
use std::collections::BTreeMap;
use std::mem;
use tracing::debug;

/// A bounded unit of work against a single trace.
///
/// Edits made through a transaction are staged privately: the transaction
/// itself sees them, but no other reader of the trace does until `commit`
/// applies them all at once. `abort` discards them, as does dropping the
/// transaction without committing it, and in either case no listener hears
/// about anything.
///
/// Each edit is validated as it is made, against the committed state plus
/// this transaction's own staged edits. A failed edit stages nothing and the
/// transaction remains usable. Commit validates everything again under the
/// trace's write lock, since other transactions may have committed since.
pub struct Transaction<'a> {
    trace: &'a Trace,
    description: String,
    ops: Vec<Operation>,

    /// The latest staged version of every region this transaction created or
    /// modified.
    staged_regions: BTreeMap<RegionId, TraceRegion>,

    staged_mappings: Vec<StaticMapping>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(trace: &'a Trace, description: &str) -> Self {
        Transaction {
            trace,
            description: description.to_string(),
            ops: Vec::new(),
            staged_regions: BTreeMap::new(),
            staged_mappings: Vec::new(),
            finished: false,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn trace(&self) -> &'a Trace {
        self.trace
    }

    /// Look up a region as this transaction sees it.
    pub fn region(&self, id: RegionId) -> Option<TraceRegion> {
        match self.staged_regions.get(&id) {
            Some(region) => Some(region.clone()),
            None => self.trace.region(id),
        }
    }

    /// List every region alive at the given snap, as this transaction sees
    /// it, lowest address first.
    pub fn query(&self, snap: Snap) -> Vec<RegionId> {
        let state = self.trace.read_state();
        let mut alive: Vec<&TraceRegion> = state
            .regions()
            .filter(|r| !self.staged_regions.contains_key(&r.id()))
            .chain(self.staged_regions.values())
            .filter(|r| r.is_alive_at(snap))
            .collect();

        alive.sort_by_key(|r| (r.range().min(), r.id()));
        alive.into_iter().map(|r| r.id()).collect()
    }

    fn region_conflict(&self, range: &AddressRange, lifespan: &Lifespan) -> Option<RegionId> {
        let state = self.trace.read_state();
        let committed = state
            .regions()
            .filter(|r| !self.staged_regions.contains_key(&r.id()));

        find_region_conflict(committed.chain(self.staged_regions.values()), range, lifespan)
    }

    fn mapping_conflict(&self, mapping: &StaticMapping) -> Option<MappingId> {
        let state = self.trace.read_state();

        find_mapping_conflict(state.mappings().chain(self.staged_mappings.iter()), mapping)
    }

    /// Create a region that is alive from `lifespan_start` onwards.
    pub fn create_region(
        &mut self,
        name: &str,
        range: AddressRange,
        lifespan_start: Snap,
        flags: MemoryFlags,
    ) -> Result<RegionId> {
        self.add_region(name, Lifespan::now_on(lifespan_start), range, flags)
    }

    /// Create a region with an explicit lifespan, which may already be
    /// closed.
    ///
    /// Fails with `Error::Overlap` if the range intersects another region
    /// while both are alive.
    pub fn add_region(
        &mut self,
        name: &str,
        lifespan: Lifespan,
        range: AddressRange,
        flags: MemoryFlags,
    ) -> Result<RegionId> {
        if let Some(existing) = self.region_conflict(&range, &lifespan) {
            return Err(Error::Overlap {
                range,
                existing: Occupant::Region(existing),
            });
        }

        let id = self.trace.allocate_region_id()?;
        let region = TraceRegion::from_parts(id, self.trace.id(), name, range, flags, lifespan);

        debug!("Staging region {} {:?} at {} for {}", id, name, range, lifespan);

        self.staged_regions.insert(id, region.clone());
        self.ops.push(Operation::CreateRegion(region));

        Ok(id)
    }

    /// Close a region's lifespan at the given snap.
    ///
    /// The region is still there afterwards; it just stops being alive from
    /// `at_snap` onwards.
    pub fn destroy_region(&mut self, id: RegionId, at_snap: Snap) -> Result<()> {
        let mut region = self.region(id).ok_or(Error::UnknownRegion(id))?;
        let old = region.lifespan();

        if !old.is_open() {
            return Err(Error::AlreadyDestroyed(id));
        }

        let new = old.closed_at(at_snap).ok_or(Error::InvalidLifespan {
            start: old.start(),
            end: at_snap,
        })?;

        debug!("Staging destruction of region {} at snap {}", id, at_snap);

        region.set_lifespan(new);
        self.staged_regions.insert(id, region);
        self.ops.push(Operation::SetRegionLifespan { id, old, new });

        Ok(())
    }

    /// Bind a trace address range to a static address range of the same
    /// length over a lifespan.
    ///
    /// Fails with `Error::Overlap` if either side collides with an existing
    /// mapping during an overlapping lifespan.
    pub fn add_mapping(
        &mut self,
        trace_range: AddressRange,
        lifespan: Lifespan,
        program: &str,
        static_address: StaticAddress,
    ) -> Result<MappingId> {
        let id = self.trace.allocate_mapping_id()?;
        let mapping = StaticMapping::new(id, trace_range, lifespan, program, static_address)?;

        if let Some(existing) = self.mapping_conflict(&mapping) {
            return Err(Error::Overlap {
                range: trace_range,
                existing: Occupant::Mapping(existing),
            });
        }

        debug!("Staging mapping {} {} -> {}", id, trace_range, mapping.static_address());

        self.staged_mappings.push(mapping.clone());
        self.ops.push(Operation::CreateMapping(mapping));

        Ok(id)
    }

    /// Determine if anything has been staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every staged edit atomically and record them as one undoable
    /// command.
    ///
    /// If the edits no longer apply cleanly, nothing is applied and the error
    /// is returned.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;

        let ops = mem::take(&mut self.ops);
        let description = mem::take(&mut self.description);

        self.trace.commit_operations(description, ops)
    }

    /// Discard every staged edit.
    pub fn abort(mut self) {
        self.finished = true;

        debug!(
            "Aborted transaction {:?}, discarding {} staged edits",
            self.description,
            self.ops.len()
        );
    }
}

impl<'a> Drop for Transaction<'a> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                "Transaction {:?} dropped without commit, discarding {} staged edits",
                self.description,
                self.ops.len()
            );
        }
    }
}
