//! Committed contents of a trace

use crate::mapping::{MappingId, StaticMapping};
use crate::memory::{AddressRange, Lifespan, Snap};
use crate::trace::{RegionId, TraceRegion};
use std::collections::BTreeMap;

/// The committed regions and mappings of a single trace.
///
/// This is what readers see. Nothing outside of the trace module can mutate
/// it; writes happen by applying `Operation`s during commit, undo, or redo.
#[derive(Clone, Debug, Default)]
pub struct TraceState {
    regions: BTreeMap<RegionId, TraceRegion>,
    mappings: BTreeMap<MappingId, StaticMapping>,
}

/// Search a set of regions for one that would alias a prospective region.
pub(crate) fn find_region_conflict<'a, I>(
    regions: I,
    range: &AddressRange,
    lifespan: &Lifespan,
) -> Option<RegionId>
where
    I: IntoIterator<Item = &'a TraceRegion>,
{
    regions
        .into_iter()
        .find(|r| r.conflicts_with(range, lifespan))
        .map(|r| r.id())
}

/// Search a set of mappings for one that overlaps a prospective mapping on
/// either its trace side or its static side.
pub(crate) fn find_mapping_conflict<'a, I>(mappings: I, mapping: &StaticMapping) -> Option<MappingId>
where
    I: IntoIterator<Item = &'a StaticMapping>,
{
    mappings
        .into_iter()
        .find(|m| m.conflicts_with(mapping))
        .map(|m| m.id())
}

impl TraceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self, id: RegionId) -> Option<&TraceRegion> {
        self.regions.get(&id)
    }

    pub fn regions(&self) -> impl Iterator<Item = &TraceRegion> {
        self.regions.values()
    }

    pub fn mapping(&self, id: MappingId) -> Option<&StaticMapping> {
        self.mappings.get(&id)
    }

    pub fn mappings(&self) -> impl Iterator<Item = &StaticMapping> {
        self.mappings.values()
    }

    /// List every region alive at the given snap, lowest address first.
    pub fn query(&self, snap: Snap) -> Vec<RegionId> {
        let mut alive: Vec<&TraceRegion> = self
            .regions
            .values()
            .filter(|r| r.is_alive_at(snap))
            .collect();

        alive.sort_by_key(|r| (r.range().min(), r.id()));
        alive.into_iter().map(|r| r.id()).collect()
    }

    pub(crate) fn region_conflict(&self, range: &AddressRange, lifespan: &Lifespan) -> Option<RegionId> {
        find_region_conflict(self.regions.values(), range, lifespan)
    }

    pub(crate) fn mapping_conflict(&self, mapping: &StaticMapping) -> Option<MappingId> {
        find_mapping_conflict(self.mappings.values(), mapping)
    }

    pub(crate) fn region_mut(&mut self, id: RegionId) -> Option<&mut TraceRegion> {
        self.regions.get_mut(&id)
    }

    pub(crate) fn insert_region(&mut self, region: TraceRegion) {
        self.regions.insert(region.id(), region);
    }

    pub(crate) fn remove_region(&mut self, id: RegionId) -> Option<TraceRegion> {
        self.regions.remove(&id)
    }

    pub(crate) fn insert_mapping(&mut self, mapping: StaticMapping) {
        self.mappings.insert(mapping.id(), mapping);
    }

    pub(crate) fn remove_mapping(&mut self, id: MappingId) -> Option<StaticMapping> {
        self.mappings.remove(&id)
    }

    /// The lowest region and mapping id numbers that have never been used.
    ///
    /// `u64::MAX` is never handed out, so a state already holding it yields
    /// `u64::MAX` here and allocation from it fails.
    pub(crate) fn next_ids(&self) -> (u64, u64) {
        let next_region = self
            .regions
            .keys()
            .next_back()
            .map_or(0, |id| id.0.saturating_add(1));
        let next_mapping = self
            .mappings
            .keys()
            .next_back()
            .map_or(0, |id| id.raw().saturating_add(1));

        (next_region, next_mapping)
    }
}
