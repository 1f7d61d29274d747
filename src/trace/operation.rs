//! Reversible edits to a trace's state

use crate::mapping::StaticMapping;
use crate::memory::Lifespan;
use crate::trace::{ChangeEvent, Error, Occupant, RegionId, Result, TraceRegion, TraceState};
use tracing::warn;

/// A single reversible edit.
///
/// Transactions stage a list of these; commit and redo apply them in order,
/// undo reverts them in reverse order. Together, the operations of one
/// transaction form the composite command kept in the undo history.
#[derive(Clone, Debug)]
pub(crate) enum Operation {
    CreateRegion(TraceRegion),
    SetRegionLifespan {
        id: RegionId,
        old: Lifespan,
        new: Lifespan,
    },
    CreateMapping(StaticMapping),
}

impl Operation {
    /// Apply this operation to the state, checking that it still makes sense
    /// against whatever else was committed in the meantime.
    pub fn apply(&self, state: &mut TraceState) -> Result<ChangeEvent> {
        match self {
            Operation::CreateRegion(region) => {
                if let Some(existing) = state.region_conflict(&region.range(), &region.lifespan()) {
                    return Err(Error::Overlap {
                        range: region.range(),
                        existing: Occupant::Region(existing),
                    });
                }

                state.insert_region(region.clone());
                Ok(ChangeEvent::RegionAdded(region.id()))
            }
            Operation::SetRegionLifespan { id, old, new } => {
                let region = state.region_mut(*id).ok_or(Error::UnknownRegion(*id))?;

                if region.lifespan() != *old {
                    return Err(Error::ConcurrentModification(*id));
                }

                region.set_lifespan(*new);
                Ok(ChangeEvent::RegionChanged(*id))
            }
            Operation::CreateMapping(mapping) => {
                if let Some(existing) = state.mapping_conflict(mapping) {
                    return Err(Error::Overlap {
                        range: mapping.trace_range(),
                        existing: Occupant::Mapping(existing),
                    });
                }

                state.insert_mapping(mapping.clone());
                Ok(ChangeEvent::MappingAdded(mapping.id()))
            }
        }
    }

    /// Undo the effect of `apply`.
    ///
    /// The history only reverts operations it applied itself, in reverse
    /// order, so the state is always the one this operation produced.
    pub fn revert(&self, state: &mut TraceState) -> ChangeEvent {
        match self {
            Operation::CreateRegion(region) => {
                if state.remove_region(region.id()).is_none() {
                    warn!("Reverting creation of region {} which is missing", region.id());
                }

                ChangeEvent::RegionRemoved(region.id())
            }
            Operation::SetRegionLifespan { id, old, .. } => {
                match state.region_mut(*id) {
                    Some(region) => region.set_lifespan(*old),
                    None => warn!("Reverting lifespan of region {} which is missing", id),
                }

                ChangeEvent::RegionChanged(*id)
            }
            Operation::CreateMapping(mapping) => {
                if state.remove_mapping(mapping.id()).is_none() {
                    warn!("Reverting creation of mapping {} which is missing", mapping.id());
                }

                ChangeEvent::MappingRemoved(mapping.id())
            }
        }
    }
}

/// Apply a whole list of operations, or none of them.
///
/// If any operation fails, the ones already applied are reverted before the
/// error is returned.
pub(crate) fn apply_all(ops: &[Operation], state: &mut TraceState) -> Result<Vec<ChangeEvent>> {
    let mut events = Vec::with_capacity(ops.len());

    for (applied, op) in ops.iter().enumerate() {
        match op.apply(state) {
            Ok(event) => events.push(event),
            Err(e) => {
                for done in ops[..applied].iter().rev() {
                    done.revert(state);
                }

                return Err(e);
            }
        }
    }

    Ok(events)
}

/// Revert a whole list of operations, last first.
pub(crate) fn revert_all(ops: &[Operation], state: &mut TraceState) -> Vec<ChangeEvent> {
    ops.iter().rev().map(|op| op.revert(state)).collect()
}
