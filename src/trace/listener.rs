//! Change notification

use crate::mapping::MappingId;
use crate::trace::{RegionId, Trace};
use std::collections::HashMap;

/// A net change to a trace's committed state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    RegionAdded(RegionId),

    /// The region's lifespan changed (e.g. it was destroyed, or its
    /// destruction was undone).
    RegionChanged(RegionId),

    /// The region no longer exists at all. Only undo physically removes
    /// regions.
    RegionRemoved(RegionId),

    MappingAdded(MappingId),
    MappingRemoved(MappingId),
}

/// Handle returned by `Trace::subscribe`, used to unsubscribe later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Something interested in changes to a trace.
///
/// Listeners are called once per commit, undo, or redo, after the trace's
/// locks have been released, so they are free to query the trace. They are
/// never called for aborted transactions.
pub trait TraceListener: Send + Sync {
    fn trace_changed(&self, trace: &Trace, changes: &[ChangeEvent]);
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Net {
    Added,
    Changed,
    Removed,
    Vanished,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
enum Subject {
    Region(RegionId),
    Mapping(MappingId),
}

/// Collapse a sequence of raw changes into the net change per object.
///
/// Something added and then removed within the same batch never existed as
/// far as observers are concerned; something added and then changed is
/// simply added. Output preserves the order in which each object first
/// appeared.
pub(crate) fn net_changes(raw: &[ChangeEvent]) -> Vec<ChangeEvent> {
    let mut order = Vec::new();
    let mut net: HashMap<Subject, Net> = HashMap::new();

    for event in raw {
        let (subject, incoming) = match *event {
            ChangeEvent::RegionAdded(id) => (Subject::Region(id), Net::Added),
            ChangeEvent::RegionChanged(id) => (Subject::Region(id), Net::Changed),
            ChangeEvent::RegionRemoved(id) => (Subject::Region(id), Net::Removed),
            ChangeEvent::MappingAdded(id) => (Subject::Mapping(id), Net::Added),
            ChangeEvent::MappingRemoved(id) => (Subject::Mapping(id), Net::Removed),
        };

        let merged = match (net.get(&subject).copied(), incoming) {
            (None, incoming) => {
                order.push(subject);
                incoming
            }
            (Some(Net::Added), Net::Removed) => Net::Vanished,
            (Some(Net::Added), _) => Net::Added,
            (Some(Net::Vanished), Net::Added) => Net::Added,
            (Some(Net::Vanished), _) => Net::Vanished,
            (Some(Net::Removed), Net::Added) => Net::Changed,
            (Some(_), incoming) => incoming,
        };

        net.insert(subject, merged);
    }

    order
        .into_iter()
        .filter_map(|subject| match (subject, net.get(&subject).copied()?) {
            (_, Net::Vanished) => None,
            (Subject::Region(id), Net::Added) => Some(ChangeEvent::RegionAdded(id)),
            (Subject::Region(id), Net::Changed) => Some(ChangeEvent::RegionChanged(id)),
            (Subject::Region(id), Net::Removed) => Some(ChangeEvent::RegionRemoved(id)),
            (Subject::Mapping(id), Net::Removed) => Some(ChangeEvent::MappingRemoved(id)),
            (Subject::Mapping(id), _) => Some(ChangeEvent::MappingAdded(id)),
        })
        .collect()
}
