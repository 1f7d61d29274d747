use crate::mapping::MappingId;
use crate::memory::{AddressRange, Lifespan, MemoryFlags, StaticAddress};
use crate::trace::listener::net_changes;
use crate::trace::{ChangeEvent, Error, Occupant, RegionId, Trace, TraceListener};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

fn range(min: u64, max: u64) -> AddressRange {
    AddressRange::new(min, max).unwrap()
}

fn rx() -> MemoryFlags {
    MemoryFlags::READ | MemoryFlags::EXECUTE
}

#[derive(Default)]
struct Recorder {
    batches: Mutex<Vec<Vec<ChangeEvent>>>,
}

impl Recorder {
    fn batches(&self) -> Vec<Vec<ChangeEvent>> {
        self.batches.lock().clone()
    }
}

impl TraceListener for Recorder {
    fn trace_changed(&self, _trace: &Trace, changes: &[ChangeEvent]) {
        self.batches.lock().push(changes.to_vec());
    }
}

#[test]
fn create_and_query() {
    let trace = Trace::new("echo");
    let mut tx = trace.start_transaction("Populate");
    let text = tx
        .create_region("Memory[/bin/echo 0x55550000]", range(0x55550000, 0x5555ffff), 0, rx())
        .unwrap();
    let data = tx
        .create_region(
            "Memory[/bin/echo 0x55750000]",
            range(0x55750000, 0x5575ffff),
            0,
            MemoryFlags::READ | MemoryFlags::WRITE,
        )
        .unwrap();
    tx.commit().unwrap();

    assert_eq!(trace.query(0), vec![text, data]);
    assert_eq!(trace.query(100), vec![text, data]);
    assert_eq!(trace.query(-1), vec![]);

    let region = trace.region(text).unwrap();
    assert_eq!(region.name(), "Memory[/bin/echo 0x55550000]");
    assert_eq!(region.range().length(), 0x10000);
    assert_eq!(region.flags(), rx());
    assert_eq!(region.lifespan(), Lifespan::now_on(0));
    assert_eq!(region.trace(), trace.id());
}

#[test]
fn query_orders_by_address() {
    let trace = Trace::new("order");
    let mut tx = trace.start_transaction("Populate");
    let high = tx.create_region("high", range(0x9000, 0x9fff), 0, rx()).unwrap();
    let low = tx.create_region("low", range(0x1000, 0x1fff), 0, rx()).unwrap();
    tx.commit().unwrap();

    assert_eq!(trace.query(0), vec![low, high]);
}

#[test]
fn destroy_closes_lifespan() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("r", range(0x1000, 0x1fff), 1, rx()))
        .unwrap();

    trace
        .transaction("Destroy", |tx| tx.destroy_region(id, 4))
        .unwrap();

    assert_eq!(trace.query(0), vec![]);
    assert_eq!(trace.query(1), vec![id]);
    assert_eq!(trace.query(3), vec![id]);
    assert_eq!(trace.query(4), vec![]);
    assert_eq!(trace.region(id).unwrap().lifespan(), Lifespan::span(1, 4).unwrap());
}

#[test]
fn destroy_twice_fails() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("r", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();

    trace
        .transaction("Destroy", |tx| tx.destroy_region(id, 2))
        .unwrap();

    let result = trace.transaction("Destroy again", |tx| tx.destroy_region(id, 3));

    assert_eq!(result, Err(Error::AlreadyDestroyed(id)));
    assert_eq!(trace.region(id).unwrap().lifespan(), Lifespan::span(0, 2).unwrap());
}

#[test]
fn destroy_before_creation_fails() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("r", range(0x1000, 0x1fff), 5, rx()))
        .unwrap();
    let mut tx = trace.start_transaction("Destroy");

    assert_eq!(
        tx.destroy_region(id, 4),
        Err(Error::InvalidLifespan { start: 5, end: 4 })
    );
    assert_eq!(
        tx.destroy_region(RegionId(999), 4),
        Err(Error::UnknownRegion(RegionId(999)))
    );
    assert!(tx.is_empty());
}

#[test]
fn destroy_at_creation_leaves_empty_lifespan() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("r", range(0x1000, 0x1fff), 3, rx()))
        .unwrap();

    trace
        .transaction("Destroy", |tx| tx.destroy_region(id, 3))
        .unwrap();

    assert!(trace.region(id).unwrap().lifespan().is_empty());
    assert_eq!(trace.query(3), vec![]);
}

#[test]
fn overlap_rejected_while_alive() {
    let trace = Trace::new("echo");
    let first = trace
        .transaction("Create", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();

    let result = trace.transaction("Overlap", |tx| {
        tx.create_region("b", range(0x1800, 0x27ff), 0, rx())
    });

    match result {
        Err(Error::Overlap { existing, .. }) => assert_eq!(existing, Occupant::Region(first)),
        other => panic!("expected overlap, got {:?}", other),
    }

    assert_eq!(trace.query(0), vec![first]);
}

#[test]
fn overlap_allowed_after_destroy() {
    let trace = Trace::new("echo");
    let first = trace
        .transaction("Create", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();

    trace
        .transaction("Destroy", |tx| tx.destroy_region(first, 5))
        .unwrap();

    let early = trace.transaction("Too early", |tx| {
        tx.create_region("b", range(0x1000, 0x1fff), 4, rx())
    });
    assert!(matches!(early, Err(Error::Overlap { .. })));

    let second = trace
        .transaction("Reuse", |tx| tx.create_region("b", range(0x1000, 0x1fff), 5, rx()))
        .unwrap();

    assert_eq!(trace.query(4), vec![first]);
    assert_eq!(trace.query(5), vec![second]);
}

#[test]
fn overlap_within_one_transaction() {
    let trace = Trace::new("echo");
    let mut tx = trace.start_transaction("Populate");

    tx.create_region("a", range(0x1000, 0x1fff), 0, rx()).unwrap();
    assert!(tx.create_region("b", range(0x1fff, 0x2fff), 0, rx()).is_err());
    tx.create_region("c", range(0x2000, 0x2fff), 0, rx()).unwrap();
    tx.commit().unwrap();

    assert_eq!(trace.query(0).len(), 2);
}

#[test]
fn staged_edits_are_private() {
    let trace = Trace::new("echo");
    let mut tx = trace.start_transaction("Populate");
    let id = tx.create_region("a", range(0x1000, 0x1fff), 0, rx()).unwrap();

    assert_eq!(tx.query(0), vec![id]);
    assert!(tx.region(id).is_some());
    assert_eq!(trace.query(0), vec![]);
    assert!(trace.region(id).is_none());

    tx.commit().unwrap();

    assert_eq!(trace.query(0), vec![id]);
}

#[test]
fn abort_discards_creation() {
    let trace = Trace::new("echo");
    let recorder = Arc::new(Recorder::default());
    trace.subscribe(recorder.clone());

    let mut tx = trace.start_transaction("Populate");
    tx.create_region("a", range(0x1000, 0x1fff), 0, rx()).unwrap();
    tx.abort();

    {
        let mut tx = trace.start_transaction("Dropped");
        tx.create_region("b", range(0x2000, 0x2fff), 0, rx()).unwrap();
    }

    assert_eq!(trace.query(0), vec![]);
    assert!(recorder.batches().is_empty());
    assert!(!trace.can_undo());
}

#[test]
fn abort_after_destroy_keeps_region_alive() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();
    let before = trace.region(id).unwrap();

    let mut tx = trace.start_transaction("Destroy");
    tx.destroy_region(id, 1).unwrap();
    assert_eq!(tx.query(1), vec![]);
    assert_eq!(trace.query(1), vec![id]);
    tx.abort();

    assert_eq!(trace.region(id).unwrap(), before);
    assert_eq!(trace.query(1), vec![id]);
}

#[test]
fn failed_closure_aborts() {
    let trace = Trace::new("echo");
    let result: Result<(), Error> = trace.transaction("Fails", |tx| {
        tx.create_region("a", range(0x1000, 0x1fff), 0, rx())?;
        Err(Error::NothingToUndo)
    });

    assert_eq!(result, Err(Error::NothingToUndo));
    assert_eq!(trace.query(0), vec![]);
}

#[test]
fn conflicting_commits() {
    let trace = Trace::new("echo");
    let mut first = trace.start_transaction("First");
    let mut second = trace.start_transaction("Second");

    first.create_region("a", range(0x1000, 0x1fff), 0, rx()).unwrap();
    second.create_region("b", range(0x1800, 0x27ff), 0, rx()).unwrap();

    first.commit().unwrap();
    assert!(matches!(second.commit(), Err(Error::Overlap { .. })));
    assert_eq!(trace.query(0).len(), 1);
}

#[test]
fn concurrent_destroy_detected() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();
    let mut first = trace.start_transaction("First");
    let mut second = trace.start_transaction("Second");

    first.destroy_region(id, 2).unwrap();
    second.destroy_region(id, 3).unwrap();

    first.commit().unwrap();
    assert_eq!(second.commit(), Err(Error::ConcurrentModification(id)));
    assert_eq!(trace.region(id).unwrap().lifespan(), Lifespan::span(0, 2).unwrap());
}

#[test]
fn undo_and_redo() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();

    trace
        .transaction("Destroy", |tx| tx.destroy_region(id, 2))
        .unwrap();

    assert_eq!(trace.undo_description().as_deref(), Some("Destroy"));

    trace.undo().unwrap();
    assert_eq!(trace.region(id).unwrap().lifespan(), Lifespan::now_on(0));
    assert_eq!(trace.redo_description().as_deref(), Some("Destroy"));

    trace.undo().unwrap();
    assert!(trace.region(id).is_none());
    assert_eq!(trace.query(0), vec![]);
    assert_eq!(trace.undo(), Err(Error::NothingToUndo));

    trace.redo().unwrap();
    assert_eq!(trace.query(0), vec![id]);

    trace.redo().unwrap();
    assert_eq!(trace.query(2), vec![]);
    assert_eq!(trace.redo(), Err(Error::NothingToRedo));
}

#[test]
fn new_commit_clears_redo() {
    let trace = Trace::new("echo");

    trace
        .transaction("Create a", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();
    trace.undo().unwrap();
    assert!(trace.can_redo());

    trace
        .transaction("Create b", |tx| tx.create_region("b", range(0x2000, 0x2fff), 0, rx()))
        .unwrap();

    assert!(!trace.can_redo());
    assert_eq!(trace.redo(), Err(Error::NothingToRedo));
}

#[test]
fn undo_limit_forgets_oldest() {
    let trace = Trace::from_state("bounded", Default::default(), 2);

    for i in 0..3u64 {
        let base = 0x1000 * (i + 1);

        trace
            .transaction(&format!("Create {}", i), |tx| {
                tx.create_region("r", range(base, base + 0xfff), 0, rx())
            })
            .unwrap();
    }

    trace.undo().unwrap();
    trace.undo().unwrap();
    assert_eq!(trace.undo(), Err(Error::NothingToUndo));
    assert_eq!(trace.query(0).len(), 1);
}

#[test]
fn undo_reverts_mappings() {
    let trace = Trace::new("echo");
    let mapping = trace
        .transaction("Map", |tx| {
            tx.add_mapping(
                range(0x55550000, 0x555500ff),
                Lifespan::now_on(0),
                "echo",
                StaticAddress::new("ram", 0x00400000),
            )
        })
        .unwrap();

    assert!(trace.mapping(mapping).is_some());

    trace.undo().unwrap();
    assert!(trace.mappings().is_empty());

    trace.redo().unwrap();
    assert_eq!(trace.mappings().len(), 1);
}

#[test]
fn mapping_overlap_rejected() {
    let trace = Trace::new("echo");
    let first = trace
        .transaction("Map", |tx| {
            tx.add_mapping(
                range(0x1000, 0x10ff),
                Lifespan::now_on(0),
                "echo",
                StaticAddress::new("ram", 0x00400000),
            )
        })
        .unwrap();

    let same_static = trace.transaction("Again", |tx| {
        tx.add_mapping(
            range(0x8000, 0x80ff),
            Lifespan::now_on(0),
            "echo",
            StaticAddress::new("ram", 0x00400080),
        )
    });

    match same_static {
        Err(Error::Overlap { existing, .. }) => assert_eq!(existing, Occupant::Mapping(first)),
        other => panic!("expected overlap, got {:?}", other),
    }

    trace
        .transaction("Elsewhere", |tx| {
            tx.add_mapping(
                range(0x8000, 0x80ff),
                Lifespan::now_on(0),
                "libc.so.6",
                StaticAddress::new("ram", 0x00400080),
            )
        })
        .unwrap();

    assert_eq!(trace.mappings().len(), 2);
}

#[test]
fn listeners_hear_net_changes_once_per_commit() {
    let trace = Trace::new("echo");
    let recorder = Arc::new(Recorder::default());
    let listener = trace.subscribe(recorder.clone());

    let mut tx = trace.start_transaction("Populate");
    let a = tx.create_region("a", range(0x1000, 0x1fff), 0, rx()).unwrap();
    let b = tx.create_region("b", range(0x2000, 0x2fff), 0, rx()).unwrap();
    tx.destroy_region(b, 3).unwrap();
    tx.commit().unwrap();

    assert_eq!(
        recorder.batches(),
        vec![vec![ChangeEvent::RegionAdded(a), ChangeEvent::RegionAdded(b)]]
    );

    trace.undo().unwrap();
    assert_eq!(recorder.batches().len(), 2);
    assert_eq!(
        recorder.batches()[1],
        vec![ChangeEvent::RegionRemoved(b), ChangeEvent::RegionRemoved(a)]
    );

    trace.unsubscribe(listener);
    trace.redo().unwrap();
    assert_eq!(recorder.batches().len(), 2);
}

#[test]
fn empty_commit_is_silent() {
    let trace = Trace::new("echo");
    let recorder = Arc::new(Recorder::default());
    trace.subscribe(recorder.clone());

    trace.start_transaction("Nothing").commit().unwrap();

    assert!(recorder.batches().is_empty());
    assert!(!trace.can_undo());
}

#[test]
fn net_change_collapsing() {
    let r1 = RegionId(1);
    let r2 = RegionId(2);
    let m1 = MappingId::from(1u64);

    assert_eq!(
        net_changes(&[
            ChangeEvent::RegionAdded(r1),
            ChangeEvent::RegionChanged(r1),
            ChangeEvent::RegionAdded(r2),
            ChangeEvent::RegionRemoved(r2),
        ]),
        vec![ChangeEvent::RegionAdded(r1)]
    );

    assert_eq!(
        net_changes(&[ChangeEvent::RegionRemoved(r1), ChangeEvent::RegionAdded(r1)]),
        vec![ChangeEvent::RegionChanged(r1)]
    );

    assert_eq!(
        net_changes(&[ChangeEvent::MappingAdded(m1), ChangeEvent::MappingRemoved(m1)]),
        vec![]
    );

    assert_eq!(
        net_changes(&[ChangeEvent::MappingRemoved(m1)]),
        vec![ChangeEvent::MappingRemoved(m1)]
    );
}

#[test]
fn snapshot_survives_reload() {
    let trace = Trace::new("echo");
    let id = trace
        .transaction("Create", |tx| tx.create_region("a", range(0x1000, 0x1fff), 0, rx()))
        .unwrap();

    let reloaded = Trace::from_state("echo", trace.snapshot(), 10);

    assert_eq!(reloaded.query(0), vec![id]);
    assert_eq!(reloaded.region(id).unwrap().trace(), reloaded.id());
    assert!(!reloaded.can_undo());

    let next = reloaded
        .transaction("Create", |tx| tx.create_region("b", range(0x2000, 0x2fff), 0, rx()))
        .unwrap();
    assert!(next > id);
}

proptest! {
    #[test]
    fn lifecycle_matches_model(spans in prop::collection::vec((0i64..10, prop::option::of(0i64..10)), 1..12)) {
        let trace = Trace::new("lifecycle");
        let mut expected = Vec::new();

        for (i, (start, extra)) in spans.iter().enumerate() {
            let base = 0x1000 * (i as u64 + 1);
            let id = trace
                .transaction("Create", |tx| tx.create_region("r", range(base, base + 0xfff), *start, rx()))
                .unwrap();
            let end = extra.map(|e| start + e);

            if let Some(end) = end {
                trace.transaction("Destroy", |tx| tx.destroy_region(id, end)).unwrap();
            }

            expected.push((id, *start, end));
        }

        for snap in -1..25 {
            let alive: Vec<RegionId> = expected
                .iter()
                .filter(|(_, start, end)| *start <= snap && end.map_or(true, |e| snap < e))
                .map(|(id, _, _)| *id)
                .collect();

            prop_assert_eq!(trace.query(snap), alive);
        }
    }

    #[test]
    fn undo_redo_round_trip(count in 1usize..8, undone in 0usize..8) {
        let undone = undone.min(count);
        let trace = Trace::new("history");
        let mut after = Vec::new();

        for i in 0..count {
            let base = 0x1000 * (i as u64 + 1);

            trace
                .transaction("Create", |tx| tx.create_region("r", range(base, base + 0xfff), 0, rx()))
                .unwrap();
            after.push(trace.query(0));
        }

        for _ in 0..undone {
            trace.undo().unwrap();
        }

        let expected = if undone == count { Vec::new() } else { after[count - undone - 1].clone() };
        prop_assert_eq!(trace.query(0), expected);

        for _ in 0..undone {
            trace.redo().unwrap();
        }

        prop_assert_eq!(trace.query(0), after[count - 1].clone());
    }
}
