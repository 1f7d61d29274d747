//! The trace itself

use crate::mapping::{MappingId, StaticMapping};
use crate::memory::{AddressRange, Snap};
use crate::trace::history::{Command, History, DEFAULT_UNDO_LIMIT};
use crate::trace::listener::net_changes;
use crate::trace::operation::{apply_all, revert_all, Operation};
use crate::trace::{
    ChangeEvent, Error, ListenerId, RegionId, Result, TraceId, TraceListener, TraceRegion,
    TraceState, Transaction,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

static NEXT_TRACE_ID: AtomicU64 = AtomicU64::new(1);

/// A recorded execution session: its regions, its static mappings, and the
/// history of transactions that produced them.
///
/// A `Trace` is meant to be shared behind an `Arc`. Readers may query it at
/// any time; they always see the state as of some commit, undo, or redo,
/// and never a transaction in progress.
pub struct Trace {
    id: TraceId,
    name: String,

    state: RwLock<TraceState>,

    /// Always locked before `state` when both are needed.
    history: Mutex<History>,

    listeners: Mutex<Vec<(ListenerId, Arc<dyn TraceListener>)>>,

    next_region: AtomicU64,
    next_mapping: AtomicU64,
    next_listener: AtomicU64,
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl Trace {
    /// Create an empty trace.
    pub fn new(name: &str) -> Self {
        Self::from_state(name, TraceState::new(), DEFAULT_UNDO_LIMIT)
    }

    /// Create a trace from previously committed state, e.g. one loaded from
    /// disk. The new trace has no undo history.
    pub fn from_state(name: &str, mut state: TraceState, undo_limit: usize) -> Self {
        let id = TraceId(NEXT_TRACE_ID.fetch_add(1, Ordering::Relaxed));
        let ids: Vec<RegionId> = state.regions().map(|r| r.id()).collect();

        for region_id in ids {
            if let Some(region) = state.region_mut(region_id) {
                region.set_trace(id);
            }
        }

        let (next_region, next_mapping) = state.next_ids();

        Trace {
            id,
            name: name.to_string(),
            state: RwLock::new(state),
            history: Mutex::new(History::new(undo_limit)),
            listeners: Mutex::new(Vec::new()),
            next_region: AtomicU64::new(next_region),
            next_mapping: AtomicU64::new(next_mapping),
            next_listener: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> TraceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, TraceState> {
        self.state.read()
    }

    pub(crate) fn allocate_region_id(&self) -> Result<RegionId> {
        allocate_id(&self.next_region)
            .map(RegionId)
            .ok_or(Error::IdsExhausted("region"))
    }

    pub(crate) fn allocate_mapping_id(&self) -> Result<MappingId> {
        allocate_id(&self.next_mapping)
            .map(MappingId::from)
            .ok_or(Error::IdsExhausted("mapping"))
    }

    /// Copy out the committed state, e.g. for saving.
    pub fn snapshot(&self) -> TraceState {
        self.state.read().clone()
    }

    /// Begin a transaction. Dropping it without calling `commit` aborts it.
    pub fn start_transaction(&self, description: &str) -> Transaction<'_> {
        Transaction::new(self, description)
    }

    /// Run `body` inside a transaction, committing if it succeeds and
    /// aborting if it fails.
    pub fn transaction<R, E, F>(&self, description: &str, body: F) -> std::result::Result<R, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> std::result::Result<R, E>,
        E: From<Error>,
    {
        let mut tx = self.start_transaction(description);
        let result = body(&mut tx)?;

        tx.commit()?;

        Ok(result)
    }

    pub(crate) fn commit_operations(&self, description: String, ops: Vec<Operation>) -> Result<()> {
        if ops.is_empty() {
            debug!("Transaction {:?} committed with no edits", description);
            return Ok(());
        }

        let events = {
            let mut history = self.history.lock();
            let mut state = self.state.write();
            let events = apply_all(&ops, &mut state)?;

            info!("Committed {:?} ({} edits) to {}", description, ops.len(), self.name);
            history.record(Command { description, ops });

            events
        };

        self.notify(&events);

        Ok(())
    }

    /// Revert the most recently committed (or redone) transaction.
    pub fn undo(&self) -> Result<()> {
        let events = {
            let mut history = self.history.lock();
            let command = history.take_undo().ok_or(Error::NothingToUndo)?;
            let mut state = self.state.write();
            let events = revert_all(&command.ops, &mut state);

            info!("Undid {:?} on {}", command.description, self.name);
            history.push_redo(command);

            events
        };

        self.notify(&events);

        Ok(())
    }

    /// Reapply the most recently undone transaction.
    pub fn redo(&self) -> Result<()> {
        let events = {
            let mut history = self.history.lock();
            let command = history.take_redo().ok_or(Error::NothingToRedo)?;
            let mut state = self.state.write();

            match apply_all(&command.ops, &mut state) {
                Ok(events) => {
                    info!("Redid {:?} on {}", command.description, self.name);
                    history.push_undo(command);
                    events
                }
                Err(e) => {
                    history.push_redo(command);
                    return Err(e);
                }
            }
        };

        self.notify(&events);

        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().undo_description().is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().redo_description().is_some()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.lock().undo_description().map(|s| s.to_string())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.lock().redo_description().map(|s| s.to_string())
    }

    /// Forget all undo and redo history.
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    /// List every region alive at the given snap, lowest address first.
    pub fn query(&self, snap: Snap) -> Vec<RegionId> {
        self.state.read().query(snap)
    }

    pub fn region(&self, id: RegionId) -> Option<TraceRegion> {
        self.state.read().region(id).cloned()
    }

    /// Like `query`, but yields the regions themselves.
    pub fn regions_at(&self, snap: Snap) -> Vec<TraceRegion> {
        let state = self.state.read();

        state
            .query(snap)
            .into_iter()
            .filter_map(|id| state.region(id).cloned())
            .collect()
    }

    /// List the regions alive at the given snap which intersect any of the
    /// given address ranges.
    pub fn regions_intersecting(&self, snap: Snap, ranges: &[AddressRange]) -> Vec<TraceRegion> {
        self.regions_at(snap)
            .into_iter()
            .filter(|r| ranges.iter().any(|range| r.range().intersects(range)))
            .collect()
    }

    pub fn mapping(&self, id: MappingId) -> Option<StaticMapping> {
        self.state.read().mapping(id).cloned()
    }

    /// List every static mapping in the order they were created.
    pub fn mappings(&self) -> Vec<StaticMapping> {
        self.state.read().mappings().cloned().collect()
    }

    pub fn subscribe(&self, listener: Arc<dyn TraceListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));

        self.listeners.lock().push((id, listener));

        id
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    fn notify(&self, raw: &[ChangeEvent]) {
        let changes = net_changes(raw);

        if changes.is_empty() {
            return;
        }

        let listeners: Vec<Arc<dyn TraceListener>> =
            self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();

        debug!("Notifying {} listeners of {} changes", listeners.len(), changes.len());

        for listener in listeners {
            listener.trace_changed(self, &changes);
        }
    }
}

/// Take the next id from a counter. The counter stops at `u64::MAX` instead
/// of wrapping, so ids are never reused.
fn allocate_id(counter: &AtomicU64) -> Option<u64> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        .ok()
}
