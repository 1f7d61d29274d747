//! Debounced region table model

use crate::memory::{AddressRange, Snap};
use crate::trace::{ChangeEvent, ListenerId, RegionId, Trace, TraceId, TraceListener};
use crate::view::RegionRow;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// Where the model is in its refresh cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebounceState {
    /// The rows reflect the latest committed state.
    Clean,

    /// Something changed and a refresh is owed once things settle.
    Pending,

    /// A refresh is querying the trace right now.
    Refreshing,
}

struct Active {
    trace: Arc<Trace>,
    snap: Snap,
    listener: ListenerId,
}

struct ModelState {
    active: Option<Active>,
    debounce: DebounceState,
    last_change: Option<Instant>,
    rows: Vec<RegionRow>,
    refreshes: u64,

    /// Bumped whenever the active trace or snap changes, so that a refresh
    /// racing with such a change throws its result away.
    generation: u64,
}

impl ModelState {
    fn mark_dirty(&mut self, now: Instant) {
        self.debounce = DebounceState::Pending;
        self.last_change = Some(now);
    }
}

/// Subscribed to the active trace on behalf of a `RegionsModel`.
struct ModelListener {
    model: Weak<Mutex<ModelState>>,
    trace: TraceId,
}

impl TraceListener for ModelListener {
    fn trace_changed(&self, trace: &Trace, changes: &[ChangeEvent]) {
        let touches_regions = changes.iter().any(|c| {
            matches!(
                c,
                ChangeEvent::RegionAdded(_) | ChangeEvent::RegionChanged(_) | ChangeEvent::RegionRemoved(_)
            )
        });

        if !touches_regions || trace.id() != self.trace {
            return;
        }

        if let Some(model) = self.model.upgrade() {
            let mut state = model.lock();
            let is_active = state
                .active
                .as_ref()
                .map_or(false, |a| a.trace.id() == self.trace);

            if is_active {
                state.mark_dirty(Instant::now());
            }
        }
    }
}

/// The rows of a region table for one trace at one snap.
///
/// The model never polls. Change notifications from the active trace only
/// mark it `Pending`; the rows are recomputed by `tick` once `delay` has
/// passed without further changes, or immediately by `flush`. A burst of
/// changes therefore costs a single refresh, and whatever refresh runs last
/// reads the trace's latest committed state.
///
/// Queries made directly against the trace are never delayed by any of this.
pub struct RegionsModel {
    inner: Arc<Mutex<ModelState>>,
    delay: Duration,
}

impl RegionsModel {
    pub fn new(delay: Duration) -> Self {
        RegionsModel {
            inner: Arc::new(Mutex::new(ModelState {
                active: None,
                debounce: DebounceState::Clean,
                last_change: None,
                rows: Vec::new(),
                refreshes: 0,
                generation: 0,
            })),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Show the given trace at the given snap, replacing whatever was shown.
    pub fn activate(&self, trace: Arc<Trace>, snap: Snap) {
        self.deactivate();

        let listener = trace.subscribe(Arc::new(ModelListener {
            model: Arc::downgrade(&self.inner),
            trace: trace.id(),
        }));

        {
            let mut state = self.inner.lock();

            debug!("Region view showing {} at snap {}", trace.name(), snap);

            state.active = Some(Active {
                trace,
                snap,
                listener,
            });
            state.generation += 1;
        }

        self.refresh();
    }

    /// Move to another snap of the active trace.
    pub fn set_snap(&self, snap: Snap) {
        {
            let mut state = self.inner.lock();

            match state.active.as_mut() {
                Some(active) if active.snap != snap => active.snap = snap,
                _ => return,
            }

            state.generation += 1;
        }

        self.refresh();
    }

    /// Stop showing anything. The row set becomes empty immediately.
    pub fn deactivate(&self) {
        let previous = {
            let mut state = self.inner.lock();

            state.generation += 1;
            state.rows.clear();
            state.debounce = DebounceState::Clean;
            state.last_change = None;
            state.active.take()
        };

        if let Some(active) = previous {
            debug!("Region view no longer showing {}", active.trace.name());
            active.trace.unsubscribe(active.listener);
        }
    }

    /// Deactivate if the given trace is the one being shown.
    pub fn trace_closed(&self, trace: TraceId) {
        let is_active = self
            .inner
            .lock()
            .active
            .as_ref()
            .map_or(false, |a| a.trace.id() == trace);

        if is_active {
            self.deactivate();
        }
    }

    pub fn active_trace(&self) -> Option<Arc<Trace>> {
        self.inner.lock().active.as_ref().map(|a| a.trace.clone())
    }

    pub fn current_snap(&self) -> Option<Snap> {
        self.inner.lock().active.as_ref().map(|a| a.snap)
    }

    pub fn state(&self) -> DebounceState {
        self.inner.lock().debounce
    }

    /// How many times the rows have been recomputed.
    pub fn refresh_count(&self) -> u64 {
        self.inner.lock().refreshes
    }

    /// The rows as of the last refresh, lowest address first.
    pub fn rows(&self) -> Vec<RegionRow> {
        self.inner.lock().rows.clone()
    }

    pub fn row_for(&self, region: RegionId) -> Option<RegionRow> {
        self.inner
            .lock()
            .rows
            .iter()
            .find(|r| r.region() == region)
            .cloned()
    }

    /// The rows whose regions intersect an address selection.
    pub fn rows_intersecting(&self, ranges: &[AddressRange]) -> Vec<RegionRow> {
        self.inner
            .lock()
            .rows
            .iter()
            .filter(|r| ranges.iter().any(|range| r.range().intersects(range)))
            .cloned()
            .collect()
    }

    /// Refresh if a change is pending and nothing else has changed for at
    /// least the debounce delay. Returns whether a refresh happened.
    pub fn tick(&self, now: Instant) -> bool {
        let settled = {
            let state = self.inner.lock();

            state.debounce == DebounceState::Pending
                && state
                    .last_change
                    .map_or(true, |t| now.saturating_duration_since(t) >= self.delay)
        };

        settled && self.refresh()
    }

    /// Refresh now if a change is pending, without waiting for the delay.
    pub fn flush(&self) -> bool {
        let pending = self.inner.lock().debounce == DebounceState::Pending;

        pending && self.refresh()
    }

    fn refresh(&self) -> bool {
        let (trace, snap, generation) = {
            let mut state = self.inner.lock();
            let (trace, snap) = match state.active.as_ref() {
                Some(active) => (active.trace.clone(), active.snap),
                None => {
                    state.debounce = DebounceState::Clean;
                    return false;
                }
            };

            state.debounce = DebounceState::Refreshing;
            (trace, snap, state.generation)
        };

        let rows: Vec<RegionRow> = trace
            .regions_at(snap)
            .iter()
            .map(RegionRow::from_region)
            .collect();

        let mut state = self.inner.lock();

        if state.generation != generation {
            return false;
        }

        debug!("Region view refreshed with {} rows", rows.len());

        state.rows = rows;
        state.refreshes += 1;

        // A change that arrived mid-refresh left us Pending again.
        if state.debounce == DebounceState::Refreshing {
            state.debounce = DebounceState::Clean;
            state.last_change = None;
        }

        true
    }
}

impl Drop for RegionsModel {
    fn drop(&mut self) {
        self.deactivate();
    }
}
