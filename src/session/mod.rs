//! Entire-session context - The set of open traces, which one is active, and
//! the region view that follows it.

use crate::database::TraceDatabase;
use crate::memory::Snap;
use crate::project::{Project, Settings};
use crate::trace::Trace;
use crate::view::RegionsModel;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Opens, activates, and closes traces on behalf of a session.
///
/// At most one trace is active at a time. Activation, snap changes,
/// deactivation and closing are all forwarded to the region view, so that it
/// always shows the active trace at the active snap, or nothing at all.
pub struct TraceManager {
    /// All open traces, keyed by name.
    traces: BTreeMap<String, Arc<Trace>>,

    /// The name of the active trace.
    current: Option<String>,

    regions: RegionsModel,
    undo_limit: usize,
}

impl TraceManager {
    pub fn new(settings: &Settings) -> Self {
        TraceManager {
            traces: BTreeMap::new(),
            current: None,
            regions: RegionsModel::new(settings.debounce()),
            undo_limit: settings.undo_limit(),
        }
    }

    /// The region view driven by this manager.
    pub fn regions(&self) -> &RegionsModel {
        &self.regions
    }

    pub fn undo_limit(&self) -> usize {
        self.undo_limit
    }

    /// Add an already-constructed trace to the session.
    ///
    /// If a trace of the same name is already open, that one is kept and
    /// returned instead.
    pub fn open_trace(&mut self, trace: Arc<Trace>) -> Arc<Trace> {
        if let Some(existing) = self.traces.get(trace.name()) {
            if !Arc::ptr_eq(existing, &trace) {
                warn!("Trace {} is already open", trace.name());
            }

            return existing.clone();
        }

        debug!("Opened trace {}", trace.name());

        self.traces.insert(trace.name().to_string(), trace.clone());
        trace
    }

    /// Open a trace listed in the project, loading it from its database.
    pub fn open_from_project(&mut self, project: &Project, name: &str) -> io::Result<Arc<Trace>> {
        if let Some(existing) = self.traces.get(name) {
            return Ok(existing.clone());
        }

        let config = project.trace(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Trace {} does not exist", name),
            )
        })?;
        let trace = TraceDatabase::open(project.database_path(config), name, self.undo_limit)?;

        Ok(self.open_trace(Arc::new(trace)))
    }

    /// Write an open trace back to the database the project lists for it.
    pub fn save_trace(&self, project: &Project, name: &str) -> io::Result<()> {
        let trace = self.trace(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Trace {} is not open", name),
            )
        })?;
        let config = project.trace(name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Trace {} does not exist", name),
            )
        })?;

        Ok(TraceDatabase::save(&trace, project.database_path(config))?)
    }

    pub fn trace(&self, name: &str) -> Option<Arc<Trace>> {
        self.traces.get(name).cloned()
    }

    pub fn iter_traces(&self) -> impl Iterator<Item = &Arc<Trace>> {
        self.traces.values()
    }

    /// Make an open trace the active one, at the given snap.
    ///
    /// Yields `false` if no trace of that name is open.
    pub fn activate(&mut self, name: &str, snap: Snap) -> bool {
        let trace = match self.traces.get(name) {
            Some(trace) => trace.clone(),
            None => return false,
        };

        info!("Activating trace {} at snap {}", name, snap);

        self.current = Some(name.to_string());
        self.regions.activate(trace, snap);

        true
    }

    /// Move the active trace to another snap.
    pub fn activate_snap(&mut self, snap: Snap) {
        if self.current.is_some() {
            self.regions.set_snap(snap);
        }
    }

    pub fn deactivate(&mut self) {
        if let Some(name) = self.current.take() {
            debug!("Deactivating trace {}", name);
        }

        self.regions.deactivate();
    }

    /// Remove a trace from the session, deactivating it first if needed.
    pub fn close_trace(&mut self, name: &str) -> Option<Arc<Trace>> {
        let trace = self.traces.remove(name)?;

        if self.current.as_deref() == Some(name) {
            self.current = None;
        }

        self.regions.trace_closed(trace.id());

        debug!("Closed trace {}", name);

        Some(trace)
    }

    pub fn current_trace(&self) -> Option<Arc<Trace>> {
        self.current.as_deref().and_then(|name| self.trace(name))
    }

    pub fn current_snap(&self) -> Option<Snap> {
        self.regions.current_snap()
    }
}
