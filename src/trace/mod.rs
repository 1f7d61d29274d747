//! Trace region store - Time-bounded memory regions observed while a
//! program runs, plus the static mappings committed against them.
//!
//! All mutation goes through a `Transaction`. Committed transactions are
//! recorded as composite reversible commands so that they can be undone and
//! redone, and every commit, undo, or redo is announced to subscribers as a
//! single batch of net changes.

mod error;
mod history;
mod listener;
mod operation;
mod region;
mod state;
mod store;
mod transaction;

pub use error::{Error, Occupant, Result};
pub use history::DEFAULT_UNDO_LIMIT;
pub use listener::{ChangeEvent, ListenerId, TraceListener};
pub use region::{RegionId, TraceId, TraceRegion};
pub use state::TraceState;
pub use store::Trace;
pub use transaction::Transaction;

#[cfg(test)]
mod tests;
