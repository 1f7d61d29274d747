//! Trace database - Persists the committed regions and static mappings of a
//! trace between sessions.

mod error;
mod tracedb;


pub use error::{Error, Result};
pub use tracedb::TraceDatabase;
