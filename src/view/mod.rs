//! Region view model - A debounced, GUI-agnostic projection of the regions of
//! the active trace at the current snap.

mod model;
mod row;

pub use model::{DebounceState, RegionsModel};
pub use row::{select_addresses, RegionRow};
