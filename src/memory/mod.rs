//! A set of types which model address ranges, permissions, and time.
//!
//! Everything in here is plain data: the types are shared by the region
//! store, the mapping table, and the proposal engine, and none of them know
//! which trace or program they belong to.

mod address;
mod flags;
mod lifespan;
mod range;

pub use address::StaticAddress;
pub use flags::MemoryFlags;
pub use lifespan::{Lifespan, Snap};
pub use range::AddressRange;

#[cfg(test)]
mod tests;
