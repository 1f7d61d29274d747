//! CLI commands

mod common;
mod main;
mod mapping;
mod regions;


pub use common::{parse_address, parse_region_id, Command, Context};
pub use main::main;
pub use mapping::{map, mappings, propose};
pub use regions::{add_region, destroy_region, regions};
