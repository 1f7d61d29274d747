//! Static mappings - Correspondences between trace regions and the blocks of
//! a statically analyzed program image.

mod catalog;
mod commit;
mod module_key;
mod proposal;
mod static_mapping;

pub use catalog::{ProgramImage, StaticBlock};
pub use commit::{commit_proposal, CommitError, CommitSummary, EntryFailure, FailureReason};
pub use module_key::{module_key, ModuleKey};
pub use proposal::{
    is_map_action_enabled, propose, propose_best, regions_for, ProposalScore, RegionMapEntry,
    RegionMapProposal,
};
pub use static_mapping::{MappingId, StaticMapping};
