//! Turning accepted proposals into static mappings

use crate::mapping::{MappingId, ProgramImage, RegionMapProposal};
use crate::memory::Snap;
use crate::trace::{self, Occupant, RegionId, Trace};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Why a single proposal entry could not be committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The mapping would overlap one that already exists.
    #[error("overlaps existing mapping {0}")]
    Overlap(MappingId),

    /// The mapping would overlap the mapping of another entry in the same
    /// commit.
    #[error("overlaps the mapping proposed for region {0}")]
    OverlapsEntry(RegionId),

    /// The region no longer exists, or is not alive at the commit snap.
    #[error("region is no longer alive")]
    StaleRegion,

    /// The block is no longer part of the program image.
    #[error("block is no longer part of the program")]
    StaleBlock,

    /// Anything else the trace refused.
    #[error("{0}")]
    Invalid(trace::Error),
}

/// A proposal entry that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub region: RegionId,
    pub reason: FailureReason,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}: {}", self.region, self.reason)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// Some entries failed validation, so nothing was committed.
    #[error("{} proposal entries could not be mapped", .failures.len())]
    Rejected { failures: Vec<EntryFailure> },

    /// Validation passed but the trace refused the commit, e.g. because
    /// another transaction got there first.
    #[error("commit failed: {0}")]
    Trace(#[from] trace::Error),
}

/// The outcome of a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub created: Vec<MappingId>,
}

impl CommitSummary {
    pub fn count(&self) -> usize {
        self.created.len()
    }
}

/// Persist the accepted entries of a proposal as static mappings.
///
/// Every accepted entry is checked: its region must still be alive at `snap`,
/// its block must still be in `image`, and its mapping may overlap neither an
/// existing mapping nor another entry's. If anything fails, nothing is
/// created and every failure is reported. Otherwise all mappings are created
/// in one transaction, each with the lifespan its region has right now.
///
/// The proposal is only borrowed, so a failed commit leaves it exactly as it
/// was for the user to fix up and retry.
pub fn commit_proposal(
    trace: &Trace,
    proposal: &RegionMapProposal,
    image: &ProgramImage,
    snap: Snap,
) -> Result<CommitSummary, CommitError> {
    let mut tx = trace.start_transaction(&format!("Map regions to {}", proposal.program()));
    let mut failures = Vec::new();
    let mut created = Vec::new();
    let mut entry_owners: HashMap<MappingId, RegionId> = HashMap::new();

    for entry in proposal.accepted() {
        let region_id = entry.region_id();
        let fail = |reason| EntryFailure {
            region: region_id,
            reason,
        };

        let region = match tx.region(region_id) {
            Some(region) if region.is_alive_at(snap) => region,
            _ => {
                failures.push(fail(FailureReason::StaleRegion));
                continue;
            }
        };

        let (block, trace_range) = match (entry.block(), entry.trace_range()) {
            (Some(block), Some(trace_range)) if image.contains(block) => (block, trace_range),
            _ => {
                failures.push(fail(FailureReason::StaleBlock));
                continue;
            }
        };

        match tx.add_mapping(trace_range, region.lifespan(), image.name(), block.start()) {
            Ok(id) => {
                entry_owners.insert(id, region_id);
                created.push(id);
            }
            Err(trace::Error::Overlap {
                existing: Occupant::Mapping(other),
                ..
            }) => {
                let reason = match entry_owners.get(&other) {
                    Some(owner) => FailureReason::OverlapsEntry(*owner),
                    None => FailureReason::Overlap(other),
                };

                failures.push(fail(reason));
            }
            Err(e) => failures.push(fail(FailureReason::Invalid(e))),
        }
    }

    if !failures.is_empty() {
        for failure in failures.iter() {
            warn!("Cannot map {}", failure);
        }

        tx.abort();
        return Err(CommitError::Rejected { failures });
    }

    tx.commit()?;

    info!(
        "Created {} static mappings from {} onto {}",
        created.len(),
        trace.name(),
        proposal.program()
    );

    Ok(CommitSummary { created })
}
