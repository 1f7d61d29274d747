//! Region-to-block mapping proposals
//!
//! A proposal pairs each selected trace region with at most one block of a
//! program image. Regions are attributed to modules by name (see
//! `module_key`), and within a module they are paired with blocks by address
//! rank: the lowest region gets the lowest block, and so on. Absolute
//! addresses are never compared, since trace and static address spaces have
//! nothing to do with each other.

use crate::mapping::{module_key, ModuleKey, ProgramImage, StaticBlock};
use crate::memory::{AddressRange, Snap, StaticAddress};
use crate::trace::{RegionId, Trace, TraceRegion};
use rayon::prelude::*;
use std::cmp::min;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// How well a module's name matches a program image, worst first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum NameMatch {
    None,

    /// The image name and file name agree up to their first dot.
    Stem,

    /// The image is named exactly after the file.
    Image,

    /// Some of the image's block names contain the file name.
    Block,
}

impl NameMatch {
    fn weight(self) -> u32 {
        match self {
            NameMatch::None => 0,
            NameMatch::Stem => 1,
            NameMatch::Image => 2,
            NameMatch::Block => 3,
        }
    }
}

fn stem_of(name: &str) -> &str {
    match name.find('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Work out which blocks of an image could belong to a module, and how good
/// a match that is.
fn eligible_blocks(key: &ModuleKey, image: &ProgramImage) -> (NameMatch, Vec<usize>) {
    let basename = key.basename().to_ascii_lowercase();
    let named: Vec<usize> = image
        .blocks()
        .iter()
        .enumerate()
        .filter(|(_, b)| b.name().to_ascii_lowercase().contains(&basename))
        .map(|(i, _)| i)
        .collect();

    if !named.is_empty() {
        return (NameMatch::Block, named);
    }

    let image_name = image.name().to_ascii_lowercase();
    let name_match = if image_name == basename {
        NameMatch::Image
    } else if stem_of(&image_name) == key.stem().to_ascii_lowercase() {
        NameMatch::Stem
    } else {
        NameMatch::None
    };

    match name_match {
        NameMatch::None => (NameMatch::None, Vec::new()),
        m => (m, (0..image.blocks().len()).collect()),
    }
}

/// Regions that share a module path.
struct ModuleGroup<'r> {
    path: String,
    name_match: NameMatch,
    eligible: Vec<usize>,
    members: Vec<&'r TraceRegion>,
}

impl<'r> ModuleGroup<'r> {
    fn lowest_address(&self) -> u64 {
        self.members.first().map_or(0, |r| r.range().min())
    }
}

/// Ranks proposals against each other. Compares by paired entries first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalScore {
    /// How many regions received a candidate block.
    pub paired: usize,

    /// Sum of the name match quality of every pairing.
    pub similarity: u32,
}

/// One region of a proposal and the block it would be mapped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionMapEntry {
    region: TraceRegion,
    block: Option<StaticBlock>,
    selected: bool,
}

impl RegionMapEntry {
    fn new(region: TraceRegion, block: Option<StaticBlock>) -> Self {
        let selected = block.is_some();

        RegionMapEntry {
            region,
            block,
            selected,
        }
    }

    /// The region as it was when the proposal was made.
    pub fn region(&self) -> &TraceRegion {
        &self.region
    }

    pub fn region_id(&self) -> RegionId {
        self.region.id()
    }

    pub fn block(&self) -> Option<&StaticBlock> {
        self.block.as_ref()
    }

    /// Whether this entry will be committed. Entries without a block are
    /// never selected.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The number of bytes the resulting mapping would cover: as much of the
    /// region as fits in the block.
    pub fn mapping_length(&self) -> Option<u64> {
        self.block
            .as_ref()
            .map(|b| min(self.region.range().length(), b.length()))
    }

    /// The trace side of the resulting mapping.
    pub fn trace_range(&self) -> Option<AddressRange> {
        AddressRange::from_start_length(self.region.range().min(), self.mapping_length()?)
    }

    /// The start of the static side of the resulting mapping.
    pub fn static_address(&self) -> Option<StaticAddress> {
        self.block.as_ref().map(|b| b.start())
    }
}

/// A tentative, editable pairing of regions to the blocks of one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionMapProposal {
    program: String,
    entries: Vec<RegionMapEntry>,
    score: ProposalScore,
}

impl RegionMapProposal {
    /// Name of the program image the blocks come from.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Entries sorted by region name, then address.
    pub fn entries(&self) -> &[RegionMapEntry] {
        &self.entries
    }

    /// The index of the entry for the given region, if it has one.
    pub fn index_of(&self, region: RegionId) -> Option<usize> {
        self.entries.iter().position(|e| e.region_id() == region)
    }

    pub fn entry(&self, index: usize) -> Option<&RegionMapEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The score the proposal was computed with. Not updated by edits.
    pub fn score(&self) -> ProposalScore {
        self.score
    }

    /// The entries that would be committed: selected ones with a block.
    pub fn accepted(&self) -> impl Iterator<Item = &RegionMapEntry> {
        self.entries
            .iter()
            .filter(|e| e.selected && e.block.is_some())
    }

    /// Reassign an entry's candidate block, or clear it with `None`.
    ///
    /// A block may only be held by one entry. If another entry already holds
    /// the requested block, that entry loses it and is deselected; its index
    /// is returned so the caller can tell the user. The reassigned entry is
    /// selected exactly when it has a block.
    pub fn set_block(&mut self, index: usize, block: Option<StaticBlock>) -> Option<usize> {
        if index >= self.entries.len() {
            return None;
        }

        let displaced = block.as_ref().and_then(|wanted| {
            self.entries
                .iter()
                .enumerate()
                .position(|(i, e)| i != index && e.block.as_ref() == Some(wanted))
        });

        if let Some(other) = displaced {
            debug!(
                "Block taken from region {} for region {}",
                self.entries[other].region_id(),
                self.entries[index].region_id()
            );

            self.entries[other].block = None;
            self.entries[other].selected = false;
        }

        let entry = &mut self.entries[index];
        entry.selected = block.is_some();
        entry.block = block;

        displaced
    }

    /// Include or exclude an entry from the commit.
    pub fn set_selected(&mut self, index: usize, selected: bool) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.selected = selected && entry.block.is_some();
        }
    }
}

/// Resolve a selection of region ids, skipping any that no longer exist.
pub fn regions_for(trace: &Trace, selection: &[RegionId]) -> Vec<TraceRegion> {
    selection.iter().filter_map(|id| trace.region(*id)).collect()
}

/// Propose a block for each region from the given image.
///
/// This never fails: a region that cannot be attributed to a module, whose
/// module does not match the image, or for which no block is left over gets
/// an entry without a block. Identical inputs always produce identical
/// proposals.
pub fn propose(regions: &[TraceRegion], image: &ProgramImage) -> RegionMapProposal {
    let mut seen = BTreeSet::new();
    let regions: Vec<&TraceRegion> = regions.iter().filter(|r| seen.insert(r.id())).collect();

    let mut groups: Vec<ModuleGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for region in regions.iter() {
        let key = match module_key(region.name()) {
            Some(key) => key,
            None => {
                debug!("Region {} {:?} names no module", region.id(), region.name());
                continue;
            }
        };

        let index = *group_index.entry(key.path().to_string()).or_insert_with(|| {
            let (name_match, eligible) = eligible_blocks(&key, image);

            groups.push(ModuleGroup {
                path: key.path().to_string(),
                name_match,
                eligible,
                members: Vec::new(),
            });

            groups.len() - 1
        });

        groups[index].members.push(*region);
    }

    for group in groups.iter_mut() {
        group.members.sort_by_key(|r| (r.range().min(), r.id()));
    }

    groups.sort_by(|a, b| {
        b.name_match
            .cmp(&a.name_match)
            .then_with(|| a.lowest_address().cmp(&b.lowest_address()))
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut taken = vec![false; image.blocks().len()];
    let mut assigned: HashMap<RegionId, (usize, NameMatch)> = HashMap::new();

    for group in groups.iter().filter(|g| g.name_match != NameMatch::None) {
        let mut available: Vec<usize> = group.eligible.iter().copied().filter(|i| !taken[*i]).collect();

        available.sort_by_key(|i| image.blocks()[*i].range().min());

        if available.len() < group.members.len() {
            debug!(
                "Module {} has {} regions but only {} blocks remain in {}",
                group.path,
                group.members.len(),
                available.len(),
                image.name()
            );
        }

        for (region, block) in group.members.iter().zip(available) {
            taken[block] = true;
            assigned.insert(region.id(), (block, group.name_match));
        }
    }

    let mut entries: Vec<RegionMapEntry> = regions
        .iter()
        .map(|r| {
            let block = assigned.get(&r.id()).map(|(i, _)| image.blocks()[*i].clone());

            RegionMapEntry::new((*r).clone(), block)
        })
        .collect();

    entries.sort_by(|a, b| {
        a.region
            .name()
            .cmp(b.region.name())
            .then_with(|| a.region.range().min().cmp(&b.region.range().min()))
            .then_with(|| a.region.id().cmp(&b.region.id()))
    });

    let score = ProposalScore {
        paired: assigned.len(),
        similarity: assigned.values().map(|(_, m)| m.weight()).sum(),
    };

    debug!(
        "Proposed {} of {} regions onto {}",
        score.paired,
        entries.len(),
        image.name()
    );

    RegionMapProposal {
        program: image.name().to_string(),
        entries,
        score,
    }
}

/// Propose against several images at once and keep the best proposal.
///
/// Yields `None` if no image can take any of the regions. Equally good
/// proposals are resolved in favor of the image listed first.
pub fn propose_best(regions: &[TraceRegion], images: &[ProgramImage]) -> Option<RegionMapProposal> {
    let proposals: Vec<RegionMapProposal> = images.par_iter().map(|image| propose(regions, image)).collect();
    let mut best: Option<RegionMapProposal> = None;

    for proposal in proposals {
        if proposal.score.paired == 0 {
            continue;
        }

        match &best {
            Some(current) if current.score >= proposal.score => {}
            _ => best = Some(proposal),
        }
    }

    best
}

/// Determine if mapping the selected regions onto an image makes sense:
/// at least one selected region must be alive at `snap` and belong to a
/// module with a block in the image.
pub fn is_map_action_enabled(
    trace: &Trace,
    selection: &[RegionId],
    snap: Snap,
    image: &ProgramImage,
) -> bool {
    selection
        .iter()
        .filter_map(|id| trace.region(*id))
        .filter(|region| region.is_alive_at(snap))
        .any(|region| match module_key(region.name()) {
            Some(key) => !eligible_blocks(&key, image).1.is_empty(),
            None => false,
        })
}
