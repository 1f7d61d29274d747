//! Static block catalogs of program images

use crate::memory::{AddressRange, StaticAddress};

/// A named range of addresses in a program image's static address space.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StaticBlock {
    name: String,
    space: String,
    range: AddressRange,
}

impl StaticBlock {
    /// Construct a block of `length` bytes starting at `start`.
    ///
    /// Yields `None` for empty blocks or blocks that run off the end of the
    /// address space.
    pub fn new(name: &str, start: StaticAddress, length: u64) -> Option<Self> {
        let range = AddressRange::from_start_length(start.offset(), length)?;

        Some(StaticBlock {
            name: name.to_string(),
            space: start.space().to_string(),
            range,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> StaticAddress {
        StaticAddress::new(&self.space, self.range.min())
    }

    pub fn range(&self) -> AddressRange {
        self.range
    }

    pub fn length(&self) -> u64 {
        self.range.length()
    }
}

/// The block catalog of one statically analyzed program image.
///
/// Block order is significant: it is the catalog iteration order that breaks
/// ties between otherwise equally good candidates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramImage {
    name: String,
    blocks: Vec<StaticBlock>,
}

impl ProgramImage {
    pub fn new(name: &str) -> Self {
        ProgramImage {
            name: name.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn with_blocks(name: &str, blocks: Vec<StaticBlock>) -> Self {
        ProgramImage {
            name: name.to_string(),
            blocks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_block(&mut self, block: StaticBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[StaticBlock] {
        &self.blocks
    }

    /// Find a block by name.
    pub fn block_named(&self, name: &str) -> Option<&StaticBlock> {
        self.blocks.iter().find(|b| b.name() == name)
    }

    /// Determine if this exact block is still part of the catalog.
    pub fn contains(&self, block: &StaticBlock) -> bool {
        self.blocks.iter().any(|b| b == block)
    }
}
