//! Program image block catalogs

use crate::mapping::{ProgramImage, StaticBlock};
use crate::memory::StaticAddress;
use serde::{Deserialize, Serialize};
use std::{fmt, str};
use tracing::warn;

/// An address offset written in hexadecimal, e.g. `"0x00400000"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexOffset(pub u64);

impl fmt::Display for HexOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl str::FromStr for HexOffset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        u64::from_str_radix(digits, 16)
            .map(HexOffset)
            .map_err(|_| ())
    }
}

derive_serialize_from_display!(HexOffset);
derive_deserialize_from_str!(HexOffset, "valid hexadecimal offset");

/// One named block of a program image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockConfig {
    name: String,
    start: HexOffset,
    length: HexOffset,
}

/// The static block catalog of a program, as listed in the project file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    #[serde(default = "default_space")]
    space: String,

    #[serde(default)]
    blocks: Vec<BlockConfig>,
}

fn default_space() -> String {
    "ram".to_string()
}

impl Default for ProgramConfig {
    fn default() -> Self {
        ProgramConfig {
            space: default_space(),
            blocks: Vec::new(),
        }
    }
}

impl ProgramConfig {
    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = &BlockConfig> {
        self.blocks.iter()
    }

    /// Build the image the proposal engine works with. Blocks that are empty
    /// or run off the end of the address space are skipped.
    pub fn to_image(&self, name: &str) -> ProgramImage {
        let mut image = ProgramImage::new(name);

        for block in self.blocks.iter() {
            let start = StaticAddress::new(&self.space, block.start.0);

            match StaticBlock::new(&block.name, start, block.length.0) {
                Some(static_block) => image.add_block(static_block),
                None => warn!(
                    "Skipping block {} of program {}: {} bytes at {} does not fit",
                    block.name, name, block.length, block.start
                ),
            }
        }

        image
    }
}
