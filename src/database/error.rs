//! Error type for trace database save/load

use crate::mapping::MappingId;
use crate::trace::RegionId;
use std::{io, result};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Underlying cause of error is I/O related
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Underlying cause of error is JSON related
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The same region was stored twice
    #[error("Region {0} is listed more than once")]
    DuplicateRegion(RegionId),

    /// The same mapping was stored twice
    #[error("Mapping {0} is listed more than once")]
    DuplicateMapping(MappingId),

    /// Two stored regions are alive at the same address at the same time
    #[error("Region {region} overlaps region {other} while both are alive")]
    OverlappingRegions { region: RegionId, other: RegionId },

    /// Two stored mappings collide
    #[error("Mapping {mapping} overlaps mapping {other}")]
    OverlappingMappings { mapping: MappingId, other: MappingId },

    /// A stored id is one the trace never hands out
    #[error("Region id {0} is out of range")]
    RegionIdOutOfRange(RegionId),

    /// A stored id is one the trace never hands out
    #[error("Mapping id {0} is out of range")]
    MappingIdOutOfRange(MappingId),

    /// A stored mapping's trace and static ranges differ in length
    #[error("Mapping {0} has trace and static ranges of different lengths")]
    InconsistentMapping(MappingId),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::IoError(e) => e,
            Error::JsonError(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            _ => io::Error::new(io::ErrorKind::InvalidData, format!("{}", err)),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
