//! On-disk trace database

use crate::database::{Error, Result};
use crate::mapping::StaticMapping;
use crate::trace::{Trace, TraceRegion, TraceState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// The saved form of a trace: every region and mapping it has committed.
///
/// Undo history is not saved. A trace loaded from a database starts with a
/// clean history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceDatabase {
    #[serde(default)]
    regions: Vec<TraceRegion>,

    #[serde(default)]
    mappings: Vec<StaticMapping>,
}

impl TraceDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the committed state of a trace.
    pub fn from_trace(trace: &Trace) -> Self {
        let state = trace.snapshot();

        TraceDatabase {
            regions: state.regions().cloned().collect(),
            mappings: state.mappings().cloned().collect(),
        }
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_file = fs::File::open(path)?;

        Self::read_from(io::BufReader::new(db_file))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = io::BufWriter::new(fs::File::create(path)?);

        self.write_to(&mut writer)?;
        writer.flush()?;

        Ok(())
    }

    /// Rebuild the trace state this database describes.
    ///
    /// Everything is checked on the way in, since the file may have been
    /// edited by hand: ids must be unique and in range, live regions may not
    /// overlap, and mappings must be consistent and may not collide.
    pub fn into_state(self) -> Result<TraceState> {
        let mut state = TraceState::new();
        let mut region_ids = HashSet::new();
        let mut mapping_ids = HashSet::new();

        for region in self.regions {
            if region.id().raw() == u64::MAX {
                return Err(Error::RegionIdOutOfRange(region.id()));
            }

            if !region_ids.insert(region.id()) {
                return Err(Error::DuplicateRegion(region.id()));
            }

            if let Some(other) = state.region_conflict(&region.range(), &region.lifespan()) {
                return Err(Error::OverlappingRegions {
                    region: region.id(),
                    other,
                });
            }

            state.insert_region(region);
        }

        for mapping in self.mappings {
            if mapping.id().raw() == u64::MAX {
                return Err(Error::MappingIdOutOfRange(mapping.id()));
            }

            if !mapping_ids.insert(mapping.id()) {
                return Err(Error::DuplicateMapping(mapping.id()));
            }

            if !mapping.is_consistent() {
                return Err(Error::InconsistentMapping(mapping.id()));
            }

            if let Some(other) = state.mapping_conflict(&mapping) {
                return Err(Error::OverlappingMappings {
                    mapping: mapping.id(),
                    other,
                });
            }

            state.insert_mapping(mapping);
        }

        Ok(state)
    }

    /// Load the named trace from a database file. A missing file yields an
    /// empty trace.
    pub fn open<P: AsRef<Path>>(path: P, name: &str, undo_limit: usize) -> Result<Trace> {
        let path = path.as_ref();
        let database = match Self::read(path) {
            Ok(database) => database,
            Err(Error::IoError(ref e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("Creating new database for trace {} at {}", name, path.display());
                Self::new()
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Loaded {} regions and {} mappings for trace {}",
            database.regions.len(),
            database.mappings.len(),
            name
        );

        Ok(Trace::from_state(name, database.into_state()?, undo_limit))
    }

    /// Save the committed state of a trace to a database file.
    pub fn save<P: AsRef<Path>>(trace: &Trace, path: P) -> Result<()> {
        let database = Self::from_trace(trace);

        database.write(path.as_ref())?;

        info!(
            "Saved {} regions and {} mappings of trace {} to {}",
            database.regions.len(),
            database.mappings.len(),
            trace.name(),
            path.as_ref().display()
        );

        Ok(())
    }
}
