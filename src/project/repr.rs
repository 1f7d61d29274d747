//! Project configuration file representation

use crate::project::program::ProgramConfig;
use crate::project::settings::Settings;
use crate::project::trace::TraceConfig;
use crate::mapping::ProgramImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// In-memory representation of the current project configuration.
///
/// This file is typically read from a file named `tracemap.json`, and it
/// lists every trace in the project, the block catalogs of the programs those
/// traces ran, and session settings.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Project {
    #[serde(default)]
    traces: BTreeMap<String, TraceConfig>,

    #[serde(default)]
    programs: BTreeMap<String, ProgramConfig>,

    #[serde(default)]
    settings: Settings,

    /// The directory the project was read from. Database paths are resolved
    /// against it.
    #[serde(skip)]
    base_path: Option<PathBuf>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<P: AsRef<Path>>(filename: P) -> io::Result<Self> {
        let filename = filename.as_ref();
        let project_file = fs::File::open(filename)?;
        let mut project: Self = serde_json::from_reader(io::BufReader::new(project_file))?;

        project.base_path = Some(
            filename
                .parent()
                .map_or_else(PathBuf::new, |p| p.to_path_buf()),
        );

        Ok(project)
    }

    pub fn write<P: AsRef<Path>>(&self, filename: P) -> io::Result<()> {
        let project_file = fs::File::create(filename)?;

        serde_json::to_writer_pretty(project_file, self).map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Encoding project failed with error: {}", e),
            )
        })
    }

    /// The directory relative database paths are resolved against.
    ///
    /// `None` indicates that the project was never read from disk.
    pub fn path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    /// Get the trace with the given name within the project.
    pub fn trace(&self, name: &str) -> Option<&TraceConfig> {
        self.traces.get(name)
    }

    pub fn trace_mut(&mut self, name: &str) -> Option<&mut TraceConfig> {
        self.traces.get_mut(name)
    }

    /// Get the project's default trace: the first one by name.
    pub fn default_trace(&self) -> Option<(&str, &TraceConfig)> {
        self.traces.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    pub fn add_trace(&mut self, name: &str, trace: TraceConfig) {
        self.traces.insert(name.to_string(), trace);
    }

    pub fn iter_traces(&self) -> impl Iterator<Item = (&str, &TraceConfig)> {
        self.traces.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Where the given trace's database lives on disk.
    pub fn database_path(&self, trace: &TraceConfig) -> PathBuf {
        match self.path() {
            Some(base_path) => trace.as_database_path().to_path(base_path),
            None => trace.as_database_path().to_path(""),
        }
    }

    pub fn program(&self, name: &str) -> Option<&ProgramConfig> {
        self.programs.get(name)
    }

    pub fn add_program(&mut self, name: &str, program: ProgramConfig) {
        self.programs.insert(name.to_string(), program);
    }

    pub fn iter_programs(&self) -> impl Iterator<Item = (&str, &ProgramConfig)> {
        self.programs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The block catalog of the named program.
    pub fn program_image(&self, name: &str) -> Option<ProgramImage> {
        self.programs.get(name).map(|p| p.to_image(name))
    }

    /// Every program's block catalog, in name order.
    pub fn program_images(&self) -> Vec<ProgramImage> {
        self.iter_programs().map(|(name, p)| p.to_image(name)).collect()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
