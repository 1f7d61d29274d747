//! Trace identifier

use crate::memory::Snap;
use relative_path::{RelativePath, RelativePathBuf};
use serde::{Deserialize, Serialize};

/// Where a trace's database lives, and which snap to show by default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    #[serde(default = "default_db_filename")]
    database_path: RelativePathBuf,

    #[serde(default)]
    snap: Snap,
}

fn default_db_filename() -> RelativePathBuf {
    RelativePathBuf::from("tracemap.db")
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            database_path: default_db_filename(),
            snap: 0,
        }
    }
}

impl TraceConfig {
    pub fn new(database_path: &str, snap: Snap) -> Self {
        TraceConfig {
            database_path: RelativePathBuf::from(database_path),
            snap,
        }
    }

    /// The database path, relative to the directory holding the project file.
    pub fn as_database_path(&self) -> &RelativePath {
        self.database_path.as_ref()
    }

    pub fn snap(&self) -> Snap {
        self.snap
    }

    pub fn set_snap(&mut self, snap: Snap) {
        self.snap = snap;
    }
}
