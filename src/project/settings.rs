//! Session-wide tunables

use crate::trace::DEFAULT_UNDO_LIMIT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// How long the region view waits for changes to settle before it
    /// refreshes, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    debounce_ms: u64,

    /// How many transactions each trace remembers for undo.
    #[serde(default = "default_undo_limit")]
    undo_limit: usize,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_undo_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            debounce_ms: default_debounce_ms(),
            undo_limit: default_undo_limit(),
        }
    }
}

impl Settings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn undo_limit(&self) -> usize {
        self.undo_limit
    }
}
