//! Project file structures

mod program;
mod repr;
mod settings;
mod trace;


pub use program::{BlockConfig, HexOffset, ProgramConfig};
pub use repr::Project;
pub use settings::Settings;
pub use trace::TraceConfig;
