//! Common utilities for command implementations

use crate::memory::Snap;
use crate::project::Project;
use crate::session::TraceManager;
use crate::trace::{RegionId, Trace};
use clap::{App, Arg, ArgMatches, SubCommand};
use std::io;
use std::str;
use std::str::FromStr;
use std::sync::Arc;

/// Enumeration of all CLI commands
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Regions,
    AddRegion,
    DestroyRegion,
    Propose,
    Map,
    Mappings,
}

impl Command {
    /// Enumerate all commands that tracemap recognizes.
    pub fn enumerate() -> Vec<Self> {
        use Command::*;

        vec![Regions, AddRegion, DestroyRegion, Propose, Map, Mappings]
    }

    /// Construct the subcommand object for this particular `Command`.
    pub fn into_clap_subcommand<'a, 'b>(self) -> App<'a, 'b> {
        match self {
            Command::Regions => SubCommand::with_name("regions")
                .about("List the regions alive at the current snap")
                .arg(
                    Arg::with_name("containing")
                        .long("containing")
                        .value_name("0x55550000")
                        .takes_value(true)
                        .multiple(true)
                        .help("Only list regions containing these addresses"),
                ),
            Command::AddRegion => SubCommand::with_name("add-region")
                .about("Create a region that is alive from the current snap onwards")
                .arg(
                    Arg::with_name("name")
                        .value_name("Memory[/bin/echo 0x55550000]")
                        .index(1)
                        .required(true)
                        .help("What to name the region"),
                )
                .arg(
                    Arg::with_name("min")
                        .value_name("0x55550000")
                        .index(2)
                        .required(true)
                        .help("The lowest address in the region"),
                )
                .arg(
                    Arg::with_name("max")
                        .value_name("0x5555ffff")
                        .index(3)
                        .required(true)
                        .help("The highest address in the region"),
                )
                .arg(
                    Arg::with_name("flags")
                        .long("flags")
                        .value_name("r-x")
                        .takes_value(true)
                        .help("The region's permissions"),
                ),
            Command::DestroyRegion => SubCommand::with_name("destroy-region")
                .about("End a region's lifespan at the current snap")
                .arg(
                    Arg::with_name("region")
                        .value_name("0")
                        .index(1)
                        .required(true)
                        .help("The id of the region to destroy"),
                ),
            Command::Propose => SubCommand::with_name("propose")
                .about("Propose static mappings for the selected regions")
                .args(&proposal_args()),
            Command::Map => SubCommand::with_name("map")
                .about("Propose static mappings for the selected regions and commit them")
                .args(&proposal_args()),
            Command::Mappings => SubCommand::with_name("mappings")
                .about("List the static mappings of the trace")
                .arg(
                    Arg::with_name("translate")
                        .long("translate")
                        .value_name("ram:00400000")
                        .takes_value(true)
                        .multiple(true)
                        .help("Translate trace addresses, or static addresses given as space:offset, through the mappings alive at the current snap"),
                ),
        }
    }
}

fn proposal_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("program")
            .value_name("echo")
            .index(1)
            .help("The program to map onto. Defaults to whichever program matches best"),
        Arg::with_name("region")
            .long("region")
            .value_name("0")
            .takes_value(true)
            .multiple(true)
            .help("The ids of the regions to map. Defaults to every region alive at the current snap"),
        Arg::with_name("assign")
            .long("assign")
            .value_name("0=.text")
            .takes_value(true)
            .multiple(true)
            .help("Map a region onto a block of your choosing, or onto nothing if the block is left empty"),
        Arg::with_name("skip")
            .long("skip")
            .value_name("0")
            .takes_value(true)
            .multiple(true)
            .help("Leave a region out of the mapping"),
    ]
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "regions" => Ok(Command::Regions),
            "add-region" => Ok(Command::AddRegion),
            "destroy-region" => Ok(Command::DestroyRegion),
            "propose" => Ok(Command::Propose),
            "map" => Ok(Command::Map),
            "mappings" => Ok(Command::Mappings),
            _ => Err(()),
        }
    }
}

/// Parse an address, which is always hexadecimal.
pub fn parse_address(s: &str) -> io::Result<u64> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    u64::from_str_radix(digits, 16).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a valid address", s),
        )
    })
}

/// Parse a region id, with or without its leading `#`.
pub fn parse_region_id(s: &str) -> io::Result<RegionId> {
    s.trim_start_matches('#')
        .parse::<u64>()
        .map(RegionId::from)
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a valid region id", s),
            )
        })
}

/// Look up a global argument, whether it was given before or after the
/// subcommand.
pub fn global_value<'a>(
    matches: &'a ArgMatches<'_>,
    submatches: Option<&'a ArgMatches<'_>>,
    name: &str,
) -> Option<&'a str> {
    submatches
        .and_then(|m| m.value_of(name))
        .or_else(|| matches.value_of(name))
}

/// The project, the open session, and the trace and snap a command works on.
pub struct Context {
    pub project: Project,
    pub session: TraceManager,
    pub trace_name: String,
    pub trace: Arc<Trace>,
    pub snap: Snap,
}

impl Context {
    /// Read the project, open the requested trace (or the project's default
    /// one) and activate it at the requested snap (or its configured one).
    pub fn open(
        project_filename: &str,
        trace_name: Option<&str>,
        snap: Option<&str>,
    ) -> io::Result<Self> {
        let project = Project::read(project_filename)?;
        let trace_name = match trace_name {
            Some(name) => name.to_string(),
            None => project
                .default_trace()
                .map(|(name, _)| name.to_string())
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "The project lists no traces, specify one with --trace.",
                    )
                })?,
        };

        let snap = match snap {
            Some(snap) => snap.parse::<Snap>().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a valid snap", snap),
                )
            })?,
            None => project.trace(&trace_name).map_or(0, |t| t.snap()),
        };

        let mut session = TraceManager::new(project.settings());
        let trace = session.open_from_project(&project, &trace_name)?;

        session.activate(&trace_name, snap);

        Ok(Context {
            project,
            session,
            trace_name,
            trace,
            snap,
        })
    }

    /// Save the trace back to its database.
    pub fn save(&self) -> io::Result<()> {
        self.session.save_trace(&self.project, &self.trace_name)
    }
}
