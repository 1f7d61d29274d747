//! CLI support for non-command bits

use crate::cli;
use crate::cli::common::{global_value, Command, Context};
use clap::{Arg, ArgSettings};
use std::io;
use std::str::FromStr;
use tracing::Level;

fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}

pub fn main() -> io::Result<()> {
    let mut app = app_from_crate!();
    app = app.arg(
        Arg::with_name("project")
            .long("project")
            .value_name("tracemap.json")
            .takes_value(true)
            .help("The project file to load")
            .set(ArgSettings::Global),
    );
    app = app.arg(
        Arg::with_name("trace")
            .long("trace")
            .value_name("echo-run")
            .takes_value(true)
            .help("Which trace to work on")
            .set(ArgSettings::Global),
    );
    app = app.arg(
        Arg::with_name("snap")
            .long("snap")
            .value_name("0")
            .takes_value(true)
            .allow_hyphen_values(true)
            .help("Which point in time to work at")
            .set(ArgSettings::Global),
    );
    app = app.arg(
        Arg::with_name("verbose")
            .long("verbose")
            .short("v")
            .multiple(true)
            .help("Log more; repeat for even more")
            .set(ArgSettings::Global),
    );

    for cmd in Command::enumerate().iter() {
        app = app.subcommand(cmd.into_clap_subcommand());
    }

    let matches = app.get_matches();
    let (command, submatches) = matches.subcommand();

    let verbosity = matches.occurrences_of("verbose")
        + submatches.map_or(0, |m| m.occurrences_of("verbose"));

    init_tracing(match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    });

    let command = Command::from_str(command).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "No command given, try --help for a list of commands.",
        )
    })?;
    let submatches = submatches.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Missing command arguments.")
    })?;

    let project_filename =
        global_value(&matches, Some(submatches), "project").unwrap_or("tracemap.json");
    let ctx = Context::open(
        project_filename,
        global_value(&matches, Some(submatches), "trace"),
        global_value(&matches, Some(submatches), "snap"),
    )?;

    match command {
        Command::Regions => cli::regions(&ctx, submatches)?,
        Command::AddRegion => cli::add_region(&ctx, submatches)?,
        Command::DestroyRegion => cli::destroy_region(&ctx, submatches)?,
        Command::Propose => cli::propose(&ctx, submatches)?,
        Command::Map => cli::map(&ctx, submatches)?,
        Command::Mappings => cli::mappings(&ctx, submatches)?,
    };

    Ok(())
}
