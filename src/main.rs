#[macro_use]
extern crate clap;

#[macro_use]
extern crate serde_plain;

mod cli;
mod database;
mod mapping;
mod memory;
mod project;
mod session;
mod trace;
mod view;

use std::io;

fn main() -> io::Result<()> {
    cli::main()
}
