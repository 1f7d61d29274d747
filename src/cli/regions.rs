//! Region commands: list, create and destroy trace regions

use crate::cli::common::{parse_address, parse_region_id, Context};
use crate::memory::{AddressRange, MemoryFlags};
use crate::view::RegionRow;
use clap::ArgMatches;
use std::io;
use std::str::FromStr;

fn print_rows(rows: &[RegionRow]) {
    println!(
        "{:>6}  {:<48}  {:>16}  {:>16}  {:>10}  {:>8}  {:>8}  {}",
        "id", "name", "start", "end", "length", "created", "destroyed", "flags"
    );

    for row in rows {
        println!(
            "{:>6}  {:<48}  {:>16x}  {:>16x}  {:>#10x}  {:>8}  {:>8}  {}",
            row.region().to_string(),
            row.name(),
            row.min_address(),
            row.max_address(),
            row.length(),
            row.created_snap(),
            row.destroyed_snap_text(),
            row.flags()
        );
    }
}

pub fn regions<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<()> {
    let model = ctx.session.regions();
    model.flush();

    let rows = match argv.values_of("containing") {
        Some(addresses) => {
            let mut ranges = Vec::new();

            for address in addresses {
                let address = parse_address(address)?;

                ranges.extend(AddressRange::new(address, address));
            }

            model.rows_intersecting(&ranges)
        }
        None => model.rows(),
    };

    print_rows(&rows);

    Ok(())
}

pub fn add_region<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<()> {
    let name = argv.value_of("name").unwrap_or("");
    let min = parse_address(argv.value_of("min").unwrap_or(""))?;
    let max = parse_address(argv.value_of("max").unwrap_or(""))?;
    let range = AddressRange::new(min, max).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Region cannot end at {:x} when it starts at {:x}", max, min),
        )
    })?;
    let flags = match argv.value_of("flags") {
        Some(flags) => MemoryFlags::from_str(flags).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a valid permission string", flags),
            )
        })?,
        None => MemoryFlags::READ,
    };

    let id = ctx
        .trace
        .transaction(&format!("Add region {}", name), |tx| {
            tx.create_region(name, range, ctx.snap, flags)
        })
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    ctx.save()?;

    println!("Created region {} at {}", id, range);

    Ok(())
}

pub fn destroy_region<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<()> {
    let id = parse_region_id(argv.value_of("region").unwrap_or(""))?;

    ctx.trace
        .transaction(&format!("Destroy region {}", id), |tx| {
            tx.destroy_region(id, ctx.snap)
        })
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    ctx.save()?;

    println!("Destroyed region {} at snap {}", id, ctx.snap);

    Ok(())
}
