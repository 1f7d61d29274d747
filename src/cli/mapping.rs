//! Mapping commands: propose, commit, and list static mappings

use crate::cli::common::{parse_address, parse_region_id, Context};
use crate::mapping::{
    commit_proposal, is_map_action_enabled, propose as propose_for, propose_best, regions_for,
    CommitError, ProgramImage, RegionMapProposal,
};
use crate::memory::StaticAddress;
use crate::trace::{RegionId, TraceRegion};
use clap::ArgMatches;
use std::io;

/// The regions a command should map: the ones named with `--region`, or
/// else every region shown at the current snap.
fn selection<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<Vec<TraceRegion>> {
    let ids: Vec<RegionId> = match argv.values_of("region") {
        Some(values) => values.map(parse_region_id).collect::<io::Result<_>>()?,
        None => {
            let model = ctx.session.regions();
            model.flush();
            model.rows().iter().map(|row| row.region()).collect()
        }
    };

    Ok(regions_for(&ctx.trace, &ids)
        .into_iter()
        .filter(|r| r.is_alive_at(ctx.snap))
        .collect())
}

/// Parse a `--assign` value: a region id, `=`, and a block name, which may
/// be empty to leave the region unmapped.
fn parse_assignment(s: &str) -> io::Result<(RegionId, &str)> {
    let split = s.find('=').ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} should look like region=block", s),
        )
    })?;

    Ok((parse_region_id(&s[..split])?, s[split + 1..].trim()))
}

fn entry_index(proposal: &RegionMapProposal, region: RegionId) -> io::Result<usize> {
    proposal.index_of(region).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Region {} is not part of the proposal", region),
        )
    })
}

/// Apply the user's `--assign` and `--skip` edits to a proposal.
fn edit_proposal<'a>(
    proposal: &mut RegionMapProposal,
    image: &ProgramImage,
    argv: &ArgMatches<'a>,
) -> io::Result<()> {
    for assignment in argv.values_of("assign").into_iter().flatten() {
        let (region, block_name) = parse_assignment(assignment)?;
        let index = entry_index(proposal, region)?;
        let block = if block_name.is_empty() {
            None
        } else {
            Some(image.block_named(block_name).cloned().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Program {} has no block {}", image.name(), block_name),
                )
            })?)
        };

        if let Some(other) = proposal.set_block(index, block) {
            if let Some(entry) = proposal.entry(other) {
                eprintln!(
                    "Block {} taken from region {}",
                    block_name,
                    entry.region_id()
                );
            }
        }
    }

    for skipped in argv.values_of("skip").into_iter().flatten() {
        let index = entry_index(proposal, parse_region_id(skipped)?)?;

        proposal.set_selected(index, false);
    }

    Ok(())
}

fn build_proposal<'a>(
    ctx: &Context,
    argv: &ArgMatches<'a>,
) -> io::Result<(RegionMapProposal, ProgramImage)> {
    let regions = selection(ctx, argv)?;
    let ids: Vec<RegionId> = regions.iter().map(|r| r.id()).collect();

    if regions.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "No regions selected at this snap.",
        ));
    }

    let (mut proposal, image) = match argv.value_of("program") {
        Some(program) => {
            let image = ctx.project.program_image(program).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Program {} does not exist", program),
                )
            })?;

            if !is_map_action_enabled(&ctx.trace, &ids, ctx.snap, &image) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("None of the selected regions belong to program {}", program),
                ));
            }

            (propose_for(&regions, &image), image)
        }
        None => {
            let images: Vec<ProgramImage> = ctx
                .project
                .program_images()
                .into_iter()
                .filter(|image| is_map_action_enabled(&ctx.trace, &ids, ctx.snap, image))
                .collect();
            let proposal = propose_best(&regions, &images).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "No program in the project matches the selected regions.",
                )
            })?;
            let image = images
                .into_iter()
                .find(|i| i.name() == proposal.program())
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Proposed program vanished"))?;

            (proposal, image)
        }
    };

    edit_proposal(&mut proposal, &image, argv)?;

    Ok((proposal, image))
}

fn print_proposal(proposal: &RegionMapProposal) {
    println!("Proposal for {}:", proposal.program());

    for entry in proposal.entries() {
        let mark = if entry.is_selected() { "*" } else { " " };

        match (entry.block(), entry.mapping_length()) {
            (Some(block), Some(length)) => println!(
                "{} {:>6}  {:<48} -> {} ({}, {:#x} bytes)",
                mark,
                entry.region_id().to_string(),
                entry.region().name(),
                block.start(),
                block.name(),
                length
            ),
            _ => println!(
                "{} {:>6}  {:<48} -> (none)",
                mark,
                entry.region_id().to_string(),
                entry.region().name()
            ),
        }
    }
}

pub fn propose<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<()> {
    let (proposal, _) = build_proposal(ctx, argv)?;

    print_proposal(&proposal);

    Ok(())
}

pub fn map<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<()> {
    let (proposal, image) = build_proposal(ctx, argv)?;

    print_proposal(&proposal);

    match commit_proposal(&ctx.trace, &proposal, &image, ctx.snap) {
        Ok(summary) => {
            ctx.save()?;
            println!("Created {} static mappings", summary.count());

            Ok(())
        }
        Err(CommitError::Rejected { failures }) => {
            for failure in failures.iter() {
                eprintln!("Cannot map {}", failure);
            }

            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} proposal entries could not be mapped", failures.len()),
            ))
        }
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
    }
}

/// Translate one address through whichever mapping alive at the current
/// snap covers it.
fn translate(ctx: &Context, address: &str) -> io::Result<String> {
    let mappings = ctx.trace.mappings();
    let alive = mappings.iter().filter(|m| m.lifespan().contains(ctx.snap));

    if address.contains(':') {
        let static_address = address.parse::<StaticAddress>().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a valid static address", address),
            )
        })?;

        Ok(alive
            .filter_map(|m| m.to_trace(&static_address))
            .next()
            .map_or_else(|| "(unmapped)".to_string(), |a| format!("{:x}", a)))
    } else {
        let trace_address = parse_address(address)?;

        Ok(alive
            .filter_map(|m| m.to_static(trace_address))
            .next()
            .map_or_else(|| "(unmapped)".to_string(), |a| a.to_string()))
    }
}

pub fn mappings<'a>(ctx: &Context, argv: &ArgMatches<'a>) -> io::Result<()> {
    if let Some(addresses) = argv.values_of("translate") {
        for address in addresses {
            println!("{} -> {}", address, translate(ctx, address)?);
        }

        return Ok(());
    }

    println!(
        "{:>6}  {:>16}  {:>16}  {:>10}  {:<16}  {:<28}  {}",
        "id", "start", "end", "length", "program", "static", "lifespan"
    );

    for mapping in ctx.trace.mappings() {
        println!(
            "{:>6}  {:>16x}  {:>16x}  {:>#10x}  {:<16}  {:<28}  {}",
            mapping.id().to_string(),
            mapping.min_trace_address(),
            mapping.max_trace_address(),
            mapping.length(),
            mapping.program(),
            format!("{}:{}", mapping.static_address().space(), mapping.static_range()),
            mapping.lifespan()
        );
    }

    Ok(())
}
