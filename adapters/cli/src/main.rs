#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Wavegrid generation episodes.

mod catalog_source;
mod snapshot_transfer;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wavegrid_core::{
    AdjustmentSignal, CellCoord, Command, GridSize, GridView, Layout, TileCatalog,
};
use wavegrid_system_trainer::{AdjustmentPolicy, Trainer};
use wavegrid_world::{self as world, query, World};

use snapshot_transfer::GridSnapshot;

/// Generates Wave-Function-Collapse tile grids from the terminal.
#[derive(Debug, Parser)]
#[command(name = "wavegrid")]
struct Args {
    /// Number of tile columns to generate.
    #[arg(long, default_value_t = 12)]
    columns: u32,
    /// Number of tile rows to generate.
    #[arg(long, default_value_t = 9)]
    rows: u32,
    /// Biome restricting which tile variants are eligible.
    #[arg(long, default_value = "meadow")]
    biome: String,
    /// Layout constraint applied to initial candidate sets: open or walled.
    #[arg(long, default_value = "open")]
    layout: String,
    /// Seed driving all session randomness; sampled from OS entropy when
    /// omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Constant adjustment signal applied to every step.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    adjustment: f64,
    /// Sample a reproducible noise schedule instead of the constant signal.
    #[arg(long)]
    noise: bool,
    /// Seed for the noise schedule; defaults to the session seed.
    #[arg(long)]
    noise_seed: Option<u64>,
    /// Amplitude of the sampled noise schedule.
    #[arg(long, default_value_t = 0.5)]
    noise_amplitude: f64,
    /// Path to a catalog JSON file; the built-in catalog when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Treat catalog validation issues as fatal instead of warnings.
    #[arg(long)]
    strict: bool,
    /// Upper bound on step commands before the episode is abandoned.
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: usize,
    /// Emit the finished grid as a single-line snapshot string.
    #[arg(long)]
    snapshot: bool,
    /// Decode and display a previously emitted snapshot string, then exit.
    #[arg(long, value_name = "SNAPSHOT")]
    decode: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(encoded) = args.decode.as_deref() {
        return decode_snapshot(encoded);
    }

    run_episode(&args)
}

fn run_episode(args: &Args) -> Result<()> {
    let spec = catalog_source::load(args.catalog.as_deref())?;
    let issues = spec.validate();
    for issue in &issues {
        eprintln!("catalog: {issue}");
    }
    if args.strict && !issues.is_empty() {
        bail!("catalog validation reported {} issue(s)", issues.len());
    }

    let catalog = TileCatalog::from_spec(&spec);
    let biome = catalog.biome(&args.biome).with_context(|| {
        let known: Vec<&str> = catalog.biome_names().collect();
        format!(
            "unknown biome '{}' (available: {})",
            args.biome,
            known.join(", ")
        )
    })?;
    let layout = parse_layout(&args.layout)?;
    let size = GridSize::new(args.columns, args.rows);
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());

    let policy = if args.noise {
        let mut rng = ChaCha8Rng::seed_from_u64(args.noise_seed.unwrap_or(seed));
        let amplitude = args.noise_amplitude.abs();
        let schedule = (0..size.cell_count())
            .map(|_| AdjustmentSignal::new(rng.gen_range(-amplitude..=amplitude)))
            .collect();
        AdjustmentPolicy::Schedule(schedule)
    } else {
        AdjustmentPolicy::Constant(AdjustmentSignal::new(args.adjustment))
    };

    let mut world = World::new(catalog);
    let mut trainer = Trainer::new(policy);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ResetEnvironment {
            biome,
            layout,
            size,
            seed,
        },
        &mut events,
    );

    let mut steps = 0usize;
    'pump: loop {
        let mut commands = Vec::new();
        trainer.handle(&events, &mut commands);
        if commands.is_empty() {
            break;
        }

        events.clear();
        for command in commands {
            if steps >= args.max_steps {
                break 'pump;
            }
            steps += 1;
            let mut generated = Vec::new();
            world::apply(&mut world, command, &mut generated);
            events.extend(generated);
        }
    }

    let view = query::grid_view(&world);
    println!("{}", render_grid(&view, query::catalog(&world)));

    let (collapsed, total) = query::progress(&world);
    if query::has_failed(&world) {
        println!(
            "episode failed after {steps} steps ({collapsed}/{total} cells collapsed, seed {seed})"
        );
        std::process::exit(1);
    }
    if !query::is_complete(&world) {
        bail!("episode did not settle within {} steps", args.max_steps);
    }

    let walkable = query::walkable_cells(&world).len();
    println!("episode complete in {steps} steps ({walkable}/{total} walkable cells, seed {seed})");

    if args.snapshot {
        println!("{}", capture_snapshot(&world, seed).encode());
    }

    Ok(())
}

fn decode_snapshot(encoded: &str) -> Result<()> {
    let snapshot = GridSnapshot::decode(encoded).context("snapshot string rejected")?;
    println!(
        "biome {} seed {} ({}x{})",
        snapshot.biome, snapshot.seed, snapshot.columns, snapshot.rows
    );
    for row in snapshot.tiles.chunks(snapshot.columns as usize) {
        let line: String = row
            .iter()
            .map(|tile| {
                tile.as_deref()
                    .and_then(|name| name.chars().next())
                    .unwrap_or('.')
            })
            .collect();
        println!("{line}");
    }
    Ok(())
}

fn capture_snapshot(world: &World, seed: u64) -> GridSnapshot {
    let view = query::grid_view(world);
    let catalog = query::catalog(world);
    let biome = query::biome(world)
        .and_then(|biome| catalog.biome_name(biome))
        .unwrap_or("unknown")
        .to_owned();

    GridSnapshot {
        columns: view.size().columns(),
        rows: view.size().rows(),
        biome,
        seed,
        tiles: view
            .iter()
            .map(|snapshot| {
                snapshot
                    .chosen
                    .and_then(|tile| catalog.variant(tile))
                    .map(|variant| variant.name().to_owned())
            })
            .collect(),
    }
}

fn render_grid(view: &GridView, catalog: &TileCatalog) -> String {
    let mut output = String::new();
    for row in 0..view.size().rows() {
        if row > 0 {
            output.push('\n');
        }
        for column in 0..view.size().columns() {
            let glyph = view
                .get(CellCoord::new(column, row))
                .and_then(|snapshot| snapshot.chosen)
                .and_then(|tile| catalog.variant(tile))
                .and_then(|variant| variant.name().chars().next())
                .unwrap_or('.');
            output.push(glyph);
        }
    }
    output
}

fn parse_layout(value: &str) -> Result<Layout> {
    match value.to_ascii_lowercase().as_str() {
        "open" => Ok(Layout::Open),
        "walled" => Ok(Layout::Walled),
        other => bail!("unknown layout '{other}' (expected 'open' or 'walled')"),
    }
}
