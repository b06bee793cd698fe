//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the emissions table (CSV or demo data)
//! - runs the per-entity projection pipeline
//! - prints reports/plots
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{AirportArgs, Command, DataArgs, Dataset, PlotArgs, ProjectArgs, SectorArgs, TuiArgs};
use crate::data::{DataPaths, EmissionTable, SectorTable, default_selection, demo_emissions, demo_sectors};
use crate::domain::DEFAULT_SELECTION;
use crate::error::AppError;
use crate::io::ingest::RowError;

pub mod pipeline;

/// Entry point for the `co2` binary.
pub fn run() -> Result<(), AppError> {
    // We want `co2` and `co2 -e World` to behave like `co2 tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal; everything else logs to stderr.
    if !matches!(cli.command, Command::Tui(_)) {
        crate::logging::init_tracing();
    }

    match cli.command {
        Command::Project(args) => handle_project(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sectors(args) => handle_sectors(args),
        Command::Airports(args) => handle_airports(args),
        Command::Tui(args) => handle_tui(args),
    }
}

/// An annual table plus what ingest had to say about it.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: EmissionTable,
    pub row_errors: Vec<RowError>,
    /// Entities to project, in order.
    pub selection: Vec<String>,
}

/// Resolve the annual table from `--demo`, `--data` or the dataset directory.
pub fn load_table(args: &DataArgs) -> Result<LoadedTable, AppError> {
    let (table, row_errors) = if args.demo {
        (demo_emissions(args.seed)?, Vec::new())
    } else {
        let path = annual_path(args);
        if !path.exists() {
            return Err(AppError::new(
                2,
                format!(
                    "Data file '{}' not found. Pass `--data <file.csv>`, set {}, or use `--demo`.",
                    path.display(),
                    crate::data::paths::DATA_DIR_ENV
                ),
            ));
        }
        let ingested = crate::io::ingest::load_emissions(&path, args.value_column.as_deref())?;
        (ingested.table, ingested.row_errors)
    };

    let selection = default_selection(&table, &args.entities, DEFAULT_SELECTION);
    if selection.is_empty() {
        return Err(AppError::new(3, "No entities to project."));
    }

    Ok(LoadedTable {
        table,
        row_errors,
        selection,
    })
}

fn annual_path(args: &DataArgs) -> PathBuf {
    if let Some(path) = &args.data {
        return path.clone();
    }
    let paths = DataPaths::from_env();
    match args.dataset {
        Dataset::Annual => paths.annual(),
        Dataset::Aviation => paths.aviation(),
    }
}

/// Resolve the sector table: explicit file, demo data, or the dataset directory.
pub fn load_sector_table(path: Option<&PathBuf>, demo: bool, seed: u64) -> Result<SectorTable, AppError> {
    if demo {
        return demo_sectors(seed);
    }
    let path = path.cloned().unwrap_or_else(|| DataPaths::from_env().sectors());
    crate::io::ingest::load_sectors(&path)
}

fn handle_project(args: ProjectArgs) -> Result<(), AppError> {
    let config = args.engine.config();
    let loaded = load_table(&args.data)?;
    let run = pipeline::project_entities(&loaded.table, &loaded.selection, &config);

    let value_label = crate::data::EmissionSource::value_label(&loaded.table).to_string();
    println!(
        "{}",
        crate::report::format_run_summary(&run, &value_label, &config, &loaded.row_errors)
    );

    if args.plot && !args.no_plot && !run.projections.is_empty() {
        let series = crate::plot::series_for_run(&run, &loaded.table);
        println!("{}", crate::plot::render_ascii_plot(&series, args.width, args.height));
    }

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_projections_csv(path, &run.projections)?;
    }
    if let Some(path) = &args.export_json {
        let file = crate::io::projection_file(&value_label, config.horizon_year, &run.projections);
        crate::io::write_projection_json(path, &file)?;
    }

    if run.projections.is_empty() {
        return Err(AppError::new(3, "No entity could be projected."));
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_projection_json(&args.projection)?;
    let series = crate::plot::series_from_file(&file);
    println!("{}", crate::plot::render_ascii_plot(&series, args.width, args.height));
    Ok(())
}

fn handle_sectors(args: SectorArgs) -> Result<(), AppError> {
    let table = load_sector_table(args.data.as_ref(), args.demo, args.seed)?;
    let year = match args.year {
        Some(y) => y,
        None => table
            .records
            .iter()
            .filter(|r| r.entity == args.entity)
            .map(|r| r.year)
            .max()
            .ok_or_else(|| AppError::new(3, format!("No data available for {}", args.entity)))?,
    };

    let shares = table.breakdown(&args.entity, year)?;
    println!("{}", crate::report::format_sector_breakdown(&args.entity, year, &shares));
    Ok(())
}

fn handle_airports(args: AirportArgs) -> Result<(), AppError> {
    let path = args.data.unwrap_or_else(|| DataPaths::from_env().airports());
    let (mut airports, row_errors) = crate::io::ingest::load_airports(&path)?;
    for e in &row_errors {
        tracing::warn!(line = e.line, airport = e.entity.as_deref().unwrap_or("-"), "{}", e.message);
    }
    if let Some(n) = args.top {
        airports.truncate(n);
    }
    print!("{}", crate::report::format_airport_table(&airports));
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

/// Rewrite argv so `co2` defaults to `co2 tui`.
///
/// Rules:
/// - `co2`                      -> `co2 tui`
/// - `co2 -e World ...`         -> `co2 tui -e World ...`
/// - `co2 --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "project" | "plot" | "sectors" | "airports" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
