//! Command-line parsing for the emissions projection tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{
    DEFAULT_HORIZON_YEAR, DEFAULT_MAX_EVALUATIONS, DEFAULT_MIN_POINTS, DEFAULT_SAMPLE_COUNT, ProjectionConfig,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "co2", version, about = "Logistic CO₂ emissions projections")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit logistic curves per entity, print a summary, and optionally plot/export.
    Project(ProjectArgs),
    /// Plot a previously exported projection JSON.
    Plot(PlotArgs),
    /// Print the emissions-by-sector breakdown for one entity and year.
    Sectors(SectorArgs),
    /// Print the busiest-airports table with passenger counts.
    Airports(AirportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same projection pipeline as `co2 project`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Which bundled annual dataset to read when `--data` is not given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    /// Annual CO₂ emissions by world region.
    Annual,
    /// Annual CO₂ emissions from aviation.
    Aviation,
}

/// Where the annual emissions table comes from.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Annual emissions CSV (`Entity`, `Year`, value column).
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with = "demo")]
    pub data: Option<PathBuf>,

    /// Bundled dataset under `$CO2_DATA_DIR` (used when `--data` is not given).
    #[arg(long, value_enum, default_value_t = Dataset::Annual)]
    pub dataset: Dataset,

    /// Use the built-in synthetic dataset instead of a CSV file.
    #[arg(long)]
    pub demo: bool,

    /// Seed for the synthetic dataset.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Value column to project (default: first column besides Entity/Code/Year).
    #[arg(long, value_name = "NAME")]
    pub value_column: Option<String>,

    /// Entity to project; repeat for several (default: the first five in the file).
    #[arg(short = 'e', long = "entity", value_name = "NAME")]
    pub entities: Vec<String>,
}

/// Engine knobs shared by `project` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct EngineArgs {
    /// Last year of the projection range.
    #[arg(long, default_value_t = DEFAULT_HORIZON_YEAR)]
    pub horizon: i32,

    /// Number of evenly spaced projection samples.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT as u64, value_parser = clap::value_parser!(u64).range(2..))]
    pub samples: u64,

    /// Minimum number of observations required to attempt a fit.
    #[arg(long, default_value_t = DEFAULT_MIN_POINTS)]
    pub min_points: usize,

    /// Residual evaluation budget of the optimizer.
    #[arg(long, default_value_t = DEFAULT_MAX_EVALUATIONS)]
    pub max_evals: usize,
}

impl EngineArgs {
    pub fn config(&self) -> ProjectionConfig {
        ProjectionConfig {
            min_points: self.min_points,
            horizon_year: self.horizon,
            sample_count: self.samples as usize,
            max_evaluations: self.max_evals,
        }
    }
}

/// Options for `co2 project`.
#[derive(Debug, Parser, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export projected points to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export projections (parameters + fit quality + points) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for plotting a saved projection.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Projection JSON file produced by `co2 project --export-json`.
    #[arg(long, value_name = "JSON")]
    pub projection: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `co2 sectors`.
#[derive(Debug, Parser)]
pub struct SectorArgs {
    /// Emissions-by-sector CSV (default: `$CO2_DATA_DIR/co-emissions-by-sector.csv`).
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with = "demo")]
    pub data: Option<PathBuf>,

    /// Use the built-in synthetic sector table.
    #[arg(long)]
    pub demo: bool,

    /// Seed for the synthetic dataset.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Entity to break down.
    #[arg(short = 'e', long)]
    pub entity: String,

    /// Year to break down (default: the latest year available for the entity).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,
}

/// Options for `co2 airports`.
#[derive(Debug, Parser)]
pub struct AirportArgs {
    /// Busiest-airports CSV (default: `$CO2_DATA_DIR/modified_busiest_airports_2022.csv`).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Only print the first N airports, in file order.
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

/// Options for `co2 tui`.
#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Emissions-by-sector CSV for the sector view.
    #[arg(long, value_name = "CSV")]
    pub sectors: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn project_defaults_match_engine_defaults() {
        let cli = Cli::parse_from(["co2", "project", "--demo"]);
        let Command::Project(args) = cli.command else {
            panic!("expected project");
        };
        assert_eq!(args.engine.config(), ProjectionConfig::default());
        assert!(args.data.demo);
        assert!(args.data.entities.is_empty());
        assert_eq!(args.data.dataset, Dataset::Annual);
    }

    #[test]
    fn repeated_entities_are_collected() {
        let cli = Cli::parse_from(["co2", "project", "-e", "World", "--entity", "Asia", "--horizon", "2080"]);
        let Command::Project(args) = cli.command else {
            panic!("expected project");
        };
        assert_eq!(args.data.entities, vec!["World", "Asia"]);
        assert_eq!(args.engine.config().horizon_year, 2080);
    }

    #[test]
    fn too_few_samples_are_rejected() {
        assert!(Cli::try_parse_from(["co2", "project", "--samples", "1"]).is_err());
    }

    #[test]
    fn airports_accepts_path_and_top() {
        let cli = Cli::parse_from(["co2", "airports", "-f", "a.csv", "--top", "10"]);
        let Command::Airports(args) = cli.command else {
            panic!("expected airports");
        };
        assert_eq!(args.data, Some(PathBuf::from("a.csv")));
        assert_eq!(args.top, Some(10));
    }

    #[test]
    fn data_and_demo_conflict() {
        assert!(Cli::try_parse_from(["co2", "project", "--demo", "--data", "x.csv"]).is_err());
    }
}
