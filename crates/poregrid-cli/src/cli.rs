use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "poregrid - Periodic Lennard-Jones energy grids for adsorbates in crystalline frameworks, written as cube files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the energy grid of an adsorbate in a framework and write it as a cube file.
    Grid(GridArgs),
    /// Print a summary of a framework (CIF) or an energy grid (cube) file.
    Inspect(InspectArgs),
}

/// Arguments for the `grid` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// Path to the framework structure in P1 CIF format.
    #[arg(short = 'i', long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// Path to the forcefield parameter file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub forcefield: Option<PathBuf>,

    /// Name of the adsorbate (probe) as defined in the forcefield.
    #[arg(short, long, value_name = "NAME")]
    pub adsorbate: Option<String>,

    /// Path for the output cube file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target distance between grid points in Å.
    #[arg(short, long, value_name = "FLOAT")]
    pub spacing: Option<f64>,

    /// Override the cutoff radius of the forcefield in Å.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Compute the grid on the calling thread only.
    #[arg(long)]
    pub serial: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S grid.spacing=0.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// A framework (.cif) or energy grid (.cube) file.
    #[arg(required = true, value_name = "PATH")]
    pub path: PathBuf,

    /// Report the periodic images needed for this cutoff radius (Å). CIF only.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,
}
