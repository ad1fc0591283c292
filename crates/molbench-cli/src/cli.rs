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
    author = "The molbench developers",
    version,
    about = "molbench CLI - Compute and store molecular-mechanics minimized conformers against quantum-mechanical reference data.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a QM optimization-result collection into a new molecule store.
    Ingest(IngestArgs),
    /// Minimize every stored QM conformer under a force field and store the results.
    Minimize(MinimizeArgs),
}

/// Arguments for the `ingest` subcommand.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Path to the QM result collection (JSON).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub collection: PathBuf,

    /// Destination store path (.sqlite); must not already exist.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub store: PathBuf,
}

/// Arguments for the `minimize` subcommand.
#[derive(Args, Debug)]
pub struct MinimizeArgs {
    /// Path to an existing molecule store (.sqlite).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub store: PathBuf,

    /// Force-field identifier: a file path, a plugin-directory name, or a
    /// bundled name (e.g. 'mbff-1.0').
    #[arg(short, long, required = true, value_name = "NAME_OR_PATH")]
    pub force_field: String,

    /// Size of the minimization worker pool.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Gradient tolerance in kJ/(mol·nm).
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Iteration cap per conformer.
    #[arg(long, value_name = "NUM")]
    pub max_iterations: Option<usize>,

    /// Extra directories searched for '<name>.toml' force fields; repeatable.
    #[arg(long, value_name = "DIR")]
    pub plugin_dir: Vec<PathBuf>,
}
