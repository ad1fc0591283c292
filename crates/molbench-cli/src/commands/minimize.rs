use crate::cli::MinimizeArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use molbench::core::chem::toolkit::GraphToolkit;
use molbench::engine::backend::ReferenceBackend;
use molbench::engine::batch::BatchConfig;
use molbench::engine::forcefield::ForcefieldResolver;
use molbench::engine::progress::ProgressReporter;
use molbench::storage::store::MoleculeStore;
use molbench::workflows;
use tracing::info;

pub fn run(args: MinimizeArgs) -> Result<()> {
    let store = MoleculeStore::open(&args.store)?;

    let defaults = BatchConfig::default();
    let config = BatchConfig {
        n_workers: args.workers.unwrap_or(defaults.n_workers),
        tolerance: args.tolerance.unwrap_or(defaults.tolerance),
        max_iterations: args.max_iterations.unwrap_or(defaults.max_iterations),
    };
    let resolver = ForcefieldResolver::with_plugin_dirs(args.plugin_dir.clone());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Minimizing stored conformers under '{}' with {} worker(s)...",
        args.force_field, config.n_workers
    );
    info!("Invoking the core minimize workflow.");

    let summary = workflows::minimize::run(
        &store,
        &args.force_field,
        &config,
        &GraphToolkit,
        &resolver,
        &ReferenceBackend::new(),
        &reporter,
    )?;

    println!(
        "Minimized {} conformer(s) across {} molecule(s); {} already present.",
        summary.minimized, summary.molecules, summary.skipped
    );
    Ok(())
}
