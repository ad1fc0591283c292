use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{info, instrument};

use crate::core::chem::identity::StructuralKey;
use crate::core::chem::toolkit::StructureToolkit;
use crate::core::models::records::{NewMmConformer, NewRecord};
use crate::engine::backend::EnergyBackend;
use crate::engine::batch::{BatchConfig, ConformerInput, ItemFailure, minimize_batch};
use crate::engine::error::EngineError;
use crate::engine::forcefield::ForcefieldResolver;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::storage::error::StoreError;
use crate::storage::store::MoleculeStore;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{} minimization item(s) failed; no MM records were written", failures.len())]
    ItemsFailed { failures: Vec<ItemFailure> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimizeSummary {
    /// MM conformer records written by this run.
    pub minimized: usize,
    /// Conformers already minimized under this force field and left alone.
    pub skipped: usize,
    /// Distinct molecules touched by this run.
    pub molecules: usize,
}

/// Minimizes every stored QM conformer under `force_field` and writes the MM
/// records back, skipping (source id, force field) pairs that already exist,
/// so re-running is idempotent. A non-empty per-item failure list aborts the
/// run before anything is written.
#[instrument(skip_all, name = "minimize_workflow", fields(force_field = %force_field))]
pub fn run<T, B>(
    store: &MoleculeStore,
    force_field: &str,
    config: &BatchConfig,
    toolkit: &T,
    forcefields: &ForcefieldResolver,
    backend: &B,
    reporter: &ProgressReporter,
) -> Result<MinimizeSummary, WorkflowError>
where
    T: StructureToolkit,
    B: EnergyBackend,
{
    // === Phase 1: Gather unminimized conformers, grouped by key ===
    reporter.report(Progress::PhaseStart {
        name: "Gathering conformers",
    });
    info!("Collecting stored QM conformers without MM records for this force field.");

    let already_minimized: HashSet<i64> = store
        .mm_source_ids_by_force_field(force_field)?
        .into_iter()
        .collect();

    let mut inputs: BTreeMap<StructuralKey, Vec<ConformerInput>> = BTreeMap::new();
    let mut skipped = 0usize;
    for molecule in store.molecules()? {
        for record in store.qm_conformer_records_by_molecule_id(molecule.id)? {
            if already_minimized.contains(&record.source_id) {
                skipped += 1;
                continue;
            }
            inputs
                .entry(molecule.structural_key.clone())
                .or_default()
                .push(ConformerInput {
                    source_id: record.source_id,
                    mapped_structure: molecule.mapped_structure.clone(),
                    coordinates: record.coordinates,
                });
        }
    }
    let molecules = inputs.len();
    reporter.report(Progress::PhaseFinish);

    if inputs.is_empty() {
        info!(skipped, "Nothing to minimize.");
        return Ok(MinimizeSummary {
            minimized: 0,
            skipped,
            molecules: 0,
        });
    }

    // === Phase 2: Fan out across the worker pool ===
    reporter.report(Progress::PhaseStart { name: "Minimizing" });
    let outcome = minimize_batch(
        &inputs,
        force_field,
        config,
        toolkit,
        forcefields,
        backend,
        reporter,
    )?;
    reporter.report(Progress::PhaseFinish);

    if !outcome.failures.is_empty() {
        return Err(WorkflowError::ItemsFailed {
            failures: outcome.failures,
        });
    }

    // === Phase 3: Write MM records back in one transaction ===
    reporter.report(Progress::PhaseStart {
        name: "Storing results",
    });
    let records: Vec<NewRecord> = outcome
        .results
        .into_values()
        .flatten()
        .map(|result| {
            NewRecord::Mm(NewMmConformer {
                structural_key: result.structural_key,
                mapped_structure: result.mapped_structure,
                source_id: result.source_id,
                force_field: result.force_field,
                coordinates: result.coordinates,
                energy: result.energy,
            })
        })
        .collect();
    let minimized = records.len();
    store.store(&records, toolkit)?;
    reporter.report(Progress::PhaseFinish);

    info!(minimized, skipped, molecules, "Minimize workflow complete.");
    Ok(MinimizeSummary {
        minimized,
        skipped,
        molecules,
    })
}
