//! The batch orchestrator.
//!
//! Flattens a by-structural-key collection of conformers into an indexed work
//! list, fans it out across a bounded rayon thread pool, and aggregates
//! results back per key. Workers complete in arbitrary order; each result
//! keeps its original submission index and every group is sorted by that
//! index before returning, so the observable output is independent of
//! scheduling. Per-item failures are isolated into a tagged failure list
//! instead of crossing the pool boundary as a panic or early return.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use super::backend::EnergyBackend;
use super::error::EngineError;
use super::forcefield::ForcefieldResolver;
use super::minimize::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, MinimizationInput, MinimizationResult, minimize,
};
use super::progress::{Progress, ProgressReporter};
use crate::core::chem::identity::StructuralKey;
use crate::core::chem::toolkit::StructureToolkit;
use crate::core::models::coordinates::Coordinates;

/// Upper bound on concurrent minimizations; a fixed tunable, never derived
/// from input size.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// One conformer to minimize, before being joined with a force field.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformerInput {
    pub source_id: i64,
    pub mapped_structure: String,
    /// Starting geometry in Å, in the mapped structure's atom order.
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub n_workers: usize,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            n_workers: DEFAULT_POOL_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A minimization that was aborted without affecting the rest of the batch.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub structural_key: StructuralKey,
    pub source_id: i64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Per structural key, results ordered by original submission index.
    pub results: BTreeMap<StructuralKey, Vec<MinimizationResult>>,
    pub failures: Vec<ItemFailure>,
}

impl BatchOutcome {
    pub fn total_results(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

#[instrument(skip_all, name = "minimize_batch", fields(force_field = %force_field))]
pub fn minimize_batch<T, B>(
    inputs: &BTreeMap<StructuralKey, Vec<ConformerInput>>,
    force_field: &str,
    config: &BatchConfig,
    toolkit: &T,
    forcefields: &ForcefieldResolver,
    backend: &B,
    reporter: &ProgressReporter,
) -> Result<BatchOutcome, EngineError>
where
    T: StructureToolkit,
    B: EnergyBackend,
{
    let work: Vec<(usize, MinimizationInput)> = inputs
        .iter()
        .flat_map(|(key, conformers)| {
            conformers.iter().map(move |conformer| MinimizationInput {
                structural_key: key.clone(),
                source_id: conformer.source_id,
                force_field: force_field.to_string(),
                mapped_structure: conformer.mapped_structure.clone(),
                coordinates: conformer.coordinates.clone(),
            })
        })
        .enumerate()
        .collect();

    info!(
        items = work.len(),
        molecules = inputs.len(),
        workers = config.n_workers,
        "Dispatching minimization batch."
    );
    reporter.report(Progress::TaskStart {
        total: work.len() as u64,
    });

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_workers)
        .build()
        .map_err(|e| EngineError::Initialization(format!("worker pool: {e}")))?;

    let completed: Vec<(usize, StructuralKey, Result<MinimizationResult, EngineError>)> = pool
        .install(|| {
            work.par_iter()
                .map(|(index, input)| {
                    let outcome = minimize(
                        input,
                        toolkit,
                        forcefields,
                        backend,
                        config.tolerance,
                        config.max_iterations,
                    );
                    reporter.report(Progress::TaskIncrement);
                    (*index, input.structural_key.clone(), outcome)
                })
                .collect()
        });
    reporter.report(Progress::TaskFinish);

    let mut indexed: BTreeMap<StructuralKey, Vec<(usize, MinimizationResult)>> = BTreeMap::new();
    let mut failures = Vec::new();
    for (index, key, outcome) in completed {
        match outcome {
            Ok(result) => indexed.entry(key).or_default().push((index, result)),
            Err(error) => {
                warn!(source_id = work[index].1.source_id, %error, "Minimization item failed.");
                failures.push(ItemFailure {
                    structural_key: key,
                    source_id: work[index].1.source_id,
                    reason: error.to_string(),
                });
            }
        }
    }

    // Completion order is scheduling-dependent; submission order is not.
    let mut results = BTreeMap::new();
    for (key, mut group) in indexed {
        group.sort_by_key(|(index, _)| *index);
        results.insert(key, group.into_iter().map(|(_, result)| result).collect());
    }

    info!(
        succeeded = results.values().map(|g: &Vec<MinimizationResult>| g.len()).sum::<usize>(),
        failed = failures.len(),
        "Batch complete."
    );
    Ok(BatchOutcome { results, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::toolkit::GraphToolkit;
    use crate::engine::backend::ReferenceBackend;
    use nalgebra::Point3;
    use std::sync::atomic::{AtomicU64, Ordering};

    const WATER: &str = "[O:1]([H:2])[H:3]";
    const METHANOL: &str = "[C:1]([H:3])([H:4])([H:5])[O:2][H:6]";

    fn water_conformer(source_id: i64, jitter: f64) -> ConformerInput {
        ConformerInput {
            source_id,
            mapped_structure: WATER.to_string(),
            coordinates: Coordinates::new(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.05 + jitter, 0.0, 0.0),
                Point3::new(-0.3, 1.0 + jitter, 0.0),
            ]),
        }
    }

    fn methanol_conformer(source_id: i64) -> ConformerInput {
        ConformerInput {
            source_id,
            mapped_structure: METHANOL.to_string(),
            coordinates: Coordinates::new(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.43, 0.0, 0.0),
                Point3::new(-0.39, -0.52, 0.89),
                Point3::new(-0.39, -0.52, -0.89),
                Point3::new(-0.39, 1.03, 0.0),
                Point3::new(1.77, 0.90, 0.0),
            ]),
        }
    }

    fn grouped_inputs() -> BTreeMap<StructuralKey, Vec<ConformerInput>> {
        let toolkit = GraphToolkit;
        let mut inputs = BTreeMap::new();
        inputs.insert(
            toolkit.key_for(WATER).unwrap(),
            vec![
                water_conformer(101, 0.0),
                water_conformer(102, 0.08),
                water_conformer(103, -0.05),
            ],
        );
        inputs.insert(
            toolkit.key_for(METHANOL).unwrap(),
            vec![methanol_conformer(201)],
        );
        inputs
    }

    #[test]
    fn batch_aggregates_per_key_in_submission_order() {
        let inputs = grouped_inputs();
        let outcome = minimize_batch(
            &inputs,
            "mbff-1.0",
            &BatchConfig {
                n_workers: 4,
                ..BatchConfig::default()
            },
            &GraphToolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.total_results(), 4);

        let toolkit = GraphToolkit;
        let water_results = &outcome.results[&toolkit.key_for(WATER).unwrap()];
        let source_ids: Vec<i64> = water_results.iter().map(|r| r.source_id).collect();
        assert_eq!(source_ids, vec![101, 102, 103]);
    }

    #[test]
    fn batch_output_is_reproducible_across_runs() {
        let inputs = grouped_inputs();
        let run = || {
            minimize_batch(
                &inputs,
                "mbff-1.0",
                &BatchConfig {
                    n_workers: 4,
                    ..BatchConfig::default()
                },
                &GraphToolkit,
                &ForcefieldResolver::new(),
                &ReferenceBackend::new(),
                &ProgressReporter::new(),
            )
            .unwrap()
        };
        let first = run();
        let second = run();
        for (key, group) in &first.results {
            let other = &second.results[key];
            for (a, b) in group.iter().zip(other) {
                assert_eq!(a.energy, b.energy);
                assert_eq!(a.coordinates, b.coordinates);
            }
        }
    }

    #[test]
    fn one_bad_item_does_not_sink_the_batch() {
        let toolkit = GraphToolkit;
        let mut inputs = grouped_inputs();
        // File a methanol conformer under the water key.
        inputs
            .get_mut(&toolkit.key_for(WATER).unwrap())
            .unwrap()
            .push(methanol_conformer(999));

        let outcome = minimize_batch(
            &inputs,
            "mbff-1.0",
            &BatchConfig::default(),
            &toolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source_id, 999);
        assert_eq!(outcome.total_results(), 4);
    }

    #[test]
    fn progress_counts_every_item() {
        let inputs = grouped_inputs();
        let increments = AtomicU64::new(0);
        let total = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskStart { total: t } => {
                total.store(t, Ordering::SeqCst);
            }
            Progress::TaskIncrement => {
                increments.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }));

        minimize_batch(
            &inputs,
            "mbff-1.0",
            &BatchConfig::default(),
            &GraphToolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            &reporter,
        )
        .unwrap();
        drop(reporter);

        assert_eq!(total.load(Ordering::SeqCst), 4);
        assert_eq!(increments.load(Ordering::SeqCst), 4);
    }
}
