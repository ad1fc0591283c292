//! The per-conformer minimization worker.
//!
//! One worker call takes a (structure, starting coordinates, force field)
//! triple, verifies the mapped structure against the structural key it was
//! filed under, reinterprets the coordinates in canonical atom order, runs
//! the bounded minimization through the [`EnergyBackend`] seam, and reports
//! coordinates back in the caller's atom order and units (Å, kcal/mol).
//! Apart from force-field cache population it is a pure function of its
//! arguments.

use tracing::{debug, instrument};

use super::backend::EnergyBackend;
use super::error::EngineError;
use super::forcefield::ForcefieldResolver;
use crate::core::chem::ChemError;
use crate::core::chem::identity::StructuralKey;
use crate::core::chem::toolkit::StructureToolkit;
use crate::core::models::coordinates::{CoordinateError, Coordinates};
use crate::core::units::{
    ANGSTROM_TO_NANOMETER, KILOJOULE_TO_KILOCALORIE, NANOMETER_TO_ANGSTROM,
};

/// Gradient tolerance in kJ/(mol·nm); in practice the iteration cap fires
/// first and the minimizer runs to numerical quiescence.
pub const DEFAULT_TOLERANCE: f64 = 5.0e-9;
pub const DEFAULT_MAX_ITERATIONS: usize = 1500;

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationInput {
    pub structural_key: StructuralKey,
    /// Externally assigned id of the QM conformer these coordinates came from.
    pub source_id: i64,
    pub force_field: String,
    pub mapped_structure: String,
    /// Starting geometry in Å, in the mapped structure's atom order.
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationResult {
    pub structural_key: StructuralKey,
    pub source_id: i64,
    pub force_field: String,
    pub mapped_structure: String,
    /// Minimized geometry in Å, in the same atom order as the input.
    pub coordinates: Coordinates,
    /// Minimized potential energy in kcal/mol.
    pub energy: f64,
}

#[instrument(skip_all, fields(source_id = input.source_id, force_field = %input.force_field))]
pub fn minimize<T, B>(
    input: &MinimizationInput,
    toolkit: &T,
    forcefields: &ForcefieldResolver,
    backend: &B,
    tolerance: f64,
    max_iterations: usize,
) -> Result<MinimizationResult, EngineError>
where
    T: StructureToolkit + ?Sized,
    B: EnergyBackend + ?Sized,
{
    let structure = toolkit.parse_mapped(&input.mapped_structure)?;

    // The mapped structure must denote the molecule it was filed under.
    let computed_key = toolkit.canonical_key(&structure);
    if computed_key != input.structural_key {
        return Err(ChemError::StructureMismatch {
            reference_key: input.structural_key.to_string(),
            other_key: computed_key.to_string(),
        }
        .into());
    }

    if input.coordinates.len() != structure.atom_count() {
        return Err(CoordinateError::Shape {
            values: input.coordinates.len() * 3,
            expected: structure.atom_count(),
        }
        .into());
    }

    // Reinterpret everything in canonical atom order before the physics
    // engine sees it.
    let order = toolkit.canonical_order(&structure);
    let canonical_structure = structure.permuted(&order);
    let canonical_start = input.coordinates.permuted(&order)?;

    let forcefield = forcefields.resolve(&input.force_field)?;

    let start_nm: Vec<_> = canonical_start
        .scaled(ANGSTROM_TO_NANOMETER)
        .points()
        .to_vec();
    let state = backend.minimize_system(
        &canonical_structure,
        &forcefield,
        &start_nm,
        tolerance,
        max_iterations,
    )?;
    debug!(iterations = state.iterations, "Minimization finished.");

    let minimized_canonical =
        Coordinates::new(state.positions_nm).scaled(NANOMETER_TO_ANGSTROM);
    let coordinates = minimized_canonical.permuted(&order.inverse())?;

    Ok(MinimizationResult {
        structural_key: input.structural_key.clone(),
        source_id: input.source_id,
        force_field: input.force_field.clone(),
        mapped_structure: input.mapped_structure.clone(),
        coordinates,
        energy: state.energy_kj_per_mol * KILOJOULE_TO_KILOCALORIE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::toolkit::GraphToolkit;
    use crate::engine::backend::ReferenceBackend;
    use nalgebra::Point3;

    const ETHANE: &str = "[C:1]([H:3])([H:4])([H:5])[C:2]([H:6])([H:7])[H:8]";

    fn ethane_coordinates(scale: f64) -> Coordinates {
        // A reasonable staggered ethane, optionally stretched uniformly.
        let raw = [
            [0.000, 0.000, 0.000],
            [1.526, 0.000, 0.000],
            [-0.363, -0.514, 0.890],
            [-0.363, -0.514, -0.890],
            [-0.363, 1.028, 0.000],
            [1.889, -1.028, 0.000],
            [1.889, 0.514, 0.890],
            [1.889, 0.514, -0.890],
        ];
        Coordinates::new(
            raw.iter()
                .map(|xyz| Point3::new(xyz[0] * scale, xyz[1] * scale, xyz[2] * scale))
                .collect(),
        )
    }

    fn basic_input(force_field: &str, scale: f64) -> MinimizationInput {
        let toolkit = GraphToolkit;
        MinimizationInput {
            structural_key: toolkit.key_for(ETHANE).unwrap(),
            source_id: 1,
            force_field: force_field.to_string(),
            mapped_structure: ETHANE.to_string(),
            coordinates: ethane_coordinates(scale),
        }
    }

    #[test]
    fn minimization_restores_a_stretched_bond() {
        let input = basic_input("mbff-1.0", 1.2);
        let initial =
            (input.coordinates.points()[0] - input.coordinates.points()[1]).norm();
        assert!(initial > 1.6);

        let result = minimize(
            &input,
            &GraphToolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            DEFAULT_TOLERANCE,
            DEFAULT_MAX_ITERATIONS,
        )
        .unwrap();

        assert_eq!(result.structural_key, input.structural_key);
        assert_eq!(result.source_id, input.source_id);
        assert_eq!(result.mapped_structure, input.mapped_structure);

        let settled = (result.coordinates.points()[0] - result.coordinates.points()[1]).norm();
        assert!(
            settled > 1.4 && settled < 1.65,
            "C-C distance {settled} Å did not settle near equilibrium"
        );
    }

    #[test]
    fn same_force_field_same_results() {
        let resolver = ForcefieldResolver::new();
        let backend = ReferenceBackend::new();
        let run = || {
            minimize(
                &basic_input("mbff-1.0", 1.2),
                &GraphToolkit,
                &resolver,
                &backend,
                DEFAULT_TOLERANCE,
                DEFAULT_MAX_ITERATIONS,
            )
            .unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first.energy, second.energy);
        assert_eq!(first.coordinates, second.coordinates);
    }

    #[test]
    fn different_force_fields_different_results() {
        let resolver = ForcefieldResolver::new();
        let backend = ReferenceBackend::new();
        let energy = |name: &str| {
            minimize(
                &basic_input(name, 1.2),
                &GraphToolkit,
                &resolver,
                &backend,
                DEFAULT_TOLERANCE,
                DEFAULT_MAX_ITERATIONS,
            )
            .unwrap()
            .energy
        };
        assert_ne!(energy("mbff-1.0"), energy("mbff-2.0"));
    }

    #[test]
    fn key_mismatch_aborts_the_item() {
        let mut input = basic_input("mbff-1.0", 1.0);
        input.structural_key = StructuralKey::from_raw("0000000000000000");

        let result = minimize(
            &input,
            &GraphToolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            DEFAULT_TOLERANCE,
            DEFAULT_MAX_ITERATIONS,
        );
        assert!(matches!(
            result,
            Err(EngineError::Chem(ChemError::StructureMismatch { .. }))
        ));
    }

    #[test]
    fn malformed_structure_aborts_the_item() {
        let mut input = basic_input("mbff-1.0", 1.0);
        input.mapped_structure = "not a structure".to_string();

        let result = minimize(
            &input,
            &GraphToolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            DEFAULT_TOLERANCE,
            DEFAULT_MAX_ITERATIONS,
        );
        assert!(matches!(
            result,
            Err(EngineError::Chem(ChemError::MalformedStructure { .. }))
        ));
    }

    #[test]
    fn wrong_atom_count_aborts_the_item() {
        let mut input = basic_input("mbff-1.0", 1.0);
        input.coordinates = Coordinates::new(vec![Point3::origin(); 3]);

        let result = minimize(
            &input,
            &GraphToolkit,
            &ForcefieldResolver::new(),
            &ReferenceBackend::new(),
            DEFAULT_TOLERANCE,
            DEFAULT_MAX_ITERATIONS,
        );
        assert!(matches!(
            result,
            Err(EngineError::Coordinates(CoordinateError::Shape { .. }))
        ));
    }
}
