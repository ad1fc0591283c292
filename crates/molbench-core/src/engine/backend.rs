//! The physics-engine seam and the built-in reference backend.
//!
//! [`EnergyBackend`] is the boundary the minimization worker talks to; its
//! interface is engine-native (nanometers, kJ/mol) regardless of how a
//! concrete backend computes. [`ReferenceBackend`] is the bundled
//! implementation: harmonic bond stretches plus Lennard-Jones 12-6
//! non-bonded terms with analytic gradients, minimized by adaptive-step
//! steepest descent at zero temperature.

use nalgebra::{Point3, Vector3};

use super::error::EngineError;
use super::forcefield::ResolvedForcefield;
use crate::core::chem::structure::Structure;
use crate::core::forcefield::potentials;
use crate::core::units::{
    ANGSTROM_TO_NANOMETER, KILOCALORIE_TO_KILOJOULE, KILOJOULE_TO_KILOCALORIE,
    NANOMETER_TO_ANGSTROM,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizedState {
    pub positions_nm: Vec<Point3<f64>>,
    pub energy_kj_per_mol: f64,
    /// Descent iterations actually taken; equals the cap when the tolerance
    /// was never reached.
    pub iterations: usize,
}

pub trait EnergyBackend: Send + Sync {
    /// Builds a simulatable system for `structure` under `forcefield` and
    /// minimizes potential energy from `positions_nm` until the largest
    /// per-atom gradient falls below `tolerance` (kJ/(mol·nm)) or
    /// `max_iterations` is reached, whichever first. Both stopping conditions
    /// report the final coordinates and energy.
    fn minimize_system(
        &self,
        structure: &Structure,
        forcefield: &ResolvedForcefield,
        positions_nm: &[Point3<f64>],
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<MinimizedState, EngineError>;
}

struct BondTerm {
    i: usize,
    j: usize,
    length: f64,
    force_constant: f64,
}

struct VdwTerm {
    i: usize,
    j: usize,
    r_min: f64,
    well_depth: f64,
}

/// Initial steepest-descent step scale, Å²·mol/kcal.
const INITIAL_STEP: f64 = 1e-3;
const MAX_STEP: f64 = 0.1;
const MIN_STEP: f64 = 1e-12;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceBackend;

impl ReferenceBackend {
    pub fn new() -> Self {
        Self
    }

    fn build_terms(
        structure: &Structure,
        forcefield: &ResolvedForcefield,
    ) -> Result<(Vec<BondTerm>, Vec<VdwTerm>), EngineError> {
        let params = &forcefield.params;
        let atoms = structure.atoms();

        let mut bond_terms = Vec::with_capacity(structure.bonds().len());
        for bond in structure.bonds() {
            let element_a = &atoms[bond.a].element;
            let element_b = &atoms[bond.b].element;
            let param = params.bond_param(element_a, element_b).ok_or_else(|| {
                EngineError::MissingParameter {
                    force_field: forcefield.name.clone(),
                    kind: "bond",
                    key: format!("{element_a}-{element_b}"),
                }
            })?;
            bond_terms.push(BondTerm {
                i: bond.a,
                j: bond.b,
                length: param.length,
                force_constant: param.force_constant,
            });
        }

        // Non-bonded pairs: everything except 1-2 and 1-3 neighbors.
        let n = structure.atom_count();
        let adjacency = structure.adjacency();
        let mut excluded = vec![false; n * n];
        for (i, neighbors) in adjacency.iter().enumerate() {
            for &(j, _) in neighbors {
                excluded[i * n + j] = true;
                for &(k, _) in &adjacency[j] {
                    if k != i {
                        excluded[i * n + k] = true;
                        excluded[k * n + i] = true;
                    }
                }
            }
        }

        let mut vdw_terms = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if excluded[i * n + j] {
                    continue;
                }
                let param_i = params.vdw_param(&atoms[i].element).ok_or_else(|| {
                    EngineError::MissingParameter {
                        force_field: forcefield.name.clone(),
                        kind: "vdw",
                        key: atoms[i].element.clone(),
                    }
                })?;
                let param_j = params.vdw_param(&atoms[j].element).ok_or_else(|| {
                    EngineError::MissingParameter {
                        force_field: forcefield.name.clone(),
                        kind: "vdw",
                        key: atoms[j].element.clone(),
                    }
                })?;
                vdw_terms.push(VdwTerm {
                    i,
                    j,
                    r_min: param_i.radius + param_j.radius,
                    well_depth: (param_i.well_depth * param_j.well_depth).sqrt(),
                });
            }
        }

        Ok((bond_terms, vdw_terms))
    }

    fn energy(bond_terms: &[BondTerm], vdw_terms: &[VdwTerm], positions: &[Point3<f64>]) -> f64 {
        let mut energy = 0.0;
        for term in bond_terms {
            let dist = (positions[term.i] - positions[term.j]).norm();
            energy += potentials::harmonic_bond(dist, term.length, term.force_constant);
        }
        for term in vdw_terms {
            let dist = (positions[term.i] - positions[term.j]).norm();
            energy += potentials::lennard_jones_12_6(dist, term.r_min, term.well_depth);
        }
        energy
    }

    fn gradient(
        bond_terms: &[BondTerm],
        vdw_terms: &[VdwTerm],
        positions: &[Point3<f64>],
        gradient: &mut [Vector3<f64>],
    ) {
        for g in gradient.iter_mut() {
            *g = Vector3::zeros();
        }
        let mut accumulate = |i: usize, j: usize, de_dr: f64| {
            let separation = positions[i] - positions[j];
            let dist = separation.norm();
            if dist < 1e-8 {
                return;
            }
            let direction = separation / dist;
            gradient[i] += direction * de_dr;
            gradient[j] -= direction * de_dr;
        };
        for term in bond_terms {
            let dist = (positions[term.i] - positions[term.j]).norm();
            accumulate(
                term.i,
                term.j,
                potentials::harmonic_bond_gradient(dist, term.length, term.force_constant),
            );
        }
        for term in vdw_terms {
            let dist = (positions[term.i] - positions[term.j]).norm();
            accumulate(
                term.i,
                term.j,
                potentials::lennard_jones_12_6_gradient(dist, term.r_min, term.well_depth),
            );
        }
    }
}

impl EnergyBackend for ReferenceBackend {
    fn minimize_system(
        &self,
        structure: &Structure,
        forcefield: &ResolvedForcefield,
        positions_nm: &[Point3<f64>],
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<MinimizedState, EngineError> {
        let (bond_terms, vdw_terms) = Self::build_terms(structure, forcefield)?;

        // Internal computation is Å / kcal·mol⁻¹; the interface is nm / kJ.
        let mut positions: Vec<Point3<f64>> = positions_nm
            .iter()
            .map(|p| Point3::from(p.coords * NANOMETER_TO_ANGSTROM))
            .collect();
        let tolerance_kcal_per_angstrom =
            tolerance * KILOJOULE_TO_KILOCALORIE / NANOMETER_TO_ANGSTROM;

        let mut gradient = vec![Vector3::zeros(); positions.len()];
        let mut energy = Self::energy(&bond_terms, &vdw_terms, &positions);
        Self::gradient(&bond_terms, &vdw_terms, &positions, &mut gradient);

        let mut step = INITIAL_STEP;
        let mut iterations = max_iterations;
        for iteration in 0..max_iterations {
            let largest = gradient.iter().map(|g| g.norm()).fold(0.0f64, f64::max);
            if largest < tolerance_kcal_per_angstrom || step < MIN_STEP {
                iterations = iteration;
                break;
            }

            let trial: Vec<Point3<f64>> = positions
                .iter()
                .zip(&gradient)
                .map(|(p, g)| Point3::from(p.coords - g * step))
                .collect();
            let trial_energy = Self::energy(&bond_terms, &vdw_terms, &trial);

            if trial_energy < energy {
                positions = trial;
                energy = trial_energy;
                Self::gradient(&bond_terms, &vdw_terms, &positions, &mut gradient);
                step = (step * 1.2).min(MAX_STEP);
            } else {
                step *= 0.5;
            }
        }

        Ok(MinimizedState {
            positions_nm: positions
                .iter()
                .map(|p| Point3::from(p.coords * ANGSTROM_TO_NANOMETER))
                .collect(),
            energy_kj_per_mol: energy * KILOCALORIE_TO_KILOJOULE,
            iterations,
        })
    }
}
