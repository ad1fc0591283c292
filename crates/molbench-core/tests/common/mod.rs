#![allow(dead_code)] // each integration test binary uses a subset

//! Shared fixtures: a small QM result collection of 40 conformers spanning
//! two molecules (28 ethane, 12 methanol), with deterministically jittered
//! geometries in QM-native units.

use molbench::core::models::collection::{QmResultCollection, QmResultEntry};
use molbench::core::units::BOHR_TO_ANGSTROM;

pub const ETHANE: &str = "[C:1]([H:3])([H:4])([H:5])[C:2]([H:6])([H:7])[H:8]";
pub const METHANOL: &str = "[C:1]([H:3])([H:4])([H:5])[O:2][H:6]";

pub const ETHANE_CONFORMERS: usize = 28;
pub const METHANOL_CONFORMERS: usize = 12;

const ETHANE_ANGSTROM: [[f64; 3]; 8] = [
    [0.000, 0.000, 0.000],
    [1.526, 0.000, 0.000],
    [-0.363, -0.514, 0.890],
    [-0.363, -0.514, -0.890],
    [-0.363, 1.028, 0.000],
    [1.889, -1.028, 0.000],
    [1.889, 0.514, 0.890],
    [1.889, 0.514, -0.890],
];

const METHANOL_ANGSTROM: [[f64; 3]; 6] = [
    [0.000, 0.000, 0.000],
    [1.430, 0.000, 0.000],
    [-0.390, -0.520, 0.890],
    [-0.390, -0.520, -0.890],
    [-0.390, 1.030, 0.000],
    [1.770, 0.900, 0.000],
];

fn geometry_bohr(base: &[[f64; 3]], index: usize) -> Vec<f64> {
    // A per-conformer uniform stretch keeps every fixture distinct while
    // staying a plausible starting geometry.
    let scale = (1.0 + 0.004 * index as f64) / BOHR_TO_ANGSTROM;
    base.iter()
        .flat_map(|xyz| xyz.iter().map(move |v| v * scale))
        .collect()
}

pub fn ethane_entry(index: usize) -> QmResultEntry {
    QmResultEntry {
        source_id: 18433000 + index as i64,
        mapped_structure: ETHANE.to_string(),
        final_energy: -79.83 - 0.0001 * index as f64,
        geometry: geometry_bohr(&ETHANE_ANGSTROM, index),
    }
}

pub fn methanol_entry(index: usize) -> QmResultEntry {
    QmResultEntry {
        source_id: 18435000 + index as i64,
        mapped_structure: METHANOL.to_string(),
        final_energy: -115.72 - 0.0001 * index as f64,
        geometry: geometry_bohr(&METHANOL_ANGSTROM, index),
    }
}

pub fn small_collection() -> QmResultCollection {
    let mut entries = Vec::new();
    for index in 0..ETHANE_CONFORMERS {
        entries.push(ethane_entry(index));
    }
    for index in 0..METHANOL_CONFORMERS {
        entries.push(methanol_entry(index));
    }
    QmResultCollection { entries }
}

/// Deterministic reordering that is far from source-id order.
pub fn shuffled(collection: &QmResultCollection) -> QmResultCollection {
    let mut entries = collection.entries.clone();
    entries.sort_by_key(|entry| (entry.source_id * 7919) % 101);
    QmResultCollection { entries }
}
