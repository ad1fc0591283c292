//! Canonical structural identity.
//!
//! A [`StructuralKey`] is a deterministic, atom-order-insensitive hash of a
//! structure graph, computed from iteratively refined neighborhood ranks
//! (Morgan-style). Because hydrogens are explicit in mapped structural
//! strings, the key inherits a fixed hydrogen-placement convention from the
//! input representation. The same ranks yield the canonical atom order every
//! coordinate array is permuted into before minimization.

use super::ChemError;
use super::structure::Structure;
use std::fmt;

/// Canonical identifier for a molecular graph.
///
/// Two mapped structural strings describing the same graph (up to atom
/// permutation) produce equal keys; the key is stable across processes and
/// releases, so it is safe to persist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructuralKey(String);

impl StructuralKey {
    /// Wraps an already-computed key, e.g. one read back from a store.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A permutation of atom indices: `map[i]` is the source position of the atom
/// that lands at target position `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomMap(Vec<usize>);

impl AtomMap {
    pub fn new(map: Vec<usize>) -> Self {
        Self(map)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &j)| i == j)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// The permutation that undoes this one.
    pub fn inverse(&self) -> AtomMap {
        let mut inverse = vec![0usize; self.0.len()];
        for (target, &source) in self.0.iter().enumerate() {
            inverse[source] = target;
        }
        AtomMap(inverse)
    }
}

// FNV-1a; chosen for stability across builds, not for cryptographic strength.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    let mut hash = seed;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn fnv1a_u64(seed: u64, value: u64) -> u64 {
    fnv1a(seed, &value.to_le_bytes())
}

/// Iteratively refined neighborhood rank per atom. Structurally equivalent
/// atoms end up with equal ranks; distinct environments diverge with
/// overwhelming probability for practical molecule populations.
pub fn canonical_ranks(structure: &Structure) -> Vec<u64> {
    let n = structure.atom_count();
    let adjacency = structure.adjacency();

    let mut ranks: Vec<u64> = structure
        .atoms()
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            let mut h = fnv1a(FNV_OFFSET_BASIS, atom.element.as_bytes());
            h = fnv1a(h, &atom.formal_charge.to_le_bytes());
            h = fnv1a_u64(h, adjacency[i].len() as u64);
            h
        })
        .collect();

    let mut distinct = count_distinct(&ranks);
    for _ in 0..n {
        let mut next = Vec::with_capacity(n);
        for i in 0..n {
            let mut neighborhood: Vec<u64> = adjacency[i]
                .iter()
                .map(|&(j, order)| fnv1a_u64(u64::from(order.as_u8()), ranks[j]))
                .collect();
            neighborhood.sort_unstable();

            let mut h = fnv1a_u64(FNV_OFFSET_BASIS, ranks[i]);
            for value in neighborhood {
                h = fnv1a_u64(h, value);
            }
            next.push(h);
        }
        let next_distinct = count_distinct(&next);
        ranks = next;
        if next_distinct == distinct {
            break;
        }
        distinct = next_distinct;
    }
    ranks
}

fn count_distinct(ranks: &[u64]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Computes the canonical key of a structure, insensitive to atom order.
pub fn canonical_key(structure: &Structure) -> StructuralKey {
    let ranks = canonical_ranks(structure);

    let mut atom_records: Vec<u64> = structure
        .atoms()
        .iter()
        .zip(&ranks)
        .map(|(atom, &rank)| {
            let mut h = fnv1a_u64(FNV_OFFSET_BASIS, rank);
            h = fnv1a(h, atom.element.as_bytes());
            fnv1a(h, &atom.formal_charge.to_le_bytes())
        })
        .collect();
    atom_records.sort_unstable();

    let mut bond_records: Vec<u64> = structure
        .bonds()
        .iter()
        .map(|bond| {
            let (low, high) = if ranks[bond.a] <= ranks[bond.b] {
                (ranks[bond.a], ranks[bond.b])
            } else {
                (ranks[bond.b], ranks[bond.a])
            };
            let mut h = fnv1a_u64(FNV_OFFSET_BASIS, low);
            h = fnv1a_u64(h, high);
            fnv1a_u64(h, u64::from(bond.order.as_u8()))
        })
        .collect();
    bond_records.sort_unstable();

    let mut h = fnv1a_u64(FNV_OFFSET_BASIS, structure.atom_count() as u64);
    h = fnv1a_u64(h, structure.bonds().len() as u64);
    for record in atom_records.into_iter().chain(bond_records) {
        h = fnv1a_u64(h, record);
    }
    StructuralKey(format!("{h:016x}"))
}

/// Permutation from a structure's native (map-index) atom order into canonical
/// rank order; rank ties fall back to the native order, which for equivalent
/// atoms is an arbitrary but valid automorphism choice.
pub fn canonical_order(structure: &Structure) -> AtomMap {
    let ranks = canonical_ranks(structure);
    let mut order: Vec<usize> = (0..structure.atom_count()).collect();
    order.sort_by_key(|&i| (ranks[i], i));
    AtomMap::new(order)
}

/// Confirms `reference` and `other` denote the same graph up to atom
/// permutation and returns the map taking `other`'s atom order onto
/// `reference`'s: `map[reference_index] = other_index`.
pub fn atom_map(reference: &Structure, other: &Structure) -> Result<AtomMap, ChemError> {
    let reference_key = canonical_key(reference);
    let other_key = canonical_key(other);
    if reference_key != other_key {
        return Err(ChemError::StructureMismatch {
            reference_key: reference_key.to_string(),
            other_key: other_key.to_string(),
        });
    }

    let reference_order = canonical_order(reference);
    let other_order = canonical_order(other);

    // Atoms at the same canonical position correspond.
    let mut map = vec![0usize; reference.atom_count()];
    for (canonical_position, &reference_index) in
        reference_order.as_slice().iter().enumerate()
    {
        map[reference_index] = other_order.as_slice()[canonical_position];
    }
    Ok(AtomMap::new(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::parse::parse_mapped;

    const ETHANE: &str = "[C:1]([H:3])([H:4])([H:5])[C:2]([H:6])([H:7])[H:8]";
    // Same graph, different map assignment: atom order genuinely differs.
    const ETHANE_SHUFFLED: &str = "[H:1][C:2]([H:3])([H:4])[C:5]([H:6])([H:7])[H:8]";
    const METHANOL: &str = "[C:1]([H:3])([H:4])([H:5])[O:2][H:6]";

    #[test]
    fn key_is_insensitive_to_atom_order() {
        let a = canonical_key(&parse_mapped(ETHANE).unwrap());
        let b = canonical_key(&parse_mapped(ETHANE_SHUFFLED).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_molecules_get_distinct_keys() {
        let ethane = canonical_key(&parse_mapped(ETHANE).unwrap());
        let methanol = canonical_key(&parse_mapped(METHANOL).unwrap());
        assert_ne!(ethane, methanol);
    }

    #[test]
    fn bond_order_changes_the_key() {
        let single = canonical_key(&parse_mapped("[C:1][C:2]").unwrap());
        let double = canonical_key(&parse_mapped("[C:1]=[C:2]").unwrap());
        assert_ne!(single, double);
    }

    #[test]
    fn charge_changes_the_key() {
        let neutral = canonical_key(&parse_mapped("[N:1]([H:2])([H:3])[H:4]").unwrap());
        let charged = canonical_key(&parse_mapped("[N+:1]([H:2])([H:3])[H:4]").unwrap());
        assert_ne!(neutral, charged);
    }

    #[test]
    fn canonical_order_is_a_permutation() {
        let structure = parse_mapped(ETHANE).unwrap();
        let order = canonical_order(&structure);
        let mut seen = vec![false; structure.atom_count()];
        for &i in order.as_slice() {
            assert!(!seen[i]);
            seen[i] = true;
        }
    }

    #[test]
    fn atom_map_preserves_elements() {
        let reference = parse_mapped(ETHANE).unwrap();
        let other = parse_mapped(ETHANE_SHUFFLED).unwrap();
        let map = atom_map(&reference, &other).unwrap();
        for (reference_index, &other_index) in map.as_slice().iter().enumerate() {
            assert_eq!(
                reference.atoms()[reference_index].element,
                other.atoms()[other_index].element
            );
        }
    }

    #[test]
    fn atom_map_rejects_different_molecules() {
        let reference = parse_mapped(ETHANE).unwrap();
        let other = parse_mapped(METHANOL).unwrap();
        assert!(matches!(
            atom_map(&reference, &other),
            Err(ChemError::StructureMismatch { .. })
        ));
    }

    #[test]
    fn key_is_stable() {
        // Persisted keys must not drift between releases.
        let water = canonical_key(&parse_mapped("[O:1]([H:2])[H:3]").unwrap());
        assert_eq!(water.as_str().len(), 16);
        assert_eq!(water, canonical_key(&parse_mapped("[H:2][O:1][H:3]").unwrap()));
    }
}
