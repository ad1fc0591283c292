use super::identity::AtomMap;

/// Bond multiplicity in a structure graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
}

impl BondOrder {
    pub fn as_u8(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureAtom {
    /// Element symbol, e.g. `"C"` or `"Cl"`.
    pub element: String,
    pub formal_charge: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

/// A molecular graph with explicit hydrogens.
///
/// Atom positions follow the map-index order of the mapped structural string
/// the graph was parsed from: atom `i` carried map index `i + 1`. That order
/// is the concrete atom ordering every coordinate array for this structure is
/// expressed in until the canonical permutation is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    atoms: Vec<StructureAtom>,
    bonds: Vec<Bond>,
}

impl Structure {
    pub fn new(atoms: Vec<StructureAtom>, bonds: Vec<Bond>) -> Self {
        Self { atoms, bonds }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[StructureAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Reorders atoms by a permutation (`map[i]` = current position of the
    /// atom that lands at position `i`), rewriting bond endpoints to match.
    pub fn permuted(&self, map: &AtomMap) -> Structure {
        let atoms = map
            .as_slice()
            .iter()
            .map(|&i| self.atoms[i].clone())
            .collect();
        let inverse = map.inverse();
        let bonds = self
            .bonds
            .iter()
            .map(|bond| Bond {
                a: inverse.as_slice()[bond.a],
                b: inverse.as_slice()[bond.b],
                order: bond.order,
            })
            .collect();
        Structure::new(atoms, bonds)
    }

    /// Neighbor list per atom as `(neighbor index, bond order)` pairs.
    pub fn adjacency(&self) -> Vec<Vec<(usize, BondOrder)>> {
        let mut adjacency = vec![Vec::new(); self.atoms.len()];
        for bond in &self.bonds {
            adjacency[bond.a].push((bond.b, bond.order));
            adjacency[bond.b].push((bond.a, bond.order));
        }
        adjacency
    }
}
