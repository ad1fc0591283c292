//! Parser for mapped structural strings.
//!
//! The accepted grammar is a bracket-atom notation with explicit hydrogens
//! and mandatory atom-map indices: `[C:1]([H:3])([H:4])=[O:2]`. Adjacent
//! atoms are single-bonded unless a `=` or `#` symbol intervenes; branches
//! use parentheses; ring closures use single digits after an atom. Map
//! indices must form a contiguous `1..=N` set and define the atom order of
//! the resulting [`Structure`].

use super::ChemError;
use super::structure::{Bond, BondOrder, Structure, StructureAtom};
use std::collections::HashMap;

pub fn parse_mapped(input: &str) -> Result<Structure, ChemError> {
    Parser::new(input).run()
}

struct ParsedAtom {
    map_index: usize,
    element: String,
    formal_charge: i8,
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    atoms: Vec<ParsedAtom>,
    bonds: Vec<(usize, usize, BondOrder)>,
    branch_stack: Vec<usize>,
    ring_bonds: HashMap<char, (usize, Option<BondOrder>)>,
    prev: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            atoms: Vec::new(),
            bonds: Vec::new(),
            branch_stack: Vec::new(),
            ring_bonds: HashMap::new(),
            prev: None,
            pending_bond: None,
        }
    }

    fn error(&self, message: impl Into<String>) -> ChemError {
        ChemError::MalformedStructure {
            input: self.input.to_string(),
            message: message.into(),
        }
    }

    fn run(mut self) -> Result<Structure, ChemError> {
        while let Some(&(pos, c)) = self.chars.peek() {
            match c {
                '[' => {
                    self.chars.next();
                    self.parse_atom(pos)?;
                }
                '(' => {
                    self.chars.next();
                    let anchor = self
                        .prev
                        .ok_or_else(|| self.error("branch opened before any atom"))?;
                    self.branch_stack.push(anchor);
                }
                ')' => {
                    self.chars.next();
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond symbol before ')'"));
                    }
                    self.prev = Some(
                        self.branch_stack
                            .pop()
                            .ok_or_else(|| self.error("unbalanced ')'"))?,
                    );
                }
                '-' | '=' | '#' => {
                    self.chars.next();
                    if self.pending_bond.is_some() {
                        return Err(self.error("consecutive bond symbols"));
                    }
                    self.pending_bond = Some(match c {
                        '-' => BondOrder::Single,
                        '=' => BondOrder::Double,
                        _ => BondOrder::Triple,
                    });
                }
                '1'..='9' => {
                    self.chars.next();
                    self.close_or_open_ring(c)?;
                }
                _ => {
                    return Err(self.error(format!("unexpected character '{c}' at byte {pos}")));
                }
            }
        }
        self.finish()
    }

    fn parse_atom(&mut self, open_pos: usize) -> Result<(), ChemError> {
        let element = self.parse_element(open_pos)?;
        let formal_charge = self.parse_charge()?;

        match self.chars.next() {
            Some((_, ':')) => {}
            _ => return Err(self.error("expected ':' and a map index inside brackets")),
        }
        let map_index = self.parse_number()?;
        if map_index == 0 {
            return Err(self.error("map indices are 1-based"));
        }
        match self.chars.next() {
            Some((_, ']')) => {}
            _ => return Err(self.error("unclosed bracket atom")),
        }

        let index = self.atoms.len();
        self.atoms.push(ParsedAtom {
            map_index,
            element,
            formal_charge,
        });
        if let Some(prev) = self.prev {
            let order = self.pending_bond.take().unwrap_or(BondOrder::Single);
            self.bonds.push((prev, index, order));
        } else if self.pending_bond.is_some() {
            return Err(self.error("bond symbol before the first atom"));
        }
        self.prev = Some(index);
        Ok(())
    }

    fn parse_element(&mut self, open_pos: usize) -> Result<String, ChemError> {
        let mut element = String::new();
        match self.chars.peek() {
            Some(&(_, c)) if c.is_ascii_uppercase() => {
                element.push(c);
                self.chars.next();
            }
            _ => {
                return Err(
                    self.error(format!("expected an element symbol at byte {}", open_pos + 1))
                );
            }
        }
        if let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_lowercase() {
                element.push(c);
                self.chars.next();
            }
        }
        Ok(element)
    }

    fn parse_charge(&mut self) -> Result<i8, ChemError> {
        let sign = match self.chars.peek() {
            Some(&(_, '+')) => 1i8,
            Some(&(_, '-')) => -1i8,
            _ => return Ok(0),
        };
        self.chars.next();
        let magnitude = match self.chars.peek() {
            Some(&(_, c)) if c.is_ascii_digit() => {
                self.chars.next();
                c.to_digit(10).unwrap() as i8
            }
            _ => 1,
        };
        Ok(sign * magnitude)
    }

    fn parse_number(&mut self) -> Result<usize, ChemError> {
        let mut value: usize = 0;
        let mut seen = false;
        while let Some(&(_, c)) = self.chars.peek() {
            if let Some(d) = c.to_digit(10) {
                seen = true;
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d as usize))
                    .ok_or_else(|| self.error("map index overflow"))?;
                self.chars.next();
            } else {
                break;
            }
        }
        if !seen {
            return Err(self.error("expected a map index"));
        }
        Ok(value)
    }

    fn close_or_open_ring(&mut self, label: char) -> Result<(), ChemError> {
        let here = self
            .prev
            .ok_or_else(|| self.error("ring closure digit before any atom"))?;
        match self.ring_bonds.remove(&label) {
            Some((partner, opening_order)) => {
                if partner == here {
                    return Err(self.error(format!("ring closure '{label}' bonds an atom to itself")));
                }
                let order = self
                    .pending_bond
                    .take()
                    .or(opening_order)
                    .unwrap_or(BondOrder::Single);
                self.bonds.push((partner, here, order));
            }
            None => {
                self.ring_bonds
                    .insert(label, (here, self.pending_bond.take()));
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Structure, ChemError> {
        if self.atoms.is_empty() {
            return Err(self.error("no atoms"));
        }
        if !self.branch_stack.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if self.pending_bond.is_some() {
            return Err(self.error("dangling bond symbol at end of input"));
        }
        if !self.ring_bonds.is_empty() {
            let mut labels: Vec<char> = self.ring_bonds.keys().copied().collect();
            labels.sort_unstable();
            return Err(self.error(format!("unclosed ring closure(s): {labels:?}")));
        }

        // Map indices must form a contiguous 1..=N set; they define the
        // final atom order.
        let n = self.atoms.len();
        let mut position_of_parse_index = vec![usize::MAX; n];
        for (parse_index, atom) in self.atoms.iter().enumerate() {
            if atom.map_index > n {
                return Err(ChemError::MalformedStructure {
                    input: self.input.to_string(),
                    message: format!(
                        "map index {} out of range for {} atoms",
                        atom.map_index, n
                    ),
                });
            }
            position_of_parse_index[parse_index] = atom.map_index - 1;
        }
        let mut seen = vec![false; n];
        for &slot in &position_of_parse_index {
            if seen[slot] {
                return Err(ChemError::MalformedStructure {
                    input: self.input.to_string(),
                    message: format!("duplicate map index {}", slot + 1),
                });
            }
            seen[slot] = true;
        }

        let mut atoms = vec![None; n];
        for (parse_index, atom) in self.atoms.into_iter().enumerate() {
            atoms[position_of_parse_index[parse_index]] = Some(StructureAtom {
                element: atom.element,
                formal_charge: atom.formal_charge,
            });
        }
        let atoms: Vec<StructureAtom> = atoms.into_iter().map(Option::unwrap).collect();

        let bonds = self
            .bonds
            .into_iter()
            .map(|(a, b, order)| Bond {
                a: position_of_parse_index[a],
                b: position_of_parse_index[b],
                order,
            })
            .collect();

        Ok(Structure::new(atoms, bonds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ethane_with_explicit_hydrogens() {
        let s = parse_mapped("[C:1]([H:3])([H:4])([H:5])[C:2]([H:6])([H:7])[H:8]").unwrap();
        assert_eq!(s.atom_count(), 8);
        assert_eq!(s.bonds().len(), 7);
        assert_eq!(s.atoms()[0].element, "C");
        assert_eq!(s.atoms()[1].element, "C");
        assert_eq!(s.atoms()[2].element, "H");
    }

    #[test]
    fn map_indices_define_atom_order() {
        let s = parse_mapped("[H:2]-[O:1]-[H:3]").unwrap();
        assert_eq!(s.atoms()[0].element, "O");
        assert_eq!(s.atoms()[1].element, "H");
        assert_eq!(s.atoms()[2].element, "H");
        // Both bonds attach to the oxygen at position 0.
        for bond in s.bonds() {
            assert!(bond.a == 0 || bond.b == 0);
        }
    }

    #[test]
    fn parses_double_bonds_and_charges() {
        let s = parse_mapped("[C:1]=[O:2]").unwrap();
        assert_eq!(s.bonds()[0].order, BondOrder::Double);

        let s = parse_mapped("[N+:1]([H:2])([H:3])([H:4])[H:5]").unwrap();
        assert_eq!(s.atoms()[0].formal_charge, 1);
    }

    #[test]
    fn parses_ring_closures() {
        // Cyclopropane skeleton without hydrogens.
        let s = parse_mapped("[C:1]1[C:2][C:3]1").unwrap();
        assert_eq!(s.atom_count(), 3);
        assert_eq!(s.bonds().len(), 3);
    }

    #[test]
    fn rejects_garbage() {
        for bad in [
            "",
            "CCO",
            "[C:1",
            "[C]",
            "[c:1]",
            "[C:0]",
            "[C:1][C:1]",
            "[C:1][C:3]",
            "[C:1](",
            "[C:1])",
            "[C:1]=",
            "[C:1]1[C:2]",
            "[C:1]=-[C:2]",
        ] {
            assert!(
                matches!(
                    parse_mapped(bad),
                    Err(ChemError::MalformedStructure { .. })
                ),
                "expected parse failure for {bad:?}"
            );
        }
    }
}
