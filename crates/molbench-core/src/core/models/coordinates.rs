use crate::core::chem::identity::AtomMap;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinateError {
    #[error("coordinate array of {values} values does not describe {expected} atoms")]
    Shape { values: usize, expected: usize },

    #[error("coordinate blob of {bytes} bytes is not a whole number of 3-vectors")]
    Blob { bytes: usize },

    #[error("atom map of length {map} applied to {atoms} atoms")]
    MapLength { map: usize, atoms: usize },
}

/// A conformer geometry: one 3-vector per atom, in Ångström, in a concrete
/// atom order.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates(Vec<Point3<f64>>);

impl Coordinates {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self(points)
    }

    /// Builds from a flat `[x0, y0, z0, x1, ...]` array, checking the value
    /// count against the expected atom count (not merely divisibility by 3).
    pub fn from_flat(values: &[f64], expected_atoms: usize) -> Result<Self, CoordinateError> {
        if values.len() != expected_atoms * 3 {
            return Err(CoordinateError::Shape {
                values: values.len(),
                expected: expected_atoms,
            });
        }
        Ok(Self(
            values
                .chunks_exact(3)
                .map(|xyz| Point3::new(xyz[0], xyz[1], xyz[2]))
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.0
    }

    /// Applies an atom permutation: the returned coordinates place
    /// `self[map[i]]` at position `i`.
    pub fn permuted(&self, map: &AtomMap) -> Result<Self, CoordinateError> {
        if map.len() != self.0.len() {
            return Err(CoordinateError::MapLength {
                map: map.len(),
                atoms: self.0.len(),
            });
        }
        Ok(Self(map.as_slice().iter().map(|&i| self.0[i]).collect()))
    }

    /// Fixed-layout binary form: N×3 little-endian f64, row per atom.
    /// Round-trips bit-for-bit through [`Coordinates::from_blob`].
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.0.len() * 3 * 8);
        for point in &self.0 {
            for value in [point.x, point.y, point.z] {
                blob.extend_from_slice(&value.to_le_bytes());
            }
        }
        blob
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, CoordinateError> {
        if blob.len() % 24 != 0 {
            return Err(CoordinateError::Blob { bytes: blob.len() });
        }
        Ok(Self(
            blob.chunks_exact(24)
                .map(|row| {
                    let mut xyz = [0.0f64; 3];
                    for (value, bytes) in xyz.iter_mut().zip(row.chunks_exact(8)) {
                        *value = f64::from_le_bytes(bytes.try_into().unwrap());
                    }
                    Point3::new(xyz[0], xyz[1], xyz[2])
                })
                .collect(),
        ))
    }

    /// Uniform rescale of every component, for unit conversion.
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|p| Point3::from(p.coords * factor)).collect())
    }
}
