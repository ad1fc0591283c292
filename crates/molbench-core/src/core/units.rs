//! Unit conversion constants.
//!
//! Stored records are Ångström / kcal·mol⁻¹. Ingestion input arrives in
//! QM-native units (Bohr / Hartree); the energy backend interface is
//! engine-native (nanometer / kJ·mol⁻¹). All conversions between the three
//! systems go through the constants below.

/// CODATA value for one Hartree expressed in kcal/mol.
pub const HARTREE_TO_KCAL_PER_MOL: f64 = 627.509_474_063_1;

/// CODATA value for one Bohr radius expressed in Ångström.
pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_903;

pub const NANOMETER_TO_ANGSTROM: f64 = 10.0;
pub const ANGSTROM_TO_NANOMETER: f64 = 0.1;

/// Thermochemical calorie.
pub const KILOJOULE_TO_KILOCALORIE: f64 = 1.0 / 4.184;
pub const KILOCALORIE_TO_KILOJOULE: f64 = 4.184;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_conversions_are_inverses() {
        let x = 1.529_f64;
        assert_eq!(x * ANGSTROM_TO_NANOMETER * NANOMETER_TO_ANGSTROM, x);
    }

    #[test]
    fn energy_conversions_are_inverses() {
        let e = -13.7_f64;
        let round_trip = e * KILOCALORIE_TO_KILOJOULE * KILOJOULE_TO_KILOCALORIE;
        assert!((round_trip - e).abs() < 1e-12);
    }

    #[test]
    fn hartree_is_much_larger_than_kcal() {
        assert!(HARTREE_TO_KCAL_PER_MOL > 600.0);
        assert!(HARTREE_TO_KCAL_PER_MOL < 700.0);
    }
}
