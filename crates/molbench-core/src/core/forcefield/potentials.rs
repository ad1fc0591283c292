#[inline]
pub fn harmonic_bond(dist: f64, length: f64, force_constant: f64) -> f64 {
    let stretch = dist - length;
    force_constant * stretch * stretch
}

/// dE/dr of [`harmonic_bond`].
#[inline]
pub fn harmonic_bond_gradient(dist: f64, length: f64, force_constant: f64) -> f64 {
    2.0 * force_constant * (dist - length)
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// dE/dr of [`lennard_jones_12_6`].
#[inline]
pub fn lennard_jones_12_6_gradient(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return -1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    12.0 * well_depth * (rho6 - rho12) / dist
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn harmonic_bond_is_zero_at_equilibrium() {
        assert!(f64_approx_equal(harmonic_bond(1.526, 1.526, 310.0), 0.0));
    }

    #[test]
    fn harmonic_bond_is_symmetric_around_equilibrium() {
        let stretched = harmonic_bond(1.6, 1.5, 310.0);
        let compressed = harmonic_bond(1.4, 1.5, 310.0);
        assert!(f64_approx_equal(stretched, compressed));
        assert!(stretched > 0.0);
    }

    #[test]
    fn harmonic_bond_gradient_sign_matches_displacement() {
        assert!(harmonic_bond_gradient(1.6, 1.5, 310.0) > 0.0);
        assert!(harmonic_bond_gradient(1.4, 1.5, 310.0) < 0.0);
        assert!(f64_approx_equal(harmonic_bond_gradient(1.5, 1.5, 310.0), 0.0));
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(2.0, 2.0, 10.0);
        assert!(f64_approx_equal(energy, -10.0));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let energy = lennard_jones_12_6(1e-7, 2.0, 10.0);
        assert!(f64_approx_equal(energy, 1e10));
    }

    #[test]
    fn lennard_jones_gradient_vanishes_at_the_minimum() {
        assert!(f64_approx_equal(lennard_jones_12_6_gradient(2.0, 2.0, 10.0), 0.0));
    }

    #[test]
    fn lennard_jones_gradient_matches_finite_difference() {
        let h = 1e-7;
        for dist in [1.7, 2.0, 2.5, 4.0] {
            let analytic = lennard_jones_12_6_gradient(dist, 2.0, 10.0);
            let numeric = (lennard_jones_12_6(dist + h, 2.0, 10.0)
                - lennard_jones_12_6(dist - h, 2.0, 10.0))
                / (2.0 * h);
            assert!((analytic - numeric).abs() < 1e-4);
        }
    }
}
