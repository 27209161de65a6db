//! Closed-form pair potentials and their first derivatives with respect to distance.
//!
//! All energies are in kcal/mol and distances in Angstroms. Every function has a
//! `_derivative` partner returning dE/dr, which the energy methods chain with
//! dr/dx to produce Cartesian gradients.

pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

const MIN_DISTANCE: f64 = 1e-6;
const CLASH_ENERGY: f64 = 1e10;

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return CLASH_ENERGY;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return 0.0;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    -12.0 * well_depth * (rho12 - rho6) / dist
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return q1.signum() * q2.signum() * CLASH_ENERGY;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

#[inline]
pub fn coulomb_derivative(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return 0.0;
    }
    -COULOMB_CONSTANT * q1 * q2 / (dielectric * dist * dist)
}

/// Coulomb with a distance-dependent dielectric, `epsilon(r) = dielectric * r`.
#[inline]
pub fn coulomb_distance_dependent(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return q1.signum() * q2.signum() * CLASH_ENERGY;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist * dist)
}

#[inline]
pub fn coulomb_distance_dependent_derivative(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return 0.0;
    }
    -2.0 * COULOMB_CONSTANT * q1 * q2 / (dielectric * dist * dist * dist)
}

#[inline]
pub fn harmonic_bond(dist: f64, ideal_length: f64, spring_constant: f64) -> f64 {
    let dr = dist - ideal_length;
    spring_constant * dr * dr
}

#[inline]
pub fn harmonic_bond_derivative(dist: f64, ideal_length: f64, spring_constant: f64) -> f64 {
    2.0 * spring_constant * (dist - ideal_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn central_difference(f: impl Fn(f64) -> f64, x: f64) -> f64 {
        let h = 1e-6;
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(2.0, 2.0, 10.0);
        assert!(f64_approx_equal(energy, -10.0));
        assert!(f64_approx_equal(lennard_jones_12_6_derivative(2.0, 2.0, 10.0), 0.0));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let energy = lennard_jones_12_6(1e-7, 2.0, 10.0);
        assert!(f64_approx_equal(energy, 1e10));
    }

    #[test]
    fn lennard_jones_derivative_matches_finite_difference() {
        for dist in [1.6, 2.3, 3.5, 6.0] {
            let numeric = central_difference(|r| lennard_jones_12_6(r, 3.4, 0.2), dist);
            let analytic = lennard_jones_12_6_derivative(dist, 3.4, 0.2);
            assert!((numeric - analytic).abs() < 1e-4 * analytic.abs().max(1.0));
        }
    }

    #[test]
    fn coulomb_calculates_repulsive_force_correctly() {
        let energy = coulomb(1.0, 1.0, 1.0, 1.0);
        assert!(f64_approx_equal(energy, COULOMB_CONSTANT));
    }

    #[test]
    fn coulomb_calculates_attractive_force_correctly() {
        let energy = coulomb(2.0, 1.0, -1.0, 1.0);
        assert!(f64_approx_equal(energy, -COULOMB_CONSTANT / 2.0));
    }

    #[test]
    fn coulomb_at_very_small_distance_returns_large_energy_with_correct_sign() {
        assert!(f64_approx_equal(coulomb(1e-7, 1.0, 1.0, 1.0), 1e10));
        assert!(f64_approx_equal(coulomb(1e-7, -1.0, 1.0, 1.0), -1e10));
    }

    #[test]
    fn coulomb_derivatives_match_finite_differences() {
        for dist in [1.5, 3.0, 7.25] {
            let numeric = central_difference(|r| coulomb(r, 0.4, -0.3, 4.0), dist);
            assert!((numeric - coulomb_derivative(dist, 0.4, -0.3, 4.0)).abs() < 1e-5);

            let numeric = central_difference(|r| coulomb_distance_dependent(r, 0.4, -0.3, 4.0), dist);
            let analytic = coulomb_distance_dependent_derivative(dist, 0.4, -0.3, 4.0);
            assert!((numeric - analytic).abs() < 1e-5);
        }
    }

    #[test]
    fn distance_dependent_coulomb_scales_with_inverse_square() {
        let near = coulomb_distance_dependent(1.0, 1.0, 1.0, 1.0);
        let far = coulomb_distance_dependent(2.0, 1.0, 1.0, 1.0);
        assert!(f64_approx_equal(near / far, 4.0));
    }

    #[test]
    fn harmonic_bond_is_zero_at_ideal_length() {
        assert!(f64_approx_equal(harmonic_bond(1.5, 1.5, 300.0), 0.0));
        assert!(f64_approx_equal(harmonic_bond(1.6, 1.5, 300.0), 3.0));
        assert!(f64_approx_equal(harmonic_bond_derivative(1.6, 1.5, 300.0), 60.0));
    }
}
