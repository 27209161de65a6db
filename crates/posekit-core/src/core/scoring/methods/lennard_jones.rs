use super::{EnergyMethod, NonbondedPair, nonbonded_pairs};
use crate::core::models::pose::Pose;
use crate::core::scoring::energy_map::{AtomDerivatives, EnergyMap};
use crate::core::scoring::potentials::{lennard_jones_12_6, lennard_jones_12_6_derivative};
use crate::core::scoring::score_type::{ScoreType, ScoreWeights};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// 12-6 Lennard-Jones over all non-excluded pairs of parameterized atoms.
///
/// Pair parameters use `r_min = r_i + r_j` and `epsilon = sqrt(eps_i * eps_j)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LennardJonesEnergy {
    pub cutoff: f64,
}

impl LennardJonesEnergy {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    #[inline]
    fn pair_params(pair: &NonbondedPair<'_>) -> Option<(f64, f64)> {
        let p1 = pair.atom1.lj?;
        let p2 = pair.atom2.lj?;
        Some((p1.radius + p2.radius, (p1.well_depth * p2.well_depth).sqrt()))
    }
}

impl EnergyMethod for LennardJonesEnergy {
    fn score_types(&self) -> &[ScoreType] {
        &[ScoreType::LennardJones]
    }

    fn score(&self, pose: &Pose, energies: &mut EnergyMap) {
        let pairs = nonbonded_pairs(pose, self.cutoff, |a| a.lj.is_some());

        #[cfg(not(feature = "parallel"))]
        let iter = pairs.iter();
        #[cfg(feature = "parallel")]
        let iter = pairs.par_iter();

        let energy: f64 = iter
            .filter_map(|pair| {
                Self::pair_params(pair)
                    .map(|(r_min, eps)| lennard_jones_12_6(pair.dist, r_min, eps))
            })
            .sum();
        energies.accumulate(ScoreType::LennardJones, energy);
    }

    fn accumulate_derivatives(
        &self,
        pose: &Pose,
        weights: &ScoreWeights,
        derivatives: &mut AtomDerivatives,
    ) {
        let weight = weights.get(ScoreType::LennardJones);
        if weight == 0.0 {
            return;
        }
        let pairs = nonbonded_pairs(pose, self.cutoff, |a| a.lj.is_some());

        #[cfg(not(feature = "parallel"))]
        let iter = pairs.iter();
        #[cfg(feature = "parallel")]
        let iter = pairs.par_iter();

        let contributions: Vec<_> = iter
            .filter_map(|pair| {
                let (r_min, eps) = Self::pair_params(pair)?;
                let de_dr = weight * lennard_jones_12_6_derivative(pair.dist, r_min, eps);
                let (g1, g2) = pair.gradients(de_dr);
                Some((pair.id1, g1, pair.id2, g2))
            })
            .collect();

        for (id1, g1, id2, g2) in contributions {
            derivatives.add(id1, g1);
            derivatives.add(id2, g2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{assert_gradients_match_finite_difference, pose_with_atoms};
    use super::*;
    use crate::core::models::topology::BondOrder;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn pair_at_combined_radius_scores_negative_well_depth() {
        let (pose, _, _) = pose_with_atoms(&[
            ("C1", [0.0, 0.0, 0.0], 0.0, Some((1.9, 0.1))),
            ("C2", [3.8, 0.0, 0.0], 0.0, Some((1.9, 0.4))),
        ]);
        let mut map = EnergyMap::new();
        LennardJonesEnergy::new(10.0).score(&pose, &mut map);
        assert!((map.get(ScoreType::LennardJones) + 0.2).abs() < TOLERANCE);
    }

    #[test]
    fn excluded_unparameterized_and_distant_pairs_are_skipped() {
        let (mut pose, _, ids) = pose_with_atoms(&[
            ("C1", [0.0, 0.0, 0.0], 0.0, Some((1.9, 0.1))),
            ("C2", [1.5, 0.0, 0.0], 0.0, Some((1.9, 0.1))),
            ("X3", [0.0, 2.0, 0.0], 0.0, None),
            ("C4", [20.0, 0.0, 0.0], 0.0, Some((1.9, 0.1))),
        ]);
        pose.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();

        let mut map = EnergyMap::new();
        LennardJonesEnergy::new(10.0).score(&pose, &mut map);
        assert_eq!(map.get(ScoreType::LennardJones), 0.0);
    }

    #[test]
    fn analytic_gradient_matches_finite_difference() {
        let (pose, _, _) = pose_with_atoms(&[
            ("C1", [0.0, 0.0, 0.0], 0.0, Some((1.9, 0.1))),
            ("N2", [3.1, 0.8, -0.4], 0.0, Some((1.8, 0.15))),
            ("O3", [1.2, 3.3, 0.9], 0.0, Some((1.7, 0.2))),
        ]);
        let weights = ScoreWeights::new().with(ScoreType::LennardJones, 0.7);
        assert_gradients_match_finite_difference(&LennardJonesEnergy::new(12.0), &pose, &weights);
    }
}
