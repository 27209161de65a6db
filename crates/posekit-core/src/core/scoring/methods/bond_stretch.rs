use super::EnergyMethod;
use crate::core::models::pose::Pose;
use crate::core::scoring::energy_map::{AtomDerivatives, EnergyMap};
use crate::core::scoring::potentials::{harmonic_bond, harmonic_bond_derivative};
use crate::core::scoring::score_type::{ScoreType, ScoreWeights};

/// Harmonic restoring energy `k (r - r0)^2` over every covalent bond.
#[derive(Debug, Clone, PartialEq)]
pub struct BondStretchEnergy {
    pub spring_constant: f64,
}

impl BondStretchEnergy {
    pub fn new(spring_constant: f64) -> Self {
        Self { spring_constant }
    }
}

impl EnergyMethod for BondStretchEnergy {
    fn score_types(&self) -> &[ScoreType] {
        &[ScoreType::BondStretch]
    }

    fn score(&self, pose: &Pose, energies: &mut EnergyMap) {
        let energy: f64 = pose
            .bonds()
            .iter()
            .filter_map(|bond| {
                let p1 = pose.position(bond.atom1_id)?;
                let p2 = pose.position(bond.atom2_id)?;
                Some(harmonic_bond(
                    (p1 - p2).norm(),
                    bond.ideal_length,
                    self.spring_constant,
                ))
            })
            .sum();
        energies.accumulate(ScoreType::BondStretch, energy);
    }

    fn accumulate_derivatives(
        &self,
        pose: &Pose,
        weights: &ScoreWeights,
        derivatives: &mut AtomDerivatives,
    ) {
        let weight = weights.get(ScoreType::BondStretch);
        if weight == 0.0 {
            return;
        }
        for bond in pose.bonds() {
            let (Some(p1), Some(p2)) = (pose.position(bond.atom1_id), pose.position(bond.atom2_id))
            else {
                continue;
            };
            let delta = p1 - p2;
            let dist = delta.norm();
            if dist < 1e-12 {
                continue;
            }
            let de_dr = weight * harmonic_bond_derivative(dist, bond.ideal_length, self.spring_constant);
            let g = delta * (de_dr / dist);
            derivatives.add(bond.atom1_id, g);
            derivatives.add(bond.atom2_id, -g);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{assert_gradients_match_finite_difference, pose_with_atoms};
    use super::*;
    use crate::core::models::topology::BondOrder;

    #[test]
    fn bonds_at_ideal_length_score_zero() {
        let (mut pose, _, ids) = pose_with_atoms(&[
            ("C1", [0.0, 0.0, 0.0], 0.0, None),
            ("C2", [1.5, 0.0, 0.0], 0.0, None),
        ]);
        pose.add_bond(ids[0], ids[1], BondOrder::Single).unwrap();
        let mut map = EnergyMap::new();
        BondStretchEnergy::new(300.0).score(&pose, &mut map);
        assert!(map.get(ScoreType::BondStretch).abs() < 1e-12);
    }

    #[test]
    fn stretched_bond_is_penalized_quadratically() {
        let (mut pose, _, ids) = pose_with_atoms(&[
            ("C1", [0.0, 0.0, 0.0], 0.0, None),
            ("C2", [2.0, 0.0, 0.0], 0.0, None),
        ]);
        pose.add_bond_with_length(ids[0], ids[1], BondOrder::Single, 1.5)
            .unwrap();
        let mut map = EnergyMap::new();
        BondStretchEnergy::new(100.0).score(&pose, &mut map);
        assert!((map.get(ScoreType::BondStretch) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn analytic_gradient_matches_finite_difference() {
        let (mut pose, _, ids) = pose_with_atoms(&[
            ("C1", [0.0, 0.0, 0.0], 0.0, None),
            ("C2", [1.7, 0.2, 0.0], 0.0, None),
            ("O3", [2.3, 1.4, 0.3], 0.0, None),
        ]);
        pose.add_bond_with_length(ids[0], ids[1], BondOrder::Single, 1.53)
            .unwrap();
        pose.add_bond_with_length(ids[1], ids[2], BondOrder::Double, 1.23)
            .unwrap();
        let weights = ScoreWeights::new().with(ScoreType::BondStretch, 1.0);
        assert_gradients_match_finite_difference(&BondStretchEnergy::new(300.0), &pose, &weights);
    }
}
