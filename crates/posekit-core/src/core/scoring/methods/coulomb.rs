use super::{EnergyMethod, NonbondedPair, nonbonded_pairs};
use crate::core::models::pose::Pose;
use crate::core::scoring::energy_map::{AtomDerivatives, EnergyMap};
use crate::core::scoring::potentials::{
    coulomb, coulomb_derivative, coulomb_distance_dependent, coulomb_distance_dependent_derivative,
};
use crate::core::scoring::score_type::{ScoreType, ScoreWeights};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Point-charge electrostatics over all non-excluded charged pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct CoulombEnergy {
    pub dielectric: f64,
    pub distance_dependent: bool,
    pub cutoff: f64,
}

impl CoulombEnergy {
    pub fn new(dielectric: f64, distance_dependent: bool, cutoff: f64) -> Self {
        Self {
            dielectric,
            distance_dependent,
            cutoff,
        }
    }

    #[inline]
    fn pair_energy(&self, pair: &NonbondedPair<'_>) -> f64 {
        let (q1, q2) = (pair.atom1.partial_charge, pair.atom2.partial_charge);
        if self.distance_dependent {
            coulomb_distance_dependent(pair.dist, q1, q2, self.dielectric)
        } else {
            coulomb(pair.dist, q1, q2, self.dielectric)
        }
    }

    #[inline]
    fn pair_derivative(&self, pair: &NonbondedPair<'_>) -> f64 {
        let (q1, q2) = (pair.atom1.partial_charge, pair.atom2.partial_charge);
        if self.distance_dependent {
            coulomb_distance_dependent_derivative(pair.dist, q1, q2, self.dielectric)
        } else {
            coulomb_derivative(pair.dist, q1, q2, self.dielectric)
        }
    }
}

impl EnergyMethod for CoulombEnergy {
    fn score_types(&self) -> &[ScoreType] {
        &[ScoreType::Coulomb]
    }

    fn score(&self, pose: &Pose, energies: &mut EnergyMap) {
        let pairs = nonbonded_pairs(pose, self.cutoff, |a| a.partial_charge != 0.0);

        #[cfg(not(feature = "parallel"))]
        let iter = pairs.iter();
        #[cfg(feature = "parallel")]
        let iter = pairs.par_iter();

        let energy: f64 = iter.map(|pair| self.pair_energy(pair)).sum();
        energies.accumulate(ScoreType::Coulomb, energy);
    }

    fn accumulate_derivatives(
        &self,
        pose: &Pose,
        weights: &ScoreWeights,
        derivatives: &mut AtomDerivatives,
    ) {
        let weight = weights.get(ScoreType::Coulomb);
        if weight == 0.0 {
            return;
        }
        let pairs = nonbonded_pairs(pose, self.cutoff, |a| a.partial_charge != 0.0);

        #[cfg(not(feature = "parallel"))]
        let iter = pairs.iter();
        #[cfg(feature = "parallel")]
        let iter = pairs.par_iter();

        let contributions: Vec<_> = iter
            .map(|pair| {
                let (g1, g2) = pair.gradients(weight * self.pair_derivative(pair));
                (pair.id1, g1, pair.id2, g2)
            })
            .collect();

        for (id1, g1, id2, g2) in contributions {
            derivatives.add(id1, g1);
            derivatives.add(id2, g2);
        }
    }
}
