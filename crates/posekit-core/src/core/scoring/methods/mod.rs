//! Pluggable energy contributions.
//!
//! Each [`EnergyMethod`] evaluates one or more [`ScoreType`]s for a whole pose
//! and can add its weighted Cartesian gradient to an [`AtomDerivatives`]
//! accumulator. User-defined methods are attached to a score function with
//! [`ScoreFunction::add_method`](super::score_function::ScoreFunction::add_method).

mod bond_stretch;
mod constraints;
mod coulomb;
mod lennard_jones;

pub use bond_stretch::BondStretchEnergy;
pub use constraints::ConstraintsEnergy;
pub use coulomb::CoulombEnergy;
pub use lennard_jones::LennardJonesEnergy;

use super::energy_map::{AtomDerivatives, EnergyMap};
use super::score_type::{ScoreType, ScoreWeights};
use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;
use crate::core::models::pose::Pose;
use nalgebra::Vector3;
use std::fmt::Debug;

pub trait EnergyMethod: Send + Sync + Debug {
    /// The score types this method writes into an [`EnergyMap`].
    fn score_types(&self) -> &[ScoreType];

    /// Adds the unweighted energies of this method to `energies`.
    fn score(&self, pose: &Pose, energies: &mut EnergyMap);

    /// Adds the weighted gradient dE/dx of this method to `derivatives`.
    fn accumulate_derivatives(
        &self,
        pose: &Pose,
        weights: &ScoreWeights,
        derivatives: &mut AtomDerivatives,
    );
}

/// A non-excluded atom pair within the cutoff, with its separation precomputed.
pub(crate) struct NonbondedPair<'a> {
    pub id1: AtomId,
    pub id2: AtomId,
    pub atom1: &'a Atom,
    pub atom2: &'a Atom,
    pub dist: f64,
    /// `position1 - position2`.
    pub delta: Vector3<f64>,
}

impl NonbondedPair<'_> {
    /// Distributes dE/dr onto both atoms as Cartesian gradients.
    #[inline]
    pub fn gradients(&self, de_dr: f64) -> (Vector3<f64>, Vector3<f64>) {
        if self.dist < 1e-12 {
            return (Vector3::zeros(), Vector3::zeros());
        }
        let g = self.delta * (de_dr / self.dist);
        (g, -g)
    }
}

/// Collects every unordered atom pair that passes `include`, is not 1-2/1-3
/// excluded and lies within `cutoff`.
pub(crate) fn nonbonded_pairs<'a>(
    pose: &'a Pose,
    cutoff: f64,
    include: impl Fn(&Atom) -> bool,
) -> Vec<NonbondedPair<'a>> {
    let atoms: Vec<(AtomId, &Atom)> = pose.atoms_iter().filter(|(_, a)| include(a)).collect();
    let cutoff_sq = cutoff * cutoff;
    let mut pairs = Vec::new();

    for (i, &(id1, atom1)) in atoms.iter().enumerate() {
        for &(id2, atom2) in &atoms[i + 1..] {
            let delta = atom1.position - atom2.position;
            let dist_sq = delta.norm_squared();
            if dist_sq > cutoff_sq || pose.is_excluded_pair(id1, id2) {
                continue;
            }
            pairs.push(NonbondedPair {
                id1,
                id2,
                atom1,
                atom2,
                dist: dist_sq.sqrt(),
                delta,
            });
        }
    }
    pairs
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::models::chain::ChainType;
    use crate::core::models::ids::ResidueId;
    use nalgebra::Point3;

    /// Checks analytic gradients of `method` against central finite differences of its weighted score.
    pub fn assert_gradients_match_finite_difference(
        method: &dyn EnergyMethod,
        pose: &Pose,
        weights: &ScoreWeights,
    ) {
        let weighted = |p: &Pose| {
            let mut map = EnergyMap::new();
            method.score(p, &mut map);
            map.weighted_total(weights)
        };

        let mut analytic = AtomDerivatives::new();
        method.accumulate_derivatives(pose, weights, &mut analytic);

        let h = 1e-6;
        let mut displaced = pose.clone();
        for atom_id in pose.atom_ids() {
            for axis in 0..3 {
                let original = displaced.position(atom_id).unwrap();

                displaced.atom_mut(atom_id).unwrap().position[axis] = original[axis] + h;
                let plus = weighted(&displaced);
                displaced.atom_mut(atom_id).unwrap().position[axis] = original[axis] - h;
                let minus = weighted(&displaced);
                displaced.atom_mut(atom_id).unwrap().position = original;

                let numeric = (plus - minus) / (2.0 * h);
                let exact = analytic.get(atom_id)[axis];
                assert!(
                    (numeric - exact).abs() < 1e-4 * exact.abs().max(1.0),
                    "{:?}: atom {:?} axis {}: numeric {} vs analytic {}",
                    method,
                    atom_id,
                    axis,
                    numeric,
                    exact
                );
            }
        }
    }

    /// Builds a single-residue pose from `(name, position, charge, lj)` tuples.
    pub fn pose_with_atoms(atoms: &[(&str, [f64; 3], f64, Option<(f64, f64)>)]) -> (Pose, ResidueId, Vec<AtomId>) {
        let mut pose = Pose::new();
        let chain_id = pose.add_chain('A', ChainType::Other);
        let res_id = pose.add_residue(chain_id, 1, "MOL").unwrap();
        let ids = atoms
            .iter()
            .map(|&(name, [x, y, z], charge, lj)| {
                let mut atom = Atom::new(name, res_id, Point3::new(x, y, z)).with_charge(charge);
                if let Some((radius, well_depth)) = lj {
                    atom = atom.with_lennard_jones(radius, well_depth);
                }
                pose.add_atom_to_residue(res_id, atom).unwrap()
            })
            .collect();
        (pose, res_id, ids)
    }
}
