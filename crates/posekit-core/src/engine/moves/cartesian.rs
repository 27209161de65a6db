use super::Mover;
use crate::core::models::pose::Pose;
use crate::core::select::MoveMapSpec;
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use rand::RngCore;
use rand_distr::{Distribution, Normal};

/// Adds independent N(0, sd) noise to every coordinate of every free atom.
#[derive(Debug, Clone)]
pub struct GaussianCartesianMover {
    movemap: MoveMapSpec,
    sd: f64,
    noise: Normal<f64>,
}

impl GaussianCartesianMover {
    pub fn new(movemap: MoveMapSpec, sd: f64) -> Result<Self, EngineError> {
        let noise = Normal::new(0.0, sd)
            .ok()
            .filter(|_| sd > 0.0)
            .ok_or_else(|| EngineError::InvalidMover {
                name: "GaussianCartesianMover".to_string(),
                reason: format!("standard deviation must be positive and finite, got {}", sd),
            })?;
        Ok(Self { movemap, sd, noise })
    }

    pub fn sd(&self) -> f64 {
        self.sd
    }
}

impl Mover for GaussianCartesianMover {
    fn name(&self) -> &str {
        "GaussianCartesianMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let movemap = self.movemap.build(pose)?;
        for &atom_id in movemap.free_atoms() {
            let shift = Vector3::from_fn(|_, _| self.noise.sample(&mut *rng));
            if let Some(atom) = pose.atom_mut(atom_id) {
                atom.position += shift;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::select::{AtomScope, ResidueSelector};
    use crate::engine::moves::test_support::protein_ligand_pose;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn only_free_atoms_are_displaced() {
        let mut pose = protein_ligand_pose();
        let before: Vec<_> = pose.atoms_iter().map(|(id, a)| (id, a.position)).collect();
        let spec = MoveMapSpec {
            residues: ResidueSelector::chain('A'),
            atoms: AtomScope::Sidechain,
        };
        let mut mover = GaussianCartesianMover::new(spec, 0.3).unwrap();

        mover
            .apply(&mut pose, &mut StdRng::seed_from_u64(6))
            .unwrap();

        let cb = pose.find_atom('A', 1, "CB").unwrap();
        for (id, position) in before {
            let moved = pose.position(id).unwrap() != position;
            assert_eq!(moved, id == cb);
        }
    }

    #[test]
    fn displacement_spread_matches_sd() {
        let pose = protein_ligand_pose();
        let c1 = pose.find_atom('B', 1, "C1").unwrap();
        let start = pose.position(c1).unwrap();
        let spec = MoveMapSpec {
            residues: ResidueSelector::chain('B'),
            atoms: AtomScope::All,
        };
        let mut mover = GaussianCartesianMover::new(spec, 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(10);

        let mut sum_sq = 0.0;
        let n = 2000;
        for _ in 0..n {
            let mut trial = pose.clone();
            mover.apply(&mut trial, &mut rng).unwrap();
            sum_sq += (trial.position(c1).unwrap() - start).norm_squared();
        }
        let sd = (sum_sq / (3 * n) as f64).sqrt();
        assert!((sd - 0.5).abs() < 0.03, "sd = {}", sd);
    }

    #[test]
    fn non_positive_sd_is_rejected() {
        assert!(GaussianCartesianMover::new(MoveMapSpec::default(), 0.0).is_err());
        assert!(GaussianCartesianMover::new(MoveMapSpec::default(), -1.0).is_err());
        assert!(GaussianCartesianMover::new(MoveMapSpec::default(), f64::NAN).is_err());
    }
}
