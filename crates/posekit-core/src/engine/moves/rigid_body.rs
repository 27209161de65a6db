use super::Mover;
use crate::core::models::pose::Pose;
use crate::core::select::ResidueSelector;
use crate::core::utils::geometry::{
    center_of_mass, centroid, positions_of, random_rotation, random_small_rotation, transform_atoms,
};
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, trace};

/// Rigidly translates and rotates the selected residues about their centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyPerturbMover {
    pub selector: ResidueSelector,
    /// Standard deviation of each translation component, Angstroms.
    pub translation_sd: f64,
    pub rotation_sd_degrees: f64,
}

impl RigidBodyPerturbMover {
    pub fn new(selector: ResidueSelector, translation_sd: f64, rotation_sd_degrees: f64) -> Self {
        Self {
            selector,
            translation_sd,
            rotation_sd_degrees,
        }
    }
}

impl Mover for RigidBodyPerturbMover {
    fn name(&self) -> &str {
        "RigidBodyPerturbMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let residues = self.selector.resolve(pose)?;
        let atoms = pose.atoms_in_residues(&residues);
        let Some(pivot) = centroid(&positions_of(pose, &atoms)) else {
            debug!("Selection is empty; nothing to perturb");
            return Ok(());
        };

        let translation = Vector3::from_fn(|_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            z * self.translation_sd
        });
        let rotation = random_small_rotation(rng, self.rotation_sd_degrees);
        trace!(
            angle = rotation.angle().to_degrees(),
            shift = translation.norm(),
            "Rigid-body perturbation"
        );
        transform_atoms(pose, &atoms, &pivot, &rotation, &translation);
        Ok(())
    }
}

/// Applies a uniformly random rotation to the selected residues about their center of mass.
#[derive(Debug, Clone, PartialEq)]
pub struct TumbleMover {
    pub selector: ResidueSelector,
}

impl TumbleMover {
    pub fn new(selector: ResidueSelector) -> Self {
        Self { selector }
    }
}

impl Mover for TumbleMover {
    fn name(&self) -> &str {
        "TumbleMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let residues = self.selector.resolve(pose)?;
        let atoms = pose.atoms_in_residues(&residues);
        let masses: Vec<f64> = atoms
            .iter()
            .filter_map(|&id| pose.atom(id).map(|a| a.mass))
            .collect();
        let Some(pivot) = center_of_mass(&positions_of(pose, &atoms), &masses) else {
            debug!("Selection is empty; nothing to tumble");
            return Ok(());
        };
        let rotation = random_rotation(rng);
        transform_atoms(pose, &atoms, &pivot, &rotation, &Vector3::zeros());
        Ok(())
    }
}
