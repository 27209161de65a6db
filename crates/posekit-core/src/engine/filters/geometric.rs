use super::Filter;
use crate::core::models::ids::AtomId;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::utils::geometry::calculate_rmsd;
use crate::engine::error::EngineError;
use nalgebra::Point3;

fn positions(pose: &Pose, atoms: &[AtomId]) -> Result<Vec<Point3<f64>>, PoseError> {
    atoms
        .iter()
        .map(|&id| pose.position(id).ok_or(PoseError::AtomNotFound(id)))
        .collect()
}

/// Passes when the RMSD of `atoms` to reference coordinates is at most `threshold`.
///
/// No superposition is performed.
#[derive(Debug, Clone, PartialEq)]
pub struct RmsdFilter {
    atoms: Vec<AtomId>,
    reference: Vec<Point3<f64>>,
    pub threshold: f64,
}

impl RmsdFilter {
    /// Captures the current coordinates of `atoms` in `reference` as the target.
    pub fn from_pose(
        reference: &Pose,
        atoms: Vec<AtomId>,
        threshold: f64,
    ) -> Result<Self, EngineError> {
        let reference = positions(reference, &atoms)?;
        Ok(Self {
            atoms,
            reference,
            threshold,
        })
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }
}

impl Filter for RmsdFilter {
    fn name(&self) -> &str {
        "RmsdFilter"
    }

    fn apply(&self, pose: &Pose) -> Result<bool, EngineError> {
        Ok(self.report_metric(pose)? <= self.threshold)
    }

    fn report_metric(&self, pose: &Pose) -> Result<f64, EngineError> {
        let current = positions(pose, &self.atoms)?;
        Ok(calculate_rmsd(&current, &self.reference).unwrap_or(0.0))
    }
}

/// Passes when two atoms are at most `max_distance` Angstroms apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomPairDistanceFilter {
    pub atom1: AtomId,
    pub atom2: AtomId,
    pub max_distance: f64,
}

impl AtomPairDistanceFilter {
    pub fn new(atom1: AtomId, atom2: AtomId, max_distance: f64) -> Self {
        Self {
            atom1,
            atom2,
            max_distance,
        }
    }
}

impl Filter for AtomPairDistanceFilter {
    fn name(&self) -> &str {
        "AtomPairDistanceFilter"
    }

    fn apply(&self, pose: &Pose) -> Result<bool, EngineError> {
        Ok(self.report_metric(pose)? <= self.max_distance)
    }

    fn report_metric(&self, pose: &Pose) -> Result<f64, EngineError> {
        let p1 = pose
            .position(self.atom1)
            .ok_or(PoseError::AtomNotFound(self.atom1))?;
        let p2 = pose
            .position(self.atom2)
            .ok_or(PoseError::AtomNotFound(self.atom2))?;
        Ok((p1 - p2).norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::test_support::{ligand_atoms, protein_ligand_pose};
    use nalgebra::Vector3;
    use slotmap::KeyData;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn rmsd_of_unchanged_pose_is_zero() {
        let pose = protein_ligand_pose();
        let filter = RmsdFilter::from_pose(&pose, ligand_atoms(&pose), 0.5).unwrap();
        assert_eq!(filter.report_metric(&pose).unwrap(), 0.0);
        assert!(filter.apply(&pose).unwrap());
    }

    #[test]
    fn rmsd_filter_fails_once_atoms_drift_past_threshold() {
        let mut pose = protein_ligand_pose();
        let ligand = ligand_atoms(&pose);
        let filter = RmsdFilter::from_pose(&pose, ligand.clone(), 0.5).unwrap();
        for &id in &ligand {
            pose.atom_mut(id).unwrap().position += Vector3::new(0.0, 0.0, 1.0);
        }
        assert!((filter.report_metric(&pose).unwrap() - 1.0).abs() < TOLERANCE);
        assert!(!filter.apply(&pose).unwrap());
    }

    #[test]
    fn rmsd_filter_rejects_unknown_atoms() {
        let pose = protein_ligand_pose();
        let ghost = AtomId::from(KeyData::from_ffi(u64::MAX));
        let result = RmsdFilter::from_pose(&pose, vec![ghost], 1.0);
        assert!(matches!(result, Err(EngineError::Pose { .. })));
    }

    #[test]
    fn atom_pair_distance_filter_measures_the_pair() {
        let pose = protein_ligand_pose();
        let ligand = ligand_atoms(&pose);
        let filter = AtomPairDistanceFilter::new(ligand[0], ligand[1], 1.4);
        assert!((filter.report_metric(&pose).unwrap() - 1.5).abs() < TOLERANCE);
        assert!(!filter.apply(&pose).unwrap());
        assert!(
            AtomPairDistanceFilter::new(ligand[0], ligand[1], 1.5)
                .apply(&pose)
                .unwrap()
        );
    }
}
