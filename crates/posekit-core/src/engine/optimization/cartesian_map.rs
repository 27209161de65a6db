use super::multifunc::Multivec;
use crate::core::models::ids::AtomId;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::scoring::AtomDerivatives;
use crate::core::select::MoveMap;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use slotmap::SecondaryMap;

/// Fixes the order of the free atoms and maps them to `3 * n` flat DOFs (x, y, z per atom).
#[derive(Debug, Clone)]
pub struct CartesianMinimizerMap {
    atoms: Vec<AtomId>,
    index: SecondaryMap<AtomId, usize>,
    masses: Vec<f64>,
}

impl CartesianMinimizerMap {
    pub fn new(pose: &Pose, movemap: &MoveMap) -> Result<Self, PoseError> {
        let mut atoms = Vec::with_capacity(movemap.len());
        let mut index = SecondaryMap::new();
        let mut masses = Vec::with_capacity(movemap.len());
        for &atom_id in movemap.free_atoms() {
            let atom = pose.atom(atom_id).ok_or(PoseError::AtomNotFound(atom_id))?;
            index.insert(atom_id, atoms.len());
            atoms.push(atom_id);
            masses.push(atom.mass);
        }
        Ok(Self {
            atoms,
            index,
            masses,
        })
    }

    #[inline]
    pub fn n_dof(&self) -> usize {
        3 * self.atoms.len()
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// Position of `atom_id` in [`Self::atoms`]; its DOFs start at `3 * index`.
    pub fn index_of(&self, atom_id: AtomId) -> Option<usize> {
        self.index.get(atom_id).copied()
    }

    pub fn copy_dofs_from_pose(&self, pose: &Pose) -> Result<Multivec, EngineError> {
        let mut dofs = Multivec::zeros(self.n_dof());
        for (i, &atom_id) in self.atoms.iter().enumerate() {
            let p = pose.position(atom_id).ok_or(PoseError::AtomNotFound(atom_id))?;
            dofs.fixed_rows_mut::<3>(3 * i).copy_from(&p.coords);
        }
        Ok(dofs)
    }

    pub fn copy_dofs_to_pose(&self, pose: &mut Pose, dofs: &Multivec) -> Result<(), EngineError> {
        if dofs.len() != self.n_dof() {
            return Err(EngineError::Internal(format!(
                "DOF vector has length {}, map expects {}",
                dofs.len(),
                self.n_dof()
            )));
        }
        for (i, &atom_id) in self.atoms.iter().enumerate() {
            let atom = pose
                .atom_mut(atom_id)
                .ok_or(PoseError::AtomNotFound(atom_id))?;
            atom.position = Point3::from(dofs.fixed_rows::<3>(3 * i).into_owned());
        }
        Ok(())
    }

    /// Gathers the gradient of the free atoms; fixed atoms are ignored.
    pub fn gradient_from_derivatives(&self, derivatives: &AtomDerivatives) -> Multivec {
        let mut gradient = Multivec::zeros(self.n_dof());
        for (i, &atom_id) in self.atoms.iter().enumerate() {
            gradient
                .fixed_rows_mut::<3>(3 * i)
                .copy_from(&derivatives.get(atom_id));
        }
        gradient
    }

    /// Per-atom masses in map order.
    pub fn atom_masses(&self) -> &[f64] {
        &self.masses
    }

    /// Masses expanded to one entry per DOF.
    pub fn masses(&self) -> Multivec {
        Multivec::from_iterator(
            self.n_dof(),
            self.masses.iter().flat_map(|&m| [m, m, m]),
        )
    }
}
