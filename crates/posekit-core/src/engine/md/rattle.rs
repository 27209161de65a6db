use crate::core::models::pose::Pose;
use crate::engine::optimization::{CartesianMinimizerMap, Multivec};
use nalgebra::Vector3;

/// A fixed-length bond between two free atoms, indexed by their slot in the minimizer map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BondConstraint {
    pub i: usize,
    pub j: usize,
    pub length: f64,
}

/// RATTLE holonomic constraints on bonds to hydrogen.
#[derive(Debug, Clone)]
pub(crate) struct Rattle {
    constraints: Vec<BondConstraint>,
    inverse_masses: Vec<f64>,
    tolerance: f64,
    max_iterations: usize,
}

impl Rattle {
    /// Constrains every bond whose atoms are both free and at least one is a hydrogen.
    pub fn new(
        pose: &Pose,
        map: &CartesianMinimizerMap,
        tolerance: f64,
        max_iterations: usize,
    ) -> Self {
        let constraints = pose
            .bonds()
            .iter()
            .filter_map(|bond| {
                let i = map.index_of(bond.atom1_id)?;
                let j = map.index_of(bond.atom2_id)?;
                let has_hydrogen = [bond.atom1_id, bond.atom2_id]
                    .iter()
                    .filter_map(|&id| pose.atom(id))
                    .any(|atom| atom.is_hydrogen());
                has_hydrogen.then_some(BondConstraint {
                    i,
                    j,
                    length: bond.ideal_length,
                })
            })
            .collect();
        Self::from_constraints(constraints, map.atom_masses(), tolerance, max_iterations)
    }

    pub fn from_constraints(
        constraints: Vec<BondConstraint>,
        masses: &[f64],
        tolerance: f64,
        max_iterations: usize,
    ) -> Self {
        let inverse_masses = masses
            .iter()
            .map(|&m| if m > 0.0 { 1.0 / m } else { 0.0 })
            .collect();
        Self {
            constraints,
            inverse_masses,
            tolerance,
            max_iterations,
        }
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Position stage: moves `x` back onto the constraint surface along the
    /// bond vectors of `x_old` and applies the matching velocity correction.
    ///
    /// Returns the number of sweeps used, or `None` if not converged.
    pub fn constrain_positions(
        &self,
        x: &mut Multivec,
        x_old: &Multivec,
        v: &mut Multivec,
        dt: f64,
    ) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        for sweep in 1..=self.max_iterations {
            let mut converged = true;
            for c in &self.constraints {
                let r = atom_vector(x, c.i) - atom_vector(x, c.j);
                let target = c.length * c.length;
                let diff = target - r.norm_squared();
                if diff.abs() <= 2.0 * self.tolerance * target {
                    continue;
                }
                converged = false;

                let r_old = atom_vector(x_old, c.i) - atom_vector(x_old, c.j);
                let (wi, wj) = (self.inverse_masses[c.i], self.inverse_masses[c.j]);
                let dot = r_old.dot(&r);
                if dot.abs() < f64::EPSILON || wi + wj == 0.0 {
                    return None;
                }
                let g = diff / (2.0 * dot * (wi + wj));
                let correction = r_old * g;
                add_to_atom(x, c.i, &(correction * wi));
                add_to_atom(x, c.j, &(-correction * wj));
                add_to_atom(v, c.i, &(correction * (wi / dt)));
                add_to_atom(v, c.j, &(-correction * (wj / dt)));
            }
            if converged {
                return Some(sweep);
            }
        }
        None
    }

    /// Velocity stage: removes the velocity components along each constrained bond.
    pub fn constrain_velocities(&self, x: &Multivec, v: &mut Multivec) -> Option<usize> {
        if self.is_empty() {
            return Some(0);
        }
        for sweep in 1..=self.max_iterations {
            let mut converged = true;
            for c in &self.constraints {
                let r = atom_vector(x, c.i) - atom_vector(x, c.j);
                let v_rel = atom_vector(v, c.i) - atom_vector(v, c.j);
                let target = c.length * c.length;
                let dot = r.dot(&v_rel);
                if dot.abs() <= self.tolerance * target {
                    continue;
                }
                converged = false;

                let (wi, wj) = (self.inverse_masses[c.i], self.inverse_masses[c.j]);
                if wi + wj == 0.0 {
                    return None;
                }
                let k = -dot / ((wi + wj) * r.norm_squared());
                let correction = r * k;
                add_to_atom(v, c.i, &(correction * wi));
                add_to_atom(v, c.j, &(-correction * wj));
            }
            if converged {
                return Some(sweep);
            }
        }
        None
    }
}

#[inline]
pub(crate) fn atom_vector(dofs: &Multivec, atom_index: usize) -> Vector3<f64> {
    dofs.fixed_rows::<3>(3 * atom_index).into_owned()
}

#[inline]
pub(crate) fn add_to_atom(dofs: &mut Multivec, atom_index: usize, delta: &Vector3<f64>) {
    let mut rows = dofs.fixed_rows_mut::<3>(3 * atom_index);
    rows += delta;
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-8;

    fn dimer(positions: [[f64; 3]; 2]) -> Multivec {
        Multivec::from_iterator(6, positions.iter().flatten().copied())
    }

    fn rattle(length: f64) -> Rattle {
        Rattle::from_constraints(
            vec![BondConstraint { i: 0, j: 1, length }],
            &[12.011, 1.008],
            1e-10,
            100,
        )
    }

    fn bond_length(x: &Multivec) -> f64 {
        (atom_vector(x, 0) - atom_vector(x, 1)).norm()
    }

    #[test]
    fn position_stage_restores_bond_length() {
        let rattle = rattle(1.09);
        let x_old = dimer([[0.0, 0.0, 0.0], [1.09, 0.0, 0.0]]);
        let mut x = dimer([[0.01, 0.02, 0.0], [1.2, -0.05, 0.03]]);
        let mut v = Multivec::zeros(6);

        let sweeps = rattle.constrain_positions(&mut x, &x_old, &mut v, 0.001);

        assert!(sweeps.is_some());
        assert!((bond_length(&x) - 1.09).abs() < 1e-8);
    }

    #[test]
    fn position_stage_conserves_center_of_mass() {
        let rattle = rattle(1.0);
        let masses = [12.011, 1.008];
        let com = |x: &Multivec| {
            (atom_vector(x, 0) * masses[0] + atom_vector(x, 1) * masses[1])
                / (masses[0] + masses[1])
        };
        let x_old = dimer([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut x = dimer([[0.0, 0.1, 0.0], [1.3, 0.0, 0.0]]);
        let before = com(&x);
        let mut v = Multivec::zeros(6);

        rattle.constrain_positions(&mut x, &x_old, &mut v, 0.001).unwrap();

        assert!((com(&x) - before).norm() < TOLERANCE);
    }

    #[test]
    fn velocity_stage_removes_relative_motion_along_bond() {
        let rattle = rattle(1.0);
        let x = dimer([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut v = dimer([[0.5, 0.2, 0.0], [-1.0, 0.0, 0.3]]);

        rattle.constrain_velocities(&x, &mut v).unwrap();

        let r = atom_vector(&x, 0) - atom_vector(&x, 1);
        let v_rel = atom_vector(&v, 0) - atom_vector(&v, 1);
        assert!(r.dot(&v_rel).abs() < 1e-9);
        assert!((v[1] - 0.2).abs() < TOLERANCE);
        assert!((v[5] - 0.3).abs() < TOLERANCE);
    }

    #[test]
    fn position_stage_fails_when_bond_is_perpendicular_to_history() {
        let rattle = rattle(1.0);
        let x_old = dimer([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut x = dimer([[0.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        let mut v = Multivec::zeros(6);
        assert_eq!(rattle.constrain_positions(&mut x, &x_old, &mut v, 0.001), None);
    }

    #[test]
    fn empty_rattle_is_a_no_op() {
        let rattle = Rattle::from_constraints(Vec::new(), &[], 1e-6, 10);
        let mut x = Multivec::zeros(0);
        let mut v = Multivec::zeros(0);
        let x_old = x.clone();
        assert_eq!(rattle.constrain_positions(&mut x, &x_old, &mut v, 0.001), Some(0));
        assert_eq!(rattle.constrain_velocities(&x, &mut v), Some(0));
    }
}
