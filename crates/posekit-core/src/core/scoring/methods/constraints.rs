use super::EnergyMethod;
use crate::core::models::constraint::Constraint;
use crate::core::models::pose::Pose;
use crate::core::scoring::energy_map::{AtomDerivatives, EnergyMap};
use crate::core::scoring::score_type::{ScoreType, ScoreWeights};
use nalgebra::Vector3;

/// Evaluates the constraint set stored on the pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConstraintsEnergy;

impl ConstraintsEnergy {
    fn score_type_of(constraint: &Constraint) -> ScoreType {
        match constraint {
            Constraint::AtomPair { .. } => ScoreType::AtomPairConstraint,
            Constraint::Coordinate { .. } => ScoreType::CoordinateConstraint,
        }
    }
}

impl EnergyMethod for ConstraintsEnergy {
    fn score_types(&self) -> &[ScoreType] {
        &[ScoreType::AtomPairConstraint, ScoreType::CoordinateConstraint]
    }

    fn score(&self, pose: &Pose, energies: &mut EnergyMap) {
        for constraint in pose.constraints() {
            let energy = match constraint {
                Constraint::AtomPair { atom1, atom2, func } => {
                    let (Some(p1), Some(p2)) = (pose.position(*atom1), pose.position(*atom2))
                    else {
                        continue;
                    };
                    func.value((p1 - p2).norm())
                }
                Constraint::Coordinate { atom, target, func } => {
                    let Some(p) = pose.position(*atom) else {
                        continue;
                    };
                    func.value((p - target).norm())
                }
            };
            energies.accumulate(Self::score_type_of(constraint), energy);
        }
    }

    fn accumulate_derivatives(
        &self,
        pose: &Pose,
        weights: &ScoreWeights,
        derivatives: &mut AtomDerivatives,
    ) {
        for constraint in pose.constraints() {
            let weight = weights.get(Self::score_type_of(constraint));
            if weight == 0.0 {
                continue;
            }
            match constraint {
                Constraint::AtomPair { atom1, atom2, func } => {
                    let (Some(p1), Some(p2)) = (pose.position(*atom1), pose.position(*atom2))
                    else {
                        continue;
                    };
                    let delta = p1 - p2;
                    let g = radial_gradient(&delta, weight * func.derivative(delta.norm()));
                    derivatives.add(*atom1, g);
                    derivatives.add(*atom2, -g);
                }
                Constraint::Coordinate { atom, target, func } => {
                    let Some(p) = pose.position(*atom) else {
                        continue;
                    };
                    let delta = p - target;
                    let g = radial_gradient(&delta, weight * func.derivative(delta.norm()));
                    derivatives.add(*atom, g);
                }
            }
        }
    }
}

/// Chains dE/dr with dr/dx for `r = |delta|`; zero at the singular point.
#[inline]
fn radial_gradient(delta: &Vector3<f64>, de_dr: f64) -> Vector3<f64> {
    let dist = delta.norm();
    if dist < 1e-12 {
        Vector3::zeros()
    } else {
        delta * (de_dr / dist)
    }
}
