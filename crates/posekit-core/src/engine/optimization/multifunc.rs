use super::cartesian_map::CartesianMinimizerMap;
use crate::core::models::pose::Pose;
use crate::core::scoring::ScoreFunction;
use crate::engine::error::EngineError;
use nalgebra::DVector;

pub type Multivec = DVector<f64>;

/// A scalar function of a flat vector of degrees of freedom.
pub trait Multifunc {
    fn value(&mut self, x: &Multivec) -> Result<f64, EngineError>;

    fn gradient(&mut self, x: &Multivec) -> Result<Multivec, EngineError>;

    fn value_and_gradient(&mut self, x: &Multivec) -> Result<(f64, Multivec), EngineError> {
        let value = self.value(x)?;
        let gradient = self.gradient(x)?;
        Ok((value, gradient))
    }
}

/// Evaluates a score function at Cartesian coordinates of the free atoms of a pose.
///
/// Every evaluation writes the DOFs into the bound pose first, so after a
/// minimizer returns, the pose holds whatever vector was evaluated last.
pub struct CartesianMultifunc<'a> {
    pose: &'a mut Pose,
    map: &'a CartesianMinimizerMap,
    score_function: &'a ScoreFunction,
    evaluations: usize,
}

impl<'a> CartesianMultifunc<'a> {
    pub fn new(
        pose: &'a mut Pose,
        map: &'a CartesianMinimizerMap,
        score_function: &'a ScoreFunction,
    ) -> Self {
        Self {
            pose,
            map,
            score_function,
            evaluations: 0,
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn pose(&self) -> &Pose {
        &*self.pose
    }
}

impl Multifunc for CartesianMultifunc<'_> {
    fn value(&mut self, x: &Multivec) -> Result<f64, EngineError> {
        self.map.copy_dofs_to_pose(self.pose, x)?;
        self.evaluations += 1;
        Ok(self.score_function.score(self.pose))
    }

    fn gradient(&mut self, x: &Multivec) -> Result<Multivec, EngineError> {
        self.map.copy_dofs_to_pose(self.pose, x)?;
        let derivatives = self.score_function.derivatives(self.pose);
        Ok(self.map.gradient_from_derivatives(&derivatives))
    }

    fn value_and_gradient(&mut self, x: &Multivec) -> Result<(f64, Multivec), EngineError> {
        self.map.copy_dofs_to_pose(self.pose, x)?;
        self.evaluations += 1;
        let value = self.score_function.score(self.pose);
        let derivatives = self.score_function.derivatives(self.pose);
        Ok((value, self.map.gradient_from_derivatives(&derivatives)))
    }
}
