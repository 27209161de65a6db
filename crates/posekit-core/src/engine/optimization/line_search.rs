use super::multifunc::{Multifunc, Multivec};
use crate::engine::error::EngineError;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;
const BACKTRACK_FACTOR: f64 = 0.5;
const MAX_BACKTRACKS: usize = 60;

pub(crate) struct LineSearchStep {
    pub x: Multivec,
    pub value: f64,
}

/// Backtracks from `initial_step` along `direction` until the Armijo condition holds.
///
/// Returns `None` if `direction` is not a descent direction or no acceptable
/// step was found. An accepted step strictly lowers the function value.
pub(crate) fn armijo_backtracking(
    func: &mut dyn Multifunc,
    x: &Multivec,
    value: f64,
    gradient: &Multivec,
    direction: &Multivec,
    initial_step: f64,
    evaluations: &mut usize,
) -> Result<Option<LineSearchStep>, EngineError> {
    let slope = gradient.dot(direction);
    if !(slope < 0.0) {
        return Ok(None);
    }

    let mut alpha = initial_step;
    for _ in 0..MAX_BACKTRACKS {
        let trial = x + direction * alpha;
        let trial_value = func.value(&trial)?;
        *evaluations += 1;
        if trial_value.is_finite() && trial_value <= value + ARMIJO_C1 * alpha * slope {
            return Ok(Some(LineSearchStep {
                x: trial,
                value: trial_value,
            }));
        }
        alpha *= BACKTRACK_FACTOR;
    }
    Ok(None)
}
