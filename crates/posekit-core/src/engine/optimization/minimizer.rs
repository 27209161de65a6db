use super::cartesian_map::CartesianMinimizerMap;
use super::line_search::armijo_backtracking;
use super::multifunc::{CartesianMultifunc, Multifunc, Multivec};
use super::nelder_mead::NelderMeadSimplex;
use crate::core::models::pose::Pose;
use crate::core::scoring::ScoreFunction;
use crate::core::select::MoveMap;
use crate::engine::config::{MinimizerOptions, MinimizerType};
use crate::engine::error::EngineError;
use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

const ZEPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizerOutcome {
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationReport {
    pub initial_score: f64,
    pub final_score: f64,
    pub outcome: MinimizerOutcome,
}

/// Dispatches to the algorithm named by [`MinimizerOptions::minimizer`].
#[derive(Debug, Clone)]
pub struct Minimizer {
    options: MinimizerOptions,
}

/// One L-BFGS correction pair `(s, y, 1 / s·y)`.
type Correction = (Multivec, Multivec, f64);

impl Minimizer {
    pub fn new(options: MinimizerOptions) -> Result<Self, EngineError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &MinimizerOptions {
        &self.options
    }

    /// Minimizes `func` from `x`, leaving the best point found in `x`.
    pub fn run(
        &self,
        func: &mut dyn Multifunc,
        x: &mut Multivec,
    ) -> Result<MinimizerOutcome, EngineError> {
        match self.options.minimizer {
            MinimizerType::Lbfgs => self.run_gradient(func, x, true),
            MinimizerType::SteepestDescent => self.run_gradient(func, x, false),
            MinimizerType::Simplex => {
                let step = Multivec::from_element(x.len(), self.options.simplex_step);
                NelderMeadSimplex::new(self.options.tolerance, self.options.max_iterations)
                    .run(func, x, &step)
            }
        }
    }

    fn run_gradient(
        &self,
        func: &mut dyn Multifunc,
        x: &mut Multivec,
        use_lbfgs: bool,
    ) -> Result<MinimizerOutcome, EngineError> {
        let opts = &self.options;
        let (mut value, mut gradient) = func.value_and_gradient(x)?;
        let mut evaluations = 1;
        let mut iterations = 0;
        let mut converged = x.is_empty();
        let mut history: VecDeque<Correction> = VecDeque::with_capacity(opts.lbfgs_memory);

        while !converged && iterations < opts.max_iterations {
            if gradient.norm() <= opts.gradient_tolerance {
                converged = true;
                break;
            }
            iterations += 1;

            let mut direction = if use_lbfgs {
                lbfgs_direction(&gradient, &history)
            } else {
                -&gradient
            };
            if gradient.dot(&direction) >= 0.0 {
                history.clear();
                direction = -&gradient;
            }

            let mut step = armijo_backtracking(
                func,
                x,
                value,
                &gradient,
                &direction,
                self.initial_step(&direction, use_lbfgs),
                &mut evaluations,
            )?;
            if step.is_none() && !history.is_empty() {
                history.clear();
                direction = -&gradient;
                step = armijo_backtracking(
                    func,
                    x,
                    value,
                    &gradient,
                    &direction,
                    self.initial_step(&direction, false),
                    &mut evaluations,
                )?;
            }
            let Some(step) = step else {
                debug!(iterations, value, "Line search made no progress; stopping");
                break;
            };

            let new_gradient = func.gradient(&step.x)?;
            if use_lbfgs {
                let s = &step.x - &*x;
                let y = &new_gradient - &gradient;
                let sy = s.dot(&y);
                if sy > 1e-10 {
                    if history.len() == opts.lbfgs_memory {
                        history.pop_front();
                    }
                    history.push_back((s, y, 1.0 / sy));
                }
            }

            let previous = value;
            x.copy_from(&step.x);
            value = step.value;
            gradient = new_gradient;

            if previous.is_finite()
                && 2.0 * (previous - value).abs()
                    <= opts.tolerance * (previous.abs() + value.abs() + ZEPS)
            {
                converged = true;
            }
        }

        debug!(
            value,
            iterations,
            evaluations,
            converged,
            gradient_norm = gradient.norm(),
            "Gradient minimizer finished"
        );
        Ok(MinimizerOutcome {
            value,
            iterations,
            evaluations,
            converged,
        })
    }

    /// Unit step for quasi-Newton directions, otherwise a step whose largest
    /// coordinate change equals `max_step`; never larger than `max_step`.
    fn initial_step(&self, direction: &Multivec, quasi_newton: bool) -> f64 {
        let largest = direction.amax();
        if largest <= 0.0 {
            return 1.0;
        }
        let limit = self.options.max_step / largest;
        if quasi_newton { limit.min(1.0) } else { limit }
    }
}

/// The L-BFGS two-loop recursion, returning the search direction `-H g`.
fn lbfgs_direction(gradient: &Multivec, history: &VecDeque<Correction>) -> Multivec {
    let mut q = gradient.clone();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let alpha = rho * s.dot(&q);
        q -= y * alpha;
        alphas.push(alpha);
    }

    let gamma = history
        .back()
        .map(|(s, y, _)| s.dot(y) / y.dot(y))
        .unwrap_or(1.0);
    let mut r = q * gamma;

    for ((s, y, rho), alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = rho * y.dot(&r);
        r += s * (alpha - beta);
    }
    -r
}

/// Minimizes the free atoms of `pose` under `score_function`.
///
/// The pose is left at the best coordinates found; fixed atoms never move and
/// the final score never exceeds the initial one.
#[instrument(skip_all, name = "minimize_pose")]
pub fn minimize_pose(
    pose: &mut Pose,
    score_function: &ScoreFunction,
    movemap: &MoveMap,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, EngineError> {
    let minimizer = Minimizer::new(options.clone())?;
    let initial_score = score_function.score(pose);
    let map = CartesianMinimizerMap::new(pose, movemap)?;

    if map.n_dof() == 0 {
        debug!("Move map has no free atoms; nothing to minimize");
        return Ok(MinimizationReport {
            initial_score,
            final_score: initial_score,
            outcome: MinimizerOutcome {
                value: initial_score,
                iterations: 0,
                evaluations: 0,
                converged: true,
            },
        });
    }

    let start = map.copy_dofs_from_pose(pose)?;
    let mut x = start.clone();
    let outcome = {
        let mut func = CartesianMultifunc::new(pose, &map, score_function);
        minimizer.run(&mut func, &mut x)?
    };

    map.copy_dofs_to_pose(pose, &x)?;
    let mut final_score = score_function.score(pose);
    if !(final_score <= initial_score) {
        warn!(
            initial_score,
            final_score, "Minimizer ended above the starting score; restoring start coordinates"
        );
        map.copy_dofs_to_pose(pose, &start)?;
        final_score = initial_score;
    }

    info!(
        minimizer = ?options.minimizer,
        n_dof = map.n_dof(),
        initial_score,
        final_score,
        iterations = outcome.iterations,
        converged = outcome.converged,
        "Minimization finished"
    );

    Ok(MinimizationReport {
        initial_score,
        final_score,
        outcome,
    })
}
