use super::minimizer::MinimizerOutcome;
use super::multifunc::{Multifunc, Multivec};
use crate::engine::error::EngineError;
use tracing::{debug, trace};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;
const ZEPS: f64 = 1e-10;

/// Downhill simplex minimizer. Needs function values only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadSimplex {
    /// Fractional spread of the simplex values at which the search stops.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl NelderMeadSimplex {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Minimizes `func` starting from `x`, with the initial simplex spanned by
    /// `x` and `x + step[i] * e_i`.
    ///
    /// On return `x` holds the best vertex and the outcome carries its value.
    pub fn run(
        &self,
        func: &mut dyn Multifunc,
        x: &mut Multivec,
        step: &Multivec,
    ) -> Result<MinimizerOutcome, EngineError> {
        let n = x.len();
        if step.len() != n {
            return Err(EngineError::Minimization(format!(
                "simplex step has {} entries for {} degrees of freedom",
                step.len(),
                n
            )));
        }

        let mut evaluations = 0;
        if n == 0 {
            let value = evaluate(func, x, &mut evaluations)?;
            return Ok(MinimizerOutcome {
                value,
                iterations: 0,
                evaluations,
                converged: true,
            });
        }

        let mut simplex: Vec<(f64, Multivec)> = Vec::with_capacity(n + 1);
        simplex.push((evaluate(func, x, &mut evaluations)?, x.clone()));
        for i in 0..n {
            let mut vertex = x.clone();
            vertex[i] += step[i];
            simplex.push((evaluate(func, &vertex, &mut evaluations)?, vertex));
        }

        let mut iterations = 0;
        let mut converged = false;
        loop {
            simplex.sort_by(|a, b| a.0.total_cmp(&b.0));
            let f_best = simplex[0].0;
            let f_worst = simplex[n].0;

            // Non-finite vertices never count as converged.
            if f_best.is_finite()
                && f_worst.is_finite()
                && 2.0 * (f_worst - f_best).abs()
                    <= self.tolerance * (f_worst.abs() + f_best.abs() + ZEPS)
            {
                converged = true;
                break;
            }
            if iterations >= self.max_iterations {
                break;
            }
            iterations += 1;

            let centroid = simplex[..n]
                .iter()
                .fold(Multivec::zeros(n), |acc, (_, v)| acc + v)
                / n as f64;

            let reflected = &centroid + (&centroid - &simplex[n].1) * REFLECTION;
            let f_reflected = evaluate(func, &reflected, &mut evaluations)?;

            if f_reflected < f_best {
                let expanded = &centroid + (&reflected - &centroid) * EXPANSION;
                let f_expanded = evaluate(func, &expanded, &mut evaluations)?;
                simplex[n] = if f_expanded < f_reflected {
                    trace!(iteration = iterations, "Simplex expansion");
                    (f_expanded, expanded)
                } else {
                    (f_reflected, reflected)
                };
                continue;
            }

            if f_reflected < simplex[n - 1].0 {
                simplex[n] = (f_reflected, reflected);
                continue;
            }

            let outside = f_reflected < f_worst;
            let contracted = if outside {
                &centroid + (&reflected - &centroid) * CONTRACTION
            } else {
                &centroid + (&simplex[n].1 - &centroid) * CONTRACTION
            };
            let f_contracted = evaluate(func, &contracted, &mut evaluations)?;
            let accepted = if outside {
                f_contracted <= f_reflected
            } else {
                f_contracted < f_worst
            };
            if accepted {
                simplex[n] = (f_contracted, contracted);
                continue;
            }

            trace!(iteration = iterations, "Simplex shrink");
            let best = simplex[0].1.clone();
            for (value, vertex) in simplex.iter_mut().skip(1) {
                *vertex = &best + (&*vertex - &best) * SHRINK;
                *value = evaluate(func, vertex, &mut evaluations)?;
            }
        }

        let (value, best) = &simplex[0];
        x.copy_from(best);
        debug!(
            value,
            iterations, evaluations, converged, "Nelder-Mead simplex finished"
        );
        Ok(MinimizerOutcome {
            value: *value,
            iterations,
            evaluations,
            converged,
        })
    }
}

/// Evaluates `func`, mapping NaN to +inf so the simplex ordering stays total.
fn evaluate(
    func: &mut dyn Multifunc,
    x: &Multivec,
    evaluations: &mut usize,
) -> Result<f64, EngineError> {
    *evaluations += 1;
    let value = func.value(x)?;
    Ok(if value.is_nan() { f64::INFINITY } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rosenbrock;

    impl Multifunc for Rosenbrock {
        fn value(&mut self, x: &Multivec) -> Result<f64, EngineError> {
            Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2))
        }
        fn gradient(&mut self, _x: &Multivec) -> Result<Multivec, EngineError> {
            Err(EngineError::Internal("simplex must not request gradients".into()))
        }
    }

    struct OffsetBowl {
        center: Multivec,
    }

    impl Multifunc for OffsetBowl {
        fn value(&mut self, x: &Multivec) -> Result<f64, EngineError> {
            Ok(1.0 + (x - &self.center).norm_squared())
        }
        fn gradient(&mut self, x: &Multivec) -> Result<Multivec, EngineError> {
            Ok((x - &self.center) * 2.0)
        }
    }

    #[test]
    fn finds_minimum_of_rosenbrock_without_gradients() {
        let mut x = Multivec::from_vec(vec![-1.2, 1.0]);
        let step = Multivec::from_element(2, 0.5);
        let outcome = NelderMeadSimplex::new(1e-14, 5000)
            .run(&mut Rosenbrock, &mut x, &step)
            .unwrap();
        assert!((x[0] - 1.0).abs() < 1e-3, "x = {}", x);
        assert!((x[1] - 1.0).abs() < 1e-3, "x = {}", x);
        assert!(outcome.value < 1e-6);
    }

    #[test]
    fn converges_on_a_bowl_and_reports_convergence() {
        let center = Multivec::from_vec(vec![1.0, -2.0, 0.5]);
        let mut func = OffsetBowl {
            center: center.clone(),
        };
        let mut x = Multivec::zeros(3);
        let outcome = NelderMeadSimplex::new(1e-10, 5000)
            .run(&mut func, &mut x, &Multivec::from_element(3, 1.0))
            .unwrap();
        assert!(outcome.converged);
        assert!((&x - &center).norm() < 1e-3);
        assert!((outcome.value - 1.0).abs() < 1e-8);
    }

    #[test]
    fn never_returns_a_value_worse_than_the_start() {
        let mut func = OffsetBowl {
            center: Multivec::from_vec(vec![0.0, 0.0]),
        };
        let mut x = Multivec::from_vec(vec![0.1, -0.1]);
        let start_value = func.value(&x).unwrap();
        let outcome = NelderMeadSimplex::new(1e-6, 3)
            .run(&mut func, &mut x, &Multivec::from_element(2, 5.0))
            .unwrap();
        assert!(outcome.value <= start_value);
        assert!((func.value(&x).unwrap() - outcome.value).abs() < 1e-12);
    }

    #[test]
    fn empty_dof_vector_returns_function_value_immediately() {
        let mut func = OffsetBowl {
            center: Multivec::zeros(0),
        };
        let mut x = Multivec::zeros(0);
        let outcome = NelderMeadSimplex::new(1e-6, 10)
            .run(&mut func, &mut x, &Multivec::zeros(0))
            .unwrap();
        assert_eq!(outcome.value, 1.0);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.evaluations, 1);
    }

    /// `1 + |x - (1, 1)|^2`, undefined above `x[1] = 2.5`.
    struct WalledBowl;

    impl Multifunc for WalledBowl {
        fn value(&mut self, x: &Multivec) -> Result<f64, EngineError> {
            if x[1] > 2.5 {
                return Ok(f64::NAN);
            }
            Ok(1.0 + (x[0] - 1.0).powi(2) + (x[1] - 1.0).powi(2))
        }
        fn gradient(&mut self, _x: &Multivec) -> Result<Multivec, EngineError> {
            unreachable!("simplex never asks for gradients")
        }
    }

    #[test]
    fn non_finite_vertex_does_not_stop_the_search() {
        let mut x = Multivec::from_vec(vec![-3.0, 2.0]);
        let outcome = NelderMeadSimplex::new(1e-10, 5000)
            .run(&mut WalledBowl, &mut x, &Multivec::from_element(2, 1.0))
            .unwrap();
        assert!(outcome.iterations > 0);
        assert!(outcome.converged);
        assert!((x[0] - 1.0).abs() < 1e-3, "x = {}", x);
        assert!((x[1] - 1.0).abs() < 1e-3, "x = {}", x);
        assert!((outcome.value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn all_non_finite_simplex_is_never_reported_converged() {
        struct Undefined;
        impl Multifunc for Undefined {
            fn value(&mut self, _x: &Multivec) -> Result<f64, EngineError> {
                Ok(f64::INFINITY)
            }
            fn gradient(&mut self, _x: &Multivec) -> Result<Multivec, EngineError> {
                unreachable!("simplex never asks for gradients")
            }
        }
        let mut x = Multivec::zeros(2);
        let outcome = NelderMeadSimplex::new(1e-6, 20)
            .run(&mut Undefined, &mut x, &Multivec::from_element(2, 1.0))
            .unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 20);
    }

    #[test]
    fn mismatched_step_length_is_rejected() {
        let mut x = Multivec::zeros(2);
        let result = NelderMeadSimplex::new(1e-6, 10).run(&mut Rosenbrock, &mut x, &Multivec::zeros(3));
        assert!(matches!(result, Err(EngineError::Minimization(_))));
    }
}
