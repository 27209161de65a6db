//! One-dimensional penalty functions used by geometric constraints.
//!
//! A [`Func`] maps a scalar geometric quantity (a distance, in practice) to an
//! energy and provides its analytic derivative, so constraint terms can take
//! part in gradient-based minimization and molecular dynamics.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FuncError {
    #[error("Standard deviation must be positive, got {0}")]
    NonPositiveStdDev(f64),
    #[error("Tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),
    #[error("Lower bound {lb} exceeds upper bound {ub}")]
    InvertedBounds { lb: f64, ub: f64 },
    #[error("Violation threshold must be non-negative, got {0}")]
    NegativeThreshold(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum Func {
    /// `((x - x0) / sd)^2`
    Harmonic { x0: f64, sd: f64 },
    /// Zero within `tol` of `x0`; harmonic in the excess beyond it.
    FlatHarmonic { x0: f64, sd: f64, tol: f64 },
    /// Zero inside `[lb, ub]`; harmonic in the distance to the violated bound.
    Bounded { lb: f64, ub: f64, sd: f64 },
    /// Passes the inner function through only where its value exceeds `threshold`.
    ///
    /// Small violations are ignored entirely, which makes the function
    /// discontinuous at the threshold.
    SkipViolation { threshold: f64, inner: Box<Func> },
}

impl Func {
    pub fn harmonic(x0: f64, sd: f64) -> Self {
        Func::Harmonic { x0, sd }
    }

    pub fn value(&self, x: f64) -> f64 {
        match self {
            Func::Harmonic { x0, sd } => {
                let z = (x - x0) / sd;
                z * z
            }
            Func::FlatHarmonic { x0, sd, tol } => {
                let excess = (x - x0).abs() - tol;
                if excess <= 0.0 {
                    0.0
                } else {
                    let z = excess / sd;
                    z * z
                }
            }
            Func::Bounded { lb, ub, sd } => {
                let violation = if x < *lb {
                    lb - x
                } else if x > *ub {
                    x - ub
                } else {
                    return 0.0;
                };
                let z = violation / sd;
                z * z
            }
            Func::SkipViolation { threshold, inner } => {
                let v = inner.value(x);
                if v > *threshold { v } else { 0.0 }
            }
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            Func::Harmonic { x0, sd } => 2.0 * (x - x0) / (sd * sd),
            Func::FlatHarmonic { x0, sd, tol } => {
                let offset = x - x0;
                let excess = offset.abs() - tol;
                if excess <= 0.0 {
                    0.0
                } else {
                    2.0 * excess / (sd * sd) * offset.signum()
                }
            }
            Func::Bounded { lb, ub, sd } => {
                if x < *lb {
                    -2.0 * (lb - x) / (sd * sd)
                } else if x > *ub {
                    2.0 * (x - ub) / (sd * sd)
                } else {
                    0.0
                }
            }
            Func::SkipViolation { threshold, inner } => {
                if inner.value(x) > *threshold {
                    inner.derivative(x)
                } else {
                    0.0
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), FuncError> {
        match self {
            Func::Harmonic { sd, .. } => check_sd(*sd),
            Func::FlatHarmonic { sd, tol, .. } => {
                check_sd(*sd)?;
                if *tol < 0.0 {
                    return Err(FuncError::NegativeTolerance(*tol));
                }
                Ok(())
            }
            Func::Bounded { lb, ub, sd } => {
                check_sd(*sd)?;
                if lb > ub {
                    return Err(FuncError::InvertedBounds { lb: *lb, ub: *ub });
                }
                Ok(())
            }
            Func::SkipViolation { threshold, inner } => {
                if *threshold < 0.0 {
                    return Err(FuncError::NegativeThreshold(*threshold));
                }
                inner.validate()
            }
        }
    }
}

fn check_sd(sd: f64) -> Result<(), FuncError> {
    if sd > 0.0 && sd.is_finite() {
        Ok(())
    } else {
        Err(FuncError::NonPositiveStdDev(sd))
    }
}
