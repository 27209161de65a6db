//! Minimization over Cartesian degrees of freedom.
//!
//! A [`CartesianMinimizerMap`] flattens the free atoms of a [`MoveMap`](crate::core::select::MoveMap)
//! into a [`Multivec`]; a [`CartesianMultifunc`] evaluates a score function at
//! such a vector; and a [`Minimizer`] drives the vector downhill with L-BFGS,
//! steepest descent or the Nelder-Mead simplex.

mod cartesian_map;
mod line_search;
mod minimizer;
mod multifunc;
mod nelder_mead;

pub use cartesian_map::CartesianMinimizerMap;
pub use minimizer::{MinimizationReport, Minimizer, MinimizerOutcome, minimize_pose};
pub use multifunc::{CartesianMultifunc, Multifunc, Multivec};
pub use nelder_mead::NelderMeadSimplex;
