//! # posekit
//!
//! A library for the numerical side of macromolecular modeling: a pose data model,
//! pluggable energy methods, and the minimizers, molecular dynamics integrators and
//! Monte Carlo samplers that move a pose downhill or sample it at temperature.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer split.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Pose`), constraint functions,
//!   energy methods combined into a `ScoreFunction`, residue selectors and geometry helpers.
//!
//! - **[`engine`]: The Logic Core.** Stateful algorithms operating on a pose: Cartesian
//!   minimization (L-BFGS, steepest descent, Nelder-Mead simplex), velocity-Verlet MD with
//!   RATTLE and a Berendsen thermostat, Metropolis Monte Carlo, and the movers and filters
//!   they are assembled from.
//!
//! - **[`workflows`]: The Public API.** Protocol runs that tie `engine` and `core` together
//!   from a single TOML description.
//!
//! Logging goes through `tracing`; no subscriber is installed by the library.

pub mod core;
pub mod engine;
pub mod workflows;
