//! # Engine Module
//!
//! The stateful layer of posekit: everything that changes a [`Pose`](crate::core::models::pose::Pose)
//! according to a [`ScoreFunction`](crate::core::scoring::ScoreFunction).
//!
//! ## Architecture
//!
//! - **Optimization** ([`optimization`]) - Cartesian minimizer map, L-BFGS, steepest descent
//!   and Nelder-Mead simplex minimizers
//! - **Molecular Dynamics** ([`md`]) - Velocity Verlet with RATTLE and a Berendsen thermostat
//! - **Monte Carlo** ([`monte_carlo`]) - Metropolis acceptance, temperature schedules and
//!   sampler combinators
//! - **Movers** ([`moves`]) and **Filters** ([`filters`]) - The pluggable perturbations and
//!   predicates the samplers are assembled from
//! - **Configuration** ([`config`]), **Progress Monitoring** ([`progress`]) and
//!   **Error Handling** ([`error`])

pub mod config;
pub mod error;
pub mod filters;
pub mod md;
pub mod monte_carlo;
pub mod moves;
pub mod optimization;
pub mod progress;
