//! Metropolis Monte Carlo over poses.
//!
//! Two styles are provided. [`GenericMonteCarloMover`] wraps any [`Mover`](crate::engine::moves::Mover)
//! and accepts or reverts whole-pose trials. The [`McSampler`] combinators keep a
//! stored and a proposed value per degree of freedom and are driven by [`run_sampling`].

mod generic;
mod metropolis;
mod samplers;
mod schedule;

pub use generic::GenericMonteCarloMover;
pub use metropolis::{McOutcome, McRunStats, MonteCarlo};
pub use samplers::{
    AtomDisplacementSampler, McAny, McLoop, McSampler, RigidBodySampler, run_sampling,
};
pub use schedule::TemperatureSchedule;
