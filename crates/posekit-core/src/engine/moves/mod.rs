//! Pose perturbation operators.
//!
//! Every mover implements [`Mover`]. Leaf movers perturb coordinates
//! ([`RigidBodyPerturbMover`], [`TumbleMover`], [`GaussianCartesianMover`]) or
//! run one of the engine algorithms ([`MinMover`], [`MdMover`]); the composite
//! movers ([`SequenceMover`], [`RandomMover`], [`RepeatMover`],
//! [`RampingMover`]) combine other movers.

mod cartesian;
mod composite;
mod protocol_movers;
mod rigid_body;

pub use cartesian::GaussianCartesianMover;
pub use composite::{Ramp, RampingMover, RandomMover, RepeatMover, SequenceMover};
pub use protocol_movers::{MdMover, MinMover};
pub use rigid_body::{RigidBodyPerturbMover, TumbleMover};

use crate::core::models::pose::Pose;
use crate::core::scoring::ScoreFunction;
use crate::engine::error::EngineError;
use rand::RngCore;

pub trait Mover: Send {
    fn name(&self) -> &str;

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError>;

    /// The score function this mover optimizes against, if any.
    ///
    /// Wrappers such as [`RampingMover`] use it to retune weights between applications.
    fn score_function_mut(&mut self) -> Option<&mut ScoreFunction> {
        None
    }
}
