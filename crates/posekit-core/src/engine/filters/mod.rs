//! Predicates over a pose, each backed by a numeric metric.

mod geometric;
mod score;

pub use geometric::{AtomPairDistanceFilter, RmsdFilter};
pub use score::ScoreFilter;

use crate::core::models::pose::Pose;
use crate::engine::error::EngineError;

pub trait Filter: Send {
    fn name(&self) -> &str;

    /// Returns `true` if the pose passes.
    fn apply(&self, pose: &Pose) -> Result<bool, EngineError>;

    /// The value the pass/fail decision is based on.
    fn report_metric(&self, pose: &Pose) -> Result<f64, EngineError>;
}
