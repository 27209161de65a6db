use super::Filter;
use crate::core::models::pose::Pose;
use crate::core::scoring::{ScoreFunction, ScoreType};
use crate::engine::error::EngineError;

/// Passes when the weighted score, or a single weighted term of it, is at most `threshold`.
#[derive(Debug, Clone)]
pub struct ScoreFilter {
    pub score_function: ScoreFunction,
    pub threshold: f64,
    pub score_type: Option<ScoreType>,
}

impl ScoreFilter {
    pub fn new(score_function: ScoreFunction, threshold: f64) -> Self {
        Self {
            score_function,
            threshold,
            score_type: None,
        }
    }

    pub fn with_score_type(mut self, score_type: ScoreType) -> Self {
        self.score_type = Some(score_type);
        self
    }
}

impl Filter for ScoreFilter {
    fn name(&self) -> &str {
        "ScoreFilter"
    }

    fn apply(&self, pose: &Pose) -> Result<bool, EngineError> {
        Ok(self.report_metric(pose)? <= self.threshold)
    }

    fn report_metric(&self, pose: &Pose) -> Result<f64, EngineError> {
        Ok(match self.score_type {
            Some(score_type) => self.score_function.score_term(pose, score_type),
            None => self.score_function.score(pose),
        })
    }
}
