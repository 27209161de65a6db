use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::pose::PoseError;
use crate::core::scoring::ScoreFunctionError;
use crate::core::select::SelectionError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Pose error: {source}")]
    Pose {
        #[from]
        source: PoseError,
    },

    #[error("Selection failed: {source}")]
    Selection {
        #[from]
        source: SelectionError,
    },

    #[error("Score function error: {source}")]
    ScoreFunction {
        #[from]
        source: ScoreFunctionError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Minimization failed: {0}")]
    Minimization(String),

    #[error("Integration failed at step {step}: {message}")]
    Integration { step: usize, message: String },

    #[error("Sampling failed: {0}")]
    Sampling(String),

    #[error("Mover '{name}' cannot be applied: {reason}")]
    InvalidMover { name: String, reason: String },

    #[error("Filter '{filter}' failed with metric {metric}")]
    FilterFailed { filter: String, metric: f64 },

    #[error("Failed to write trajectory to {path}: {source}")]
    TrajectoryWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
