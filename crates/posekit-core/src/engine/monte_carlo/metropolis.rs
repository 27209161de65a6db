use crate::core::models::pose::Pose;
use crate::core::scoring::ScoreFunction;
use rand::{Rng, RngCore};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McOutcome {
    Accepted,
    /// Accepted with a score below every previously accepted state.
    AcceptedLowest,
    Rejected,
}

impl McOutcome {
    pub fn is_accepted(self) -> bool {
        !matches!(self, McOutcome::Rejected)
    }
}

/// Summary of one Monte Carlo run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct McRunStats {
    pub trials: usize,
    pub accepted: usize,
    pub rejected_by_filters: usize,
    pub lowest_score: f64,
    pub final_score: f64,
    pub acceptance_rate: f64,
}

/// Metropolis acceptance against the last accepted state, tracking the lowest state seen.
#[derive(Debug, Clone)]
pub struct MonteCarlo {
    score_function: ScoreFunction,
    temperature: f64,
    last_accepted: Pose,
    last_accepted_score: f64,
    lowest: Pose,
    lowest_score: f64,
    trials: usize,
    accepted: usize,
}

impl MonteCarlo {
    pub fn new(pose: &Pose, score_function: ScoreFunction, temperature: f64) -> Self {
        let score = score_function.score(pose);
        Self {
            score_function,
            temperature,
            last_accepted: pose.clone(),
            last_accepted_score: score,
            lowest: pose.clone(),
            lowest_score: score,
            trials: 0,
            accepted: 0,
        }
    }

    pub fn score_function(&self) -> &ScoreFunction {
        &self.score_function
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    /// Scores `pose` and applies the Metropolis criterion.
    ///
    /// On rejection `pose` is restored to the last accepted state.
    pub fn boltzmann(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> McOutcome {
        self.trials += 1;
        let score = self.score_function.score(pose);
        let delta = score - self.last_accepted_score;

        let accept = if score.is_nan() {
            false
        } else if delta <= 0.0 {
            true
        } else if self.temperature > 0.0 {
            let u: f64 = rng.r#gen();
            u < (-delta / self.temperature).exp()
        } else {
            false
        };

        if !accept {
            trace!(score, delta, "Rejected");
            pose.clone_from(&self.last_accepted);
            return McOutcome::Rejected;
        }

        self.accepted += 1;
        self.last_accepted.clone_from(pose);
        self.last_accepted_score = score;
        if score < self.lowest_score {
            self.lowest.clone_from(pose);
            self.lowest_score = score;
            trace!(score, "Accepted new lowest");
            McOutcome::AcceptedLowest
        } else {
            trace!(score, delta, "Accepted");
            McOutcome::Accepted
        }
    }

    /// Counts a trial rejected before scoring and restores the last accepted state.
    pub fn reject(&mut self, pose: &mut Pose) {
        self.trials += 1;
        pose.clone_from(&self.last_accepted);
    }

    /// Makes `pose` both the last accepted and the lowest state and clears the counters.
    pub fn reset(&mut self, pose: &Pose) {
        let score = self.score_function.score(pose);
        self.last_accepted.clone_from(pose);
        self.last_accepted_score = score;
        self.lowest.clone_from(pose);
        self.lowest_score = score;
        self.trials = 0;
        self.accepted = 0;
    }

    /// Replaces `pose` with the lowest state, which also becomes the last accepted one.
    pub fn recover_low(&mut self, pose: &mut Pose) {
        pose.clone_from(&self.lowest);
        self.last_accepted.clone_from(&self.lowest);
        self.last_accepted_score = self.lowest_score;
    }

    pub fn last_accepted_score(&self) -> f64 {
        self.last_accepted_score
    }

    pub fn lowest_score(&self) -> f64 {
        self.lowest_score
    }

    pub fn last_accepted_pose(&self) -> &Pose {
        &self.last_accepted
    }

    pub fn lowest_pose(&self) -> &Pose {
        &self.lowest
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.accepted as f64 / self.trials as f64
        }
    }
}
