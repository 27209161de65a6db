use super::metropolis::{McOutcome, McRunStats, MonteCarlo};
use crate::core::models::pose::Pose;
use crate::core::scoring::ScoreFunction;
use crate::engine::config::MonteCarloConfig;
use crate::engine::error::EngineError;
use crate::engine::filters::Filter;
use crate::engine::moves::Mover;
use rand::RngCore;
use tracing::{info, instrument, trace};

/// Repeatedly perturbs a pose with an inner mover and keeps or reverts each
/// trial by filters and the Metropolis criterion.
pub struct GenericMonteCarloMover {
    mover: Box<dyn Mover>,
    score_function: ScoreFunction,
    config: MonteCarloConfig,
    filters: Vec<Box<dyn Filter>>,
    last_run: Option<McRunStats>,
}

impl GenericMonteCarloMover {
    pub fn new(
        mover: Box<dyn Mover>,
        score_function: ScoreFunction,
        config: MonteCarloConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            mover,
            score_function,
            config,
            filters: Vec::new(),
            last_run: None,
        })
    }

    pub fn with_filter(mut self, filter: Box<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn add_filter(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn last_run(&self) -> Option<McRunStats> {
        self.last_run
    }

    fn passes_filters(&self, pose: &Pose) -> Result<bool, EngineError> {
        for filter in &self.filters {
            if !filter.apply(pose)? {
                trace!(filter = filter.name(), "Trial rejected by filter");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Mover for GenericMonteCarloMover {
    fn name(&self) -> &str {
        "GenericMonteCarloMover"
    }

    #[instrument(skip_all, name = "generic_monte_carlo")]
    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let trials = self.config.trials;
        let schedule = self.config.schedule;
        let mut mc = MonteCarlo::new(
            pose,
            self.score_function.clone(),
            schedule.temperature_at(0, trials),
        );
        let mut rejected_by_filters = 0;
        let mut new_lowest = 0;

        for trial in 0..trials {
            mc.set_temperature(schedule.temperature_at(trial, trials));
            self.mover.apply(pose, rng)?;

            if !self.passes_filters(pose)? {
                mc.reject(pose);
                rejected_by_filters += 1;
                continue;
            }
            if mc.boltzmann(pose, rng) == McOutcome::AcceptedLowest {
                new_lowest += 1;
            }
        }

        if self.config.recover_low {
            mc.recover_low(pose);
        }

        let stats = McRunStats {
            trials: mc.trials(),
            accepted: mc.accepted(),
            rejected_by_filters,
            lowest_score: mc.lowest_score(),
            final_score: mc.last_accepted_score(),
            acceptance_rate: mc.acceptance_rate(),
        };
        info!(
            mover = self.mover.name(),
            trials = stats.trials,
            accepted = stats.accepted,
            rejected_by_filters,
            new_lowest,
            lowest_score = stats.lowest_score,
            final_score = stats.final_score,
            "Monte Carlo run finished"
        );
        self.last_run = Some(stats);
        Ok(())
    }

    fn score_function_mut(&mut self) -> Option<&mut ScoreFunction> {
        Some(&mut self.score_function)
    }
}
