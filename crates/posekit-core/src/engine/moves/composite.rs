use super::Mover;
use crate::core::models::pose::Pose;
use crate::core::scoring::{ScoreFunction, ScoreType};
use crate::engine::error::EngineError;
use rand::RngCore;
use rand::distributions::{Distribution, WeightedIndex};
use serde::Deserialize;
use tracing::trace;

fn invalid_mover(name: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidMover {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Applies its movers in order.
#[derive(Default)]
pub struct SequenceMover {
    movers: Vec<Box<dyn Mover>>,
}

impl SequenceMover {
    pub fn new(movers: Vec<Box<dyn Mover>>) -> Self {
        Self { movers }
    }

    pub fn push(&mut self, mover: Box<dyn Mover>) {
        self.movers.push(mover);
    }

    pub fn len(&self) -> usize {
        self.movers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }
}

impl Mover for SequenceMover {
    fn name(&self) -> &str {
        "SequenceMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        for mover in &mut self.movers {
            trace!(mover = mover.name(), "Applying");
            mover.apply(pose, rng)?;
        }
        Ok(())
    }
}

/// Applies one mover per call, picked with probability proportional to its weight.
pub struct RandomMover {
    movers: Vec<Box<dyn Mover>>,
    distribution: WeightedIndex<f64>,
    last_choice: Option<usize>,
}

impl RandomMover {
    pub fn new(weighted: Vec<(Box<dyn Mover>, f64)>) -> Result<Self, EngineError> {
        const NAME: &str = "RandomMover";
        if weighted.is_empty() {
            return Err(invalid_mover(NAME, "needs at least one mover"));
        }
        if let Some((mover, w)) = weighted.iter().find(|(_, w)| !(*w > 0.0 && w.is_finite())) {
            return Err(invalid_mover(
                NAME,
                format!("weight of '{}' must be positive and finite, got {}", mover.name(), w),
            ));
        }
        let (movers, weights): (Vec<_>, Vec<_>) = weighted.into_iter().unzip();
        if !weights.iter().sum::<f64>().is_finite() {
            return Err(invalid_mover(NAME, "sum of weights is not finite"));
        }
        let distribution =
            WeightedIndex::new(&weights).map_err(|e| invalid_mover(NAME, e.to_string()))?;
        Ok(Self {
            movers,
            distribution,
            last_choice: None,
        })
    }

    /// Index of the mover picked by the last call to [`Mover::apply`].
    pub fn last_choice(&self) -> Option<usize> {
        self.last_choice
    }
}

impl Mover for RandomMover {
    fn name(&self) -> &str {
        "RandomMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let index = self.distribution.sample(rng);
        self.last_choice = Some(index);
        self.movers[index].apply(pose, rng)
    }
}

/// Applies the inner mover `count` times.
pub struct RepeatMover {
    inner: Box<dyn Mover>,
    count: usize,
}

impl RepeatMover {
    pub fn new(inner: Box<dyn Mover>, count: usize) -> Self {
        Self { inner, count }
    }
}

impl Mover for RepeatMover {
    fn name(&self) -> &str {
        "RepeatMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        for _ in 0..self.count {
            self.inner.apply(pose, rng)?;
        }
        Ok(())
    }

    fn score_function_mut(&mut self) -> Option<&mut ScoreFunction> {
        self.inner.score_function_mut()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ramp {
    #[default]
    Linear,
    Geometric,
}

impl Ramp {
    /// Weight at `cycle` of `cycles`, moving from `start` to `end`.
    pub fn weight_at(self, start: f64, end: f64, cycle: usize, cycles: usize) -> f64 {
        if cycles <= 1 {
            return end;
        }
        let t = cycle.min(cycles - 1) as f64 / (cycles - 1) as f64;
        match self {
            Ramp::Linear => start + (end - start) * t,
            Ramp::Geometric => start * (end / start).powf(t),
        }
    }
}

/// Applies the inner mover `cycles` times while ramping one score-term weight.
///
/// The inner mover keeps the end weight after the last cycle.
pub struct RampingMover {
    inner: Box<dyn Mover>,
    score_type: ScoreType,
    start_weight: f64,
    end_weight: f64,
    cycles: usize,
    ramp: Ramp,
}

impl RampingMover {
    pub fn new(
        inner: Box<dyn Mover>,
        score_type: ScoreType,
        start_weight: f64,
        end_weight: f64,
        cycles: usize,
        ramp: Ramp,
    ) -> Result<Self, EngineError> {
        const NAME: &str = "RampingMover";
        if !(start_weight.is_finite() && end_weight.is_finite()) {
            return Err(invalid_mover(NAME, "weights must be finite"));
        }
        if ramp == Ramp::Geometric && !(start_weight > 0.0 && end_weight > 0.0) {
            return Err(invalid_mover(NAME, "geometric ramps need positive weights"));
        }
        Ok(Self {
            inner,
            score_type,
            start_weight,
            end_weight,
            cycles,
            ramp,
        })
    }
}

impl Mover for RampingMover {
    fn name(&self) -> &str {
        "RampingMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        for cycle in 0..self.cycles {
            let weight = self
                .ramp
                .weight_at(self.start_weight, self.end_weight, cycle, self.cycles);
            let inner_name = self.inner.name().to_string();
            self.inner
                .score_function_mut()
                .ok_or_else(|| {
                    invalid_mover(
                        "RampingMover",
                        format!("inner mover '{}' has no score function", inner_name),
                    )
                })?
                .set_weight(self.score_type, weight);
            trace!(cycle, weight, score_type = %self.score_type, "Ramped weight");
            self.inner.apply(pose, rng)?;
        }
        Ok(())
    }

    fn score_function_mut(&mut self) -> Option<&mut ScoreFunction> {
        self.inner.score_function_mut()
    }
}
