use crate::engine::config::{ConfigError, invalid};
use serde::Deserialize;

/// The Metropolis temperature (kT, kcal/mol) as a function of trial index.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum TemperatureSchedule {
    Constant { kt: f64 },
    Linear { start: f64, end: f64 },
    Geometric { start: f64, end: f64 },
}

impl TemperatureSchedule {
    /// kT for trial `trial` of `trials`; the first trial gets `start` and the last `end`.
    pub fn temperature_at(&self, trial: usize, trials: usize) -> f64 {
        let t = if trials <= 1 {
            0.0
        } else {
            trial.min(trials - 1) as f64 / (trials - 1) as f64
        };
        match *self {
            TemperatureSchedule::Constant { kt } => kt,
            TemperatureSchedule::Linear { start, end } => start + (end - start) * t,
            TemperatureSchedule::Geometric { start, end } => start * (end / start).powf(t),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            TemperatureSchedule::Constant { kt } => {
                if !(kt >= 0.0 && kt.is_finite()) {
                    return Err(invalid("schedule.kt", "must be finite and non-negative"));
                }
            }
            TemperatureSchedule::Linear { start, end } => {
                if !(start >= 0.0 && end >= 0.0 && start.is_finite() && end.is_finite()) {
                    return Err(invalid(
                        "schedule",
                        "linear temperatures must be finite and non-negative",
                    ));
                }
            }
            TemperatureSchedule::Geometric { start, end } => {
                if !(start > 0.0 && end > 0.0 && start.is_finite() && end.is_finite()) {
                    return Err(invalid(
                        "schedule",
                        "geometric temperatures must be finite and positive",
                    ));
                }
            }
        }
        Ok(())
    }
}
