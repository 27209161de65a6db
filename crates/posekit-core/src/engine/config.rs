use super::monte_carlo::TemperatureSchedule;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Failed to read configuration file {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinimizerType {
    #[default]
    Lbfgs,
    SteepestDescent,
    Simplex,
}

/// Options shared by all Cartesian minimizers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct MinimizerOptions {
    pub minimizer: MinimizerType,
    pub max_iterations: usize,
    /// Relative function change below which a minimizer reports convergence.
    pub tolerance: f64,
    /// Gradient norm in kcal/(mol·Å) below which gradient minimizers stop.
    pub gradient_tolerance: f64,
    /// Number of correction pairs kept by L-BFGS.
    pub lbfgs_memory: usize,
    /// Initial simplex edge length in Angstroms.
    pub simplex_step: f64,
    /// Upper bound on any single coordinate change of a line-search trial step.
    pub max_step: f64,
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            minimizer: MinimizerType::Lbfgs,
            max_iterations: 2000,
            tolerance: 1e-7,
            gradient_tolerance: 1e-4,
            lbfgs_memory: 8,
            simplex_step: 0.5,
            max_step: 1.0,
        }
    }
}

impl MinimizerOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if !(self.tolerance >= 0.0) {
            return Err(invalid("tolerance", "must be non-negative"));
        }
        if !(self.gradient_tolerance >= 0.0) {
            return Err(invalid("gradient_tolerance", "must be non-negative"));
        }
        if self.lbfgs_memory == 0 {
            return Err(invalid("lbfgs_memory", "must be at least 1"));
        }
        if !(self.simplex_step > 0.0 && self.simplex_step.is_finite()) {
            return Err(invalid("simplex_step", "must be positive and finite"));
        }
        if !(self.max_step > 0.0 && self.max_step.is_finite()) {
            return Err(invalid("max_step", "must be positive and finite"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MinimizerOptionsBuilder {
    minimizer: Option<MinimizerType>,
    max_iterations: Option<usize>,
    tolerance: Option<f64>,
    gradient_tolerance: Option<f64>,
    lbfgs_memory: Option<usize>,
    simplex_step: Option<f64>,
    max_step: Option<f64>,
}

impl MinimizerOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimizer(mut self, minimizer: MinimizerType) -> Self {
        self.minimizer = Some(minimizer);
        self
    }
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = Some(tolerance);
        self
    }
    pub fn lbfgs_memory(mut self, memory: usize) -> Self {
        self.lbfgs_memory = Some(memory);
        self
    }
    pub fn simplex_step(mut self, step: f64) -> Self {
        self.simplex_step = Some(step);
        self
    }
    pub fn max_step(mut self, step: f64) -> Self {
        self.max_step = Some(step);
        self
    }

    pub fn build(self) -> Result<MinimizerOptions, ConfigError> {
        let defaults = MinimizerOptions::default();
        let options = MinimizerOptions {
            minimizer: self.minimizer.unwrap_or(defaults.minimizer),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            tolerance: self.tolerance.unwrap_or(defaults.tolerance),
            gradient_tolerance: self
                .gradient_tolerance
                .unwrap_or(defaults.gradient_tolerance),
            lbfgs_memory: self.lbfgs_memory.unwrap_or(defaults.lbfgs_memory),
            simplex_step: self.simplex_step.unwrap_or(defaults.simplex_step),
            max_step: self.max_step.unwrap_or(defaults.max_step),
        };
        options.validate()?;
        Ok(options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Thermostat {
    None,
    /// Weak coupling to a heat bath with relaxation time `tau` in ps.
    Berendsen { tau: f64 },
}

impl Default for Thermostat {
    fn default() -> Self {
        Thermostat::Berendsen { tau: 0.1 }
    }
}

/// Molecular dynamics run parameters. Units are ps, K and Angstroms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct MdConfig {
    pub nstep: usize,
    /// Integration timestep in ps.
    pub timestep: f64,
    /// Target temperature in K, also used to draw the initial velocities.
    pub temperature: f64,
    pub thermostat: Thermostat,
    /// Constrain bonds to hydrogen with RATTLE.
    pub use_rattle: bool,
    pub rattle_tolerance: f64,
    pub rattle_max_iterations: usize,
    /// Record a snapshot every this many steps.
    pub report_interval: usize,
    /// Also record free-atom coordinates with every snapshot.
    pub store_frames: bool,
    /// Minimize the free atoms before integrating.
    pub preminimize: Option<MinimizerOptions>,
    /// Harmonically restrain free atoms to their starting coordinates for the run.
    pub coordinate_restraint_sd: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for MdConfig {
    fn default() -> Self {
        Self {
            nstep: 1000,
            timestep: 0.001,
            temperature: 300.0,
            thermostat: Thermostat::default(),
            use_rattle: true,
            rattle_tolerance: 1e-6,
            rattle_max_iterations: 200,
            report_interval: 100,
            store_frames: false,
            preminimize: None,
            coordinate_restraint_sd: None,
            seed: None,
        }
    }
}

impl MdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            return Err(invalid("timestep", "must be positive and finite"));
        }
        if !(self.temperature >= 0.0 && self.temperature.is_finite()) {
            return Err(invalid("temperature", "must be non-negative and finite"));
        }
        if let Thermostat::Berendsen { tau } = self.thermostat {
            if !(tau > 0.0 && tau.is_finite()) {
                return Err(invalid("thermostat.tau", "must be positive and finite"));
            }
        }
        if !(self.rattle_tolerance > 0.0 && self.rattle_tolerance.is_finite()) {
            return Err(invalid("rattle_tolerance", "must be positive and finite"));
        }
        if self.rattle_max_iterations == 0 {
            return Err(invalid("rattle_max_iterations", "must be at least 1"));
        }
        if self.report_interval == 0 {
            return Err(invalid("report_interval", "must be at least 1"));
        }
        if let Some(sd) = self.coordinate_restraint_sd {
            if !(sd > 0.0 && sd.is_finite()) {
                return Err(invalid("coordinate_restraint_sd", "must be positive and finite"));
            }
        }
        if let Some(options) = &self.preminimize {
            options.validate()?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MdConfigBuilder {
    nstep: Option<usize>,
    temperature: Option<f64>,
    timestep: Option<f64>,
    thermostat: Option<Thermostat>,
    use_rattle: Option<bool>,
    rattle_tolerance: Option<f64>,
    rattle_max_iterations: Option<usize>,
    report_interval: Option<usize>,
    store_frames: bool,
    preminimize: Option<MinimizerOptions>,
    coordinate_restraint_sd: Option<f64>,
    seed: Option<u64>,
}

impl MdConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nstep(mut self, nstep: usize) -> Self {
        self.nstep = Some(nstep);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn timestep(mut self, ps: f64) -> Self {
        self.timestep = Some(ps);
        self
    }
    pub fn thermostat(mut self, thermostat: Thermostat) -> Self {
        self.thermostat = Some(thermostat);
        self
    }
    pub fn use_rattle(mut self, enabled: bool) -> Self {
        self.use_rattle = Some(enabled);
        self
    }
    pub fn rattle_tolerance(mut self, tolerance: f64) -> Self {
        self.rattle_tolerance = Some(tolerance);
        self
    }
    pub fn rattle_max_iterations(mut self, iterations: usize) -> Self {
        self.rattle_max_iterations = Some(iterations);
        self
    }
    pub fn report_interval(mut self, steps: usize) -> Self {
        self.report_interval = Some(steps);
        self
    }
    pub fn store_frames(mut self, enabled: bool) -> Self {
        self.store_frames = enabled;
        self
    }
    pub fn preminimize(mut self, options: MinimizerOptions) -> Self {
        self.preminimize = Some(options);
        self
    }
    pub fn coordinate_restraint_sd(mut self, sd: f64) -> Self {
        self.coordinate_restraint_sd = Some(sd);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<MdConfig, ConfigError> {
        let defaults = MdConfig::default();
        let config = MdConfig {
            nstep: self.nstep.ok_or(ConfigError::MissingParameter("nstep"))?,
            temperature: self
                .temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
            timestep: self.timestep.unwrap_or(defaults.timestep),
            thermostat: self.thermostat.unwrap_or(defaults.thermostat),
            use_rattle: self.use_rattle.unwrap_or(defaults.use_rattle),
            rattle_tolerance: self.rattle_tolerance.unwrap_or(defaults.rattle_tolerance),
            rattle_max_iterations: self
                .rattle_max_iterations
                .unwrap_or(defaults.rattle_max_iterations),
            report_interval: self.report_interval.unwrap_or(defaults.report_interval),
            store_frames: self.store_frames,
            preminimize: self.preminimize,
            coordinate_restraint_sd: self.coordinate_restraint_sd,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub trials: usize,
    pub schedule: TemperatureSchedule,
    /// Leave the pose at the lowest-scoring accepted state when the run ends.
    pub recover_low: bool,
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.validate()
    }
}

#[derive(Default)]
pub struct MonteCarloConfigBuilder {
    trials: Option<usize>,
    schedule: Option<TemperatureSchedule>,
    recover_low: Option<bool>,
}

impl MonteCarloConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }
    pub fn schedule(mut self, schedule: TemperatureSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }
    pub fn recover_low(mut self, recover: bool) -> Self {
        self.recover_low = Some(recover);
        self
    }

    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        let config = MonteCarloConfig {
            trials: self.trials.ok_or(ConfigError::MissingParameter("trials"))?,
            schedule: self
                .schedule
                .ok_or(ConfigError::MissingParameter("schedule"))?,
            recover_low: self.recover_low.unwrap_or(true),
        };
        config.validate()?;
        Ok(config)
    }
}
