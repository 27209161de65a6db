use crate::core::models::ids::AtomId;
use crate::core::models::pose::Pose;
use crate::core::scoring::score_function::ScoreFunctionFile;
use crate::core::scoring::{ScoreFunction, ScoreFunctionOptions, ScoreType};
use crate::core::select::{MoveMapSpec, ResidueSelector, ResidueSpecifier, SelectionError};
use crate::engine::config::{ConfigError, MdConfig, MinimizerOptions, MonteCarloConfig, invalid};
use crate::engine::error::EngineError;
use crate::engine::filters::{AtomPairDistanceFilter, Filter, RmsdFilter, ScoreFilter};
use crate::engine::md::{CartesianMd, MdReport};
use crate::engine::monte_carlo::{GenericMonteCarloMover, McRunStats, TemperatureSchedule};
use crate::engine::moves::{
    GaussianCartesianMover, MdMover, MinMover, Mover, Ramp, RampingMover, RandomMover,
    RepeatMover, RigidBodyPerturbMover, SequenceMover, TumbleMover,
};
use crate::engine::optimization::{MinimizationReport, minimize_pose};
use crate::engine::progress::{Progress, ProgressReporter};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A complete protocol: one score function applied through an ordered list of stages.
///
/// ```toml
/// seed = 7
///
/// [score-function.weights]
/// bond-stretch = 1.0
/// lennard-jones = 1.0
///
/// [[stages]]
/// type = "minimize"
/// movemap = { residues = { type = "chain", chains = ["B"] } }
///
/// [[stages]]
/// type = "monte-carlo"
/// trials = 200
/// schedule = { type = "linear", start = 2.0, end = 0.1 }
/// mover = { type = "rigid-body", residues = { type = "chain", chains = ["B"] }, translation-sd = 0.3, rotation-sd-degrees = 5.0 }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Seed for every stochastic stage. Entropy is used when absent.
    pub seed: Option<u64>,
    #[serde(default)]
    pub score_function: ScoreFunctionSpec,
    #[serde(default)]
    pub stages: Vec<StageSpec>,
}

impl ProtocolConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads a protocol file. A relative score-function path is resolved
    /// against the directory holding the protocol file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let (Some(sfxn_path), Some(dir)) = (&mut config.score_function.path, path.parent()) {
            if sfxn_path.is_relative() {
                *sfxn_path = dir.join(&*sfxn_path);
            }
        }
        Ok(config)
    }
}

/// Either a path to a score-function TOML file or inline weights and options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScoreFunctionSpec {
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    pub options: Option<ScoreFunctionOptions>,
}

impl ScoreFunctionSpec {
    pub fn build(&self) -> Result<ScoreFunction, EngineError> {
        match &self.path {
            Some(_) if !self.weights.is_empty() || self.options.is_some() => Err(invalid(
                "score-function",
                "give either a path or inline weights and options, not both",
            )
            .into()),
            Some(path) => Ok(ScoreFunction::load(path)?),
            None => Ok(ScoreFunctionFile {
                weights: self.weights.clone(),
                options: self.options.clone().unwrap_or_default(),
            }
            .into_score_function()?),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
pub enum StageSpec {
    Minimize {
        #[serde(default)]
        movemap: MoveMapSpec,
        #[serde(default)]
        options: MinimizerOptions,
    },
    Md {
        #[serde(default)]
        movemap: MoveMapSpec,
        #[serde(default)]
        config: MdConfig,
    },
    MonteCarlo {
        mover: MoverSpec,
        trials: usize,
        schedule: TemperatureSchedule,
        #[serde(default = "default_true")]
        recover_low: bool,
        #[serde(default)]
        filters: Vec<FilterSpec>,
    },
    /// Aborts the protocol unless the pose passes.
    Filter { filter: FilterSpec },
}

impl StageSpec {
    pub fn phase_name(&self) -> &'static str {
        match self {
            StageSpec::Minimize { .. } => "Minimization",
            StageSpec::Md { .. } => "Molecular Dynamics",
            StageSpec::MonteCarlo { .. } => "Monte Carlo",
            StageSpec::Filter { .. } => "Filter",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
pub enum MoverSpec {
    RigidBody {
        residues: ResidueSelector,
        translation_sd: f64,
        rotation_sd_degrees: f64,
    },
    Tumble {
        residues: ResidueSelector,
    },
    Gaussian {
        #[serde(default)]
        movemap: MoveMapSpec,
        sd: f64,
    },
    Minimize {
        #[serde(default)]
        movemap: MoveMapSpec,
        #[serde(default)]
        options: MinimizerOptions,
    },
    Md {
        #[serde(default)]
        movemap: MoveMapSpec,
        #[serde(default)]
        config: MdConfig,
    },
    Sequence {
        movers: Vec<MoverSpec>,
    },
    Random {
        movers: Vec<WeightedMoverSpec>,
    },
    Repeat {
        mover: Box<MoverSpec>,
        count: usize,
    },
    Ramp {
        mover: Box<MoverSpec>,
        score_type: ScoreType,
        start_weight: f64,
        end_weight: f64,
        cycles: usize,
        #[serde(default)]
        ramp: Ramp,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WeightedMoverSpec {
    pub weight: f64,
    pub mover: MoverSpec,
}

impl MoverSpec {
    /// Instantiates the mover; score-function based movers get a copy of `score_function`.
    pub fn build(&self, score_function: &ScoreFunction) -> Result<Box<dyn Mover>, EngineError> {
        let mover: Box<dyn Mover> = match self {
            MoverSpec::RigidBody {
                residues,
                translation_sd,
                rotation_sd_degrees,
            } => Box::new(RigidBodyPerturbMover::new(
                residues.clone(),
                *translation_sd,
                *rotation_sd_degrees,
            )),
            MoverSpec::Tumble { residues } => Box::new(TumbleMover::new(residues.clone())),
            MoverSpec::Gaussian { movemap, sd } => {
                Box::new(GaussianCartesianMover::new(movemap.clone(), *sd)?)
            }
            MoverSpec::Minimize { movemap, options } => Box::new(MinMover::new(
                score_function.clone(),
                movemap.clone(),
                options.clone(),
            )?),
            MoverSpec::Md { movemap, config } => Box::new(MdMover::new(
                score_function.clone(),
                movemap.clone(),
                config.clone(),
            )?),
            MoverSpec::Sequence { movers } => Box::new(SequenceMover::new(
                movers
                    .iter()
                    .map(|spec| spec.build(score_function))
                    .collect::<Result<_, _>>()?,
            )),
            MoverSpec::Random { movers } => Box::new(RandomMover::new(
                movers
                    .iter()
                    .map(|w| Ok((w.mover.build(score_function)?, w.weight)))
                    .collect::<Result<_, EngineError>>()?,
            )?),
            MoverSpec::Repeat { mover, count } => {
                Box::new(RepeatMover::new(mover.build(score_function)?, *count))
            }
            MoverSpec::Ramp {
                mover,
                score_type,
                start_weight,
                end_weight,
                cycles,
                ramp,
            } => Box::new(RampingMover::new(
                mover.build(score_function)?,
                *score_type,
                *start_weight,
                *end_weight,
                *cycles,
                *ramp,
            )?),
        };
        Ok(mover)
    }
}

/// Names one atom by chain, residue number and atom name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AtomSpecifier {
    pub chain_id: char,
    pub residue_number: isize,
    pub atom_name: String,
}

impl AtomSpecifier {
    pub fn resolve(&self, pose: &Pose) -> Result<AtomId, SelectionError> {
        pose.find_atom(self.chain_id, self.residue_number, &self.atom_name)
            .ok_or_else(|| SelectionError::AtomNotFound {
                residue: ResidueSpecifier::new(self.chain_id, self.residue_number),
                atom_name: self.atom_name.clone(),
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    deny_unknown_fields
)]
pub enum FilterSpec {
    Score {
        threshold: f64,
        score_type: Option<ScoreType>,
    },
    /// RMSD of the selected atoms against the protocol's input pose.
    Rmsd {
        #[serde(default)]
        atoms: MoveMapSpec,
        threshold: f64,
    },
    AtomPairDistance {
        atom1: AtomSpecifier,
        atom2: AtomSpecifier,
        max_distance: f64,
    },
}

impl FilterSpec {
    pub fn build(
        &self,
        reference: &Pose,
        score_function: &ScoreFunction,
    ) -> Result<Box<dyn Filter>, EngineError> {
        let filter: Box<dyn Filter> = match self {
            FilterSpec::Score {
                threshold,
                score_type,
            } => {
                let filter = ScoreFilter::new(score_function.clone(), *threshold);
                Box::new(match score_type {
                    Some(ty) => filter.with_score_type(*ty),
                    None => filter,
                })
            }
            FilterSpec::Rmsd { atoms, threshold } => {
                let atoms = atoms.build(reference)?.free_atoms().to_vec();
                Box::new(RmsdFilter::from_pose(reference, atoms, *threshold)?)
            }
            FilterSpec::AtomPairDistance {
                atom1,
                atom2,
                max_distance,
            } => Box::new(AtomPairDistanceFilter::new(
                atom1.resolve(reference)?,
                atom2.resolve(reference)?,
                *max_distance,
            )),
        };
        Ok(filter)
    }
}

#[derive(Debug, Clone)]
pub enum StageOutcome {
    Minimization(MinimizationReport),
    Md(MdReport),
    MonteCarlo(McRunStats),
    Filter { name: String, metric: f64 },
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: &'static str,
    pub score_before: f64,
    pub score_after: f64,
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone)]
pub struct ProtocolResult {
    pub initial_score: f64,
    pub final_score: f64,
    pub final_pose: Pose,
    pub stages: Vec<StageReport>,
}

#[instrument(skip_all, name = "protocol_workflow")]
pub fn run(
    initial_pose: &Pose,
    config: &ProtocolConfig,
    reporter: &ProgressReporter,
) -> Result<ProtocolResult, EngineError> {
    let score_function = config.score_function.build()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut pose = initial_pose.clone();
    let initial_score = score_function.score(&pose);
    info!(
        initial_score,
        stages = config.stages.len(),
        "Starting protocol."
    );

    let mut stages = Vec::with_capacity(config.stages.len());
    for (index, stage) in config.stages.iter().enumerate() {
        let name = stage.phase_name();
        reporter.report(Progress::StageStart { index, name });
        let score_before = score_function.score(&pose);

        let outcome = run_stage(
            stage,
            &mut pose,
            initial_pose,
            &score_function,
            reporter,
            &mut rng,
        )?;

        let score_after = score_function.score(&pose);
        info!(
            stage = index,
            name, score_before, score_after, "Stage finished."
        );
        reporter.report(Progress::StageFinish {
            index,
            score: score_after,
        });
        stages.push(StageReport {
            name,
            score_before,
            score_after,
            outcome,
        });
    }

    let final_score = score_function.score(&pose);
    info!(initial_score, final_score, "Protocol complete.");
    Ok(ProtocolResult {
        initial_score,
        final_score,
        final_pose: pose,
        stages,
    })
}

fn run_stage(
    stage: &StageSpec,
    pose: &mut Pose,
    reference: &Pose,
    score_function: &ScoreFunction,
    reporter: &ProgressReporter,
    rng: &mut dyn RngCore,
) -> Result<StageOutcome, EngineError> {
    match stage {
        StageSpec::Minimize { movemap, options } => {
            let movemap = movemap.build(pose)?;
            let report = minimize_pose(pose, score_function, &movemap, options)?;
            Ok(StageOutcome::Minimization(report))
        }
        StageSpec::Md { movemap, config } => {
            let movemap = movemap.build(pose)?;
            let md = CartesianMd::new(config.clone())?;
            let report = match config.seed {
                Some(_) => md.run(pose, score_function, &movemap, reporter)?,
                None => md.run_with_rng(pose, score_function, &movemap, reporter, rng)?,
            };
            Ok(StageOutcome::Md(report))
        }
        StageSpec::MonteCarlo {
            mover,
            trials,
            schedule,
            recover_low,
            filters,
        } => {
            let config = MonteCarloConfig {
                trials: *trials,
                schedule: *schedule,
                recover_low: *recover_low,
            };
            let mut mc = GenericMonteCarloMover::new(
                mover.build(score_function)?,
                score_function.clone(),
                config,
            )?;
            for filter in filters {
                mc.add_filter(filter.build(reference, score_function)?);
            }
            mc.apply(pose, rng)?;
            let stats = mc.last_run().ok_or_else(|| {
                EngineError::Internal("Monte Carlo stage finished without run statistics".into())
            })?;
            Ok(StageOutcome::MonteCarlo(stats))
        }
        StageSpec::Filter { filter } => {
            let filter = filter.build(reference, score_function)?;
            let metric = filter.report_metric(pose)?;
            if !filter.apply(pose)? {
                warn!(filter = filter.name(), metric, "Filter stage failed.");
                return Err(EngineError::FilterFailed {
                    filter: filter.name().to_string(),
                    metric,
                });
            }
            Ok(StageOutcome::Filter {
                name: filter.name().to_string(),
                metric,
            })
        }
    }
}
