use super::rattle::{Rattle, add_to_atom, atom_vector};
use super::trajectory::{MdSnapshot, Trajectory};
use super::{BOLTZMANN_KCAL, KCAL_TO_INTERNAL};
use crate::core::func::Func;
use crate::core::models::constraint::Constraint;
use crate::core::models::pose::Pose;
use crate::core::scoring::{ScoreFunction, ScoreType};
use crate::core::select::MoveMap;
use crate::engine::config::{MdConfig, Thermostat};
use crate::engine::error::EngineError;
use crate::engine::optimization::{CartesianMinimizerMap, Multivec, minimize_pose};
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::borrow::Cow;
use tracing::{debug, info, instrument, warn};

const BERENDSEN_MIN_SCALE: f64 = 0.8;
const BERENDSEN_MAX_SCALE: f64 = 1.25;

#[derive(Debug, Clone)]
pub struct MdReport {
    pub trajectory: Trajectory,
    pub final_temperature: f64,
    /// Total energy of the last snapshot minus the first, kcal/mol.
    pub energy_drift: f64,
    pub steps: usize,
}

/// Velocity-Verlet molecular dynamics over the free atoms of a move map.
#[derive(Debug, Clone)]
pub struct CartesianMd {
    config: MdConfig,
}

impl CartesianMd {
    pub fn new(config: MdConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MdConfig {
        &self.config
    }

    /// Runs the configured number of steps, seeding from the config or from entropy.
    pub fn run(
        &self,
        pose: &mut Pose,
        score_function: &ScoreFunction,
        movemap: &MoveMap,
        reporter: &ProgressReporter,
    ) -> Result<MdReport, EngineError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(pose, score_function, movemap, reporter, &mut rng)
    }

    #[instrument(skip_all, name = "cartesian_md")]
    pub fn run_with_rng(
        &self,
        pose: &mut Pose,
        score_function: &ScoreFunction,
        movemap: &MoveMap,
        reporter: &ProgressReporter,
        rng: &mut dyn RngCore,
    ) -> Result<MdReport, EngineError> {
        let Some(sd) = self.config.coordinate_restraint_sd else {
            return self.run_unrestrained(pose, score_function, movemap, reporter, rng);
        };

        let mut restraints = Vec::with_capacity(movemap.len());
        for &atom_id in movemap.free_atoms() {
            if let Some(target) = pose.position(atom_id) {
                restraints.push(Constraint::coordinate(atom_id, target, Func::harmonic(0.0, sd)));
            }
        }
        let mut combined = pose.constraints().to_vec();
        combined.extend(restraints);
        let original = pose.replace_constraints(combined);

        let score_function = if score_function.weight(ScoreType::CoordinateConstraint) == 0.0 {
            let mut restrained = score_function.clone();
            restrained.set_weight(ScoreType::CoordinateConstraint, 1.0);
            Cow::Owned(restrained)
        } else {
            Cow::Borrowed(score_function)
        };
        debug!(sd, "Restraining free atoms to their starting coordinates");

        let result = self.run_unrestrained(pose, &score_function, movemap, reporter, rng);
        pose.replace_constraints(original);
        result
    }

    fn run_unrestrained(
        &self,
        pose: &mut Pose,
        score_function: &ScoreFunction,
        movemap: &MoveMap,
        reporter: &ProgressReporter,
        rng: &mut dyn RngCore,
    ) -> Result<MdReport, EngineError> {
        let cfg = &self.config;
        if let Some(options) = &cfg.preminimize {
            let report = minimize_pose(pose, score_function, movemap, options)?;
            debug!(
                initial_score = report.initial_score,
                final_score = report.final_score,
                "Pre-minimization finished"
            );
        }

        let map = CartesianMinimizerMap::new(pose, movemap)?;
        let rattle = if cfg.use_rattle {
            Rattle::new(pose, &map, cfg.rattle_tolerance, cfg.rattle_max_iterations)
        } else {
            Rattle::from_constraints(Vec::new(), map.atom_masses(), 1.0, 1)
        };
        let masses = map.masses();
        let dof = degrees_of_freedom(map.atoms().len(), rattle.len());
        let dt = cfg.timestep;

        let mut x = map.copy_dofs_from_pose(pose)?;
        let mut v = initial_velocities(map.atom_masses(), &x, &rattle, dof, cfg.temperature, rng);
        let mut a = accelerations(pose, &map, score_function, &masses);

        let mut trajectory = Trajectory::new(map.atoms().to_vec());
        let record = |trajectory: &mut Trajectory, pose: &Pose, step: usize, v: &Multivec| {
            let potential = score_function.score(pose);
            let kinetic = kinetic_energy(&masses, v);
            let snapshot = MdSnapshot {
                step,
                time: step as f64 * dt,
                potential,
                kinetic,
                total: potential + kinetic,
                temperature: temperature(kinetic, dof),
            };
            let frame = cfg.store_frames.then(|| {
                map.atoms()
                    .iter()
                    .filter_map(|&id| pose.position(id))
                    .collect()
            });
            trajectory.record(snapshot, frame);
            snapshot
        };

        info!(
            n_atoms = map.atoms().len(),
            rattle_constraints = rattle.len(),
            dof,
            nstep = cfg.nstep,
            "Starting MD"
        );
        reporter.report(Progress::MdStart {
            total_steps: cfg.nstep,
        });
        record(&mut trajectory, pose, 0, &v);

        for step in 1..=cfg.nstep {
            v.axpy(0.5 * dt, &a, 1.0);
            let x_old = x.clone();
            x.axpy(dt, &v, 1.0);
            if rattle.constrain_positions(&mut x, &x_old, &mut v, dt).is_none() {
                return Err(integration_error(step, "RATTLE position stage did not converge"));
            }
            if !x.iter().all(|c| c.is_finite()) {
                return Err(integration_error(step, "coordinates became non-finite"));
            }
            map.copy_dofs_to_pose(pose, &x)?;

            a = accelerations(pose, &map, score_function, &masses);
            v.axpy(0.5 * dt, &a, 1.0);
            if rattle.constrain_velocities(&x, &mut v).is_none() {
                return Err(integration_error(step, "RATTLE velocity stage did not converge"));
            }

            if let Thermostat::Berendsen { tau } = cfg.thermostat {
                let current = temperature(kinetic_energy(&masses, &v), dof);
                v *= berendsen_scale(current, cfg.temperature, dt, tau);
            }

            if step % cfg.report_interval == 0 || step == cfg.nstep {
                let snapshot = record(&mut trajectory, pose, step, &v);
                reporter.report(Progress::MdSnapshot {
                    step,
                    temperature: snapshot.temperature,
                    total_energy: snapshot.total,
                });
            }
        }

        let final_temperature = temperature(kinetic_energy(&masses, &v), dof);
        reporter.report(Progress::MdFinish { final_temperature });
        let energy_drift = trajectory.energy_drift();
        info!(final_temperature, energy_drift, "MD finished");

        Ok(MdReport {
            trajectory,
            final_temperature,
            energy_drift,
            steps: cfg.nstep,
        })
    }
}

fn integration_error(step: usize, message: &str) -> EngineError {
    EngineError::Integration {
        step,
        message: message.to_string(),
    }
}

pub(crate) fn degrees_of_freedom(n_atoms: usize, n_constraints: usize) -> usize {
    (3 * n_atoms).saturating_sub(n_constraints)
}

/// `F / m` in Angstrom/ps² for every free DOF.
fn accelerations(
    pose: &Pose,
    map: &CartesianMinimizerMap,
    score_function: &ScoreFunction,
    masses: &Multivec,
) -> Multivec {
    let gradient = map.gradient_from_derivatives(&score_function.derivatives(pose));
    gradient.zip_map(masses, |g, m| if m > 0.0 { -g / m * KCAL_TO_INTERNAL } else { 0.0 })
}

/// Kinetic energy in kcal/mol of per-DOF velocities (Angstrom/ps).
pub(crate) fn kinetic_energy(masses: &Multivec, v: &Multivec) -> f64 {
    0.5 * masses
        .iter()
        .zip(v.iter())
        .map(|(m, vi)| m * vi * vi)
        .sum::<f64>()
        / KCAL_TO_INTERNAL
}

pub(crate) fn temperature(kinetic: f64, dof: usize) -> f64 {
    if dof == 0 {
        return 0.0;
    }
    2.0 * kinetic / (dof as f64 * BOLTZMANN_KCAL)
}

/// Berendsen weak-coupling velocity scale factor.
pub fn berendsen_scale(current: f64, target: f64, dt: f64, tau: f64) -> f64 {
    if !(current > 0.0) {
        return 1.0;
    }
    let inner = (1.0 + dt / tau * (target / current - 1.0)).max(0.0);
    inner.sqrt().clamp(BERENDSEN_MIN_SCALE, BERENDSEN_MAX_SCALE)
}

/// Maxwell-Boltzmann velocities with the center-of-mass drift removed,
/// projected onto the constraints and rescaled to exactly `target`.
pub(crate) fn initial_velocities(
    atom_masses: &[f64],
    x: &Multivec,
    rattle: &Rattle,
    dof: usize,
    target: f64,
    rng: &mut dyn RngCore,
) -> Multivec {
    let n = atom_masses.len();
    let mut v = Multivec::zeros(3 * n);
    if target <= 0.0 || dof == 0 {
        return v;
    }

    for (i, &m) in atom_masses.iter().enumerate() {
        if m <= 0.0 {
            continue;
        }
        let sigma = (BOLTZMANN_KCAL * target * KCAL_TO_INTERNAL / m).sqrt();
        let sample: Vector3<f64> = Vector3::from_fn(|_, _| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            z * sigma
        });
        add_to_atom(&mut v, i, &sample);
    }

    let total_mass: f64 = atom_masses.iter().sum();
    if n > 1 && total_mass > 0.0 {
        let momentum: Vector3<f64> = (0..n).map(|i| atom_vector(&v, i) * atom_masses[i]).sum();
        let drift = momentum / total_mass;
        for i in 0..n {
            add_to_atom(&mut v, i, &-drift);
        }
    }

    if rattle.constrain_velocities(x, &mut v).is_none() {
        warn!(
            constraints = rattle.len(),
            "Initial velocities were not fully projected onto the bond constraints"
        );
    }

    let per_dof_masses = Multivec::from_iterator(3 * n, atom_masses.iter().flat_map(|&m| [m, m, m]));
    let current = temperature(kinetic_energy(&per_dof_masses, &v), dof);
    if current > 0.0 {
        v *= (target / current).sqrt();
    }
    v
}
