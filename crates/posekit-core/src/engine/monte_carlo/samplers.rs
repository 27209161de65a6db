use super::metropolis::{McRunStats, MonteCarlo};
use crate::core::models::ids::AtomId;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::select::ResidueSelector;
use crate::core::utils::geometry::{centroid, random_small_rotation};
use crate::engine::error::EngineError;
use nalgebra::{Isometry3, Point3, Translation3, Vector3};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, instrument};

/// A stateful proposal generator driven by [`run_sampling`].
///
/// A sampler holds a stored (last accepted) value and a proposed value.
/// `apply` writes the proposed value into the pose; `accept` makes it the
/// stored value and `reject` discards it.
pub trait McSampler: Send {
    fn name(&self) -> &str;

    /// Captures whatever reference state the sampler needs from `pose`.
    fn init(&mut self, pose: &Pose) -> Result<(), EngineError>;

    fn propose(&mut self, rng: &mut dyn RngCore);

    fn apply(&self, pose: &mut Pose) -> Result<(), EngineError>;

    fn accept(&mut self);

    fn reject(&mut self);

    /// Indented, one-line-per-sampler description of the sampler tree.
    fn show(&self, indent: usize) -> String {
        format!("{:indent$}{}\n", "", self.name(), indent = indent)
    }
}

fn gaussian_vector(rng: &mut dyn RngCore, sd: f64) -> Vector3<f64> {
    Vector3::from_fn(|_, _| {
        let z: f64 = StandardNormal.sample(&mut *rng);
        z * sd
    })
}

/// Samples a rigid-body transform of a residue selection about its initial centroid.
#[derive(Debug, Clone)]
pub struct RigidBodySampler {
    pub residues: ResidueSelector,
    pub translation_step: f64,
    pub rotation_step_degrees: f64,
    atoms: Vec<AtomId>,
    reference: Vec<Point3<f64>>,
    pivot: Point3<f64>,
    stored: Isometry3<f64>,
    proposed: Isometry3<f64>,
}

impl RigidBodySampler {
    pub fn new(residues: ResidueSelector, translation_step: f64, rotation_step_degrees: f64) -> Self {
        Self {
            residues,
            translation_step,
            rotation_step_degrees,
            atoms: Vec::new(),
            reference: Vec::new(),
            pivot: Point3::origin(),
            stored: Isometry3::identity(),
            proposed: Isometry3::identity(),
        }
    }

    pub fn stored(&self) -> &Isometry3<f64> {
        &self.stored
    }
}

impl McSampler for RigidBodySampler {
    fn name(&self) -> &str {
        "RigidBodySampler"
    }

    fn init(&mut self, pose: &Pose) -> Result<(), EngineError> {
        let residues = self.residues.resolve(pose)?;
        self.atoms = pose.atoms_in_residues(&residues);
        self.reference = self
            .atoms
            .iter()
            .map(|&id| pose.position(id).ok_or(PoseError::AtomNotFound(id)))
            .collect::<Result<_, _>>()?;
        self.pivot = centroid(&self.reference).unwrap_or_else(Point3::origin);
        self.stored = Isometry3::identity();
        self.proposed = Isometry3::identity();
        Ok(())
    }

    fn propose(&mut self, rng: &mut dyn RngCore) {
        let shift = gaussian_vector(rng, self.translation_step);
        let rotation = random_small_rotation(rng, self.rotation_step_degrees);
        let delta = Isometry3::from_parts(Translation3::from(shift), rotation);
        self.proposed = delta * self.stored;
    }

    fn apply(&self, pose: &mut Pose) -> Result<(), EngineError> {
        for (&atom_id, reference) in self.atoms.iter().zip(&self.reference) {
            let local = Point3::from(reference - self.pivot);
            let moved = self.proposed.transform_point(&local) + self.pivot.coords;
            pose.atom_mut(atom_id)
                .ok_or(PoseError::AtomNotFound(atom_id))?
                .position = moved;
        }
        Ok(())
    }

    fn accept(&mut self) {
        self.stored = self.proposed;
    }

    fn reject(&mut self) {
        self.proposed = self.stored;
    }
}

/// Samples a Cartesian offset of one atom from its initial position.
#[derive(Debug, Clone)]
pub struct AtomDisplacementSampler {
    pub atom: AtomId,
    pub step: f64,
    reference: Point3<f64>,
    stored: Vector3<f64>,
    proposed: Vector3<f64>,
}

impl AtomDisplacementSampler {
    pub fn new(atom: AtomId, step: f64) -> Self {
        Self {
            atom,
            step,
            reference: Point3::origin(),
            stored: Vector3::zeros(),
            proposed: Vector3::zeros(),
        }
    }

    pub fn stored(&self) -> &Vector3<f64> {
        &self.stored
    }
}

impl McSampler for AtomDisplacementSampler {
    fn name(&self) -> &str {
        "AtomDisplacementSampler"
    }

    fn init(&mut self, pose: &Pose) -> Result<(), EngineError> {
        self.reference = pose
            .position(self.atom)
            .ok_or(PoseError::AtomNotFound(self.atom))?;
        self.stored = Vector3::zeros();
        self.proposed = Vector3::zeros();
        Ok(())
    }

    fn propose(&mut self, rng: &mut dyn RngCore) {
        self.proposed = self.stored + gaussian_vector(rng, self.step);
    }

    fn apply(&self, pose: &mut Pose) -> Result<(), EngineError> {
        pose.atom_mut(self.atom)
            .ok_or(PoseError::AtomNotFound(self.atom))?
            .position = self.reference + self.proposed;
        Ok(())
    }

    fn accept(&mut self) {
        self.stored = self.proposed;
    }

    fn reject(&mut self) {
        self.proposed = self.stored;
    }
}

fn show_children(name: &str, children: &[Box<dyn McSampler>], indent: usize) -> String {
    let mut text = format!("{:indent$}{}\n", "", name, indent = indent);
    for child in children {
        text.push_str(&child.show(indent + 2));
    }
    text
}

/// Proposes on every child at once; acceptance applies to all of them.
#[derive(Default)]
pub struct McLoop {
    children: Vec<Box<dyn McSampler>>,
}

impl McLoop {
    pub fn new(children: Vec<Box<dyn McSampler>>) -> Self {
        Self { children }
    }

    pub fn add(&mut self, child: Box<dyn McSampler>) {
        self.children.push(child);
    }
}

impl McSampler for McLoop {
    fn name(&self) -> &str {
        "McLoop"
    }

    fn init(&mut self, pose: &Pose) -> Result<(), EngineError> {
        self.children.iter_mut().try_for_each(|c| c.init(pose))
    }

    fn propose(&mut self, rng: &mut dyn RngCore) {
        for child in &mut self.children {
            child.propose(rng);
        }
    }

    fn apply(&self, pose: &mut Pose) -> Result<(), EngineError> {
        self.children.iter().try_for_each(|c| c.apply(pose))
    }

    fn accept(&mut self) {
        self.children.iter_mut().for_each(|c| c.accept());
    }

    fn reject(&mut self) {
        self.children.iter_mut().for_each(|c| c.reject());
    }

    fn show(&self, indent: usize) -> String {
        show_children(self.name(), &self.children, indent)
    }
}

/// Proposes on one uniformly chosen child; acceptance applies to that child only.
#[derive(Default)]
pub struct McAny {
    children: Vec<Box<dyn McSampler>>,
    curr_id: Option<usize>,
}

impl McAny {
    pub fn new(children: Vec<Box<dyn McSampler>>) -> Self {
        Self {
            children,
            curr_id: None,
        }
    }

    pub fn add(&mut self, child: Box<dyn McSampler>) {
        self.children.push(child);
    }

    /// Index of the child chosen by the last proposal.
    pub fn curr_id(&self) -> Option<usize> {
        self.curr_id
    }

    fn current(&mut self) -> Option<&mut Box<dyn McSampler>> {
        self.curr_id.and_then(|i| self.children.get_mut(i))
    }
}

impl McSampler for McAny {
    fn name(&self) -> &str {
        "McAny"
    }

    fn init(&mut self, pose: &Pose) -> Result<(), EngineError> {
        self.curr_id = None;
        self.children.iter_mut().try_for_each(|c| c.init(pose))
    }

    fn propose(&mut self, rng: &mut dyn RngCore) {
        if self.children.is_empty() {
            self.curr_id = None;
            return;
        }
        let index = rng.gen_range(0..self.children.len());
        self.curr_id = Some(index);
        self.children[index].propose(rng);
    }

    fn apply(&self, pose: &mut Pose) -> Result<(), EngineError> {
        self.children.iter().try_for_each(|c| c.apply(pose))
    }

    fn accept(&mut self) {
        if let Some(child) = self.current() {
            child.accept();
        }
    }

    fn reject(&mut self) {
        if let Some(child) = self.current() {
            child.reject();
        }
    }

    fn show(&self, indent: usize) -> String {
        show_children(self.name(), &self.children, indent)
    }
}

/// Runs `cycles` propose/apply/Metropolis rounds, keeping the sampler's
/// stored values in step with the accepted pose.
///
/// `mc` is reset to `pose` first, so the returned statistics cover this run only.
#[instrument(skip_all, name = "mc_sampling", fields(sampler = sampler.name(), cycles = cycles))]
pub fn run_sampling(
    pose: &mut Pose,
    sampler: &mut dyn McSampler,
    mc: &mut MonteCarlo,
    cycles: usize,
    rng: &mut dyn RngCore,
) -> Result<McRunStats, EngineError> {
    sampler.init(pose)?;
    mc.reset(pose);
    if !mc.last_accepted_score().is_finite() {
        return Err(EngineError::Sampling(format!(
            "starting score {} is not finite",
            mc.last_accepted_score()
        )));
    }

    for _ in 0..cycles {
        sampler.propose(rng);
        sampler.apply(pose)?;
        if mc.boltzmann(pose, rng).is_accepted() {
            sampler.accept();
        } else {
            sampler.reject();
        }
    }

    let stats = McRunStats {
        trials: mc.trials(),
        accepted: mc.accepted(),
        rejected_by_filters: 0,
        lowest_score: mc.lowest_score(),
        final_score: mc.last_accepted_score(),
        acceptance_rate: mc.acceptance_rate(),
    };
    debug!(
        accepted = stats.accepted,
        lowest = stats.lowest_score,
        "Sampling finished"
    );
    Ok(stats)
}
