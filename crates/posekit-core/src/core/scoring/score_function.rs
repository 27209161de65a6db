use super::energy_map::{AtomDerivatives, EnergyMap};
use super::methods::{
    BondStretchEnergy, ConstraintsEnergy, CoulombEnergy, EnergyMethod, LennardJonesEnergy,
};
use super::score_type::{ScoreType, ScoreWeights, UnknownScoreType};
use crate::core::models::pose::Pose;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScoreFunctionError {
    #[error("Failed to read score function file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse score function TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    UnknownScoreType(#[from] UnknownScoreType),
    #[error("Invalid value {value} for option '{name}': {reason}")]
    InvalidOption {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Parameters shared by the built-in energy methods.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct ScoreFunctionOptions {
    /// Non-bonded pairs farther apart than this (Angstroms) are skipped.
    pub nonbonded_cutoff: f64,
    pub dielectric: f64,
    /// Use `epsilon(r) = dielectric * r` in the Coulomb term.
    pub distance_dependent_dielectric: bool,
    /// Spring constant of the bond-stretch term in kcal/(mol·Å²).
    pub bond_spring_constant: f64,
}

impl Default for ScoreFunctionOptions {
    fn default() -> Self {
        Self {
            nonbonded_cutoff: 10.0,
            dielectric: 1.0,
            distance_dependent_dielectric: false,
            bond_spring_constant: 300.0,
        }
    }
}

impl ScoreFunctionOptions {
    pub fn validate(&self) -> Result<(), ScoreFunctionError> {
        if !(self.nonbonded_cutoff > 0.0) {
            return Err(ScoreFunctionError::InvalidOption {
                name: "nonbonded-cutoff",
                value: self.nonbonded_cutoff,
                reason: "must be positive",
            });
        }
        if !(self.dielectric > 0.0) {
            return Err(ScoreFunctionError::InvalidOption {
                name: "dielectric",
                value: self.dielectric,
                reason: "must be positive",
            });
        }
        if !(self.bond_spring_constant >= 0.0) {
            return Err(ScoreFunctionError::InvalidOption {
                name: "bond-spring-constant",
                value: self.bond_spring_constant,
                reason: "must be non-negative",
            });
        }
        Ok(())
    }
}

/// On-disk form of a score function.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScoreFunctionFile {
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub options: ScoreFunctionOptions,
}

impl ScoreFunctionFile {
    pub fn into_score_function(self) -> Result<ScoreFunction, ScoreFunctionError> {
        let weights = self
            .weights
            .iter()
            .map(|(name, &w)| Ok((name.parse::<ScoreType>()?, w)))
            .collect::<Result<ScoreWeights, ScoreFunctionError>>()?;
        ScoreFunction::new(weights, self.options)
    }
}

/// A weighted sum of energy methods evaluated over a [`Pose`].
///
/// Built-in methods are instantiated for every score type with a non-zero
/// weight; methods added through [`ScoreFunction::add_method`] are always
/// evaluated. Cloning is cheap since methods are shared behind `Arc`.
#[derive(Debug, Clone)]
pub struct ScoreFunction {
    weights: ScoreWeights,
    options: ScoreFunctionOptions,
    builtin_methods: Vec<Arc<dyn EnergyMethod>>,
    extra_methods: Vec<Arc<dyn EnergyMethod>>,
}

impl ScoreFunction {
    pub fn new(
        weights: ScoreWeights,
        options: ScoreFunctionOptions,
    ) -> Result<Self, ScoreFunctionError> {
        options.validate()?;
        let mut sfxn = Self {
            weights,
            options,
            builtin_methods: Vec::new(),
            extra_methods: Vec::new(),
        };
        sfxn.rebuild_methods();
        Ok(sfxn)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ScoreFunctionError> {
        let file: ScoreFunctionFile = toml::from_str(text)?;
        file.into_score_function()
    }

    pub fn load(path: &Path) -> Result<Self, ScoreFunctionError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScoreFunctionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn rebuild_methods(&mut self) {
        let opts = &self.options;
        let candidates: [Arc<dyn EnergyMethod>; 4] = [
            Arc::new(LennardJonesEnergy::new(opts.nonbonded_cutoff)),
            Arc::new(CoulombEnergy::new(
                opts.dielectric,
                opts.distance_dependent_dielectric,
                opts.nonbonded_cutoff,
            )),
            Arc::new(BondStretchEnergy::new(opts.bond_spring_constant)),
            Arc::new(ConstraintsEnergy),
        ];
        self.builtin_methods = candidates
            .into_iter()
            .filter(|m| m.score_types().iter().any(|&ty| self.weights.is_active(ty)))
            .collect();
        debug!(
            active_methods = self.builtin_methods.len(),
            "Rebuilt score function methods"
        );
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn options(&self) -> &ScoreFunctionOptions {
        &self.options
    }

    pub fn weight(&self, score_type: ScoreType) -> f64 {
        self.weights.get(score_type)
    }

    pub fn set_weight(&mut self, score_type: ScoreType, weight: f64) {
        self.weights.set(score_type, weight);
        self.rebuild_methods();
    }

    /// Attaches a user-defined energy method.
    ///
    /// Its contributions are weighted like any other term, so at least one of
    /// its score types needs a non-zero weight to have any effect.
    pub fn add_method(&mut self, method: Arc<dyn EnergyMethod>) {
        self.extra_methods.push(method);
    }

    fn methods(&self) -> impl Iterator<Item = &Arc<dyn EnergyMethod>> {
        self.builtin_methods.iter().chain(self.extra_methods.iter())
    }

    /// Unweighted per-term energies.
    pub fn energies(&self, pose: &Pose) -> EnergyMap {
        let mut energies = EnergyMap::new();
        for method in self.methods() {
            method.score(pose, &mut energies);
        }
        energies
    }

    /// The weighted total energy.
    pub fn score(&self, pose: &Pose) -> f64 {
        self.energies(pose).weighted_total(&self.weights)
    }

    /// The weighted energy of a single term.
    pub fn score_term(&self, pose: &Pose, score_type: ScoreType) -> f64 {
        self.energies(pose).get(score_type) * self.weight(score_type)
    }

    /// The gradient of [`ScoreFunction::score`] with respect to every atom position.
    pub fn derivatives(&self, pose: &Pose) -> AtomDerivatives {
        let mut derivatives = AtomDerivatives::new();
        for method in self.methods() {
            method.accumulate_derivatives(pose, &self.weights, &mut derivatives);
        }
        derivatives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use crate::core::models::topology::BondOrder;
    use nalgebra::Point3;
    use std::io::Write;

    const TOLERANCE: f64 = 1e-6;

    fn diatomic(distance: f64) -> Pose {
        let mut pose = Pose::new();
        let chain_id = pose.add_chain('A', ChainType::Ligand);
        let res_id = pose.add_residue(chain_id, 1, "LIG").unwrap();
        let a = pose
            .add_atom_to_residue(
                res_id,
                Atom::new("C1", res_id, Point3::origin())
                    .with_charge(0.3)
                    .with_lennard_jones(1.9, 0.1),
            )
            .unwrap();
        pose.add_atom_to_residue(
            res_id,
            Atom::new("O2", res_id, Point3::new(distance, 0.0, 0.0))
                .with_charge(-0.3)
                .with_lennard_jones(1.7, 0.2),
        )
        .unwrap();
        let c = pose
            .add_atom_to_residue(
                res_id,
                Atom::new("C3", res_id, Point3::new(-1.5, 0.0, 0.0)).with_lennard_jones(1.9, 0.1),
            )
            .unwrap();
        pose.add_bond_with_length(a, c, BondOrder::Single, 1.4)
            .unwrap();
        pose
    }

    #[test]
    fn score_is_weighted_sum_of_energies() {
        let weights = ScoreWeights::new()
            .with(ScoreType::LennardJones, 1.0)
            .with(ScoreType::Coulomb, 0.5)
            .with(ScoreType::BondStretch, 2.0);
        let sfxn = ScoreFunction::new(weights, ScoreFunctionOptions::default()).unwrap();
        let pose = diatomic(4.0);

        let energies = sfxn.energies(&pose);
        let expected = energies.get(ScoreType::LennardJones)
            + 0.5 * energies.get(ScoreType::Coulomb)
            + 2.0 * energies.get(ScoreType::BondStretch);
        assert!((sfxn.score(&pose) - expected).abs() < TOLERANCE);
        assert!((sfxn.score_term(&pose, ScoreType::Coulomb) - 0.5 * energies.get(ScoreType::Coulomb)).abs() < TOLERANCE);
    }

    #[test]
    fn zero_weight_terms_are_not_evaluated() {
        let weights = ScoreWeights::new().with(ScoreType::LennardJones, 1.0);
        let sfxn = ScoreFunction::new(weights, ScoreFunctionOptions::default()).unwrap();
        let energies = sfxn.energies(&diatomic(3.0));
        assert_eq!(energies.get(ScoreType::Coulomb), 0.0);
        assert_eq!(energies.get(ScoreType::BondStretch), 0.0);
        assert_ne!(energies.get(ScoreType::LennardJones), 0.0);
    }

    #[test]
    fn set_weight_activates_and_deactivates_terms() {
        let mut sfxn =
            ScoreFunction::new(ScoreWeights::new(), ScoreFunctionOptions::default()).unwrap();
        let pose = diatomic(3.0);
        assert_eq!(sfxn.score(&pose), 0.0);

        sfxn.set_weight(ScoreType::Coulomb, 1.0);
        assert!(sfxn.score(&pose) < 0.0);
        assert_eq!(sfxn.weight(ScoreType::Coulomb), 1.0);

        sfxn.set_weight(ScoreType::Coulomb, 0.0);
        assert_eq!(sfxn.score(&pose), 0.0);
    }

    #[test]
    fn total_gradient_matches_finite_difference() {
        let weights = ScoreWeights::new()
            .with(ScoreType::LennardJones, 1.0)
            .with(ScoreType::Coulomb, 0.5)
            .with(ScoreType::BondStretch, 1.0);
        let sfxn = ScoreFunction::new(weights, ScoreFunctionOptions::default()).unwrap();
        let mut pose = diatomic(3.3);
        let derivs = sfxn.derivatives(&pose);

        let h = 1e-6;
        for atom_id in pose.atom_ids() {
            for axis in 0..3 {
                let original = pose.position(atom_id).unwrap();
                pose.atom_mut(atom_id).unwrap().position[axis] = original[axis] + h;
                let plus = sfxn.score(&pose);
                pose.atom_mut(atom_id).unwrap().position[axis] = original[axis] - h;
                let minus = sfxn.score(&pose);
                pose.atom_mut(atom_id).unwrap().position = original;

                let numeric = (plus - minus) / (2.0 * h);
                let analytic = derivs.get(atom_id)[axis];
                assert!((numeric - analytic).abs() < 1e-4 * analytic.abs().max(1.0));
            }
        }
    }

    #[test]
    fn from_toml_str_parses_weights_and_options() {
        let text = r#"
            [weights]
            lennard-jones = 1.0
            coulomb = 0.25
            coordinate-constraint = 1.0

            [options]
            nonbonded-cutoff = 8.0
            dielectric = 4.0
            distance-dependent-dielectric = true
        "#;
        let sfxn = ScoreFunction::from_toml_str(text).unwrap();
        assert_eq!(sfxn.weight(ScoreType::Coulomb), 0.25);
        assert_eq!(sfxn.weight(ScoreType::BondStretch), 0.0);
        assert_eq!(sfxn.options().nonbonded_cutoff, 8.0);
        assert!(sfxn.options().distance_dependent_dielectric);
        assert_eq!(sfxn.options().bond_spring_constant, 300.0);
    }

    #[test]
    fn from_toml_str_rejects_unknown_score_types_and_options() {
        let err = ScoreFunction::from_toml_str("[weights]\nhbond = 1.0\n").unwrap_err();
        assert!(matches!(err, ScoreFunctionError::UnknownScoreType(_)));

        let err = ScoreFunction::from_toml_str("[options]\nswitch-width = 1.0\n").unwrap_err();
        assert!(matches!(err, ScoreFunctionError::Toml(_)));

        let err = ScoreFunction::from_toml_str("[options]\ndielectric = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ScoreFunctionError::InvalidOption {
                name: "dielectric",
                ..
            }
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_paths() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[weights]\nbond-stretch = 1.0").unwrap();
        let sfxn = ScoreFunction::load(file.path()).unwrap();
        assert_eq!(sfxn.weight(ScoreType::BondStretch), 1.0);

        let err = ScoreFunction::load(Path::new("/nonexistent/weights.toml")).unwrap_err();
        assert!(matches!(err, ScoreFunctionError::Io { .. }));
    }

    #[derive(Debug)]
    struct ConstantEnergy(f64);

    impl EnergyMethod for ConstantEnergy {
        fn score_types(&self) -> &[ScoreType] {
            &[ScoreType::LennardJones]
        }
        fn score(&self, _pose: &Pose, energies: &mut EnergyMap) {
            energies.accumulate(ScoreType::LennardJones, self.0);
        }
        fn accumulate_derivatives(&self, _: &Pose, _: &ScoreWeights, _: &mut AtomDerivatives) {}
    }

    #[test]
    fn user_methods_are_added_to_builtin_terms() {
        let weights = ScoreWeights::new().with(ScoreType::LennardJones, 2.0);
        let mut sfxn = ScoreFunction::new(weights, ScoreFunctionOptions::default()).unwrap();
        let pose = diatomic(6.0);
        let before = sfxn.score(&pose);

        sfxn.add_method(Arc::new(ConstantEnergy(5.0)));
        assert!((sfxn.score(&pose) - before - 10.0).abs() < TOLERANCE);

        let cloned = sfxn.clone();
        assert!((cloned.score(&pose) - sfxn.score(&pose)).abs() < TOLERANCE);
    }
}
