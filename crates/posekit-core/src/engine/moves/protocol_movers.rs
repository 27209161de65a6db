use super::Mover;
use crate::core::models::pose::Pose;
use crate::core::scoring::ScoreFunction;
use crate::core::select::MoveMapSpec;
use crate::engine::config::{MdConfig, MinimizerOptions};
use crate::engine::error::EngineError;
use crate::engine::md::{CartesianMd, MdReport};
use crate::engine::optimization::{MinimizationReport, minimize_pose};
use crate::engine::progress::ProgressReporter;
use rand::RngCore;

/// Minimizes the free atoms of the move map.
#[derive(Debug, Clone)]
pub struct MinMover {
    score_function: ScoreFunction,
    movemap: MoveMapSpec,
    options: MinimizerOptions,
    last_report: Option<MinimizationReport>,
}

impl MinMover {
    pub fn new(
        score_function: ScoreFunction,
        movemap: MoveMapSpec,
        options: MinimizerOptions,
    ) -> Result<Self, EngineError> {
        options.validate()?;
        Ok(Self {
            score_function,
            movemap,
            options,
            last_report: None,
        })
    }

    pub fn last_report(&self) -> Option<&MinimizationReport> {
        self.last_report.as_ref()
    }
}

impl Mover for MinMover {
    fn name(&self) -> &str {
        "MinMover"
    }

    fn apply(&mut self, pose: &mut Pose, _rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let movemap = self.movemap.build(pose)?;
        let report = minimize_pose(pose, &self.score_function, &movemap, &self.options)?;
        self.last_report = Some(report);
        Ok(())
    }

    fn score_function_mut(&mut self) -> Option<&mut ScoreFunction> {
        Some(&mut self.score_function)
    }
}

/// Runs Cartesian MD on the free atoms of the move map, drawing velocities from the caller's RNG.
#[derive(Debug, Clone)]
pub struct MdMover {
    score_function: ScoreFunction,
    movemap: MoveMapSpec,
    md: CartesianMd,
    last_report: Option<MdReport>,
}

impl MdMover {
    pub fn new(
        score_function: ScoreFunction,
        movemap: MoveMapSpec,
        config: MdConfig,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            score_function,
            movemap,
            md: CartesianMd::new(config)?,
            last_report: None,
        })
    }

    pub fn last_report(&self) -> Option<&MdReport> {
        self.last_report.as_ref()
    }
}

impl Mover for MdMover {
    fn name(&self) -> &str {
        "MdMover"
    }

    fn apply(&mut self, pose: &mut Pose, rng: &mut dyn RngCore) -> Result<(), EngineError> {
        let movemap = self.movemap.build(pose)?;
        let report = self.md.run_with_rng(
            pose,
            &self.score_function,
            &movemap,
            &ProgressReporter::new(),
            rng,
        )?;
        self.last_report = Some(report);
        Ok(())
    }

    fn score_function_mut(&mut self) -> Option<&mut ScoreFunction> {
        Some(&mut self.score_function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::{ScoreFunctionOptions, ScoreType, ScoreWeights};
    use crate::core::select::{AtomScope, ResidueSelector};
    use crate::engine::config::{MdConfigBuilder, Thermostat};
    use crate::engine::moves::test_support::{ligand_atoms, protein_ligand_pose};
    use nalgebra::Vector3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bond_sfxn() -> ScoreFunction {
        ScoreFunction::new(
            ScoreWeights::new().with(ScoreType::BondStretch, 1.0),
            ScoreFunctionOptions::default(),
        )
        .unwrap()
    }

    fn ligand_spec() -> MoveMapSpec {
        MoveMapSpec {
            residues: ResidueSelector::chain('B'),
            atoms: AtomScope::All,
        }
    }

    #[test]
    fn min_mover_relaxes_a_stretched_ligand_bond() {
        let mut pose = protein_ligand_pose();
        let ligand = ligand_atoms(&pose);
        pose.atom_mut(ligand[1]).unwrap().position += Vector3::new(0.3, 0.0, 0.0);
        let sfxn = bond_sfxn();
        let before = sfxn.score(&pose);

        let mut mover = MinMover::new(sfxn.clone(), ligand_spec(), MinimizerOptions::default())
            .unwrap();
        mover
            .apply(&mut pose, &mut StdRng::seed_from_u64(0))
            .unwrap();

        let report = mover.last_report().unwrap();
        assert!((report.initial_score - before).abs() < 1e-9);
        assert!(report.final_score < 1e-4);
    }

    #[test]
    fn md_mover_is_reproducible_for_a_given_rng_seed() {
        let config = MdConfigBuilder::new()
            .nstep(20)
            .temperature(300.0)
            .thermostat(Thermostat::None)
            .build()
            .unwrap();
        let mut mover = MdMover::new(bond_sfxn(), ligand_spec(), config).unwrap();

        let mut run = |seed| {
            let mut pose = protein_ligand_pose();
            mover
                .apply(&mut pose, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            pose.coordinates()
        };
        let first = run(3);
        let second = run(3);
        let third = run(4);
        assert_eq!(first, second);
        assert_ne!(first, third);
    }

    #[test]
    fn protocol_movers_expose_their_score_function() {
        let mut mover =
            MinMover::new(bond_sfxn(), ligand_spec(), MinimizerOptions::default()).unwrap();
        mover
            .score_function_mut()
            .unwrap()
            .set_weight(ScoreType::LennardJones, 0.5);
        assert_eq!(mover.score_function.weight(ScoreType::LennardJones), 0.5);
    }
}
