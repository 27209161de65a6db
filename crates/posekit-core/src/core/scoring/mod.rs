//! # Scoring Module
//!
//! Energy evaluation for poses: closed-form [`potentials`], the [`ScoreType`]
//! catalogue, per-term [`EnergyMap`]s and per-atom [`AtomDerivatives`], the
//! pluggable [`methods::EnergyMethod`] trait and the weighted [`ScoreFunction`].
//!
//! Weights and options can be loaded from TOML:
//!
//! ```toml
//! [weights]
//! lennard-jones = 1.0
//! coulomb = 0.25
//!
//! [options]
//! nonbonded-cutoff = 10.0
//! dielectric = 4.0
//! distance-dependent-dielectric = true
//! ```

pub mod energy_map;
pub mod methods;
pub mod potentials;
pub mod score_function;
pub mod score_type;

pub use energy_map::{AtomDerivatives, EnergyMap};
pub use score_function::{ScoreFunction, ScoreFunctionError, ScoreFunctionOptions};
pub use score_type::{ScoreType, ScoreWeights};
