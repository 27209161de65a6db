//! Cartesian molecular dynamics.
//!
//! Velocity-Verlet integration of the free atoms of a move map, with RATTLE
//! constraints on bonds to hydrogen and an optional Berendsen thermostat.
//! Internal units are Angstroms, picoseconds and amu; energies are reported
//! in kcal/mol.

mod integrator;
mod rattle;
mod trajectory;

/// Boltzmann constant in kcal/(mol·K).
pub const BOLTZMANN_KCAL: f64 = 0.0019872041;

/// Converts kcal/mol to amu·Å²/ps².
pub const KCAL_TO_INTERNAL: f64 = 418.4;

pub use integrator::{CartesianMd, MdReport, berendsen_scale};
pub use trajectory::{MdSnapshot, Trajectory};
