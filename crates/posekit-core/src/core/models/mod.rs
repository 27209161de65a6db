//! # Core Models Module
//!
//! Fundamental data structures for representing a molecular conformation in posekit.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atoms with coordinates, mass, charge and Lennard-Jones parameters
//! - [`residue`] - Residues and their ordered atom lists
//! - [`chain`] - Chains and their ordered residue lists
//! - [`topology`] - Covalent bonds with their ideal lengths
//! - [`constraint`] - Geometric restraints evaluated by the constraint score terms
//! - [`pose`] - The complete conformation tying all of the above together
//! - [`element`] - Compile-time element mass table
//! - [`ids`] - Unique identifier types for atoms, residues, and chains
//!
//! ## Usage
//!
//! ```ignore
//! use posekit::core::models::{atom::Atom, chain::ChainType, pose::Pose};
//!
//! let mut pose = Pose::new();
//! let chain_id = pose.add_chain('A', ChainType::Protein);
//! let residue_id = pose.add_residue(chain_id, 1, "ALA")?;
//!
//! let atom = Atom::new("CA", residue_id, Point3::new(0.0, 0.0, 0.0));
//! pose.add_atom_to_residue(residue_id, atom)?;
//! ```

pub mod atom;
pub mod chain;
pub mod constraint;
pub mod element;
pub mod ids;
pub mod pose;
pub mod residue;
pub mod topology;
