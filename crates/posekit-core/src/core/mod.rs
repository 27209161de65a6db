//! # Core Module
//!
//! Stateless building blocks shared by every algorithm in posekit.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, bonds, constraints and the [`Pose`](models::pose::Pose)
//! - **Constraint Functions** ([`func`]) - One-dimensional penalty functions with analytic derivatives
//! - **Energy Calculations** ([`scoring`]) - Pluggable energy methods combined into a weighted score function
//! - **Selections** ([`select`]) - Residue selectors and the move maps built from them
//! - **Geometry** ([`utils`]) - RMSD, centers and rigid-body transforms
//!
//! Nothing in this layer keeps state between calls; the stateful search and
//! sampling algorithms live in [`crate::engine`].

pub mod func;
pub mod models;
pub mod scoring;
pub mod select;
pub mod utils;
