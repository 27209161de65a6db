//! # Workflows Module
//!
//! High-level entry points that assemble the engine into complete runs.
//!
//! - **Protocols** ([`protocol`]) - A TOML-described sequence of minimization, molecular
//!   dynamics, Monte Carlo and filter stages applied to a copy of an input pose, with
//!   per-stage scores and progress phases reported back to the caller.

pub mod protocol;
