//! Residue selection and the move maps derived from it.

mod movemap;
mod selector;

pub use movemap::{AtomScope, MoveMap, MoveMapSpec};
pub use selector::ResidueSelector;

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ResidueSpecifier {
    pub chain_id: char,
    pub residue_number: isize,
}

impl ResidueSpecifier {
    pub fn new(chain_id: char, residue_number: isize) -> Self {
        Self {
            chain_id,
            residue_number,
        }
    }
}

impl fmt::Display for ResidueSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.residue_number)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("Chain '{0}' not found in the pose")]
    ChainNotFound(char),
    #[error("Residue {0} not found in the pose")]
    ResidueNotFound(ResidueSpecifier),
    #[error("Atom '{atom_name}' not found in residue {residue}")]
    AtomNotFound {
        residue: ResidueSpecifier,
        atom_name: String,
    },
    #[error("Neighborhood distance must be non-negative, got {0}")]
    InvalidDistance(f64),
}
