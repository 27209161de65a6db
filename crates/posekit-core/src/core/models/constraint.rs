use super::ids::AtomId;
use crate::core::func::Func;
use nalgebra::Point3;

/// A geometric restraint stored on a pose and evaluated by the constraint energy term.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Penalizes the distance between two atoms.
    AtomPair {
        atom1: AtomId,
        atom2: AtomId,
        func: Func,
    },
    /// Penalizes the distance between an atom and a fixed point in space.
    Coordinate {
        atom: AtomId,
        target: Point3<f64>,
        func: Func,
    },
}

impl Constraint {
    pub fn atom_pair(atom1: AtomId, atom2: AtomId, func: Func) -> Self {
        Constraint::AtomPair { atom1, atom2, func }
    }

    pub fn coordinate(atom: AtomId, target: Point3<f64>, func: Func) -> Self {
        Constraint::Coordinate { atom, target, func }
    }

    pub fn atoms(&self) -> Vec<AtomId> {
        match self {
            Constraint::AtomPair { atom1, atom2, .. } => vec![*atom1, *atom2],
            Constraint::Coordinate { atom, .. } => vec![*atom],
        }
    }

    pub fn func(&self) -> &Func {
        match self {
            Constraint::AtomPair { func, .. } | Constraint::Coordinate { func, .. } => func,
        }
    }
}
