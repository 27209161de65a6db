use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::constraint::Constraint;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use super::topology::{Bond, BondOrder};
use crate::core::func::FuncError;
use nalgebra::{Point3, Vector3};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PoseError {
    #[error("Atom with ID {0:?} not found in the pose")]
    AtomNotFound(AtomId),
    #[error("Residue with ID {0:?} not found in the pose")]
    ResidueNotFound(ResidueId),
    #[error("Chain with ID {0:?} not found in the pose")]
    ChainNotFound(ChainId),
    #[error("Residue {residue:?} already contains an atom named '{name}'")]
    DuplicateAtomName { residue: ResidueId, name: String },
    #[error("Cannot bond atom {0:?} to itself")]
    SelfBond(AtomId),
    #[error("Expected {expected} coordinates, got {found}")]
    CoordinateCountMismatch { expected: usize, found: usize },
    #[error("Invalid constraint function: {0}")]
    InvalidConstraint(#[from] FuncError),
}

/// The in-memory representation of a molecular conformation.
///
/// A `Pose` owns the atoms, residues, chains and covalent bonds of a structure,
/// plus the set of geometric constraints that score functions may evaluate.
/// Atom iteration order is insertion order and is stable for the lifetime of
/// the pose, which the minimizer map and trajectory frames rely on.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    /// Primary storage for atoms using a slot map for efficient ID management.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for efficient ID management.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains using a slot map for efficient ID management.
    chains: SlotMap<ChainId, Chain>,
    /// List of all bonds in the pose.
    bonds: Vec<Bond>,
    /// Geometric restraints evaluated by the constraint energy terms.
    constraints: Vec<Constraint>,
    /// Lookup map for finding residues by chain ID and residue number.
    residue_id_map: HashMap<(ChainId, isize), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
    /// Cached adjacency list for bond connectivity, indexed by atom ID.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
}

impl Pose {
    /// Creates a new, empty pose.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns an iterator over all atoms in insertion order.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    /// Returns all atom IDs in insertion order.
    pub fn atom_ids(&self) -> Vec<AtomId> {
        self.atoms.keys().collect()
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn position(&self, id: AtomId) -> Option<Point3<f64>> {
        self.atoms.get(id).map(|atom| atom.position)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn num_residues(&self) -> usize {
        self.residues.len()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chains.iter()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds a residue ID by its chain ID and residue number.
    pub fn find_residue_by_id(&self, chain_id: ChainId, residue_number: isize) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number))
            .copied()
    }

    /// Finds an atom by chain identifier, residue number and atom name.
    pub fn find_atom(&self, chain: char, residue_number: isize, atom_name: &str) -> Option<AtomId> {
        let chain_id = self.find_chain_by_id(chain)?;
        let residue_id = self.find_residue_by_id(chain_id, residue_number)?;
        self.residues.get(residue_id)?.get_atom_id_by_name(atom_name)
    }

    /// Adds a new chain to the pose or returns the existing one.
    ///
    /// Idempotent: an existing chain with the same identifier is returned as is.
    pub fn add_chain(&mut self, id: char, chain_type: ChainType) -> ChainId {
        *self.chain_id_map.entry(id).or_insert_with(|| {
            let chain = Chain::new(id, chain_type);
            self.chains.insert(chain)
        })
    }

    /// Adds a new residue to a chain or returns the existing one.
    ///
    /// Idempotent on `(chain_id, residue_number)`.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ChainNotFound`] if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
    ) -> Result<ResidueId, PoseError> {
        let chain = self
            .chains
            .get_mut(chain_id)
            .ok_or(PoseError::ChainNotFound(chain_id))?;
        let key = (chain_id, residue_number);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue = Residue::new(residue_number, name, chain_id);
            self.residues.insert(residue)
        });

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }

        Ok(residue_id)
    }

    /// Adds an atom to a residue.
    ///
    /// The atom's `residue_id` is overwritten with `residue_id`.
    ///
    /// # Errors
    ///
    /// Fails if the residue does not exist or already holds an atom of the same name.
    pub fn add_atom_to_residue(
        &mut self,
        residue_id: ResidueId,
        mut atom: Atom,
    ) -> Result<AtomId, PoseError> {
        let residue = self
            .residues
            .get_mut(residue_id)
            .ok_or(PoseError::ResidueNotFound(residue_id))?;
        if residue.has_atom_named(&atom.name) {
            return Err(PoseError::DuplicateAtomName {
                residue: residue_id,
                name: atom.name,
            });
        }

        atom.residue_id = residue_id;
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.bond_adjacency.insert(atom_id, Vec::new());
        residue.add_atom(&name, atom_id);

        Ok(atom_id)
    }

    /// Adds a bond whose ideal length is the current inter-atomic distance.
    ///
    /// Idempotent: bonding an already-bonded pair succeeds without changes.
    pub fn add_bond(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        order: BondOrder,
    ) -> Result<(), PoseError> {
        let p1 = self.position(atom1_id).ok_or(PoseError::AtomNotFound(atom1_id))?;
        let p2 = self.position(atom2_id).ok_or(PoseError::AtomNotFound(atom2_id))?;
        self.add_bond_with_length(atom1_id, atom2_id, order, (p1 - p2).norm())
    }

    /// Adds a bond with an explicit ideal length in Angstroms.
    pub fn add_bond_with_length(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        order: BondOrder,
        ideal_length: f64,
    ) -> Result<(), PoseError> {
        if !self.atoms.contains_key(atom1_id) {
            return Err(PoseError::AtomNotFound(atom1_id));
        }
        if !self.atoms.contains_key(atom2_id) {
            return Err(PoseError::AtomNotFound(atom2_id));
        }
        if atom1_id == atom2_id {
            return Err(PoseError::SelfBond(atom1_id));
        }

        if self.bond_adjacency[atom1_id].contains(&atom2_id) {
            return Ok(());
        }

        self.bonds
            .push(Bond::new(atom1_id, atom2_id, order, ideal_length));
        self.bond_adjacency[atom1_id].push(atom2_id);
        self.bond_adjacency[atom2_id].push(atom1_id);
        Ok(())
    }

    /// Returns the atoms directly bonded to `atom_id`.
    pub fn bonded_neighbors(&self, atom_id: AtomId) -> &[AtomId] {
        self.bond_adjacency
            .get(atom_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns `true` if the pair is excluded from non-bonded scoring:
    /// the same atom, directly bonded (1-2) or sharing a bonded neighbor (1-3).
    pub fn is_excluded_pair(&self, a: AtomId, b: AtomId) -> bool {
        if a == b {
            return true;
        }
        let neighbors_a = self.bonded_neighbors(a);
        if neighbors_a.contains(&b) {
            return true;
        }
        let neighbors_b = self.bonded_neighbors(b);
        neighbors_a.iter().any(|n| neighbors_b.contains(n))
    }

    /// Adds a constraint after checking its atoms exist and its function is valid.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), PoseError> {
        for atom_id in constraint.atoms() {
            if !self.atoms.contains_key(atom_id) {
                return Err(PoseError::AtomNotFound(atom_id));
            }
        }
        constraint.func().validate()?;
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
    }

    /// Swaps in a previously captured constraint set, returning the current one.
    pub(crate) fn replace_constraints(&mut self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        std::mem::replace(&mut self.constraints, constraints)
    }

    /// Returns the coordinates of all atoms in insertion order.
    pub fn coordinates(&self) -> Vec<Point3<f64>> {
        self.atoms.values().map(|atom| atom.position).collect()
    }

    /// Restores coordinates captured by [`Pose::coordinates`].
    pub fn set_coordinates(&mut self, coordinates: &[Point3<f64>]) -> Result<(), PoseError> {
        if coordinates.len() != self.atoms.len() {
            return Err(PoseError::CoordinateCountMismatch {
                expected: self.atoms.len(),
                found: coordinates.len(),
            });
        }
        for (atom, position) in self.atoms.values_mut().zip(coordinates) {
            atom.position = *position;
        }
        Ok(())
    }

    /// Returns all atoms belonging to the given residues, in residue order.
    pub fn atoms_in_residues(&self, residues: &HashSet<ResidueId>) -> Vec<AtomId> {
        self.residues
            .iter()
            .filter(|(id, _)| residues.contains(id))
            .flat_map(|(_, residue)| residue.atoms().iter().copied())
            .collect()
    }

    pub fn total_mass(&self) -> f64 {
        self.atoms.values().map(|atom| atom.mass).sum()
    }

    /// Mass-weighted center of all atoms, or `None` for an empty or massless pose.
    pub fn center_of_mass(&self) -> Option<Point3<f64>> {
        let total_mass = self.total_mass();
        if self.atoms.is_empty() || total_mass <= 0.0 {
            return None;
        }
        let weighted: Vector3<f64> = self
            .atoms
            .values()
            .map(|atom| atom.position.coords * atom.mass)
            .sum();
        Some(Point3::from(weighted / total_mass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::func::Func;

    fn three_atom_chain() -> (Pose, ResidueId, [AtomId; 3]) {
        let mut pose = Pose::new();
        let chain_id = pose.add_chain('A', ChainType::Protein);
        let res_id = pose.add_residue(chain_id, 1, "ALA").unwrap();
        let n = pose
            .add_atom_to_residue(res_id, Atom::new("N", res_id, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        let ca = pose
            .add_atom_to_residue(res_id, Atom::new("CA", res_id, Point3::new(1.5, 0.0, 0.0)))
            .unwrap();
        let c = pose
            .add_atom_to_residue(res_id, Atom::new("C", res_id, Point3::new(2.0, 1.4, 0.0)))
            .unwrap();
        pose.add_bond(n, ca, BondOrder::Single).unwrap();
        pose.add_bond(ca, c, BondOrder::Single).unwrap();
        (pose, res_id, [n, ca, c])
    }

    #[test]
    fn add_chain_and_residue_are_idempotent() {
        let mut pose = Pose::new();
        let a1 = pose.add_chain('A', ChainType::Protein);
        let a2 = pose.add_chain('A', ChainType::Ligand);
        assert_eq!(a1, a2);

        let r1 = pose.add_residue(a1, 5, "GLY").unwrap();
        let r2 = pose.add_residue(a1, 5, "GLY").unwrap();
        assert_eq!(r1, r2);
        assert_eq!(pose.chain(a1).unwrap().residues(), &[r1]);
        assert_eq!(pose.find_residue_by_id(a1, 5), Some(r1));
    }

    #[test]
    fn add_residue_to_missing_chain_fails() {
        let mut pose = Pose::new();
        let missing = ChainId::default();
        assert_eq!(
            pose.add_residue(missing, 1, "ALA"),
            Err(PoseError::ChainNotFound(missing))
        );
    }

    #[test]
    fn add_atom_rejects_duplicate_names() {
        let (mut pose, res_id, _) = three_atom_chain();
        let result = pose.add_atom_to_residue(res_id, Atom::new("CA", res_id, Point3::origin()));
        assert!(matches!(result, Err(PoseError::DuplicateAtomName { .. })));
    }

    #[test]
    fn add_bond_records_current_distance_and_is_idempotent() {
        let (mut pose, _, [n, ca, _]) = three_atom_chain();
        assert_eq!(pose.bonds().len(), 2);
        assert!((pose.bonds()[0].ideal_length - 1.5).abs() < 1e-12);

        pose.add_bond(ca, n, BondOrder::Single).unwrap();
        assert_eq!(pose.bonds().len(), 2);
        assert_eq!(pose.bonded_neighbors(ca).len(), 2);
    }

    #[test]
    fn add_bond_rejects_self_bonds_and_missing_atoms() {
        let (mut pose, _, [n, ..]) = three_atom_chain();
        assert_eq!(
            pose.add_bond(n, n, BondOrder::Single),
            Err(PoseError::SelfBond(n))
        );
        let missing = AtomId::default();
        assert_eq!(
            pose.add_bond(n, missing, BondOrder::Single),
            Err(PoseError::AtomNotFound(missing))
        );
    }

    #[test]
    fn excluded_pairs_cover_one_two_and_one_three_neighbors() {
        let (mut pose, res_id, [n, ca, c]) = three_atom_chain();
        let o = pose
            .add_atom_to_residue(res_id, Atom::new("O", res_id, Point3::new(3.0, 2.0, 0.0)))
            .unwrap();
        pose.add_bond(c, o, BondOrder::Double).unwrap();

        assert!(pose.is_excluded_pair(n, n));
        assert!(pose.is_excluded_pair(n, ca));
        assert!(pose.is_excluded_pair(n, c));
        assert!(pose.is_excluded_pair(ca, o));
        assert!(!pose.is_excluded_pair(n, o));
    }

    #[test]
    fn find_atom_resolves_chain_residue_and_name() {
        let (pose, _, [_, ca, _]) = three_atom_chain();
        assert_eq!(pose.find_atom('A', 1, "CA"), Some(ca));
        assert_eq!(pose.find_atom('A', 2, "CA"), None);
        assert_eq!(pose.find_atom('B', 1, "CA"), None);
    }

    #[test]
    fn constraints_require_existing_atoms_and_valid_functions() {
        let (mut pose, _, [n, _, c]) = three_atom_chain();
        pose.add_constraint(Constraint::atom_pair(n, c, Func::harmonic(2.5, 0.5)))
            .unwrap();
        assert_eq!(pose.constraints().len(), 1);

        let missing = AtomId::default();
        assert_eq!(
            pose.add_constraint(Constraint::coordinate(
                missing,
                Point3::origin(),
                Func::harmonic(0.0, 1.0)
            )),
            Err(PoseError::AtomNotFound(missing))
        );
        assert!(matches!(
            pose.add_constraint(Constraint::atom_pair(n, c, Func::harmonic(2.5, -1.0))),
            Err(PoseError::InvalidConstraint(_))
        ));

        pose.clear_constraints();
        assert!(pose.constraints().is_empty());
    }

    #[test]
    fn coordinates_round_trip_and_length_is_checked() {
        let (mut pose, _, [n, ..]) = three_atom_chain();
        let saved = pose.coordinates();
        pose.atom_mut(n).unwrap().position = Point3::new(9.0, 9.0, 9.0);
        pose.set_coordinates(&saved).unwrap();
        assert_eq!(pose.position(n), Some(Point3::origin()));

        assert_eq!(
            pose.set_coordinates(&saved[..1]),
            Err(PoseError::CoordinateCountMismatch {
                expected: 3,
                found: 1
            })
        );
    }

    #[test]
    fn center_of_mass_is_mass_weighted() {
        let mut pose = Pose::new();
        let chain_id = pose.add_chain('A', ChainType::Other);
        let res_id = pose.add_residue(chain_id, 1, "HOH").unwrap();
        pose.add_atom_to_residue(res_id, Atom::new("O", res_id, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        pose.add_atom_to_residue(res_id, Atom::new("H1", res_id, Point3::new(1.0, 0.0, 0.0)))
            .unwrap();

        let com = pose.center_of_mass().unwrap();
        let expected_x = 1.008 / (15.999 + 1.008);
        assert!((com.x - expected_x).abs() < 1e-9);
        assert!(Pose::new().center_of_mass().is_none());
    }
}
