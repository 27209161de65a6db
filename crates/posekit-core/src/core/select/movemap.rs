use super::{ResidueSelector, SelectionError};
use crate::core::models::atom::AtomRole;
use crate::core::models::ids::AtomId;
use crate::core::models::pose::Pose;
use serde::Deserialize;
use std::collections::HashSet;

/// Restricts a residue selection to a class of atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AtomScope {
    #[default]
    All,
    Backbone,
    /// Every atom that is not tagged [`AtomRole::Backbone`].
    Sidechain,
}

impl AtomScope {
    pub fn includes(self, role: AtomRole) -> bool {
        match self {
            AtomScope::All => true,
            AtomScope::Backbone => role == AtomRole::Backbone,
            AtomScope::Sidechain => role != AtomRole::Backbone,
        }
    }
}

/// The set of atoms free to move in Cartesian space, in pose order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveMap {
    free_atoms: Vec<AtomId>,
    free_set: HashSet<AtomId>,
}

impl MoveMap {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all(pose: &Pose) -> Self {
        Self::from_atoms(pose.atom_ids())
    }

    /// Builds a map from an explicit atom list, keeping the first occurrence of each atom.
    pub fn from_atoms(atoms: impl IntoIterator<Item = AtomId>) -> Self {
        let mut map = Self::default();
        for atom_id in atoms {
            if map.free_set.insert(atom_id) {
                map.free_atoms.push(atom_id);
            }
        }
        map
    }

    pub fn from_selection(
        pose: &Pose,
        selector: &ResidueSelector,
        scope: AtomScope,
    ) -> Result<Self, SelectionError> {
        let residues = selector.resolve(pose)?;
        Ok(Self::from_atoms(
            pose.atoms_iter()
                .filter(|(_, atom)| residues.contains(&atom.residue_id) && scope.includes(atom.role))
                .map(|(id, _)| id),
        ))
    }

    #[inline]
    pub fn is_free(&self, atom_id: AtomId) -> bool {
        self.free_set.contains(&atom_id)
    }

    pub fn free_atoms(&self) -> &[AtomId] {
        &self.free_atoms
    }

    pub fn len(&self) -> usize {
        self.free_atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free_atoms.is_empty()
    }
}

/// Serializable description of a [`MoveMap`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MoveMapSpec {
    #[serde(default)]
    pub residues: ResidueSelector,
    #[serde(default)]
    pub atoms: AtomScope,
}

impl MoveMapSpec {
    pub fn build(&self, pose: &Pose) -> Result<MoveMap, SelectionError> {
        MoveMap::from_selection(pose, &self.residues, self.atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    fn setup_pose() -> Pose {
        let mut pose = Pose::new();
        let chain_a = pose.add_chain('A', ChainType::Protein);
        for i in 1..=2 {
            let res_id = pose.add_residue(chain_a, i, "SER").unwrap();
            let x = i as f64 * 4.0;
            pose.add_atom_to_residue(
                res_id,
                Atom::new("CA", res_id, Point3::new(x, 0.0, 0.0)).with_role(AtomRole::Backbone),
            )
            .unwrap();
            pose.add_atom_to_residue(
                res_id,
                Atom::new("OG", res_id, Point3::new(x, 1.4, 0.0)).with_role(AtomRole::Sidechain),
            )
            .unwrap();
        }
        pose
    }

    #[test]
    fn all_and_none_cover_the_extremes() {
        let pose = setup_pose();
        assert_eq!(MoveMap::all(&pose).len(), 4);
        assert!(MoveMap::none().is_empty());
        assert_eq!(MoveMap::all(&pose).free_atoms(), pose.atom_ids().as_slice());
    }

    #[test]
    fn from_selection_applies_residue_and_atom_scope() {
        let pose = setup_pose();
        let map = MoveMap::from_selection(
            &pose,
            &ResidueSelector::residues(vec![crate::core::select::ResidueSpecifier::new('A', 2)]),
            AtomScope::Sidechain,
        )
        .unwrap();
        assert_eq!(map.len(), 1);
        let og2 = pose.find_atom('A', 2, "OG").unwrap();
        assert!(map.is_free(og2));
        assert!(!map.is_free(pose.find_atom('A', 2, "CA").unwrap()));

        let backbone =
            MoveMap::from_selection(&pose, &ResidueSelector::All, AtomScope::Backbone).unwrap();
        assert_eq!(backbone.len(), 2);
    }

    #[test]
    fn from_atoms_deduplicates_and_keeps_order() {
        let pose = setup_pose();
        let ids = pose.atom_ids();
        let map = MoveMap::from_atoms([ids[2], ids[0], ids[2]]);
        assert_eq!(map.free_atoms(), &[ids[2], ids[0]]);
    }

    #[test]
    fn spec_defaults_to_everything_and_parses_from_toml() {
        let pose = setup_pose();
        assert_eq!(MoveMapSpec::default().build(&pose).unwrap().len(), 4);

        let spec: MoveMapSpec = toml::from_str(
            r#"
            atoms = "backbone"
            [residues]
            type = "chain"
            chains = ["A"]
            "#,
        )
        .unwrap();
        assert_eq!(spec.atoms, AtomScope::Backbone);
        assert_eq!(spec.build(&pose).unwrap().len(), 2);
    }
}
