use super::element::{self, DEFAULT_ATOMIC_MASS};
use super::ids::ResidueId;
use nalgebra::Point3;
use serde::Deserialize;
use std::str::FromStr;

/// Represents the role or classification of an atom within a molecular structure.
///
/// Move maps and selectors use the role to restrict sampling to, for example,
/// backbone or side-chain atoms only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Backbone atom, part of the main chain of a polymer (e.g., N, CA, C, O).
    Backbone,
    /// Sidechain atom, part of the side groups attached to the backbone.
    Sidechain,
    /// Ligand atom, associated with small molecules bound to the structure.
    Ligand,
    /// Water molecule atom.
    Water,
    /// Unknown or unclassified atom role.
    #[default]
    Other,
}

/// Per-atom Lennard-Jones parameters.
///
/// Pair parameters are combined as `r_min = radius_i + radius_j` and
/// `epsilon = sqrt(well_depth_i * well_depth_j)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LennardJonesParams {
    /// Half of the pair distance at the energy minimum, in Angstroms.
    pub radius: f64,
    /// The well depth parameter (epsilon) in kcal/mol.
    pub well_depth: f64,
}

/// An atom of a [`Pose`](super::pose::Pose): identity, physical parameters and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The element symbol (e.g., "C", "H").
    pub element: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The role or classification of the atom in the molecular structure.
    pub role: AtomRole,
    /// Atomic mass in amu.
    pub mass: f64,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// Lennard-Jones parameters; atoms without them are skipped by the LJ term.
    pub lj: Option<LennardJonesParams>,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` with default values for most fields.
    ///
    /// The element is guessed from the first letter of the atom name and the
    /// mass is looked up from the element table.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        let element = element::element_from_atom_name(name);
        let mass = element::atomic_mass(&element).unwrap_or(DEFAULT_ATOMIC_MASS);
        Self {
            name: name.to_string(),
            element,
            residue_id,
            role: AtomRole::default(),
            mass,
            partial_charge: 0.0,
            lj: None,
            position,
        }
    }

    /// Sets the element symbol and refreshes the mass from the element table.
    pub fn with_element(mut self, element: &str) -> Self {
        self.element = element.trim().to_ascii_uppercase();
        self.mass = element::atomic_mass(&self.element).unwrap_or(DEFAULT_ATOMIC_MASS);
        self
    }

    pub fn with_role(mut self, role: AtomRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_charge(mut self, partial_charge: f64) -> Self {
        self.partial_charge = partial_charge;
        self
    }

    pub fn with_lennard_jones(mut self, radius: f64, well_depth: f64) -> Self {
        self.lj = Some(LennardJonesParams { radius, well_depth });
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        element::is_hydrogen(&self.element)
    }
}

impl FromStr for AtomRole {
    type Err = ();

    /// Parses a string into an `AtomRole`.
    ///
    /// Case-insensitive; accepts common spellings such as "side-chain" or "side_chain".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" | "side-chain" | "side_chain" => Ok(AtomRole::Sidechain),
            "ligand" => Ok(AtomRole::Ligand),
            "water" => Ok(AtomRole::Water),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ResidueId;
    use nalgebra::Point3;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let residue_id = ResidueId::default();
        let atom = Atom::new("CA", residue_id, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.name, "CA");
        assert_eq!(atom.element, "C");
        assert_eq!(atom.residue_id, residue_id);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.mass, 12.011);
        assert_eq!(atom.partial_charge, 0.0);
        assert!(atom.lj.is_none());
        assert_eq!(atom.role, AtomRole::Other);
    }

    #[test]
    fn with_element_updates_mass() {
        let atom = Atom::new("X1", ResidueId::default(), Point3::origin()).with_element("s");
        assert_eq!(atom.element, "S");
        assert_eq!(atom.mass, 32.06);
    }

    #[test]
    fn unknown_element_falls_back_to_default_mass() {
        let atom = Atom::new("Q1", ResidueId::default(), Point3::origin());
        assert_eq!(atom.mass, DEFAULT_ATOMIC_MASS);
    }

    #[test]
    fn builder_methods_set_parameters() {
        let atom = Atom::new("OG", ResidueId::default(), Point3::origin())
            .with_role(AtomRole::Sidechain)
            .with_charge(-0.66)
            .with_lennard_jones(1.7, 0.15);
        assert_eq!(atom.role, AtomRole::Sidechain);
        assert_eq!(atom.partial_charge, -0.66);
        assert_eq!(
            atom.lj,
            Some(LennardJonesParams {
                radius: 1.7,
                well_depth: 0.15
            })
        );
    }

    #[test]
    fn hydrogen_atoms_are_detected_from_name() {
        let h = Atom::new("HA", ResidueId::default(), Point3::origin());
        let c = Atom::new("CA", ResidueId::default(), Point3::origin());
        assert!(h.is_hydrogen());
        assert!(!c.is_hydrogen());
    }

    #[test]
    fn from_str_parses_valid_roles_case_insensitively() {
        assert_eq!(AtomRole::from_str("backbone"), Ok(AtomRole::Backbone));
        assert_eq!(AtomRole::from_str("SideChain"), Ok(AtomRole::Sidechain));
        assert_eq!(AtomRole::from_str("side_chain"), Ok(AtomRole::Sidechain));
        assert_eq!(AtomRole::from_str("LiGaNd"), Ok(AtomRole::Ligand));
        assert_eq!(AtomRole::from_str("water"), Ok(AtomRole::Water));
        assert_eq!(AtomRole::from_str("unknown"), Ok(AtomRole::Other));
    }

    #[test]
    fn from_str_returns_err_for_invalid_role() {
        assert_eq!(AtomRole::from_str("foo"), Err(()));
        assert_eq!(AtomRole::from_str(""), Err(()));
    }
}
