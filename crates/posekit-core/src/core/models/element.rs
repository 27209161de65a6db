use phf::phf_map;

/// Mass assigned to atoms whose element symbol is not in [`ATOMIC_MASSES`].
pub const DEFAULT_ATOMIC_MASS: f64 = 12.011;

/// Standard atomic weights (amu) for the elements found in biomolecular systems.
pub static ATOMIC_MASSES: phf::Map<&'static str, f64> = phf_map! {
    "H" => 1.008,
    "D" => 2.014,
    "C" => 12.011,
    "N" => 14.007,
    "O" => 15.999,
    "F" => 18.998,
    "NA" => 22.990,
    "MG" => 24.305,
    "P" => 30.974,
    "S" => 32.06,
    "CL" => 35.45,
    "K" => 39.098,
    "CA" => 40.078,
    "MN" => 54.938,
    "FE" => 55.845,
    "CO" => 58.933,
    "NI" => 58.693,
    "CU" => 63.546,
    "ZN" => 65.38,
    "SE" => 78.971,
    "BR" => 79.904,
    "I" => 126.904,
};

/// Looks up the atomic mass for an element symbol, case-insensitively.
pub fn atomic_mass(element: &str) -> Option<f64> {
    ATOMIC_MASSES
        .get(element.trim().to_ascii_uppercase().as_str())
        .copied()
}

/// Hydrogen and deuterium are treated alike by constraint algorithms.
pub fn is_hydrogen(element: &str) -> bool {
    matches!(element.trim().to_ascii_uppercase().as_str(), "H" | "D")
}

/// Guesses the element symbol from a PDB-style atom name ("CA" -> "C", "1HB" -> "H").
pub fn element_from_atom_name(atom_name: &str) -> String {
    atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}
