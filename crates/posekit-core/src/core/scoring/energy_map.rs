use super::score_type::{ScoreType, ScoreWeights};
use crate::core::models::ids::AtomId;
use nalgebra::Vector3;
use slotmap::SecondaryMap;
use std::ops::{Add, AddAssign};

/// Unweighted energies, one slot per [`ScoreType`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyMap {
    values: [f64; ScoreType::COUNT],
}

impl EnergyMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, score_type: ScoreType) -> f64 {
        self.values[score_type.index()]
    }

    #[inline]
    pub fn set(&mut self, score_type: ScoreType, value: f64) {
        self.values[score_type.index()] = value;
    }

    #[inline]
    pub fn accumulate(&mut self, score_type: ScoreType, value: f64) {
        self.values[score_type.index()] += value;
    }

    /// Sum of all terms without weights applied.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn weighted_total(&self, weights: &ScoreWeights) -> f64 {
        ScoreType::ALL
            .into_iter()
            .filter(|&ty| weights.is_active(ty))
            .map(|ty| self.get(ty) * weights.get(ty))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreType, f64)> + '_ {
        ScoreType::ALL.into_iter().map(|ty| (ty, self.get(ty)))
    }
}

impl Add for EnergyMap {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for EnergyMap {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.values.iter_mut().zip(rhs.values) {
            *lhs += rhs;
        }
    }
}

/// Per-atom energy gradient dE/dx in kcal/(mol·Å).
///
/// Atoms that received no contribution read as zero.
#[derive(Debug, Clone, Default)]
pub struct AtomDerivatives {
    values: SecondaryMap<AtomId, Vector3<f64>>,
}

impl AtomDerivatives {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, atom_id: AtomId, gradient: Vector3<f64>) {
        match self.values.get_mut(atom_id) {
            Some(existing) => *existing += gradient,
            None => {
                self.values.insert(atom_id, gradient);
            }
        }
    }

    #[inline]
    pub fn get(&self, atom_id: AtomId) -> Vector3<f64> {
        self.values
            .get(atom_id)
            .copied()
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomId, &Vector3<f64>)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_map_is_all_zero() {
        let map = EnergyMap::new();
        assert!(map.iter().all(|(_, v)| v == 0.0));
        assert_eq!(map.total(), 0.0);
    }

    #[test]
    fn accumulate_adds_to_existing_value() {
        let mut map = EnergyMap::new();
        map.set(ScoreType::Coulomb, 2.0);
        map.accumulate(ScoreType::Coulomb, -0.5);
        assert_eq!(map.get(ScoreType::Coulomb), 1.5);
    }

    #[test]
    fn add_sums_each_term_correctly() {
        let mut a = EnergyMap::new();
        a.set(ScoreType::LennardJones, 1.0);
        let mut b = EnergyMap::new();
        b.set(ScoreType::LennardJones, 4.0);
        b.set(ScoreType::BondStretch, 2.0);

        let sum = a + b;
        assert_eq!(sum.get(ScoreType::LennardJones), 5.0);
        assert_eq!(sum.get(ScoreType::BondStretch), 2.0);

        a += b;
        assert_eq!(a, sum);
    }

    #[test]
    fn weighted_total_ignores_inactive_terms() {
        let mut map = EnergyMap::new();
        map.set(ScoreType::LennardJones, 10.0);
        map.set(ScoreType::Coulomb, 100.0);
        map.set(ScoreType::BondStretch, 3.0);

        let weights = ScoreWeights::new()
            .with(ScoreType::LennardJones, 0.5)
            .with(ScoreType::BondStretch, 2.0);
        assert_eq!(map.weighted_total(&weights), 11.0);
        assert_eq!(map.total(), 113.0);
    }

    #[test]
    fn atom_derivatives_accumulate_and_default_to_zero() {
        let mut derivs = AtomDerivatives::new();
        let a = dummy_atom_id(1);
        assert!(derivs.is_empty());
        assert_eq!(derivs.get(a), Vector3::zeros());

        derivs.add(a, Vector3::new(1.0, 0.0, 0.0));
        derivs.add(a, Vector3::new(0.5, 2.0, 0.0));
        assert_eq!(derivs.get(a), Vector3::new(1.5, 2.0, 0.0));
        assert_eq!(derivs.iter().count(), 1);
    }
}
