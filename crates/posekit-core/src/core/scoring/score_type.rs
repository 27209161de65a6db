use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies one energy contribution of a [`ScoreFunction`](super::score_function::ScoreFunction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreType {
    LennardJones,
    Coulomb,
    BondStretch,
    AtomPairConstraint,
    CoordinateConstraint,
}

impl ScoreType {
    pub const ALL: [ScoreType; 5] = [
        ScoreType::LennardJones,
        ScoreType::Coulomb,
        ScoreType::BondStretch,
        ScoreType::AtomPairConstraint,
        ScoreType::CoordinateConstraint,
    ];

    pub const COUNT: usize = Self::ALL.len();

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ScoreType::LennardJones => "lennard-jones",
            ScoreType::Coulomb => "coulomb",
            ScoreType::BondStretch => "bond-stretch",
            ScoreType::AtomPairConstraint => "atom-pair-constraint",
            ScoreType::CoordinateConstraint => "coordinate-constraint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown score type: '{0}'")]
pub struct UnknownScoreType(pub String);

impl FromStr for ScoreType {
    type Err = UnknownScoreType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ScoreType::ALL
            .into_iter()
            .find(|ty| ty.name() == normalized)
            .ok_or_else(|| UnknownScoreType(s.to_string()))
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-term weights. Terms without an entry, or with a zero weight, are inactive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreWeights {
    weights: BTreeMap<ScoreType, f64>,
}

impl ScoreWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, handy for constructing weight sets inline.
    pub fn with(mut self, score_type: ScoreType, weight: f64) -> Self {
        self.set(score_type, weight);
        self
    }

    pub fn set(&mut self, score_type: ScoreType, weight: f64) {
        if weight == 0.0 {
            self.weights.remove(&score_type);
        } else {
            self.weights.insert(score_type, weight);
        }
    }

    #[inline]
    pub fn get(&self, score_type: ScoreType) -> f64 {
        self.weights.get(&score_type).copied().unwrap_or(0.0)
    }

    pub fn is_active(&self, score_type: ScoreType) -> bool {
        self.get(score_type) != 0.0
    }

    /// Iterates over the non-zero weights in [`ScoreType`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ScoreType, f64)> + '_ {
        self.weights.iter().map(|(&ty, &w)| (ty, w))
    }
}

impl FromIterator<(ScoreType, f64)> for ScoreWeights {
    fn from_iter<I: IntoIterator<Item = (ScoreType, f64)>>(iter: I) -> Self {
        let mut weights = ScoreWeights::new();
        for (ty, w) in iter {
            weights.set(ty, w);
        }
        weights
    }
}
