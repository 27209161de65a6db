use super::{ResidueSpecifier, SelectionError};
use crate::core::models::ids::ResidueId;
use crate::core::models::pose::Pose;
use kiddo::{KdTree, SquaredEuclidean};
use serde::Deserialize;
use std::collections::HashSet;

/// A composable rule picking a subset of the residues of a pose.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ResidueSelector {
    #[default]
    All,
    /// Every residue of the named chains.
    Chain { chains: Vec<char> },
    /// Explicit residues. An empty `include` starts from every residue.
    Index {
        #[serde(default)]
        include: Vec<ResidueSpecifier>,
        #[serde(default)]
        exclude: Vec<ResidueSpecifier>,
    },
    /// Residues with any atom within `distance` of any atom of the focus set,
    /// the focus residues included.
    Neighborhood {
        focus: Box<ResidueSelector>,
        distance: f64,
    },
    Not { selector: Box<ResidueSelector> },
    And { selectors: Vec<ResidueSelector> },
    Or { selectors: Vec<ResidueSelector> },
}

impl ResidueSelector {
    pub fn chain(chain_id: char) -> Self {
        ResidueSelector::Chain {
            chains: vec![chain_id],
        }
    }

    pub fn residues(include: Vec<ResidueSpecifier>) -> Self {
        ResidueSelector::Index {
            include,
            exclude: Vec::new(),
        }
    }

    pub fn resolve(&self, pose: &Pose) -> Result<HashSet<ResidueId>, SelectionError> {
        match self {
            ResidueSelector::All => Ok(all_residues(pose)),
            ResidueSelector::Chain { chains } => {
                let mut selected = HashSet::new();
                for &chain_char in chains {
                    let chain_id = pose
                        .find_chain_by_id(chain_char)
                        .ok_or(SelectionError::ChainNotFound(chain_char))?;
                    if let Some(chain) = pose.chain(chain_id) {
                        selected.extend(chain.residues().iter().copied());
                    }
                }
                Ok(selected)
            }
            ResidueSelector::Index { include, exclude } => {
                let mut selected = if include.is_empty() {
                    all_residues(pose)
                } else {
                    include
                        .iter()
                        .map(|spec| {
                            find_residue(pose, spec)
                                .ok_or_else(|| SelectionError::ResidueNotFound(spec.clone()))
                        })
                        .collect::<Result<HashSet<_>, _>>()?
                };
                for spec in exclude {
                    if let Some(residue_id) = find_residue(pose, spec) {
                        selected.remove(&residue_id);
                    }
                }
                Ok(selected)
            }
            ResidueSelector::Neighborhood { focus, distance } => {
                if !(*distance >= 0.0) {
                    return Err(SelectionError::InvalidDistance(*distance));
                }
                let focus_ids = focus.resolve(pose)?;
                Ok(neighborhood(pose, &focus_ids, *distance))
            }
            ResidueSelector::Not { selector } => {
                let excluded = selector.resolve(pose)?;
                Ok(all_residues(pose)
                    .into_iter()
                    .filter(|id| !excluded.contains(id))
                    .collect())
            }
            ResidueSelector::And { selectors } => {
                let mut selected = all_residues(pose);
                for selector in selectors {
                    let next = selector.resolve(pose)?;
                    selected.retain(|id| next.contains(id));
                }
                Ok(selected)
            }
            ResidueSelector::Or { selectors } => {
                let mut selected = HashSet::new();
                for selector in selectors {
                    selected.extend(selector.resolve(pose)?);
                }
                Ok(selected)
            }
        }
    }
}

fn all_residues(pose: &Pose) -> HashSet<ResidueId> {
    pose.residues_iter().map(|(id, _)| id).collect()
}

fn find_residue(pose: &Pose, spec: &ResidueSpecifier) -> Option<ResidueId> {
    let chain_id = pose.find_chain_by_id(spec.chain_id)?;
    pose.find_residue_by_id(chain_id, spec.residue_number)
}

fn neighborhood(pose: &Pose, focus: &HashSet<ResidueId>, distance: f64) -> HashSet<ResidueId> {
    let focus_positions: Vec<[f64; 3]> = pose
        .atoms_in_residues(focus)
        .into_iter()
        .filter_map(|id| pose.position(id))
        .map(|p| [p.x, p.y, p.z])
        .collect();

    if focus_positions.is_empty() {
        return HashSet::new();
    }

    let kdtree: KdTree<f64, 3> = (&focus_positions).into();
    let radius_sq = distance * distance;

    pose.residues_iter()
        .filter(|(res_id, residue)| {
            focus.contains(res_id)
                || residue.atoms().iter().any(|&atom_id| {
                    pose.position(atom_id).is_some_and(|p| {
                        kdtree
                            .nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z])
                            .distance
                            <= radius_sq
                    })
                })
        })
        .map(|(res_id, _)| res_id)
        .collect()
}
