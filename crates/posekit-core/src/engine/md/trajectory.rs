use crate::core::models::ids::AtomId;
use crate::core::models::pose::{Pose, PoseError};
use crate::engine::error::EngineError;
use nalgebra::Point3;
use serde::Serialize;
use std::path::Path;

/// Energies and temperature at one reported MD step. Energies in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MdSnapshot {
    pub step: usize,
    /// Simulation time in ps.
    pub time: f64,
    pub potential: f64,
    pub kinetic: f64,
    pub total: f64,
    pub temperature: f64,
}

/// Reported snapshots of a run, plus free-atom coordinates when frames are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    atoms: Vec<AtomId>,
    snapshots: Vec<MdSnapshot>,
    frames: Vec<Vec<Point3<f64>>>,
}

impl Trajectory {
    pub fn new(atoms: Vec<AtomId>) -> Self {
        Self {
            atoms,
            snapshots: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, snapshot: MdSnapshot, frame: Option<Vec<Point3<f64>>>) {
        self.snapshots.push(snapshot);
        if let Some(frame) = frame {
            self.frames.push(frame);
        }
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn snapshots(&self) -> &[MdSnapshot] {
        &self.snapshots
    }

    pub fn frames(&self) -> &[Vec<Point3<f64>>] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Total energy of the last snapshot minus that of the first.
    pub fn energy_drift(&self) -> f64 {
        match (self.snapshots.first(), self.snapshots.last()) {
            (Some(first), Some(last)) => last.total - first.total,
            _ => 0.0,
        }
    }

    /// Writes one CSV row per snapshot with a header line.
    pub fn write_csv(&self, path: &Path) -> Result<(), EngineError> {
        let to_error = |source: csv::Error| EngineError::TrajectoryWrite {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
        for snapshot in &self.snapshots {
            writer.serialize(snapshot).map_err(to_error)?;
        }
        writer
            .flush()
            .map_err(|e| to_error(csv::Error::from(e)))?;
        Ok(())
    }

    /// Rebuilds one pose per stored frame by writing the frame into a copy of `template`.
    pub fn dump_poses(&self, template: &Pose) -> Result<Vec<Pose>, EngineError> {
        self.frames
            .iter()
            .map(|frame| -> Result<Pose, EngineError> {
                let mut pose = template.clone();
                for (&atom_id, &position) in self.atoms.iter().zip(frame) {
                    pose.atom_mut(atom_id)
                        .ok_or(PoseError::AtomNotFound(atom_id))?
                        .position = position;
                }
                Ok(pose)
            })
            .collect()
    }
}
