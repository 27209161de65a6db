use crate::core::models::ids::AtomId;
use crate::core::models::pose::Pose;
use nalgebra::{Point3, Quaternion, Unit, UnitQuaternion, Vector3};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point3::from(sum / points.len() as f64))
}

/// Mass-weighted center of `points`; `None` if empty, mismatched or massless.
pub fn center_of_mass(points: &[Point3<f64>], masses: &[f64]) -> Option<Point3<f64>> {
    if points.is_empty() || points.len() != masses.len() {
        return None;
    }
    let total_mass: f64 = masses.iter().sum();
    if total_mass <= 0.0 {
        return None;
    }
    let weighted: Vector3<f64> = points
        .iter()
        .zip(masses)
        .map(|(p, &m)| p.coords * m)
        .sum();
    Some(Point3::from(weighted / total_mass))
}

/// Draws a rotation uniformly from SO(3).
///
/// Uses Shoemake's subgroup algorithm: three uniform variates map to a unit
/// quaternion uniformly distributed on the 3-sphere.
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> UnitQuaternion<f64> {
    let u1: f64 = rng.r#gen();
    let u2: f64 = rng.r#gen();
    let u3: f64 = rng.r#gen();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    let q = Quaternion::new(
        b * (2.0 * PI * u3).cos(),
        a * (2.0 * PI * u2).sin(),
        a * (2.0 * PI * u2).cos(),
        b * (2.0 * PI * u3).sin(),
    );
    UnitQuaternion::from_quaternion(q)
}

/// Draws a uniformly distributed unit vector.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Unit<Vector3<f64>> {
    loop {
        let v: Vector3<f64> = Vector3::new(
            StandardNormal.sample(rng),
            StandardNormal.sample(rng),
            StandardNormal.sample(rng),
        );
        if let Some(unit) = Unit::try_new(v, 1e-12) {
            return unit;
        }
    }
}

/// A rotation about a uniformly random axis by an angle drawn from N(0, sd_degrees).
pub fn random_small_rotation<R: Rng + ?Sized>(rng: &mut R, sd_degrees: f64) -> UnitQuaternion<f64> {
    if sd_degrees <= 0.0 {
        return UnitQuaternion::identity();
    }
    let axis = random_unit_vector(rng);
    let z: f64 = StandardNormal.sample(rng);
    UnitQuaternion::from_axis_angle(&axis, (z * sd_degrees).to_radians())
}

/// Rotates `point` about `pivot` and then translates it.
#[inline]
pub fn transform_about_pivot(
    point: &Point3<f64>,
    pivot: &Point3<f64>,
    rotation: &UnitQuaternion<f64>,
    translation: &Vector3<f64>,
) -> Point3<f64> {
    pivot + rotation * (point - pivot) + translation
}

/// Applies a rigid-body transform about `pivot` to a group of atoms of a pose.
///
/// Atom IDs missing from the pose are skipped.
pub fn transform_atoms(
    pose: &mut Pose,
    atoms: &[AtomId],
    pivot: &Point3<f64>,
    rotation: &UnitQuaternion<f64>,
    translation: &Vector3<f64>,
) {
    for &atom_id in atoms {
        if let Some(atom) = pose.atom_mut(atom_id) {
            atom.position = transform_about_pivot(&atom.position, pivot, rotation, translation);
        }
    }
}

/// Returns the positions of `atoms` in order, skipping IDs missing from the pose.
pub fn positions_of(pose: &Pose, atoms: &[AtomId]) -> Vec<Point3<f64>> {
    atoms.iter().filter_map(|&id| pose.position(id)).collect()
}
