//! The planet: a sphere centred at the origin.
//!
//! Every agent lives on (or, for drones, above) a concentric shell of the
//! planet. Shells differ only by a per-agent offset from the planet surface,
//! so every function here takes an explicit shell radius.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use polarise_types::GEOMETRY_EPSILON;
use rand::Rng;

/// Outward unit normal through `point`, +Y at the origin.
pub fn surface_normal(point: Vec3) -> Vec3 {
    point.try_normalize().unwrap_or(Vec3::Y)
}

/// Project `point` radially onto the shell of `radius`.
pub fn project_to_shell(point: Vec3, radius: f32) -> Vec3 {
    surface_normal(point) * radius
}

/// Remove the component of `vector` along `normal`.
pub fn project_onto_tangent(vector: Vec3, normal: Vec3) -> Vec3 {
    vector - normal * vector.dot(normal)
}

/// Tangent-plane basis at a surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentBasis {
    /// Unit vector to the right.
    pub right: Vec3,
    /// Unit vector forward; `normal x right`.
    pub forward: Vec3,
    /// Outward surface normal.
    pub normal: Vec3,
}

impl TangentBasis {
    /// Build the basis at `position` whose right axis follows `reference_right`
    /// projected onto the tangent plane.
    ///
    /// Falls back to an arbitrary orthonormal tangent when the reference is
    /// (nearly) radial.
    pub fn at(position: Vec3, reference_right: Vec3) -> Self {
        let normal = surface_normal(position);
        let right = project_onto_tangent(reference_right, normal)
            .try_normalize()
            .unwrap_or_else(|| normal.any_orthonormal_vector());
        let forward = normal.cross(right);
        Self {
            right,
            forward,
            normal,
        }
    }

    /// Map a 2D intent (`x` right, `y` forward) onto the tangent plane.
    ///
    /// The result is normalised, or zero for a zero intent.
    pub fn direction(&self, x: f32, y: f32) -> Vec3 {
        (self.forward * y + self.right * x).normalize_or_zero()
    }
}

/// Rotate `position` along the great circle heading in `direction` by
/// `arc_length` measured on the shell of `radius`.
///
/// Keeps surface speed independent of latitude. Returns the position
/// re-projected onto the shell; a radial or zero direction leaves the
/// position where it is.
pub fn rotate_along_surface(position: Vec3, direction: Vec3, arc_length: f32, radius: f32) -> Vec3 {
    if radius <= GEOMETRY_EPSILON {
        return position;
    }
    let Some(axis) = position.cross(direction).try_normalize() else {
        return project_to_shell(position, radius);
    };
    let angle = arc_length / radius;
    project_to_shell(Quat::from_axis_angle(axis, angle) * position, radius)
}

/// Great-circle distance between two points, measured on the shell of `radius`.
pub fn arc_distance(a: Vec3, b: Vec3, radius: f32) -> f32 {
    let cos = surface_normal(a).dot(surface_normal(b)).clamp(-1.0, 1.0);
    cos.acos() * radius
}

/// Uniformly distributed point on the shell of `radius`.
pub fn random_surface_point(rng: &mut impl Rng, radius: f32) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..TAU);
    let ring = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(ring * theta.cos(), z, ring * theta.sin()) * radius
}

/// Random point on the shell of `radius` within `max_arc` of `center`,
/// uniform over the disc area.
pub fn random_point_near(rng: &mut impl Rng, center: Vec3, max_arc: f32, radius: f32) -> Vec3 {
    let basis = TangentBasis::at(center, Vec3::X);
    let heading: f32 = rng.random_range(0.0..TAU);
    let unit: f32 = rng.random_range(0.0..=1.0);
    let arc = unit.sqrt() * max_arc.max(0.0);
    let direction = basis.right * heading.cos() + basis.forward * heading.sin();
    rotate_along_surface(project_to_shell(center, radius), direction, arc, radius)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn basis_at_north_pole_follows_camera() {
        let basis = TangentBasis::at(Vec3::new(0.0, 50.0, 0.0), Vec3::X);
        assert_abs_diff_eq!(basis.right.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(basis.forward.z, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(basis.normal.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn basis_falls_back_for_radial_reference() {
        let basis = TangentBasis::at(Vec3::new(0.0, 50.0, 0.0), Vec3::Y);
        assert_abs_diff_eq!(basis.right.length(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(basis.right.dot(basis.normal), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(basis.forward.dot(basis.normal), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn rotation_preserves_radius_and_arc() {
        let start = Vec3::new(0.0, 51.0, 0.0);
        let end = rotate_along_surface(start, Vec3::NEG_Z, 2.0, 51.0);
        assert_abs_diff_eq!(end.length(), 51.0, epsilon = 1e-3);
        assert_abs_diff_eq!(arc_distance(start, end, 51.0), 2.0, epsilon = 1e-3);
        assert!(end.z < 0.0);
    }

    #[test]
    fn zero_direction_stays_put() {
        let start = Vec3::new(3.0, 4.0, 0.0);
        let end = rotate_along_surface(start, Vec3::ZERO, 1.0, 5.0);
        assert_abs_diff_eq!(end.x, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(end.y, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn random_points_lie_on_shell() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            let p = random_surface_point(&mut rng, 50.0);
            assert_abs_diff_eq!(p.length(), 50.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn nearby_points_respect_max_arc() {
        let mut rng = SmallRng::seed_from_u64(7);
        let center = Vec3::new(0.0, 0.0, 50.0);
        for _ in 0..100 {
            let p = random_point_near(&mut rng, center, 8.0, 50.0);
            assert_abs_diff_eq!(p.length(), 50.0, epsilon = 1e-3);
            assert!(arc_distance(center, p, 50.0) <= 8.0 + 1e-3);
        }
    }
}
