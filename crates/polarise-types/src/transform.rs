//! Spatial state shared by every agent on (or above) the planet.
//!
//! A [`Transform`] carries position, orientation, scale, velocity, and the
//! transient per-frame acceleration. Agents confined to the planet surface
//! call [`Transform::project_to_sphere`] after every position change so that
//! `|position| == planet_radius + half_height` holds at the end of each
//! update.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lengths below this are treated as zero when normalising.
pub const GEOMETRY_EPSILON: f32 = 1e-6;

/// Position, orientation, scale, and motion state of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Transform {
    /// World-space position; the planet center is the origin.
    #[ts(as = "[f32; 3]")]
    pub position: Vec3,
    /// Orientation used by the renderer to place the mesh.
    #[ts(as = "[f32; 4]")]
    pub orientation: Quat,
    /// Cosmetic scale; never read by the simulation.
    #[ts(as = "[f32; 3]")]
    pub scale: Vec3,
    /// Velocity in world units per second.
    #[ts(as = "[f32; 3]")]
    pub velocity: Vec3,
    /// Acceleration accumulated during the current frame.
    #[ts(as = "[f32; 3]")]
    pub acceleration: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl Transform {
    /// Create a transform at rest at `position` with identity orientation.
    pub const fn new(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
        }
    }

    /// Create a transform already projected onto a sphere of `radius`.
    pub fn on_sphere(position: Vec3, radius: f32) -> Self {
        let mut transform = Self::new(position);
        transform.project_to_sphere(radius);
        transform
    }

    /// Distance between two transforms' positions.
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }

    /// Distance from this transform's position to a point.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    /// Outward unit normal of the sphere through this position.
    ///
    /// Falls back to +Y at the planet center.
    pub fn surface_normal(&self) -> Vec3 {
        self.position.try_normalize().unwrap_or(Vec3::Y)
    }

    /// Re-project the position onto the sphere of `radius`.
    ///
    /// A position at the planet center is moved to the north pole.
    pub fn project_to_sphere(&mut self, radius: f32) {
        self.position = self.surface_normal() * radius;
    }

    /// Remove the radial component of the velocity so it stays tangent.
    pub fn strip_radial_velocity(&mut self) {
        let normal = self.surface_normal();
        self.velocity -= normal * self.velocity.dot(normal);
    }

    /// Whether the position lies on the sphere of `radius` within `epsilon`.
    pub fn is_on_sphere(&self, radius: f32, epsilon: f32) -> bool {
        (self.position.length() - radius).abs() < epsilon
    }

    /// Integrate one step: apply acceleration, move, then clear acceleration.
    pub fn integrate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = Vec3::ZERO;
    }

    /// Orient the transform so that its up axis is the surface normal and
    /// its forward axis (-Z) points along `forward` projected onto the
    /// tangent plane.
    ///
    /// Leaves the orientation untouched when `forward` is (nearly) radial.
    pub fn face_along_surface(&mut self, forward: Vec3) {
        let up = self.surface_normal();
        let tangent = forward - up * forward.dot(up);
        let Some(fwd) = tangent.try_normalize() else {
            return;
        };
        let back = -fwd;
        let right = up.cross(back);
        self.orientation = Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize();
    }

    /// Orient the transform to look along `direction` in free space, with
    /// the outward radial direction as the reference up axis.
    pub fn face_direction(&mut self, direction: Vec3) {
        let Some(fwd) = direction.try_normalize() else {
            return;
        };
        let reference_up = self.surface_normal();
        let right = fwd.cross(reference_up);
        let Some(right) = right.try_normalize() else {
            return;
        };
        let up = right.cross(fwd);
        self.orientation = Quat::from_mat3(&Mat3::from_cols(right, up, -fwd)).normalize();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn projection_enforces_radius() {
        let mut t = Transform::new(Vec3::new(3.0, 4.0, 12.0));
        t.project_to_sphere(50.0);
        assert_abs_diff_eq!(t.position.length(), 50.0, epsilon = 1e-4);
        assert!(t.is_on_sphere(50.0, 1e-3));
    }

    #[test]
    fn projection_of_origin_falls_back_to_north_pole() {
        let mut t = Transform::new(Vec3::ZERO);
        t.project_to_sphere(10.0);
        assert_abs_diff_eq!(t.position.y, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn strip_radial_velocity_leaves_tangent_part() {
        let mut t = Transform::new(Vec3::new(0.0, 10.0, 0.0));
        t.velocity = Vec3::new(1.0, 5.0, -2.0);
        t.strip_radial_velocity();
        assert_abs_diff_eq!(t.velocity.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(t.velocity.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(t.velocity.z, -2.0, epsilon = 1e-6);
    }

    #[test]
    fn integrate_clears_acceleration() {
        let mut t = Transform::new(Vec3::ZERO);
        t.acceleration = Vec3::new(2.0, 0.0, 0.0);
        t.integrate(0.5);
        assert_abs_diff_eq!(t.velocity.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(t.position.x, 0.5, epsilon = 1e-6);
        assert_eq!(t.acceleration, Vec3::ZERO);
    }

    #[test]
    fn face_along_surface_keeps_up_on_normal() {
        let mut t = Transform::new(Vec3::new(0.0, 0.0, 20.0));
        t.face_along_surface(Vec3::X);
        let up = t.orientation * Vec3::Y;
        let forward = t.orientation * Vec3::NEG_Z;
        assert_abs_diff_eq!(up.z, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(forward.x, 1.0, epsilon = 1e-4);
    }
}
