//! Forced-repulsion relaxation of points on a sphere.
//!
//! Used to spread NPC group spawn centers so that groups do not start on top
//! of each other. Each pass pushes every pair closer than the minimum
//! distance apart by half the overlap each, then re-projects onto the shell.

use glam::Vec3;
use polarise_types::GEOMETRY_EPSILON;
use tracing::debug;

use crate::planet::project_to_shell;

/// Tunables for [`relax_points`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxParams {
    /// Target minimum chord distance between any two points.
    pub min_distance: f32,
    /// Shell radius the points live on.
    pub radius: f32,
    /// Upper bound on passes.
    pub max_iterations: u32,
    /// Stop once the total movement of a pass falls below this.
    pub epsilon: f32,
}

/// Outcome of a relaxation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxReport {
    /// Passes executed.
    pub iterations: u32,
    /// Total movement in the last pass.
    pub last_movement: f32,
    /// Whether the run stopped early because movement fell below epsilon.
    pub converged: bool,
}

/// Relax `points` in place.
pub fn relax_points(points: &mut [Vec3], params: &RelaxParams) -> RelaxReport {
    let mut report = RelaxReport {
        iterations: 0,
        last_movement: 0.0,
        converged: false,
    };
    let mut corrections = vec![Vec3::ZERO; points.len()];

    for _ in 0..params.max_iterations {
        report.iterations = report.iterations.saturating_add(1);
        corrections.iter_mut().for_each(|c| *c = Vec3::ZERO);

        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate().skip(i.saturating_add(1)) {
                let offset = *a - *b;
                let distance = offset.length();
                if distance >= params.min_distance {
                    continue;
                }
                let axis = if distance > GEOMETRY_EPSILON {
                    offset / distance
                } else {
                    a.normalize_or_zero().any_orthonormal_vector()
                };
                let push = axis * ((params.min_distance - distance) * 0.5);
                if let Some(c) = corrections.get_mut(i) {
                    *c += push;
                }
                if let Some(c) = corrections.get_mut(j) {
                    *c -= push;
                }
            }
        }

        let mut movement = 0.0;
        for (point, correction) in points.iter_mut().zip(&corrections) {
            let moved = project_to_shell(*point + *correction, params.radius);
            movement += moved.distance(*point);
            *point = moved;
        }
        report.last_movement = movement;

        if movement < params.epsilon {
            report.converged = true;
            break;
        }
    }

    debug!(
        iterations = report.iterations,
        movement = report.last_movement,
        converged = report.converged,
        "relaxed spawn centers"
    );
    report
}

/// Smallest pairwise chord distance among `points`, or `None` for fewer than two.
pub fn min_pairwise_distance(points: &[Vec3]) -> Option<f32> {
    let mut best: Option<f32> = None;
    for (i, a) in points.iter().enumerate() {
        for b in points.iter().skip(i.saturating_add(1)) {
            let d = a.distance(*b);
            best = Some(best.map_or(d, |current| current.min(d)));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn params() -> RelaxParams {
        RelaxParams {
            min_distance: 20.0,
            radius: 50.0,
            max_iterations: 200,
            epsilon: 1e-3,
        }
    }

    #[test]
    fn clustered_points_are_spread_apart() {
        let mut points: Vec<Vec3> = (0..7_u8)
            .map(|i| project_to_shell(Vec3::new(f32::from(i) * 0.5, 50.0, 0.1), 50.0))
            .collect();
        let report = relax_points(&mut points, &params());
        assert!(report.iterations > 1);
        let min = min_pairwise_distance(&points).unwrap_or(0.0);
        assert!(min > 15.0, "min distance {min}");
        for p in &points {
            assert_abs_diff_eq!(p.length(), 50.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn separated_points_exit_immediately() {
        let mut points = vec![Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.0, -50.0, 0.0)];
        let report = relax_points(&mut points, &params());
        assert_eq!(report.iterations, 1);
        assert!(report.converged);
    }

    #[test]
    fn coincident_points_still_separate() {
        let mut points = vec![Vec3::new(0.0, 0.0, 50.0); 2];
        relax_points(&mut points, &params());
        let min = min_pairwise_distance(&points).unwrap_or(0.0);
        assert!(min > 1.0);
    }
}
