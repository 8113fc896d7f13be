//! Render-lane collision resolution on the NPC shell.
//!
//! Overlapping NPC pairs are pushed apart symmetrically along the great
//! circle through both, so after resolution the pair sits exactly `size`
//! apart (chord distance) and both remain on the shell.

use glam::Vec3;
use polarise_types::GEOMETRY_EPSILON;
use polarise_world::{
    SpatialHash, project_onto_tangent, project_to_shell, rotate_along_surface, surface_normal,
};

use super::agent::Npc;

/// Separate every overlapping NPC pair to a chord distance of `size`.
///
/// `grid` must index the current positions. Returns the number of pairs
/// resolved.
pub fn resolve_npc_overlaps(npcs: &mut [Npc], grid: &SpatialHash, size: f32, radius: f32) -> usize {
    if size <= 0.0 || radius <= GEOMETRY_EPSILON {
        return 0;
    }
    let mut resolved = 0;
    let mut candidates = Vec::new();
    for i in 0..npcs.len() {
        let Some(a) = npcs.get(i).map(Npc::position) else {
            continue;
        };
        grid.candidates(a, size, &mut candidates);
        for &j in &candidates {
            if j <= i {
                continue;
            }
            let (Some(a), Some(b)) = (npcs.get(i).map(Npc::position), npcs.get(j).map(Npc::position))
            else {
                continue;
            };
            if a.distance(b) >= size {
                continue;
            }
            let (new_a, new_b) = separate_pair(a, b, size, radius);
            if let Some(npc) = npcs.get_mut(i) {
                settle(npc, new_a);
            }
            if let Some(npc) = npcs.get_mut(j) {
                settle(npc, new_b);
            }
            resolved += 1;
        }
    }
    resolved
}

/// Place `a` and `b` symmetrically about their midpoint, `size` apart.
///
/// Coincident points are split along an arbitrary tangent.
pub fn separate_pair(a: Vec3, b: Vec3, size: f32, radius: f32) -> (Vec3, Vec3) {
    let midpoint = project_to_shell(a + b, radius);
    let normal = surface_normal(midpoint);
    let axis = project_onto_tangent(a - b, normal)
        .try_normalize()
        .unwrap_or_else(|| normal.any_orthonormal_vector());

    // Chord `size` on the shell spans the central angle 2 * asin(size / 2R).
    let half_angle = (size / (2.0 * radius)).clamp(0.0, 1.0).asin();
    let half_arc = half_angle * radius;
    (
        rotate_along_surface(midpoint, axis, half_arc, radius),
        rotate_along_surface(midpoint, -axis, half_arc, radius),
    )
}

/// Push NPCs overlapping the player away from it.
///
/// Each overlapping NPC moves `strength` of the overlap away from the player,
/// gains `push_velocity` in that direction, and is re-projected. Returns the
/// number of NPCs pushed.
pub fn push_from_player(
    npcs: &mut [Npc],
    grid: &SpatialHash,
    player: Vec3,
    contact_distance: f32,
    strength: f32,
    push_velocity: f32,
    radius: f32,
) -> usize {
    if contact_distance <= 0.0 {
        return 0;
    }
    let mut pushed = 0;
    let mut candidates = Vec::new();
    grid.candidates(player, contact_distance, &mut candidates);
    for &index in &candidates {
        let Some(npc) = npcs.get_mut(index) else {
            continue;
        };
        let offset = npc.position() - player;
        let distance = offset.length();
        if distance >= contact_distance {
            continue;
        }
        let normal = npc.transform.surface_normal();
        let away = project_onto_tangent(offset, normal)
            .try_normalize()
            .unwrap_or_else(|| normal.any_orthonormal_vector());
        let overlap = contact_distance - distance;
        npc.transform.position += away * overlap * strength;
        npc.transform.project_to_sphere(radius);
        npc.transform.velocity += away * push_velocity;
        npc.transform.strip_radial_velocity();
        pushed += 1;
    }
    pushed
}

fn settle(npc: &mut Npc, position: Vec3) {
    npc.transform.position = position;
    npc.transform.strip_radial_velocity();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::npc::agent::Personality;
    use polarise_types::MaskType;

    const R: f32 = 50.5;
    const SIZE: f32 = 1.0;

    fn npc(position: Vec3) -> Npc {
        Npc::new(
            MaskType::Amber,
            1,
            position,
            R,
            Personality {
                curiosity: 0.5,
                energy: 0.5,
            },
            1.0,
        )
    }

    fn grid(npcs: &[Npc]) -> SpatialHash {
        let mut grid = SpatialHash::new(2.0);
        grid.rebuild(npcs.iter().map(Npc::position));
        grid
    }

    #[test]
    fn overlapping_pair_ends_exactly_size_apart() {
        let mut npcs = vec![
            npc(Vec3::new(0.0, R, 0.0)),
            npc(Vec3::new(0.4, R, 0.1)),
        ];
        let g = grid(&npcs);
        assert_eq!(resolve_npc_overlaps(&mut npcs, &g, SIZE, R), 1);

        let a = npcs.first().unwrap();
        let b = npcs.get(1).unwrap();
        assert_abs_diff_eq!(a.position().distance(b.position()), SIZE, epsilon = 1e-3);
        assert!(a.transform.is_on_sphere(R, 1e-3));
        assert!(b.transform.is_on_sphere(R, 1e-3));
    }

    #[test]
    fn coincident_pair_is_split() {
        let mut npcs = vec![npc(Vec3::new(0.0, R, 0.0)), npc(Vec3::new(0.0, R, 0.0))];
        let g = grid(&npcs);
        resolve_npc_overlaps(&mut npcs, &g, SIZE, R);
        let a = npcs.first().unwrap().position();
        let b = npcs.get(1).unwrap().position();
        assert_abs_diff_eq!(a.distance(b), SIZE, epsilon = 1e-3);
    }

    #[test]
    fn separated_pair_is_untouched() {
        let mut npcs = vec![npc(Vec3::new(0.0, R, 0.0)), npc(Vec3::new(3.0, R, 0.0))];
        let before: Vec<Vec3> = npcs.iter().map(Npc::position).collect();
        let g = grid(&npcs);
        assert_eq!(resolve_npc_overlaps(&mut npcs, &g, SIZE, R), 0);
        let after: Vec<Vec3> = npcs.iter().map(Npc::position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn player_pushes_npc_away() {
        let player = Vec3::new(0.0, R, 0.0);
        let mut npcs = vec![npc(Vec3::new(0.3, R, 0.0))];
        let before = npcs.first().unwrap().position().distance(player);
        let g = grid(&npcs);
        assert_eq!(push_from_player(&mut npcs, &g, player, 1.0, 0.5, 2.0, R), 1);

        let pushed = npcs.first().unwrap();
        assert!(pushed.position().distance(player) > before);
        assert!(pushed.velocity().x > 0.0);
        assert!(pushed.transform.is_on_sphere(R, 1e-3));
        assert_abs_diff_eq!(pushed.velocity().dot(pushed.position().normalize()), 0.0, epsilon = 1e-4);
    }
}
