//! Boids-style steering forces on the NPC shell.
//!
//! Each NPC sums weighted separation, alignment, cohesion, inter-group
//! repulsion, wander, gathering, and player-influence forces computed over
//! its neighbours. The sum is projected onto the tangent plane and capped at
//! `max_force`.
//!
//! Forces are computed from a snapshot of the population; callers apply them
//! only after every NPC's force is known.

use glam::Vec3;
use polarise_core::config::{FlockingConfig, NpcConfig};
use polarise_types::{GEOMETRY_EPSILON, MaskType, NpcState};
use polarise_world::{SpatialHash, project_onto_tangent, surface_normal};

use super::agent::{Group, Npc};

/// What the flock knows about the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    /// Player position.
    pub position: Vec3,
    /// Player mask; `None` is neutral.
    pub mask: Option<MaskType>,
}

/// Borrowed inputs for one round of force computation.
#[derive(Debug, Clone, Copy)]
pub struct Flock<'a> {
    /// The population snapshot.
    pub npcs: &'a [Npc],
    /// Group centers for gathering.
    pub groups: &'a [Group],
    /// Neighbour index over `npcs`.
    pub grid: &'a SpatialHash,
    /// Radii and weights.
    pub flocking: &'a FlockingConfig,
    /// Speed and force caps.
    pub npc: &'a NpcConfig,
    /// The player, if known.
    pub player: Option<PlayerView>,
}

/// Cap the length of `v` at `max`.
pub fn clamp_len(v: Vec3, max: f32) -> Vec3 {
    if max <= 0.0 {
        return Vec3::ZERO;
    }
    v.clamp_length_max(max)
}

/// Steering toward `target` at full speed, relative to `velocity`.
pub fn seek(position: Vec3, target: Vec3, velocity: Vec3, max_speed: f32, max_force: f32) -> Vec3 {
    let desired = (target - position).normalize_or_zero() * max_speed;
    if desired == Vec3::ZERO {
        return Vec3::ZERO;
    }
    clamp_len(desired - velocity, max_force)
}

#[derive(Debug, Default)]
struct Neighbourhood {
    separation: Vec3,
    separation_count: u32,
    velocity_sum: Vec3,
    alignment_count: u32,
    position_sum: Vec3,
    cohesion_count: u32,
    repulsion: Vec3,
    repulsion_count: u32,
}

impl Flock<'_> {
    fn query_radius(&self) -> f32 {
        let f = self.flocking;
        f.separation_radius
            .max(f.alignment_radius)
            .max(f.cohesion_radius)
            .max(f.intergroup_distance)
    }

    fn scan(&self, index: usize, me: &Npc) -> Neighbourhood {
        let f = self.flocking;
        let mut hood = Neighbourhood::default();
        self.grid
            .for_each_candidate(me.position(), self.query_radius(), |other_index| {
                if other_index == index {
                    return;
                }
                let Some(other) = self.npcs.get(other_index) else {
                    return;
                };
                let offset = me.position() - other.position();
                let distance = offset.length();
                if distance <= GEOMETRY_EPSILON {
                    return;
                }
                let away = offset / distance;

                if distance < f.separation_radius {
                    let ratio = f.separation_radius / distance;
                    hood.separation += away * ratio * ratio;
                    hood.separation_count += 1;
                }
                if other.group == me.group {
                    if distance < f.alignment_radius {
                        hood.velocity_sum += other.velocity();
                        hood.alignment_count += 1;
                    }
                    if distance < f.cohesion_radius {
                        hood.position_sum += other.position();
                        hood.cohesion_count += 1;
                    }
                } else if distance < f.intergroup_distance {
                    let ratio = f.intergroup_distance / distance;
                    hood.repulsion += away * ratio * ratio;
                    hood.repulsion_count += 1;
                }
            });
        hood
    }

    /// Total steering force on the NPC at `index`.
    ///
    /// `jitter` is the random nudge applied when the NPC is not wandering.
    pub fn steering(&self, index: usize, jitter: Vec3) -> Vec3 {
        let Some(me) = self.npcs.get(index) else {
            return Vec3::ZERO;
        };
        let f = self.flocking;
        let max_force = self.npc.max_force;
        let max_speed = me.max_speed(self.npc);
        let hood = self.scan(index, me);

        let separation = average(hood.separation, hood.separation_count)
            .map_or(Vec3::ZERO, |v| clamp_len(v, max_force));
        let alignment = average(hood.velocity_sum, hood.alignment_count)
            .and_then(|v| v.try_normalize())
            .map_or(Vec3::ZERO, |dir| {
                clamp_len(dir * max_speed - me.velocity(), max_force)
            });
        let cohesion = average(hood.position_sum, hood.cohesion_count).map_or(Vec3::ZERO, |c| {
            seek(me.position(), c, me.velocity(), max_speed, max_force)
        });
        let repulsion = average(hood.repulsion, hood.repulsion_count)
            .map_or(Vec3::ZERO, |v| clamp_len(v, max_force));

        let wander = match (me.state, me.wander_target) {
            (NpcState::Wandering, Some(target)) => {
                seek(me.position(), target, me.velocity(), max_speed, max_force)
            }
            _ => jitter,
        };
        let gathering = match (me.state, self.groups.get(me.group)) {
            (NpcState::Gathering, Some(group)) => {
                seek(me.position(), group.center, me.velocity(), max_speed, max_force)
            }
            _ => Vec3::ZERO,
        };
        let influence = self.player_influence(me, max_force);

        let flocking_boost = me.flocking_boost.value();
        let separation_boost = me.separation_boost.value();
        let total = separation * f.separation_weight * separation_boost
            + alignment * f.alignment_weight * flocking_boost
            + cohesion * f.cohesion_weight * flocking_boost
            + repulsion * f.intergroup_weight * separation_boost
            + wander * f.wander_weight
            + gathering * f.gathering_weight
            + influence * f.player_influence_weight;

        clamp_len(
            project_onto_tangent(total, surface_normal(me.position())),
            max_force,
        )
    }

    /// Attraction toward a player wearing the NPC's mask, repulsion from one
    /// wearing another. Strength falls off linearly to zero at the influence
    /// radius.
    fn player_influence(&self, me: &Npc, max_force: f32) -> Vec3 {
        let Some(PlayerView {
            position,
            mask: Some(mask),
        }) = self.player
        else {
            return Vec3::ZERO;
        };
        let radius = self.flocking.influence_radius;
        let offset = position - me.position();
        let distance = offset.length();
        if radius <= 0.0 || distance >= radius || distance <= GEOMETRY_EPSILON {
            return Vec3::ZERO;
        }
        let strength = 1.0 - distance / radius;
        let toward = offset / distance;
        let sign = if mask == me.mask { 1.0 } else { -1.0 };
        toward * sign * strength * max_force
    }
}

fn average(sum: Vec3, count: u32) -> Option<Vec3> {
    (count > 0).then(|| sum / count as f32)
}

/// Apply a steering force for one simulation tick.
///
/// Adds `force * dt` to the velocity, keeps it tangent, caps it at the NPC's
/// max speed, then applies friction (and idle damping while idle).
pub fn apply_force(npc: &mut Npc, force: Vec3, config: &NpcConfig, dt: f32) {
    let normal = surface_normal(npc.position());
    let mut velocity = project_onto_tangent(npc.velocity() + force * dt, normal);
    velocity = clamp_len(velocity, npc.max_speed(config));
    velocity *= config.friction;
    if npc.state == NpcState::Idle {
        velocity *= config.idle_damping;
    }
    npc.transform.velocity = velocity;
    if let Some(heading) = velocity.try_normalize() {
        npc.transform.face_along_surface(heading);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::npc::agent::Personality;

    const R: f32 = 50.5;

    fn npc(mask: MaskType, group: usize, position: Vec3) -> Npc {
        Npc::new(
            mask,
            group,
            position,
            R,
            Personality {
                curiosity: 0.5,
                energy: 0.0,
            },
            1.0,
        )
    }

    fn on_shell(x: f32, z: f32) -> Vec3 {
        polarise_world::project_to_shell(Vec3::new(x, R, z), R)
    }

    fn forces(npcs: &[Npc], player: Option<PlayerView>) -> Vec<Vec3> {
        let mut grid = SpatialHash::new(4.0);
        grid.rebuild(npcs.iter().map(Npc::position));
        let flocking = FlockingConfig::default();
        let config = NpcConfig::default();
        let flock = Flock {
            npcs,
            groups: &[],
            grid: &grid,
            flocking: &flocking,
            npc: &config,
            player,
        };
        (0..npcs.len()).map(|i| flock.steering(i, Vec3::ZERO)).collect()
    }

    #[test]
    fn close_npcs_push_apart() {
        let npcs = vec![
            npc(MaskType::Crimson, 0, on_shell(-0.5, 0.0)),
            npc(MaskType::Crimson, 0, on_shell(0.5, 0.0)),
        ];
        let f = forces(&npcs, None);
        assert!(f.first().unwrap().x < 0.0);
        assert!(f.get(1).unwrap().x > 0.0);
    }

    #[test]
    fn same_group_at_range_pulls_together() {
        // Outside separation radius, inside cohesion radius.
        let npcs = vec![
            npc(MaskType::Crimson, 0, on_shell(-2.5, 0.0)),
            npc(MaskType::Crimson, 0, on_shell(2.5, 0.0)),
        ];
        let f = forces(&npcs, None);
        assert!(f.first().unwrap().x > 0.0);
        assert!(f.get(1).unwrap().x < 0.0);
    }

    #[test]
    fn other_group_at_range_is_ignored_by_cohesion() {
        let npcs = vec![
            npc(MaskType::Crimson, 0, on_shell(-2.5, 0.0)),
            npc(MaskType::Azure, 4, on_shell(2.5, 0.0)),
        ];
        let f = forces(&npcs, None);
        assert_abs_diff_eq!(f.first().unwrap().length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn forces_are_tangent_and_capped() {
        let npcs: Vec<Npc> = (0..6)
            .map(|i| npc(MaskType::Gold, 2, on_shell(i as f32 * 0.3, 0.1)))
            .collect();
        let max_force = NpcConfig::default().max_force;
        for (n, f) in npcs.iter().zip(forces(&npcs, None)) {
            assert!(f.length() <= max_force + 1e-4);
            assert_abs_diff_eq!(f.dot(n.position().normalize()), 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn masked_player_attracts_same_mask_and_repels_others() {
        let npcs = vec![
            npc(MaskType::Jade, 3, on_shell(5.0, 0.0)),
            npc(MaskType::Violet, 6, on_shell(-5.0, 0.0)),
        ];
        let player = Some(PlayerView {
            position: on_shell(0.0, 0.0),
            mask: Some(MaskType::Jade),
        });
        let f = forces(&npcs, player);
        // Jade at +x moves toward the player (-x); Violet at -x moves away (-x).
        assert!(f.first().unwrap().x < 0.0);
        assert!(f.get(1).unwrap().x < 0.0);
    }

    #[test]
    fn neutral_player_has_no_influence() {
        let npcs = vec![npc(MaskType::Jade, 3, on_shell(5.0, 0.0))];
        let player = Some(PlayerView {
            position: on_shell(0.0, 0.0),
            mask: None,
        });
        let f = forces(&npcs, player);
        assert_abs_diff_eq!(f.first().unwrap().length(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn apply_force_caps_speed_and_applies_friction() {
        let mut n = npc(MaskType::Amber, 1, on_shell(0.0, 0.0));
        n.enter_state(NpcState::Wandering);
        let config = NpcConfig::default();
        apply_force(&mut n, Vec3::X * 1000.0, &config, 0.1);
        let cap = n.max_speed(&config) * config.friction;
        assert_abs_diff_eq!(n.velocity().length(), cap, epsilon = 1e-4);
        assert_abs_diff_eq!(n.velocity().dot(n.position().normalize()), 0.0, epsilon = 1e-4);
    }
}
