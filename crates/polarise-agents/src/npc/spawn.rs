//! Population spawning.
//!
//! One group per mask. Group centers start at uniform random surface points
//! and are relaxed apart before members are scattered around them.

use glam::Vec3;
use polarise_core::config::GameConfig;
use polarise_types::{MaskType, NpcState};
use polarise_world::{
    RelaxParams, RelaxReport, random_point_near, random_surface_point, relax_points,
};
use rand::Rng;
use tracing::debug;

use super::agent::{Group, Npc, Personality};

/// A freshly spawned population.
#[derive(Debug, Clone)]
pub struct Population {
    /// One group per mask, in [`MaskType::ALL`] order.
    pub groups: Vec<Group>,
    /// Every NPC; group `members` index into this.
    pub npcs: Vec<Npc>,
    /// How the spawn-center relaxation went.
    pub relax: RelaxReport,
}

/// Spawn every group on the NPC shell.
pub fn spawn_population(config: &GameConfig, rng: &mut impl Rng) -> Population {
    let radius = config.npc_radius();
    let npc = &config.npc;

    let mut centers: Vec<Vec3> = MaskType::ALL
        .iter()
        .map(|_| random_surface_point(rng, radius))
        .collect();
    let relax = relax_points(
        &mut centers,
        &RelaxParams {
            min_distance: npc.min_group_distance,
            radius,
            max_iterations: npc.relax_max_iterations,
            epsilon: npc.relax_epsilon,
        },
    );
    debug!(
        iterations = relax.iterations,
        converged = relax.converged,
        "group centers relaxed"
    );

    let group_size = usize::try_from(npc.group_size).unwrap_or(0);
    let mut groups = Vec::with_capacity(MaskType::ALL.len());
    let mut npcs = Vec::with_capacity(group_size.saturating_mul(MaskType::ALL.len()));
    let min_dwell = npc.min_state_duration.max(0.0);
    let max_dwell = npc.max_state_duration.max(min_dwell);

    for (slot, (mask, center)) in MaskType::ALL.iter().zip(centers).enumerate() {
        let mut members = Vec::with_capacity(group_size);
        for _ in 0..group_size {
            let position = random_point_near(rng, center, npc.spawn_radius, radius);
            let personality = Personality {
                curiosity: rng.random_range(0.0..=1.0),
                energy: rng.random_range(0.0..=1.0),
            };
            let dwell = rng.random_range(min_dwell..=max_dwell);
            let mut member = Npc::new(*mask, slot, position, radius, personality, dwell);
            if rng.random_bool(0.5) {
                member.enter_state(NpcState::Wandering);
            }
            // Stagger timers so the population does not switch state in lockstep.
            member.state_timer = rng.random_range(0.0..=dwell);
            members.push(npcs.len());
            npcs.push(member);
        }
        groups.push(Group {
            mask: *mask,
            members,
            spawn_center: center,
            spawn_radius: npc.spawn_radius,
            cohesion: rng.random_range(0.4..=1.0),
            activity: rng.random_range(0.2..=1.0),
            center,
        });
    }

    Population {
        groups,
        npcs,
        relax,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use polarise_world::{arc_distance, min_pairwise_distance};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn config(group_size: u32) -> GameConfig {
        let mut config = GameConfig::default();
        config.npc.group_size = group_size;
        config
    }

    #[test]
    fn one_group_per_mask() {
        let config = config(10);
        let population = spawn_population(&config, &mut SmallRng::seed_from_u64(1));
        assert_eq!(population.groups.len(), 7);
        assert_eq!(population.npcs.len(), 70);
        for (group, mask) in population.groups.iter().zip(MaskType::ALL) {
            assert_eq!(group.mask, mask);
            assert_eq!(group.members.len(), 10);
            for &i in &group.members {
                assert_eq!(population.npcs.get(i).unwrap().mask, mask);
            }
        }
    }

    #[test]
    fn members_stay_near_their_center() {
        let config = config(25);
        let radius = config.npc_radius();
        let population = spawn_population(&config, &mut SmallRng::seed_from_u64(2));
        for group in &population.groups {
            for &i in &group.members {
                let npc = population.npcs.get(i).unwrap();
                assert!(npc.transform.is_on_sphere(radius, 1e-3));
                let arc = arc_distance(npc.position(), group.spawn_center, radius);
                assert!(arc <= config.npc.spawn_radius + 1e-3);
            }
        }
    }

    #[test]
    fn centers_are_spread_apart() {
        let config = config(1);
        let population = spawn_population(&config, &mut SmallRng::seed_from_u64(3));
        let centers: Vec<Vec3> = population.groups.iter().map(|g| g.spawn_center).collect();
        let closest = min_pairwise_distance(&centers).unwrap();
        assert!(closest >= config.npc.min_group_distance - 0.5);
    }

    #[test]
    fn same_seed_same_population() {
        let config = config(5);
        let a = spawn_population(&config, &mut SmallRng::seed_from_u64(9));
        let b = spawn_population(&config, &mut SmallRng::seed_from_u64(9));
        let positions = |p: &Population| p.npcs.iter().map(Npc::position).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
    }
}
