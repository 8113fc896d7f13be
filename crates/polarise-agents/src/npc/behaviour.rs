//! Per-NPC behaviour state machine.
//!
//! Every NPC dwells in its state for at least `min_state_duration` seconds.
//! After that it changes state with probability `transition_rate * dt` per
//! simulation tick. The next state is drawn with weights built from the
//! NPC's curiosity and its group's activity and cohesion; the current state
//! is never redrawn.

use glam::Vec3;
use polarise_core::config::NpcConfig;
use polarise_types::NpcState;
use polarise_world::random_point_near;
use rand::Rng;

use super::agent::{Group, Npc};

/// Every state gets at least this weight so no transition is impossible.
const BASE_WEIGHT: f32 = 0.1;

/// Relative likelihood of each state as the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateWeights {
    /// Weight of Idle.
    pub idle: f32,
    /// Weight of Wandering.
    pub wandering: f32,
    /// Weight of Gathering.
    pub gathering: f32,
}

impl StateWeights {
    /// Weights for `npc` in `group`, excluding the NPC's current state.
    pub fn for_npc(npc: &Npc, group: &Group) -> Self {
        let curiosity = npc.personality.curiosity.clamp(0.0, 1.0);
        let activity = group.activity.clamp(0.0, 1.0);
        let cohesion = group.cohesion.clamp(0.0, 1.0);
        let mut weights = Self {
            idle: (1.0 - activity) * (1.0 - curiosity) + BASE_WEIGHT,
            wandering: curiosity * activity + BASE_WEIGHT,
            gathering: cohesion * (1.0 - 0.5 * curiosity) + BASE_WEIGHT,
        };
        match npc.state {
            NpcState::Idle => weights.idle = 0.0,
            NpcState::Wandering => weights.wandering = 0.0,
            NpcState::Gathering => weights.gathering = 0.0,
        }
        weights
    }

    /// Pick a state given a uniform `roll` in `[0, 1)`.
    pub fn pick(&self, roll: f32) -> NpcState {
        let total = self.idle + self.wandering + self.gathering;
        let mut threshold = roll * total;
        if threshold < self.idle {
            return NpcState::Idle;
        }
        threshold -= self.idle;
        if threshold < self.wandering {
            return NpcState::Wandering;
        }
        NpcState::Gathering
    }
}

/// Advance the state machine of one NPC by `dt`.
///
/// Returns the new state when a transition happened.
pub fn step_state(
    npc: &mut Npc,
    group: &Group,
    config: &NpcConfig,
    radius: f32,
    dt: f32,
    rng: &mut impl Rng,
) -> Option<NpcState> {
    npc.state_timer += dt;

    let mut changed = None;
    if npc.state_timer >= npc.min_state_duration
        && rng.random::<f32>() < config.transition_rate * dt
    {
        let next = StateWeights::for_npc(npc, group).pick(rng.random());
        if next != npc.state {
            npc.enter_state(next);
            changed = Some(next);
        }
    }

    if npc.state == NpcState::Wandering && needs_wander_target(npc, config) {
        npc.wander_target = Some(random_point_near(
            rng,
            npc.position(),
            config.wander_radius,
            radius,
        ));
    }
    changed
}

fn needs_wander_target(npc: &Npc, config: &NpcConfig) -> bool {
    npc.wander_target
        .is_none_or(|target| npc.position().distance(target) < config.wander_reach_distance)
}

/// A random tangent jitter of length `magnitude` at `position`.
pub fn jitter(rng: &mut impl Rng, position: Vec3, magnitude: f32) -> Vec3 {
    let raw = Vec3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    );
    let normal = polarise_world::surface_normal(position);
    polarise_world::project_onto_tangent(raw, normal).normalize_or_zero() * magnitude
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use polarise_types::MaskType;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::npc::agent::Personality;

    fn npc(curiosity: f32) -> Npc {
        Npc::new(
            MaskType::Jade,
            3,
            Vec3::Y * 10.0,
            10.0,
            Personality {
                curiosity,
                energy: 0.5,
            },
            1.0,
        )
    }

    fn group(activity: f32, cohesion: f32) -> Group {
        Group {
            mask: MaskType::Jade,
            members: vec![0],
            spawn_center: Vec3::Y * 10.0,
            spawn_radius: 5.0,
            cohesion,
            activity,
            center: Vec3::Y * 10.0,
        }
    }

    #[test]
    fn current_state_is_never_redrawn() {
        let weights = StateWeights::for_npc(&npc(0.5), &group(0.5, 0.5));
        assert_abs_diff_eq!(weights.idle, 0.0);
        for roll in [0.0, 0.25, 0.5, 0.75, 0.999] {
            assert_ne!(weights.pick(roll), NpcState::Idle);
        }
    }

    #[test]
    fn curious_npcs_in_active_groups_prefer_wandering() {
        let weights = StateWeights::for_npc(&npc(1.0), &group(1.0, 0.0));
        assert!(weights.wandering > weights.gathering);
    }

    #[test]
    fn dwell_time_blocks_transitions() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut n = npc(0.5);
        n.min_state_duration = 100.0;
        let config = NpcConfig {
            transition_rate: 1000.0,
            ..NpcConfig::default()
        };
        for _ in 0..50 {
            assert!(step_state(&mut n, &group(0.5, 0.5), &config, 10.0, 0.1, &mut rng).is_none());
        }
        assert_eq!(n.state, NpcState::Idle);
    }

    #[test]
    fn transitions_happen_after_dwell() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut n = npc(0.5);
        let config = NpcConfig {
            transition_rate: 1000.0,
            ..NpcConfig::default()
        };
        let changed = step_state(&mut n, &group(0.5, 0.5), &config, 10.0, 1.5, &mut rng);
        assert!(changed.is_some());
        assert_abs_diff_eq!(n.state_timer, 0.0);
    }

    #[test]
    fn wandering_picks_reachable_target() {
        let mut rng = SmallRng::seed_from_u64(6);
        let mut n = npc(0.5);
        n.enter_state(NpcState::Wandering);
        let config = NpcConfig::default();
        step_state(&mut n, &group(0.5, 0.5), &config, 10.0, 0.1, &mut rng);
        let target = n.wander_target.unwrap_or(Vec3::ZERO);
        assert_abs_diff_eq!(target.length(), 10.0, epsilon = 1e-3);
        assert!(polarise_world::arc_distance(target, n.position(), 10.0) <= config.wander_radius + 1e-3);
    }

    #[test]
    fn jitter_is_tangent() {
        let mut rng = SmallRng::seed_from_u64(7);
        let position = Vec3::new(3.0, 4.0, 0.0);
        let j = jitter(&mut rng, position, 0.3);
        assert_abs_diff_eq!(j.dot(position.normalize()), 0.0, epsilon = 1e-5);
    }
}
