//! NPC and group state.

use glam::Vec3;
use polarise_core::config::NpcConfig;
use polarise_types::{MaskType, NpcId, NpcState, Transform};
use polarise_world::project_to_shell;

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Fixed per-NPC traits rolled at spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Personality {
    /// Tendency to wander off, in `[0, 1]`.
    pub curiosity: f32,
    /// Drives the NPC's top speed, in `[0, 1]`.
    pub energy: f32,
}

// ---------------------------------------------------------------------------
// Booster
// ---------------------------------------------------------------------------

/// A temporary force multiplier with a countdown.
///
/// The multiplier is `1.0` whenever the booster is inactive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Booster {
    multiplier: f32,
    remaining: f32,
    fresh: bool,
}

impl Default for Booster {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            remaining: 0.0,
            fresh: false,
        }
    }
}

impl Booster {
    /// Current multiplier.
    pub const fn value(&self) -> f32 {
        self.multiplier
    }

    /// Seconds left before the booster wears off.
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Whether the booster is running.
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Start (or strengthen) the booster.
    ///
    /// A weaker multiplier never overrides a stronger running one. Returns
    /// whether the booster changed.
    pub fn trigger(&mut self, multiplier: f32, duration: f32) -> bool {
        if multiplier <= 1.0 || duration <= 0.0 {
            return false;
        }
        if self.is_active() && multiplier < self.multiplier {
            return false;
        }
        self.multiplier = multiplier;
        self.remaining = self.remaining.max(duration);
        self.fresh = true;
        true
    }

    /// Count down by `dt`; the multiplier returns to `1.0` on expiry.
    pub fn tick(&mut self, dt: f32) {
        if !self.is_active() {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            *self = Self::default();
        }
    }

    /// Whether the booster was triggered since the last call.
    pub const fn take_fresh(&mut self) -> bool {
        let fresh = self.fresh;
        self.fresh = false;
        fresh
    }
}

// ---------------------------------------------------------------------------
// Npc
// ---------------------------------------------------------------------------

/// One member of the flocking population.
#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    /// Stable identifier.
    pub id: NpcId,
    /// The NPC's mask; never changes.
    pub mask: MaskType,
    /// Index of the owning group.
    pub group: usize,
    /// Position and motion on the NPC shell.
    pub transform: Transform,
    /// Current behaviour state.
    pub state: NpcState,
    /// Seconds spent in the current state.
    pub state_timer: f32,
    /// Dwell time before the state may change.
    pub min_state_duration: f32,
    /// Where a wandering NPC is heading.
    pub wander_target: Option<Vec3>,
    /// Rolled traits.
    pub personality: Personality,
    /// Accumulated influence of the player, in `[-1, 1]`.
    pub player_influence: f32,
    /// Whether the NPC has been counted as polarised.
    pub polarised: bool,
    /// Scales alignment and cohesion.
    pub flocking_boost: Booster,
    /// Scales separation and inter-group repulsion.
    pub separation_boost: Booster,
    /// Seconds until the player can interact with this NPC again.
    pub interaction_cooldown: f32,
}

impl Npc {
    /// Create an idle NPC at rest on the shell of `radius`.
    pub fn new(
        mask: MaskType,
        group: usize,
        position: Vec3,
        radius: f32,
        personality: Personality,
        min_state_duration: f32,
    ) -> Self {
        Self {
            id: NpcId::new(),
            mask,
            group,
            transform: Transform::on_sphere(position, radius),
            state: NpcState::Idle,
            state_timer: 0.0,
            min_state_duration,
            wander_target: None,
            personality,
            player_influence: 0.0,
            polarised: false,
            flocking_boost: Booster::default(),
            separation_boost: Booster::default(),
            interaction_cooldown: 0.0,
        }
    }

    /// Position shortcut.
    pub const fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Velocity shortcut.
    pub const fn velocity(&self) -> Vec3 {
        self.transform.velocity
    }

    /// Speed cap from the base speed and this NPC's energy.
    pub fn max_speed(&self, config: &NpcConfig) -> f32 {
        config.base_speed + self.personality.energy * config.speed_variation
    }

    /// Switch to `state`, restarting the dwell timer.
    pub fn enter_state(&mut self, state: NpcState) {
        if state != NpcState::Wandering {
            self.wander_target = None;
        }
        self.state = state;
        self.state_timer = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// All NPCs sharing one mask.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// The group's mask.
    pub mask: MaskType,
    /// Indices into the population, in spawn order.
    pub members: Vec<usize>,
    /// Surface point the group spawned around.
    pub spawn_center: Vec3,
    /// Members spawned within this arc of the spawn center.
    pub spawn_radius: f32,
    /// How strongly members gather, in `[0, 1]`.
    pub cohesion: f32,
    /// How restless members are, in `[0, 1]`.
    pub activity: f32,
    /// Centroid of the members projected onto the shell.
    pub center: Vec3,
}

impl Group {
    /// Recompute [`Group::center`] from the members' positions.
    ///
    /// Falls back to the spawn center when the members cancel out.
    pub fn recompute_center(&mut self, npcs: &[Npc], radius: f32) {
        let mut sum = Vec3::ZERO;
        for npc in self.members.iter().filter_map(|&i| npcs.get(i)) {
            sum += npc.position();
        }
        self.center = if sum.length_squared() > f32::EPSILON {
            project_to_shell(sum, radius)
        } else {
            self.spawn_center
        };
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn npc_at(position: Vec3) -> Npc {
        Npc::new(
            MaskType::Gold,
            2,
            position,
            10.0,
            Personality {
                curiosity: 0.5,
                energy: 1.0,
            },
            2.0,
        )
    }

    #[test]
    fn booster_expires_back_to_one() {
        let mut boost = Booster::default();
        assert!(boost.trigger(2.0, 1.0));
        assert!(boost.take_fresh());
        assert!(!boost.take_fresh());
        boost.tick(0.6);
        assert_abs_diff_eq!(boost.value(), 2.0);
        boost.tick(0.6);
        assert!(!boost.is_active());
        assert_abs_diff_eq!(boost.value(), 1.0);
    }

    #[test]
    fn weaker_boost_does_not_override() {
        let mut boost = Booster::default();
        boost.trigger(3.0, 1.0);
        assert!(!boost.trigger(2.0, 5.0));
        assert_abs_diff_eq!(boost.value(), 3.0);
        assert!(!boost.trigger(0.5, 1.0));
    }

    #[test]
    fn npc_spawns_on_shell() {
        let npc = npc_at(Vec3::new(1.0, 2.0, 3.0));
        assert!(npc.transform.is_on_sphere(10.0, 1e-4));
        assert_eq!(npc.state, NpcState::Idle);
    }

    #[test]
    fn max_speed_scales_with_energy() {
        let npc = npc_at(Vec3::Y);
        let config = NpcConfig::default();
        assert_abs_diff_eq!(npc.max_speed(&config), 2.5);
    }

    #[test]
    fn group_center_is_on_shell() {
        let npcs = vec![npc_at(Vec3::X), npc_at(Vec3::Y)];
        let mut group = Group {
            mask: MaskType::Gold,
            members: vec![0, 1],
            spawn_center: Vec3::Z * 10.0,
            spawn_radius: 4.0,
            cohesion: 0.5,
            activity: 0.5,
            center: Vec3::ZERO,
        };
        group.recompute_center(&npcs, 10.0);
        assert_abs_diff_eq!(group.center.length(), 10.0, epsilon = 1e-4);
        assert_abs_diff_eq!(group.center.x, group.center.y, epsilon = 1e-4);
    }
}
