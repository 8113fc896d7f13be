//! The NPC flocking engine.
//!
//! [`NpcSystem`] owns seven mask groups of NPCs on the shell of radius
//! `planet_radius + npc.half_height` and runs them on the coordinator's two
//! lanes:
//!
//! - **Simulation lane** (fixed `logic_hz` steps): state machines, steering
//!   forces, boosters, player interactions, and crowd detection.
//! - **Render lane** (every frame): integration, shell re-projection,
//!   NPC-NPC and player-NPC collision.
//!
//! # Modules
//!
//! - [`agent`] -- [`Npc`], [`Group`], [`Booster`], [`Personality`]
//! - [`behaviour`] -- Idle/Wandering/Gathering state machine
//! - [`collision`] -- Overlap resolution on the shell
//! - [`crowd`] -- Crowd composition around the player
//! - [`flocking`] -- Steering forces
//! - [`interaction`] -- Player interactions and boost contagion
//! - [`spawn`] -- Group placement and population spawning

pub mod agent;
pub mod behaviour;
pub mod collision;
pub mod crowd;
pub mod flocking;
pub mod interaction;
pub mod spawn;

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use polarise_core::clock::FrameTick;
use polarise_core::config::GameConfig;
use polarise_core::coordinator::{GameSystem, PlayerActionListener, SystemError};
use polarise_core::game_state::SharedGameState;
use polarise_core::registry::{ServiceRegistry, keys};
use polarise_events::EventBus;
use polarise_types::{GameEvent, MaskType, NpcSpawnDetails, NpcState, PlayerAction};
use polarise_world::SpatialHash;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

pub use agent::{Booster, Group, Npc, Personality};
pub use crowd::CrowdReport;
pub use flocking::PlayerView;

use crate::error::AgentError;
use crate::player::{Player, SharedPlayer};

/// Event source name.
const SOURCE: &str = "npc_system";

/// Shared handle stored in the service registry under [`keys::NPC_SYSTEM`].
pub type SharedNpcSystem = Rc<RefCell<NpcSystem>>;

/// The flocking population and its rules.
#[derive(Debug)]
pub struct NpcSystem {
    config: GameConfig,
    radius: f32,
    bus: EventBus,
    state: SharedGameState,
    rng: SmallRng,
    npcs: Vec<Npc>,
    groups: Vec<Group>,
    grid: SpatialHash,
    player: Option<SharedPlayer>,
    player_position: Option<Vec3>,
    player_mask: Option<MaskType>,
    crowd: CrowdReport,
    forces: Vec<Vec3>,
}

impl NpcSystem {
    /// Create an empty system; the population spawns in `initialize`.
    pub fn new(config: &GameConfig, bus: EventBus, state: SharedGameState) -> Self {
        let flocking = &config.flocking;
        let cell = flocking
            .separation_radius
            .max(flocking.alignment_radius)
            .max(flocking.cohesion_radius)
            .max(flocking.intergroup_distance);
        Self {
            config: config.clone(),
            radius: config.npc_radius(),
            bus,
            state,
            rng: SmallRng::seed_from_u64(config.session.seed),
            npcs: Vec::new(),
            groups: Vec::new(),
            grid: SpatialHash::new(cell),
            player: None,
            player_position: None,
            player_mask: None,
            crowd: CrowdReport::default(),
            forces: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Radius of the NPC shell.
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Every NPC.
    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    /// Every group, in mask order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The group wearing `mask`.
    pub fn group(&self, mask: MaskType) -> Option<&Group> {
        self.groups.get(mask.slot())
    }

    /// Latest crowd classification.
    pub const fn crowd(&self) -> &CrowdReport {
        &self.crowd
    }

    /// NPCs counted as polarised so far.
    pub fn polarised_count(&self) -> usize {
        self.npcs.iter().filter(|n| n.polarised).count()
    }

    /// NPCs per behaviour state: idle, wandering, gathering.
    pub fn state_census(&self) -> (usize, usize, usize) {
        let count = |state| self.npcs.iter().filter(|n| n.state == state).count();
        (
            count(NpcState::Idle),
            count(NpcState::Wandering),
            count(NpcState::Gathering),
        )
    }

    /// Override what the flock knows about the player.
    pub const fn set_player(&mut self, position: Option<Vec3>, mask: Option<MaskType>) {
        self.player_position = position;
        self.player_mask = mask;
    }

    fn player_view(&self) -> Option<PlayerView> {
        self.player_position.map(|position| PlayerView {
            position,
            mask: self.player_mask,
        })
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    /// Spawn a fresh population from the configured seed.
    ///
    /// Publishes `npc.spawn` once per group.
    pub fn spawn(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.config.session.seed);
        let population = spawn::spawn_population(&self.config, &mut self.rng);
        self.npcs = population.npcs;
        self.groups = population.groups;
        self.forces = vec![Vec3::ZERO; self.npcs.len()];
        self.crowd = CrowdReport::default();
        self.rebuild_grid();

        for group in &self.groups {
            self.bus.publish(
                GameEvent::NpcSpawn(NpcSpawnDetails {
                    mask: group.mask,
                    count: u32::try_from(group.members.len()).unwrap_or(u32::MAX),
                    spawn_center: group.spawn_center,
                }),
                SOURCE,
            );
        }
        info!(
            npcs = self.npcs.len(),
            groups = self.groups.len(),
            relax_iterations = population.relax.iterations,
            "NPC population spawned"
        );
    }

    fn rebuild_grid(&mut self) {
        self.grid.rebuild(self.npcs.iter().map(Npc::position));
    }

    fn sync_player(&mut self) {
        if let Some(position) = self
            .player
            .as_ref()
            .and_then(|p| p.try_borrow().ok().map(|p| p.position()))
        {
            self.player_position = Some(position);
        }
    }

    // -----------------------------------------------------------------------
    // Simulation lane
    // -----------------------------------------------------------------------

    /// Run one fixed simulation step of `dt` seconds.
    pub fn simulation_step(&mut self, dt: f32) -> Result<(), AgentError> {
        if self.npcs.is_empty() || dt <= 0.0 {
            return Ok(());
        }
        self.rebuild_grid();
        for group in &mut self.groups {
            group.recompute_center(&self.npcs, self.radius);
        }

        // --- Behaviour states ---
        let npc_config = &self.config.npc;
        for npc in &mut self.npcs {
            if let Some(group) = self.groups.get(npc.group) {
                behaviour::step_state(npc, group, npc_config, self.radius, dt, &mut self.rng);
            }
        }

        // --- Steering ---
        let jitter_magnitude = npc_config.wander_jitter;
        let flock = flocking::Flock {
            npcs: &self.npcs,
            groups: &self.groups,
            grid: &self.grid,
            flocking: &self.config.flocking,
            npc: npc_config,
            player: self.player_view(),
        };
        self.forces.clear();
        for (index, npc) in self.npcs.iter().enumerate() {
            let jitter = behaviour::jitter(&mut self.rng, npc.position(), jitter_magnitude);
            self.forces.push(flock.steering(index, jitter));
        }
        for (npc, force) in self.npcs.iter_mut().zip(&self.forces) {
            flocking::apply_force(npc, *force, npc_config, dt);
        }

        // --- Boosters ---
        interaction::tick_timers(&mut self.npcs, dt);
        let spread = interaction::propagate_boosts(
            &mut self.npcs,
            &self.grid,
            self.config.interaction.boost_propagation_radius,
        );
        if spread > 0 {
            debug!(spread, "boosts propagated");
        }

        // --- Player ---
        if self.state.try_borrow().is_ok_and(|s| s.is_game_over()) {
            return Ok(());
        }
        self.interact_with_player()?;
        self.update_crowd()
    }

    fn interact_with_player(&mut self) -> Result<(), AgentError> {
        let Some(player) = self.player_position else {
            return Ok(());
        };
        let config = &self.config.interaction;
        let mut state = self.state.try_borrow_mut()?;
        for npc in &mut self.npcs {
            if npc.interaction_cooldown > 0.0 || npc.position().distance(player) > config.radius {
                continue;
            }
            let result = interaction::interact(npc, self.player_mask, config);
            state.add_outrage(result.outrage_delta);
            state.add_energy(result.energy_delta);
            if result.newly_polarised {
                state.add_polarised_people(1);
            }
            self.bus.publish(GameEvent::NpcInteraction(result.details), SOURCE);
        }
        Ok(())
    }

    fn update_crowd(&mut self) -> Result<(), AgentError> {
        let Some(player) = self.player_position else {
            return Ok(());
        };
        let report = crowd::detect_crowd(
            &self.npcs,
            &self.grid,
            player,
            self.player_mask,
            &self.config.crowd,
        );
        if report == self.crowd {
            return Ok(());
        }

        let mut state = self.state.try_borrow_mut()?;
        state.set_in_crowd(report.in_crowd);
        state.set_in_wrong_crowd(report.in_wrong_crowd);
        drop(state);

        debug!(
            nearby = report.nearby,
            matching = report.matching,
            in_crowd = report.in_crowd,
            in_wrong_crowd = report.in_wrong_crowd,
            "crowd changed"
        );
        self.crowd = report.clone();
        self.bus.publish(GameEvent::NpcCrowdUpdate(report.into()), SOURCE);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Render lane
    // -----------------------------------------------------------------------

    /// Move every NPC for `dt` seconds and resolve collisions.
    pub fn render_step(&mut self, dt: f32) {
        if dt > 0.0 {
            for npc in &mut self.npcs {
                npc.transform.integrate(dt);
                npc.transform.project_to_sphere(self.radius);
                npc.transform.strip_radial_velocity();
            }
        }
        self.resolve_collisions();
    }

    /// Resolve NPC-NPC and player-NPC overlaps.
    pub fn resolve_collisions(&mut self) {
        self.rebuild_grid();
        let size = self.config.npc.size;
        collision::resolve_npc_overlaps(&mut self.npcs, &self.grid, size, self.radius);

        let Some(player) = self.player_position else {
            return;
        };
        self.rebuild_grid();
        let interaction = &self.config.interaction;
        collision::push_from_player(
            &mut self.npcs,
            &self.grid,
            player,
            0.5 * (self.config.player.size + size),
            interaction.push_strength,
            interaction.push_velocity,
            self.radius,
        );
    }
}

impl PlayerActionListener for NpcSystem {
    fn on_player_action(&mut self, action: &PlayerAction) {
        match action {
            PlayerAction::Moved(details) => self.player_position = Some(details.position),
            PlayerAction::MaskChanged(details) => self.player_mask = details.current,
            PlayerAction::MaskRejected(_) => {}
        }
    }
}

impl GameSystem for NpcSystem {
    fn name(&self) -> &'static str {
        "npc_system"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn initialize(&mut self, registry: &ServiceRegistry) -> Result<(), SystemError> {
        if registry.contains(keys::PLAYER) {
            self.player = Some(registry.resolve::<RefCell<Player>>(keys::PLAYER)?);
        }
        self.sync_player();
        self.player_mask = self
            .state
            .try_borrow()
            .map_err(|source| SystemError::Failed {
                system: SOURCE,
                reason: source.to_string(),
            })?
            .current_mask();
        self.spawn();
        Ok(())
    }

    fn update(&mut self, tick: &FrameTick) -> Result<(), SystemError> {
        for _ in 0..tick.sim_steps {
            self.simulation_step(tick.sim_dt)?;
        }
        self.render_step(tick.render_dt);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), SystemError> {
        info!(npcs = self.npcs.len(), "NPC population released");
        self.npcs.clear();
        self.groups.clear();
        self.forces.clear();
        self.grid.clear();
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SystemError> {
        self.player_mask = None;
        self.sync_player();
        self.spawn();
        Ok(())
    }

    fn player_action_listener(&mut self) -> Option<&mut dyn PlayerActionListener> {
        Some(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;
    use polarise_core::game_state::GameState;
    use polarise_types::{EventKind, MaskChangeDetails};

    use super::*;

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.npc.group_size = 12;
        config
    }

    fn system(config: &GameConfig) -> (NpcSystem, SharedGameState, EventBus) {
        let bus = EventBus::new();
        let state = Rc::new(RefCell::new(GameState::new(config, bus.clone())));
        let mut npcs = NpcSystem::new(config, bus.clone(), Rc::clone(&state));
        npcs.initialize(&ServiceRegistry::new()).unwrap();
        (npcs, state, bus)
    }

    fn tick(frame: u64, sim_steps: u32) -> FrameTick {
        FrameTick {
            frame,
            render_dt: 1.0 / 60.0,
            sim_dt: 0.1,
            sim_steps,
            elapsed: 0.0,
        }
    }

    #[test]
    fn initialize_spawns_every_group() {
        let config = small_config();
        let (npcs, _state, bus) = system(&config);
        assert_eq!(npcs.npcs().len(), 84);
        let spawns = bus
            .recent_events()
            .iter()
            .filter(|e| e.kind() == EventKind::NpcSpawn)
            .count();
        assert_eq!(spawns, 7);
        assert_eq!(npcs.group(MaskType::Indigo).unwrap().members.len(), 12);
    }

    #[test]
    fn state_census_accounts_for_every_npc() {
        let config = small_config();
        let (mut npcs, _state, _bus) = system(&config);
        for frame in 1..=120 {
            npcs.update(&tick(frame, 1)).unwrap();
        }
        let (idle, wandering, gathering) = npcs.state_census();
        assert_eq!(idle + wandering + gathering, npcs.npcs().len());
        let gathering_now = npcs
            .npcs()
            .iter()
            .filter(|n| n.state == NpcState::Gathering)
            .count();
        assert_eq!(gathering, gathering_now);
    }

    #[test]
    fn every_npc_stays_on_the_shell() {
        let config = small_config();
        let (mut npcs, _state, _bus) = system(&config);
        npcs.set_player(Some(Vec3::Y * config.player_radius()), Some(MaskType::Crimson));
        for frame in 1..=300 {
            npcs.update(&tick(frame, u32::from(frame % 6 == 0))).unwrap();
            for npc in npcs.npcs() {
                assert!(
                    npc.transform.is_on_sphere(npcs.radius(), 1e-3),
                    "npc left the shell at frame {frame}"
                );
            }
        }
    }

    #[test]
    fn same_mask_interaction_lowers_outrage() {
        let config = small_config();
        let (mut npcs, state, bus) = system(&config);
        state.borrow_mut().set_mask(Some(MaskType::Gold), false);

        // Put the player right next to the first Gold NPC.
        let index = *npcs.group(MaskType::Gold).unwrap().members.first().unwrap();
        let target = npcs.npcs().get(index).unwrap().position();
        npcs.set_player(Some(target), Some(MaskType::Gold));
        npcs.npcs.get_mut(index).unwrap().interaction_cooldown = 0.0;

        assert!(state.borrow_mut().add_energy(-10.0));
        let outrage_before = state.borrow().outrage();
        let energy_before = state.borrow().energy();

        npcs.interact_with_player().unwrap();

        let npc = npcs.npcs().get(index).unwrap();
        assert_eq!(npc.state, NpcState::Gathering);
        assert!(state.borrow().outrage() < outrage_before);
        assert!(state.borrow().energy() > energy_before);
        assert!(
            bus.recent_events()
                .iter()
                .any(|e| e.kind() == EventKind::NpcInteraction)
        );
    }

    #[test]
    fn cooldown_throttles_interactions() {
        let config = small_config();
        let (mut npcs, _state, bus) = system(&config);
        let index = *npcs.group(MaskType::Amber).unwrap().members.first().unwrap();
        let target = npcs.npcs().get(index).unwrap().position();
        npcs.set_player(Some(target), None);

        let count = |bus: &EventBus| {
            bus.recent_events()
                .iter()
                .filter(|e| e.kind() == EventKind::NpcInteraction)
                .count()
        };
        npcs.interact_with_player().unwrap();
        let first = count(&bus);
        assert!(first >= 1);
        npcs.interact_with_player().unwrap();
        assert_eq!(count(&bus), first);
    }

    #[test]
    fn crowd_flags_reach_game_state() {
        let config = small_config();
        let (mut npcs, state, bus) = system(&config);
        let center = npcs.group(MaskType::Jade).unwrap().spawn_center;
        npcs.set_player(Some(center), Some(MaskType::Crimson));
        npcs.update_crowd().unwrap();

        assert!(npcs.crowd().in_crowd);
        assert_eq!(state.borrow().in_crowd(), npcs.crowd().in_crowd);
        assert_eq!(state.borrow().in_wrong_crowd(), npcs.crowd().in_wrong_crowd);
        assert!(
            bus.recent_events()
                .iter()
                .any(|e| e.kind() == EventKind::NpcCrowdUpdate)
        );
    }

    #[test]
    fn mask_changes_reach_the_flock() {
        let config = small_config();
        let (mut npcs, _state, _bus) = system(&config);
        npcs.on_player_action(&PlayerAction::MaskChanged(MaskChangeDetails {
            previous: None,
            current: Some(MaskType::Violet),
            forced: false,
        }));
        assert_eq!(npcs.player_mask, Some(MaskType::Violet));
    }

    #[test]
    fn reset_respawns_deterministically() {
        let config = small_config();
        let (mut npcs, _state, _bus) = system(&config);
        let spawned: Vec<Vec3> = npcs.npcs().iter().map(Npc::position).collect();
        for frame in 1..=60 {
            npcs.update(&tick(frame, 1)).unwrap();
        }
        npcs.reset().unwrap();
        let respawned: Vec<Vec3> = npcs.npcs().iter().map(Npc::position).collect();
        assert_eq!(spawned, respawned);
        assert_abs_diff_eq!(npcs.npcs().first().unwrap().player_influence, 0.0);
    }
}
