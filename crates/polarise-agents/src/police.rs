//! Police pursuit: drones that hunt the player while Outrage runs high.
//!
//! Pursuit switches on when Outrage reaches `activation_threshold` and off
//! when it falls back below. While active, a drone spawns every
//! `spawn_interval` seconds until `max_drones` are alive.
//!
//! # Drone states
//!
//! - **Searching**: patrols between random points in the patrol shell,
//!   picking a new one every `search_interval` seconds.
//! - **Pursuing**: flies at the player. Within `catch_radius` the game ends
//!   with [`GameOverReason::Caught`]; beyond
//!   `detection_radius * lose_sight_factor` the drone goes back to searching.
//! - **Retreating**: flies straight out and is removed beyond
//!   `planet_radius + max_retreat_distance`.
//!
//! Searching drones stay inside `[R + min_altitude, R + max_altitude]`.
//! Pursuing drones may descend to the player's shell.

use glam::Vec3;
use polarise_core::clock::FrameTick;
use polarise_core::config::{GameConfig, PoliceConfig};
use polarise_core::coordinator::{GameSystem, PlayerActionListener, SystemError};
use polarise_core::game_state::{GameState, SharedGameState};
use polarise_core::registry::{ServiceRegistry, keys};
use polarise_events::EventBus;
use polarise_types::{
    DroneDetails, DroneId, DroneState, GameEvent, GameOverReason, PlayerAction, PoliceSnapshot,
    PoliceStatusDetails, PursuitDetails, Transform,
};
use polarise_world::{random_surface_point, surface_normal};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

use crate::error::AgentError;
use crate::player::{Player, SharedPlayer};

/// Event source name.
const SOURCE: &str = "police";

/// Shared handle stored in the service registry under [`keys::POLICE`].
pub type SharedPolice = Rc<RefCell<PoliceSystem>>;

/// Mixed into the session seed so drones do not replay NPC randomness.
const RNG_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

// ---------------------------------------------------------------------------
// Drone
// ---------------------------------------------------------------------------

/// A single pursuit drone.
#[derive(Debug, Clone, PartialEq)]
pub struct Drone {
    /// Stable identifier.
    pub id: DroneId,
    /// Position and motion above the planet.
    pub transform: Transform,
    /// Current behaviour.
    pub state: DroneState,
    /// Seconds in the current state.
    pub state_timer: f32,
    /// Seconds since the patrol target was picked.
    pub search_timer: f32,
    /// Patrol target while searching.
    pub target: Option<Vec3>,
}

impl Drone {
    fn new(position: Vec3) -> Self {
        Self {
            id: DroneId::new(),
            transform: Transform::new(position),
            state: DroneState::Searching,
            state_timer: 0.0,
            search_timer: 0.0,
            target: None,
        }
    }

    /// Whether the drone is flying away.
    pub fn is_retreating(&self) -> bool {
        self.state == DroneState::Retreating
    }

    fn enter_state(&mut self, state: DroneState) {
        self.state = state;
        self.state_timer = 0.0;
        if state != DroneState::Searching {
            self.target = None;
        }
    }

    /// Blend the velocity toward `desired`, apply drag, and move.
    fn fly(&mut self, desired: Vec3, config: &PoliceConfig, dt: f32) {
        let blend = (config.steering * dt).clamp(0.0, 1.0);
        let velocity = self.transform.velocity;
        self.transform.velocity = (velocity + (desired - velocity) * blend) * config.drag;
        self.transform.position += self.transform.velocity * dt;
        self.transform.face_direction(self.transform.velocity);
    }

    fn clamp_altitude(&mut self, min: f32, max: f32) {
        let length = self.transform.position.length();
        let clamped = length.clamp(min, max.max(min));
        if (length - clamped).abs() > f32::EPSILON {
            self.transform.position = surface_normal(self.transform.position) * clamped;
        }
    }
}

/// What happened to one drone this frame.
enum DroneEvent {
    Spotted { distance: f32 },
    Caught,
    Escaped,
    Gone,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Police activation and every live drone.
#[derive(Debug)]
pub struct PoliceSystem {
    config: PoliceConfig,
    planet_radius: f32,
    player_radius: f32,
    seed: u64,
    bus: EventBus,
    state: SharedGameState,
    player: Option<SharedPlayer>,
    player_position: Option<Vec3>,
    rng: SmallRng,
    drones: Vec<Drone>,
    active: bool,
    spawn_timer: f32,
}

impl PoliceSystem {
    /// Create an inactive police system.
    pub fn new(config: &GameConfig, bus: EventBus, state: SharedGameState) -> Self {
        let seed = config.session.seed ^ RNG_STREAM;
        Self {
            config: config.police.clone(),
            planet_radius: config.planet.radius,
            player_radius: config.player_radius(),
            seed,
            bus,
            state,
            player: None,
            player_position: None,
            rng: SmallRng::seed_from_u64(seed),
            drones: Vec::new(),
            active: false,
            spawn_timer: 0.0,
        }
    }

    /// Whether pursuit is on.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Every live drone, including retreating ones.
    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    /// Summary for logs and the HUD.
    pub fn snapshot(&self) -> PoliceSnapshot {
        let pursuing = self
            .drones
            .iter()
            .filter(|d| d.state == DroneState::Pursuing)
            .count();
        PoliceSnapshot {
            active: self.active,
            drones: u32::try_from(self.drones.len()).unwrap_or(u32::MAX),
            pursuing: u32::try_from(pursuing).unwrap_or(u32::MAX),
        }
    }

    const fn patrol_shell(&self) -> (f32, f32) {
        (
            self.planet_radius + self.config.min_altitude,
            self.planet_radius + self.config.max_altitude,
        )
    }

    fn status(&self, outrage: f32) -> PoliceStatusDetails {
        PoliceStatusDetails {
            outrage,
            active_drones: u32::try_from(self.drones.len()).unwrap_or(u32::MAX),
        }
    }

    // -----------------------------------------------------------------------
    // Activation
    // -----------------------------------------------------------------------

    fn activate(&mut self, state: &mut GameState) {
        self.active = true;
        // The first drone launches on the next spawn check.
        self.spawn_timer = self.config.spawn_interval;
        state.set_being_chased(true);
        info!(outrage = state.outrage(), "Police activated");
        self.bus.publish(GameEvent::PoliceActivate(self.status(state.outrage())), SOURCE);
    }

    fn deactivate(&mut self, state: &mut GameState) {
        self.active = false;
        self.spawn_timer = 0.0;
        for drone in &mut self.drones {
            drone.enter_state(DroneState::Retreating);
        }
        state.set_being_chased(false);
        info!(outrage = state.outrage(), "Police deactivated");
        self.bus.publish(GameEvent::PoliceDeactivate(self.status(state.outrage())), SOURCE);
    }

    fn spawn_drone(&mut self) {
        let (low, high) = self.patrol_shell();
        let altitude = patrol_altitude(&mut self.rng, low, high);
        let drone = Drone::new(random_surface_point(&mut self.rng, altitude));
        debug!(drone = %drone.id, "drone launched");
        self.bus.publish(
            GameEvent::PoliceDroneSpawn(DroneDetails {
                drone_id: drone.id,
                position: drone.transform.position,
            }),
            SOURCE,
        );
        self.drones.push(drone);
    }

    // -----------------------------------------------------------------------
    // Per-frame
    // -----------------------------------------------------------------------

    /// Advance activation, spawning, and every drone by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<(), AgentError> {
        let state_handle = Rc::clone(&self.state);
        let mut state = state_handle.try_borrow_mut()?;
        if state.is_game_over() || dt <= 0.0 {
            return Ok(());
        }

        // --- Activation ---
        let hot = state.outrage() >= self.config.activation_threshold;
        if hot && !self.active {
            self.activate(&mut state);
        } else if !hot && self.active {
            self.deactivate(&mut state);
        }

        // --- Spawning ---
        if self.active {
            self.spawn_timer += dt;
            let cap = usize::try_from(self.config.max_drones).unwrap_or(usize::MAX);
            if self.spawn_timer >= self.config.spawn_interval && self.drones.len() < cap {
                self.spawn_timer = 0.0;
                self.spawn_drone();
            }
        }

        // --- Drones ---
        let player = self
            .player
            .as_ref()
            .and_then(|p| p.try_borrow().ok().map(|p| p.position()))
            .or(self.player_position);
        let mut index = 0;
        while index < self.drones.len() {
            let event = self.step_drone(index, player, dt);
            match event {
                Some(DroneEvent::Caught) => {
                    info!("Player caught by police");
                    state.end_game(GameOverReason::Caught);
                    return Ok(());
                }
                Some(DroneEvent::Gone) => {
                    let drone = self.drones.remove(index);
                    debug!(drone = %drone.id, "drone destroyed");
                    self.bus.publish(
                        GameEvent::PoliceDroneDestroyed(DroneDetails {
                            drone_id: drone.id,
                            position: drone.transform.position,
                        }),
                        SOURCE,
                    );
                    continue;
                }
                Some(DroneEvent::Spotted { distance }) => {
                    if let Some(drone) = self.drones.get(index) {
                        debug!(drone = %drone.id, distance, "drone pursuing");
                        self.bus.publish(
                            GameEvent::PolicePursuit(PursuitDetails {
                                drone_id: drone.id,
                                distance,
                            }),
                            SOURCE,
                        );
                    }
                }
                Some(DroneEvent::Escaped) => debug!("player escaped a drone"),
                None => {}
            }
            index += 1;
        }
        Ok(())
    }

    fn step_drone(&mut self, index: usize, player: Option<Vec3>, dt: f32) -> Option<DroneEvent> {
        let (low, high) = self.patrol_shell();
        let retreat_limit = self.planet_radius + self.config.max_retreat_distance;
        let player_radius = self.player_radius;
        let config = &self.config;
        let rng = &mut self.rng;
        let drone = self.drones.get_mut(index)?;
        drone.state_timer += dt;

        let distance = player.map(|p| drone.transform.position.distance(p));
        let mut event = None;
        match drone.state {
            DroneState::Searching => {
                drone.search_timer += dt;
                if drone.target.is_none() || drone.search_timer >= config.search_interval {
                    let altitude = patrol_altitude(rng, low, high);
                    drone.target = Some(random_surface_point(rng, altitude));
                    drone.search_timer = 0.0;
                }
                if let Some(d) = distance.filter(|d| *d <= config.detection_radius) {
                    drone.enter_state(DroneState::Pursuing);
                    event = Some(DroneEvent::Spotted { distance: d });
                }
            }
            DroneState::Pursuing => match distance {
                Some(d) if d <= config.catch_radius => return Some(DroneEvent::Caught),
                Some(d) if d <= config.detection_radius * config.lose_sight_factor => {}
                _ => {
                    drone.enter_state(DroneState::Searching);
                    event = Some(DroneEvent::Escaped);
                }
            },
            DroneState::Retreating => {
                if drone.transform.position.length() > retreat_limit {
                    return Some(DroneEvent::Gone);
                }
            }
        }

        let position = drone.transform.position;
        let heading = match (drone.state, player, drone.target) {
            (DroneState::Pursuing, Some(p), _) | (DroneState::Searching, _, Some(p)) => {
                (p - position).normalize_or_zero()
            }
            (DroneState::Retreating, _, _) => surface_normal(position),
            _ => Vec3::ZERO,
        };
        drone.fly(heading * config.speed, config, dt);
        match drone.state {
            DroneState::Searching => drone.clamp_altitude(low, high),
            DroneState::Pursuing => drone.clamp_altitude(player_radius, high),
            DroneState::Retreating => {}
        }
        event
    }
}

impl PlayerActionListener for PoliceSystem {
    fn on_player_action(&mut self, action: &PlayerAction) {
        if let PlayerAction::Moved(details) = action {
            self.player_position = Some(details.position);
        }
    }
}

impl GameSystem for PoliceSystem {
    fn name(&self) -> &'static str {
        "police"
    }

    fn priority(&self) -> i32 {
        40
    }

    fn initialize(&mut self, registry: &ServiceRegistry) -> Result<(), SystemError> {
        if registry.contains(keys::PLAYER) {
            self.player = Some(registry.resolve::<RefCell<Player>>(keys::PLAYER)?);
        }
        Ok(())
    }

    fn update(&mut self, tick: &FrameTick) -> Result<(), SystemError> {
        self.step(tick.render_dt)?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), SystemError> {
        self.drones.clear();
        self.active = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SystemError> {
        self.drones.clear();
        self.active = false;
        self.spawn_timer = 0.0;
        self.player_position = None;
        self.rng = SmallRng::seed_from_u64(self.seed);
        Ok(())
    }

    fn player_action_listener(&mut self) -> Option<&mut dyn PlayerActionListener> {
        Some(self)
    }
}

/// A random altitude on the patrol shell; `low` when the range is empty or
/// not finite.
fn patrol_altitude(rng: &mut SmallRng, low: f32, high: f32) -> f32 {
    if low.is_finite() && high.is_finite() && high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use polarise_types::EventKind;

    use super::*;

    fn setup() -> (PoliceSystem, SharedGameState, SharedPlayer, EventBus) {
        let config = GameConfig::default();
        let bus = EventBus::new();
        let state = Rc::new(RefCell::new(GameState::new(&config, bus.clone())));
        let player = Rc::new(RefCell::new(Player::new(
            &config,
            bus.clone(),
            Rc::clone(&state),
        )));
        let mut police = PoliceSystem::new(&config, bus.clone(), Rc::clone(&state));
        police.player = Some(Rc::clone(&player));
        (police, state, player, bus)
    }

    fn kinds(bus: &EventBus, kind: EventKind) -> usize {
        bus.recent_events().iter().filter(|e| e.kind() == kind).count()
    }

    #[test]
    fn patrol_altitude_tolerates_degenerate_ranges() {
        let mut rng = SmallRng::seed_from_u64(3);
        let altitude = patrol_altitude(&mut rng, 54.0, 60.0);
        assert!((54.0..=60.0).contains(&altitude));
        assert!((patrol_altitude(&mut rng, 60.0, 54.0) - 60.0).abs() < f32::EPSILON);
        assert!((patrol_altitude(&mut rng, 54.0, f32::NAN) - 54.0).abs() < f32::EPSILON);
        assert!(patrol_altitude(&mut rng, f32::NAN, 60.0).is_nan());
    }

    #[test]
    fn calm_outrage_keeps_police_away() {
        let (mut police, state, _player, _bus) = setup();
        for _ in 0..100 {
            police.step(0.1).unwrap();
        }
        assert!(!police.is_active());
        assert!(police.drones().is_empty());
        assert!(!state.borrow().is_being_chased());
    }

    #[test]
    fn high_outrage_activates_and_spawns_up_to_cap() {
        let (mut police, state, player, bus) = setup();
        // Out of every drone's detection range.
        player.borrow_mut().transform_mut().position = Vec3::new(0.0, -1000.0, 0.0);
        state.borrow_mut().add_outrage(70.0);
        police.step(0.1).unwrap();
        assert!(police.is_active());
        assert!(state.borrow().is_being_chased());
        assert_eq!(kinds(&bus, EventKind::PoliceActivate), 1);
        assert_eq!(police.drones().len(), 1);

        for _ in 0..200 {
            police.step(0.1).unwrap();
        }
        assert_eq!(police.drones().len(), 5);
        assert_eq!(kinds(&bus, EventKind::PoliceDroneSpawn), 5);
        let snapshot = police.snapshot();
        assert!(snapshot.active);
        assert_eq!(snapshot.drones, 5);
        assert_eq!(snapshot.pursuing, 0);
    }

    #[test]
    fn dropping_outrage_sends_drones_home() {
        let (mut police, state, _player, bus) = setup();
        state.borrow_mut().add_outrage(70.0);
        police.step(0.1).unwrap();
        state.borrow_mut().add_outrage(-50.0);
        police.step(0.1).unwrap();

        assert!(!police.is_active());
        assert!(!state.borrow().is_being_chased());
        assert_eq!(kinds(&bus, EventKind::PoliceDeactivate), 1);
        assert!(police.drones().iter().all(Drone::is_retreating));

        for _ in 0..600 {
            police.step(0.1).unwrap();
        }
        assert!(police.drones().is_empty());
        assert_eq!(kinds(&bus, EventKind::PoliceDroneDestroyed), 1);
    }

    #[test]
    fn drone_near_player_pursues_and_catches() {
        let (mut police, state, player, bus) = setup();
        state.borrow_mut().add_outrage(70.0);
        police.step(0.01).unwrap();

        let target = player.borrow().position();
        let drone = police.drones.first_mut().unwrap();
        drone.transform.position = target * 1.15;
        drone.transform.velocity = Vec3::ZERO;

        for _ in 0..300 {
            police.step(0.05).unwrap();
            if state.borrow().is_game_over() {
                break;
            }
        }
        assert_eq!(kinds(&bus, EventKind::PolicePursuit), 1);
        assert_eq!(
            state.borrow().game_over_reason(),
            Some(GameOverReason::Caught)
        );
    }

    #[test]
    fn searching_drones_stay_in_patrol_shell() {
        let (mut police, state, player, _bus) = setup();
        // Park the player far below any patrol route.
        player.borrow_mut().transform_mut().position = Vec3::new(0.0, -1000.0, 0.0);
        state.borrow_mut().add_outrage(70.0);
        for _ in 0..400 {
            police.step(0.05).unwrap();
            for drone in police.drones() {
                let altitude = drone.transform.position.length() - 50.0;
                assert!((4.0 - 1e-3..=10.0 + 1e-3).contains(&altitude));
            }
        }
    }

    #[test]
    fn reset_clears_drones() {
        let (mut police, state, _player, _bus) = setup();
        state.borrow_mut().add_outrage(70.0);
        police.step(0.1).unwrap();
        police.reset().unwrap();
        assert!(police.drones().is_empty());
        assert!(!police.is_active());
    }
}
