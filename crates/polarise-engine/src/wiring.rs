//! Builds the service registry and the coordinator for one session.
//!
//! Collaborators (bus, config, scene, input) are registered as instances.
//! The game state and the three agents are registered as singletons built
//! from their declared dependencies, resolved once, and handed to the
//! coordinator in any order; the coordinator sorts them by priority.

use std::cell::RefCell;
use std::rc::Rc;

use polarise_agents::npc::{NpcSystem, SharedNpcSystem};
use polarise_agents::player::{Player, SharedPlayer};
use polarise_agents::police::{PoliceSystem, SharedPolice};
use polarise_core::config::GameConfig;
use polarise_core::coordinator::{SharedSystem, SystemCoordinator};
use polarise_core::game_state::{GameState, SharedGameState};
use polarise_core::input::SharedInput;
use polarise_core::registry::{ServiceRegistry, keys};
use polarise_core::scene::{HeadlessScene, SharedScene};
use polarise_events::EventBus;
use tracing::info;

use crate::error::EngineError;

/// Everything a session needs, wired and initialized.
#[derive(Debug)]
pub struct World {
    /// The shared event bus.
    pub bus: EventBus,
    /// Registry the systems resolved their collaborators from.
    pub registry: ServiceRegistry,
    /// Drives every system each frame.
    pub coordinator: SystemCoordinator,
    /// Meters, flags, and win conditions.
    pub state: SharedGameState,
    /// Headless scene standing in for the renderer.
    pub scene: Rc<HeadlessScene>,
    /// The player agent.
    pub player: SharedPlayer,
    /// The NPC flocking engine.
    pub npcs: SharedNpcSystem,
    /// Police pursuit.
    pub police: SharedPolice,
}

/// Register every service and initialize the coordinator.
///
/// # Errors
///
/// Fails if a service cannot be built, the frame clock rejects the timing
/// configuration, or any system fails to initialize.
pub fn build_world(config: &GameConfig, input: SharedInput) -> Result<World, EngineError> {
    let bus = EventBus::new();
    let registry = ServiceRegistry::new();
    let scene = Rc::new(HeadlessScene::new(config.planet.radius));

    // --- Collaborators ---
    registry.register_instance(keys::EVENT_BUS, Rc::new(bus.clone()));
    registry.register_instance(keys::CONFIG, Rc::new(config.clone()));
    registry.register_instance::<SharedScene>(keys::SCENE, Rc::new(Rc::clone(&scene) as SharedScene));
    registry.register_instance::<SharedInput>(keys::INPUT, Rc::new(input));

    // --- Systems ---
    registry.register_singleton(keys::GAME_STATE, &[keys::CONFIG, keys::EVENT_BUS], |deps| {
        let config = deps.get::<GameConfig>(keys::CONFIG)?;
        let bus = deps.get::<EventBus>(keys::EVENT_BUS)?;
        Ok(RefCell::new(GameState::new(&config, EventBus::clone(&bus))))
    });
    let agent_deps = [keys::CONFIG, keys::EVENT_BUS, keys::GAME_STATE];
    registry.register_singleton(keys::PLAYER, &agent_deps, |deps| {
        let config = deps.get::<GameConfig>(keys::CONFIG)?;
        let bus = deps.get::<EventBus>(keys::EVENT_BUS)?;
        let state = deps.get::<RefCell<GameState>>(keys::GAME_STATE)?;
        Ok(RefCell::new(Player::new(&config, EventBus::clone(&bus), state)))
    });
    registry.register_singleton(keys::NPC_SYSTEM, &agent_deps, |deps| {
        let config = deps.get::<GameConfig>(keys::CONFIG)?;
        let bus = deps.get::<EventBus>(keys::EVENT_BUS)?;
        let state = deps.get::<RefCell<GameState>>(keys::GAME_STATE)?;
        Ok(RefCell::new(NpcSystem::new(&config, EventBus::clone(&bus), state)))
    });
    registry.register_singleton(keys::POLICE, &agent_deps, |deps| {
        let config = deps.get::<GameConfig>(keys::CONFIG)?;
        let bus = deps.get::<EventBus>(keys::EVENT_BUS)?;
        let state = deps.get::<RefCell<GameState>>(keys::GAME_STATE)?;
        Ok(RefCell::new(PoliceSystem::new(&config, EventBus::clone(&bus), state)))
    });

    let state = registry.resolve::<RefCell<GameState>>(keys::GAME_STATE)?;
    let player = registry.resolve::<RefCell<Player>>(keys::PLAYER)?;
    let npcs = registry.resolve::<RefCell<NpcSystem>>(keys::NPC_SYSTEM)?;
    let police = registry.resolve::<RefCell<PoliceSystem>>(keys::POLICE)?;

    let mut coordinator = SystemCoordinator::new(bus.clone(), &config.timing)?;
    coordinator.add_system(Rc::clone(&police) as SharedSystem);
    coordinator.add_system(Rc::clone(&npcs) as SharedSystem);
    coordinator.add_system(Rc::clone(&state) as SharedSystem);
    coordinator.add_system(Rc::clone(&player) as SharedSystem);

    let report = coordinator.initialize(&registry);
    if !report.is_complete() {
        let failed = report
            .failed
            .iter()
            .map(|(name, error)| format!("{name}: {error}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(EngineError::Initialize { failed });
    }
    info!(
        systems = ?coordinator.system_names(),
        services = registry.keys().len(),
        "World wired"
    );

    Ok(World {
        bus,
        registry,
        coordinator,
        state,
        scene,
        player,
        npcs,
        police,
    })
}
