//! Integration tests for a fully wired session.
//!
//! Every system is registered in a real [`ServiceRegistry`], driven by a
//! [`SystemCoordinator`], and run through [`run_session`] without a
//! renderer.

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use polarise_agents::{NpcSystem, Player, PoliceSystem};
use polarise_core::config::{GameConfig, SessionConfig};
use polarise_core::control::{SessionControl, SessionEndReason};
use polarise_core::coordinator::{SharedSystem, SystemCoordinator};
use polarise_core::game_state::{GameState, SharedGameState};
use polarise_core::input::{MaskRequest, PlayerInput, ScriptedInput, SharedInput};
use polarise_core::registry::{ServiceRegistry, keys};
use polarise_core::runner::{NoOpCallback, run_session};
use polarise_core::scene::{HeadlessScene, SharedScene};
use polarise_events::EventBus;
use polarise_types::{EventKind, GameEvent, MaskType, NEUTRAL_BACKGROUND_RGB};

struct Session {
    bus: EventBus,
    coordinator: SystemCoordinator,
    state: SharedGameState,
    scene: Rc<HeadlessScene>,
    player: Rc<RefCell<Player>>,
    npcs: Rc<RefCell<NpcSystem>>,
}

fn wire(config: &GameConfig, script: Vec<PlayerInput>) -> Session {
    let bus = EventBus::with_history_limit(10_000);
    let registry = ServiceRegistry::new();
    let scene = Rc::new(HeadlessScene::new(config.planet.radius));
    let input: SharedInput = Rc::new(RefCell::new(ScriptedInput::new(script)));
    registry.register_instance::<SharedScene>(keys::SCENE, Rc::new(Rc::clone(&scene) as SharedScene));
    registry.register_instance::<SharedInput>(keys::INPUT, Rc::new(input));

    let state = Rc::new(RefCell::new(GameState::new(config, bus.clone())));
    let player = Rc::new(RefCell::new(Player::new(config, bus.clone(), Rc::clone(&state))));
    let npcs = Rc::new(RefCell::new(NpcSystem::new(config, bus.clone(), Rc::clone(&state))));
    let police = Rc::new(RefCell::new(PoliceSystem::new(config, bus.clone(), Rc::clone(&state))));
    registry.register_instance(keys::GAME_STATE, Rc::clone(&state));
    registry.register_instance(keys::PLAYER, Rc::clone(&player));
    registry.register_instance(keys::NPC_SYSTEM, Rc::clone(&npcs));
    registry.register_instance(keys::POLICE, Rc::clone(&police));

    let mut coordinator = SystemCoordinator::new(bus.clone(), &config.timing).unwrap();
    coordinator.add_system(Rc::clone(&state) as SharedSystem);
    coordinator.add_system(Rc::clone(&player) as SharedSystem);
    coordinator.add_system(Rc::clone(&npcs) as SharedSystem);
    coordinator.add_system(police as SharedSystem);
    assert!(coordinator.initialize(&registry).is_complete());

    Session {
        bus,
        coordinator,
        state,
        scene,
        player,
        npcs,
    }
}

fn small_world() -> GameConfig {
    let mut config = GameConfig::default();
    config.npc.group_size = 10;
    config
}

fn bounded(max_frames: u64) -> SessionConfig {
    SessionConfig {
        max_frames,
        frame_interval_ms: 0,
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn walking_session_keeps_everyone_on_the_sphere() {
    let config = small_world();
    let script = (0..180)
        .map(|i| PlayerInput::moving((i as f32 * 0.05).sin(), 1.0))
        .collect();
    let mut session = wire(&config, script);
    let session_config = bounded(180);
    let control = Arc::new(SessionControl::new(&session_config));

    let result = run_session(
        &mut session.coordinator,
        &session.state,
        &session_config,
        &control,
        &mut NoOpCallback,
    )
    .await
    .unwrap();

    assert_eq!(result.end_reason, SessionEndReason::MaxFramesReached);
    assert_eq!(result.frames, 180);
    let snapshot = result.final_snapshot.unwrap();
    assert!(snapshot.game_time > 0.0);
    assert!((0.0..=100.0).contains(&snapshot.outrage));
    assert!((0.0..=100.0).contains(&snapshot.energy));

    assert!(session
        .player
        .borrow()
        .transform()
        .is_on_sphere(config.player_radius(), 1e-3));
    assert!(session
        .npcs
        .borrow()
        .npcs()
        .iter()
        .all(|n| n.transform.is_on_sphere(config.npc_radius(), 1e-3)));
    let moves = session
        .bus
        .recent_events()
        .iter()
        .filter(|e| e.kind() == EventKind::PlayerMove)
        .count();
    assert_eq!(moves, 180);
}

#[tokio::test]
async fn wearing_a_mask_recolours_the_scene() {
    let config = small_world();
    let script = vec![PlayerInput::mask(MaskRequest::Wear(MaskType::Jade))];
    let mut session = wire(&config, script);
    let session_config = bounded(10);
    let control = Arc::new(SessionControl::new(&session_config));

    run_session(
        &mut session.coordinator,
        &session.state,
        &session_config,
        &control,
        &mut NoOpCallback,
    )
    .await
    .unwrap();

    assert_eq!(session.state.borrow().current_mask(), Some(MaskType::Jade));
    assert_ne!(session.scene.background(), NEUTRAL_BACKGROUND_RGB);
}

#[tokio::test]
async fn running_out_of_energy_strips_the_mask() {
    let mut config = small_world();
    config.meters.initial_energy = 1.0;
    config.meters.mask_energy_drain_rate = 20.0;
    let script = vec![PlayerInput::mask(MaskRequest::Wear(MaskType::Crimson))];
    let mut session = wire(&config, script);
    let session_config = bounded(60);
    let control = Arc::new(SessionControl::new(&session_config));

    run_session(
        &mut session.coordinator,
        &session.state,
        &session_config,
        &control,
        &mut NoOpCallback,
    )
    .await
    .unwrap();

    assert_eq!(session.state.borrow().current_mask(), None);
    let forced = session
        .bus
        .recent_events()
        .iter()
        .filter(|e| matches!(&e.payload, GameEvent::PlayerMaskChange(d) if d.forced))
        .count();
    assert_eq!(forced, 1);
}

#[tokio::test]
async fn stop_request_ends_the_session() {
    let config = small_world();
    let mut session = wire(&config, Vec::new());
    let session_config = bounded(0);
    let control = Arc::new(SessionControl::new(&session_config));
    control.request_stop();

    let result = run_session(
        &mut session.coordinator,
        &session.state,
        &session_config,
        &control,
        &mut NoOpCallback,
    )
    .await
    .unwrap();

    assert_eq!(result.end_reason, SessionEndReason::Stopped);
    assert_eq!(result.frames, 0);
}

#[tokio::test]
async fn auto_restart_plays_another_round() {
    let mut config = small_world();
    // Outrage drops below the adult threshold almost immediately.
    config.meters.initial_outrage = 0.0;
    config.win_conditions.adult_time_required = 0.5;
    let mut session = wire(&config, Vec::new());
    let session_config = SessionConfig {
        auto_restart: true,
        ..bounded(120)
    };
    let control = Arc::new(SessionControl::new(&session_config));

    let result = run_session(
        &mut session.coordinator,
        &session.state,
        &session_config,
        &control,
        &mut NoOpCallback,
    )
    .await
    .unwrap();

    assert_eq!(result.end_reason, SessionEndReason::MaxFramesReached);
    assert!(result.rounds > 1);
    let restarts = session
        .bus
        .recent_events()
        .iter()
        .filter(|e| e.kind() == EventKind::GameRestart)
        .count();
    assert_eq!(u32::try_from(restarts).unwrap(), result.rounds - 1);
}
