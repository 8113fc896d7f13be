//! System coordinator: lifecycle, frame dispatch, and hook forwarding.
//!
//! Every gameplay component implements [`GameSystem`]. The
//! [`SystemCoordinator`] keeps them sorted by priority, drives each frame
//! through its [`FrameClock`], and isolates failures so one broken system
//! never halts the rest of the frame.
//!
//! # Frame Order
//!
//! 1. The clock turns the host delta into a [`FrameTick`].
//! 2. Enabled systems update in ascending priority (ties keep insertion
//!    order).
//! 3. After each system, queued `game.state_change` and player-action events
//!    are forwarded to every system's optional hooks.
//!
//! Hooks are the statically checked replacement for "call the method if the
//! object has it": a system opts in by returning `Some` from
//! [`GameSystem::game_state_listener`] or
//! [`GameSystem::player_action_listener`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use polarise_events::{DEFAULT_PRIORITY, EventBus, Subscription};
use polarise_types::{
    EventKind, GameEvent, PlayerAction, StateChange, SystemDetails, SystemErrorDetails,
};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, FrameClock, FrameTick};
use crate::config::TimingConfig;
use crate::registry::{RegistryError, ServiceRegistry};

/// Event source name used by the coordinator.
const SOURCE: &str = "coordinator";

/// Upper bound on hook notifications forwarded in one drain.
const MAX_FORWARDED_PER_DRAIN: usize = 1024;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a system can raise from a lifecycle call or frame update.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// A required service could not be resolved.
    #[error("dependency resolution failed: {source}")]
    Dependency {
        /// The underlying registry error.
        #[from]
        source: RegistryError,
    },

    /// The frame clock could not be built.
    #[error("clock setup failed: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The system was updated before a successful `initialize`.
    #[error("system {system} is not initialized")]
    NotInitialized {
        /// Name of the system.
        system: &'static str,
    },

    /// A shared service was already mutably borrowed.
    #[error("service {service} is busy")]
    ServiceBusy {
        /// Name of the service.
        service: &'static str,
    },

    /// Any other failure.
    #[error("{system} failed: {reason}")]
    Failed {
        /// Name of the system.
        system: &'static str,
        /// Description of the failure.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Receives every `game.state_change` notification.
pub trait GameStateListener {
    /// Called once per state change, in publish order.
    fn on_game_state_change(&mut self, change: &StateChange);
}

/// Receives every player action (move, mask change, mask rejection).
pub trait PlayerActionListener {
    /// Called once per action, in publish order.
    fn on_player_action(&mut self, action: &PlayerAction);
}

/// A component driven by the [`SystemCoordinator`].
pub trait GameSystem {
    /// Stable name used in logs and lifecycle events.
    fn name(&self) -> &'static str;

    /// Update order; lower runs first.
    fn priority(&self) -> i32;

    /// Resolve collaborators and build initial state.
    ///
    /// # Errors
    ///
    /// A failing system is disabled by the coordinator and skipped on
    /// every later frame.
    fn initialize(&mut self, registry: &ServiceRegistry) -> Result<(), SystemError>;

    /// Advance one frame.
    ///
    /// # Errors
    ///
    /// Errors are logged and published as `system.error`; the frame goes on.
    fn update(&mut self, tick: &FrameTick) -> Result<(), SystemError>;

    /// Release resources. Called in reverse priority order.
    ///
    /// # Errors
    ///
    /// Errors are logged and do not stop other systems shutting down.
    fn shutdown(&mut self) -> Result<(), SystemError> {
        Ok(())
    }

    /// Return to the state right after `initialize`.
    ///
    /// # Errors
    ///
    /// Errors are logged and do not stop other systems resetting.
    fn reset(&mut self) -> Result<(), SystemError> {
        Ok(())
    }

    /// Opt in to game-state change notifications.
    fn game_state_listener(&mut self) -> Option<&mut dyn GameStateListener> {
        None
    }

    /// Opt in to player-action notifications.
    fn player_action_listener(&mut self) -> Option<&mut dyn PlayerActionListener> {
        None
    }
}

/// Shared handle to a system.
pub type SharedSystem = Rc<RefCell<dyn GameSystem>>;

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// A notification waiting to be forwarded to hooks.
#[derive(Debug, Clone, Copy)]
enum Notification {
    State(StateChange),
    Action(PlayerAction),
}

struct SystemEntry {
    name: &'static str,
    priority: i32,
    system: SharedSystem,
    enabled: bool,
}

/// Outcome of [`SystemCoordinator::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeReport {
    /// Systems that initialized, in order.
    pub initialized: Vec<&'static str>,
    /// Systems that failed and were disabled, with the rendered error.
    pub failed: Vec<(&'static str, String)>,
}

impl InitializeReport {
    /// Whether every system initialized.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs registered systems in priority order.
pub struct SystemCoordinator {
    bus: EventBus,
    clock: FrameClock,
    systems: Vec<SystemEntry>,
    inbox: Rc<RefCell<VecDeque<Notification>>>,
    subscriptions: Vec<Subscription>,
}

impl core::fmt::Debug for SystemCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SystemCoordinator")
            .field("systems", &self.system_names())
            .field("frame", &self.clock.frame())
            .finish_non_exhaustive()
    }
}

impl SystemCoordinator {
    /// Create a coordinator publishing on `bus`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the timing configuration is invalid.
    pub fn new(bus: EventBus, timing: &TimingConfig) -> Result<Self, ClockError> {
        let clock = FrameClock::new(timing)?;
        let inbox: Rc<RefCell<VecDeque<Notification>>> = Rc::default();

        let mut subscriptions = Vec::with_capacity(4);
        let queue = Rc::clone(&inbox);
        subscriptions.push(bus.subscribe(
            EventKind::GameStateChange,
            DEFAULT_PRIORITY,
            move |event| {
                if let GameEvent::GameStateChange(change) = event.payload {
                    queue.borrow_mut().push_back(Notification::State(change));
                }
                Ok(())
            },
        ));
        for kind in [
            EventKind::PlayerMove,
            EventKind::PlayerMaskChange,
            EventKind::PlayerMaskRejected,
        ] {
            let queue = Rc::clone(&inbox);
            subscriptions.push(bus.subscribe(kind, DEFAULT_PRIORITY, move |event| {
                if let Some(action) = event.payload.as_player_action() {
                    queue.borrow_mut().push_back(Notification::Action(action));
                }
                Ok(())
            }));
        }

        Ok(Self {
            bus,
            clock,
            systems: Vec::new(),
            inbox,
            subscriptions,
        })
    }

    /// Register a system, keeping priority order stable.
    ///
    /// A system with the same name replaces the earlier one.
    pub fn add_system(&mut self, system: SharedSystem) {
        let (name, priority) = {
            let guard = system.borrow();
            (guard.name(), guard.priority())
        };
        if self.remove_system(name).is_some() {
            warn!(system = name, "replacing registered system");
        }
        let index = self.systems.partition_point(|e| e.priority <= priority);
        self.systems.insert(
            index,
            SystemEntry {
                name,
                priority,
                system,
                enabled: true,
            },
        );
        debug!(system = name, priority, index, "system added");
    }

    /// Remove a system by name.
    pub fn remove_system(&mut self, name: &str) -> Option<SharedSystem> {
        let index = self.systems.iter().position(|e| e.name == name)?;
        Some(self.systems.remove(index).system)
    }

    /// System names in update order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|e| e.name).collect()
    }

    /// Whether a registered system is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.systems.iter().any(|e| e.name == name && e.enabled)
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// The bus this coordinator publishes on.
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The frame clock.
    pub const fn clock(&self) -> &FrameClock {
        &self.clock
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Initialize every system in priority order.
    ///
    /// Failures are logged, published as `system.error`, and disable the
    /// failing system; the rest still initialize.
    pub fn initialize(&mut self, registry: &ServiceRegistry) -> InitializeReport {
        let mut report = InitializeReport::default();
        for index in 0..self.systems.len() {
            let Some(entry) = self.systems.get(index) else {
                continue;
            };
            let (name, system) = (entry.name, Rc::clone(&entry.system));
            let result = system.borrow_mut().initialize(registry);
            match result {
                Ok(()) => {
                    info!(system = name, "system initialized");
                    self.bus.publish(
                        GameEvent::SystemInitialize(SystemDetails {
                            system: name.to_owned(),
                        }),
                        SOURCE,
                    );
                    report.initialized.push(name);
                }
                Err(err) => {
                    if let Some(entry) = self.systems.get_mut(index) {
                        entry.enabled = false;
                    }
                    self.report_failure(name, "initialize", &err);
                    report.failed.push((name, err.to_string()));
                }
            }
            self.forward_notifications();
        }
        report
    }

    /// Run one host frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) -> FrameTick {
        let tick = self.clock.advance(dt);
        for index in 0..self.systems.len() {
            let Some(entry) = self.systems.get(index) else {
                continue;
            };
            if !entry.enabled {
                continue;
            }
            let (name, system) = (entry.name, Rc::clone(&entry.system));
            let result = match system.try_borrow_mut() {
                Ok(mut guard) => guard.update(&tick),
                Err(_) => {
                    warn!(system = name, "system busy, skipping update");
                    Ok(())
                }
            };
            if let Err(err) = result {
                self.report_failure(name, "update", &err);
            }
            self.forward_notifications();
        }
        tick
    }

    /// Shut every system down in reverse priority order.
    pub fn shutdown(&mut self) {
        for index in (0..self.systems.len()).rev() {
            let Some(entry) = self.systems.get(index) else {
                continue;
            };
            let (name, system) = (entry.name, Rc::clone(&entry.system));
            let result = system.borrow_mut().shutdown();
            match result {
                Ok(()) => {
                    info!(system = name, "system shut down");
                    self.bus.publish(
                        GameEvent::SystemShutdown(SystemDetails {
                            system: name.to_owned(),
                        }),
                        SOURCE,
                    );
                }
                Err(err) => self.report_failure(name, "shutdown", &err),
            }
        }
        self.inbox.borrow_mut().clear();
    }

    /// Reset the clock and every enabled system, then publish `game.restart`.
    pub fn restart(&mut self) {
        self.clock.reset();
        self.inbox.borrow_mut().clear();
        for index in 0..self.systems.len() {
            let Some(entry) = self.systems.get(index) else {
                continue;
            };
            if !entry.enabled {
                continue;
            }
            let (name, system) = (entry.name, Rc::clone(&entry.system));
            let result = system.borrow_mut().reset();
            if let Err(err) = result {
                self.report_failure(name, "reset", &err);
            }
        }
        self.forward_notifications();
        info!("game restarted");
        self.bus.publish(GameEvent::GameRestart, SOURCE);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn report_failure(&self, name: &'static str, phase: &str, err: &SystemError) {
        warn!(system = name, phase, error = %err, "system failed");
        self.bus.publish(
            GameEvent::SystemError(SystemErrorDetails {
                system: name.to_owned(),
                phase: phase.to_owned(),
                message: err.to_string(),
            }),
            SOURCE,
        );
    }

    /// Deliver queued notifications to every enabled system's hooks.
    fn forward_notifications(&self) {
        let mut forwarded = 0_usize;
        loop {
            let Some(notification) = self.inbox.borrow_mut().pop_front() else {
                return;
            };
            if forwarded >= MAX_FORWARDED_PER_DRAIN {
                let dropped = self.inbox.borrow().len().saturating_add(1);
                warn!(dropped, "hook notification storm, dropping the rest");
                self.inbox.borrow_mut().clear();
                return;
            }
            forwarded = forwarded.saturating_add(1);

            for entry in self.systems.iter().filter(|e| e.enabled) {
                let Ok(mut guard) = entry.system.try_borrow_mut() else {
                    warn!(system = entry.name, "system busy, skipping hook");
                    continue;
                };
                match notification {
                    Notification::State(change) => {
                        if let Some(listener) = guard.game_state_listener() {
                            listener.on_game_state_change(&change);
                        }
                    }
                    Notification::Action(action) => {
                        if let Some(listener) = guard.player_action_listener() {
                            listener.on_player_action(&action);
                        }
                    }
                }
            }
        }
    }
}

impl Drop for SystemCoordinator {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}
