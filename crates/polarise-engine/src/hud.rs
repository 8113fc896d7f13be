//! Frame callback that logs a HUD line at a fixed frame interval.
//!
//! The browser HUD binds [`GameStateSnapshot`] directly; headless runs get
//! the same numbers as structured log fields, plus the police and NPC
//! summaries when those systems are wired.

use polarise_agents::npc::SharedNpcSystem;
use polarise_agents::police::SharedPolice;
use polarise_core::clock::FrameTick;
use polarise_core::runner::FrameCallback;
use polarise_types::{GameStateSnapshot, PoliceSnapshot};
use tracing::{info, warn};

/// NPC population counts for one HUD line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NpcSummary {
    total: usize,
    polarised: usize,
    idle: usize,
    wandering: usize,
    gathering: usize,
}

/// Logs the game state every `interval` frames.
#[derive(Debug)]
pub struct HudCallback {
    interval: u64,
    json: bool,
    police: Option<SharedPolice>,
    npcs: Option<SharedNpcSystem>,
    lines: u64,
    last_game_over: bool,
}

impl HudCallback {
    /// Log every `interval` frames; 0 disables the periodic line.
    pub const fn new(interval: u64, json: bool) -> Self {
        Self {
            interval,
            json,
            police: None,
            npcs: None,
            lines: 0,
            last_game_over: false,
        }
    }

    /// Include the police summary.
    #[must_use]
    pub fn with_police(mut self, police: SharedPolice) -> Self {
        self.police = Some(police);
        self
    }

    /// Include the NPC population summary.
    #[must_use]
    pub fn with_npcs(mut self, npcs: SharedNpcSystem) -> Self {
        self.npcs = Some(npcs);
        self
    }

    /// HUD lines logged so far.
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    fn police_snapshot(&self) -> PoliceSnapshot {
        self.police
            .as_ref()
            .and_then(|p| p.try_borrow().ok().map(|p| p.snapshot()))
            .unwrap_or(PoliceSnapshot {
                active: false,
                drones: 0,
                pursuing: 0,
            })
    }

    fn npc_summary(&self) -> NpcSummary {
        self.npcs
            .as_ref()
            .and_then(|n| {
                n.try_borrow().ok().map(|n| {
                    let (idle, wandering, gathering) = n.state_census();
                    NpcSummary {
                        total: n.npcs().len(),
                        polarised: n.polarised_count(),
                        idle,
                        wandering,
                        gathering,
                    }
                })
            })
            .unwrap_or_default()
    }

    fn log(&mut self, tick: &FrameTick, snapshot: &GameStateSnapshot) {
        self.lines = self.lines.saturating_add(1);
        let police = self.police_snapshot();
        let npcs = self.npc_summary();

        if self.json {
            match serde_json::to_string(snapshot) {
                Ok(state) => info!(frame = tick.frame, state = %state, "HUD"),
                Err(e) => warn!(error = %e, "failed to serialize HUD snapshot"),
            }
            return;
        }
        info!(
            frame = tick.frame,
            outrage = snapshot.outrage,
            energy = snapshot.energy,
            mask = ?snapshot.current_mask,
            in_crowd = snapshot.in_crowd,
            in_wrong_crowd = snapshot.in_wrong_crowd,
            chased = snapshot.is_being_chased,
            drones = police.drones,
            pursuing = police.pursuing,
            npcs = npcs.total,
            polarised = npcs.polarised,
            idle = npcs.idle,
            wandering = npcs.wandering,
            gathering = npcs.gathering,
            score = snapshot.score,
            "HUD"
        );
    }
}

impl FrameCallback for HudCallback {
    fn on_frame(&mut self, tick: &FrameTick, snapshot: &GameStateSnapshot) {
        let due = self.interval > 0 && tick.frame % self.interval == 0;
        let ended = snapshot.is_game_over && !self.last_game_over;
        self.last_game_over = snapshot.is_game_over;
        if due || ended {
            self.log(tick, snapshot);
        }
    }
}
