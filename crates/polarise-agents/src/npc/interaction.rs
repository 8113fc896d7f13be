//! Player-NPC interactions and booster contagion.

use glam::Vec3;
use polarise_core::config::InteractionConfig;
use polarise_types::{InteractionOutcome, MaskType, NpcInteractionDetails, NpcState};
use polarise_world::SpatialHash;

use super::agent::Npc;

/// A propagated boost keeps this share of the source's extra strength.
pub const PROPAGATION_FALLOFF: f32 = 0.5;

/// Boosts weaker than `1.0 + MIN_PROPAGATED_BOOST` stop spreading.
pub const MIN_PROPAGATED_BOOST: f32 = 0.05;

/// Effect of one interaction on the game state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    /// What happened, as published in `npc.interaction`.
    pub details: NpcInteractionDetails,
    /// Outrage change to apply.
    pub outrage_delta: f32,
    /// Energy change to apply.
    pub energy_delta: f32,
    /// Whether this interaction polarised the NPC for the first time.
    pub newly_polarised: bool,
}

/// Interact with `npc` as a player wearing `player_mask`.
///
/// The caller checks range and cooldown; this applies the outcome to the
/// NPC, restarts its cooldown, and returns the meter changes.
pub fn interact(
    npc: &mut Npc,
    player_mask: Option<MaskType>,
    config: &InteractionConfig,
) -> Interaction {
    npc.interaction_cooldown = config.cooldown;

    let (outcome, outrage_delta, energy_delta) = match player_mask {
        None => {
            npc.player_influence *= 1.0 - config.neutral_influence_decay.clamp(0.0, 1.0);
            (InteractionOutcome::Neutral, 0.0, 0.0)
        }
        Some(mask) if mask == npc.mask => {
            npc.enter_state(NpcState::Gathering);
            npc.player_influence = (npc.player_influence + config.influence_step).clamp(-1.0, 1.0);
            npc.flocking_boost
                .trigger(config.flocking_boost, config.flocking_boost_duration);
            (
                InteractionOutcome::Aligned,
                -config.same_mask_outrage,
                config.same_mask_energy,
            )
        }
        Some(_) => {
            npc.enter_state(NpcState::Idle);
            npc.player_influence = (npc.player_influence - config.influence_step).clamp(-1.0, 1.0);
            npc.separation_boost
                .trigger(config.separation_boost, config.separation_boost_duration);
            (
                InteractionOutcome::Opposed,
                config.different_mask_outrage,
                -config.different_mask_energy,
            )
        }
    };

    let newly_polarised =
        !npc.polarised && npc.player_influence.abs() >= config.polarisation_threshold;
    if newly_polarised {
        npc.polarised = true;
    }

    Interaction {
        details: NpcInteractionDetails {
            npc_id: npc.id,
            npc_mask: npc.mask,
            player_mask,
            outcome,
            influence: npc.player_influence,
        },
        outrage_delta,
        energy_delta,
        newly_polarised,
    }
}

/// Count down every NPC's boosters and interaction cooldown.
pub fn tick_timers(npcs: &mut [Npc], dt: f32) {
    for npc in npcs {
        npc.flocking_boost.tick(dt);
        npc.separation_boost.tick(dt);
        npc.interaction_cooldown = (npc.interaction_cooldown - dt).max(0.0);
    }
}

/// Spread freshly triggered boosts one hop to same-group neighbours.
///
/// A spread boost is weaker by [`PROPAGATION_FALLOFF`] and is itself fresh,
/// so the ripple travels one hop per simulation tick until it fades below
/// [`MIN_PROPAGATED_BOOST`]. Returns how many NPCs received a boost.
pub fn propagate_boosts(npcs: &mut [Npc], grid: &SpatialHash, radius: f32) -> usize {
    let mut sources = Vec::new();
    for (index, npc) in npcs.iter_mut().enumerate() {
        let flocking = npc.flocking_boost.take_fresh();
        let separation = npc.separation_boost.take_fresh();
        if flocking || separation {
            sources.push(Source {
                index,
                group: npc.group,
                position: npc.position(),
                flocking: if flocking {
                    spread(npc.flocking_boost.value(), npc.flocking_boost.remaining())
                } else {
                    None
                },
                separation: if separation {
                    spread(npc.separation_boost.value(), npc.separation_boost.remaining())
                } else {
                    None
                },
            });
        }
    }

    let mut received = 0;
    let mut candidates = Vec::new();
    for source in &sources {
        grid.candidates(source.position, radius, &mut candidates);
        for &index in &candidates {
            if index == source.index {
                continue;
            }
            let Some(npc) = npcs.get_mut(index) else {
                continue;
            };
            if npc.group != source.group || npc.position().distance(source.position) > radius {
                continue;
            }
            let mut boosted = false;
            if let Some((multiplier, duration)) = source.flocking {
                boosted |= npc.flocking_boost.trigger(multiplier, duration);
            }
            if let Some((multiplier, duration)) = source.separation {
                boosted |= npc.separation_boost.trigger(multiplier, duration);
            }
            if boosted {
                received += 1;
            }
        }
    }
    received
}

#[derive(Debug)]
struct Source {
    index: usize,
    group: usize,
    position: Vec3,
    flocking: Option<(f32, f32)>,
    separation: Option<(f32, f32)>,
}

fn spread(multiplier: f32, remaining: f32) -> Option<(f32, f32)> {
    let weaker = 1.0 + (multiplier - 1.0) * PROPAGATION_FALLOFF;
    (weaker - 1.0 >= MIN_PROPAGATED_BOOST && remaining > 0.0).then_some((weaker, remaining))
}
