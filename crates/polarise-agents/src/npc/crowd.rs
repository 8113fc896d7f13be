//! Crowd detection around the player.

use std::collections::BTreeMap;

use glam::Vec3;
use polarise_core::config::CrowdConfig;
use polarise_types::{CrowdUpdateDetails, MaskType};
use polarise_world::SpatialHash;

use super::agent::Npc;

/// Who stands around the player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrowdReport {
    /// NPCs within the crowd radius.
    pub nearby: u32,
    /// Of those, NPCs wearing the player's mask.
    pub matching: u32,
    /// Count per mask among nearby NPCs.
    pub composition: BTreeMap<MaskType, u32>,
    /// Whether `nearby` reaches the minimum crowd size.
    pub in_crowd: bool,
    /// Whether a strict majority wears a mask other than the player's.
    ///
    /// Always false for a neutral player.
    pub in_wrong_crowd: bool,
}

impl From<CrowdReport> for CrowdUpdateDetails {
    fn from(report: CrowdReport) -> Self {
        Self {
            nearby: report.nearby,
            matching: report.matching,
            composition: report.composition,
            in_crowd: report.in_crowd,
            in_wrong_crowd: report.in_wrong_crowd,
        }
    }
}

/// Classify the crowd around a player at `position` wearing `mask`.
pub fn detect_crowd(
    npcs: &[Npc],
    grid: &SpatialHash,
    position: Vec3,
    mask: Option<MaskType>,
    config: &CrowdConfig,
) -> CrowdReport {
    let mut report = CrowdReport::default();
    grid.for_each_candidate(position, config.radius, |index| {
        let Some(npc) = npcs.get(index) else {
            return;
        };
        if npc.position().distance(position) > config.radius {
            return;
        }
        report.nearby += 1;
        *report.composition.entry(npc.mask).or_insert(0) += 1;
        if Some(npc.mask) == mask {
            report.matching += 1;
        }
    });

    report.in_crowd = report.nearby >= config.min_size;
    let others = report.nearby - report.matching;
    report.in_wrong_crowd = report.in_crowd && mask.is_some() && others * 2 > report.nearby;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::agent::Personality;

    fn crowd(masks: &[MaskType]) -> (Vec<Npc>, SpatialHash) {
        let npcs: Vec<Npc> = masks
            .iter()
            .enumerate()
            .map(|(i, &mask)| {
                Npc::new(
                    mask,
                    mask.slot(),
                    Vec3::new(i as f32 * 0.5, 50.5, 0.0),
                    50.5,
                    Personality {
                        curiosity: 0.5,
                        energy: 0.5,
                    },
                    1.0,
                )
            })
            .collect();
        let mut grid = SpatialHash::new(4.0);
        grid.rebuild(npcs.iter().map(Npc::position));
        (npcs, grid)
    }

    const PLAYER: Vec3 = Vec3::new(0.0, 50.5, 0.0);

    #[test]
    fn too_few_is_not_a_crowd() {
        let (npcs, grid) = crowd(&[MaskType::Crimson; 4]);
        let report = detect_crowd(&npcs, &grid, PLAYER, None, &CrowdConfig::default());
        assert_eq!(report.nearby, 4);
        assert!(!report.in_crowd);
        assert!(!report.in_wrong_crowd);
    }

    #[test]
    fn majority_of_other_masks_is_wrong_crowd() {
        use MaskType::{Azure, Crimson};
        let (npcs, grid) = crowd(&[Crimson, Crimson, Azure, Azure, Azure]);
        let report = detect_crowd(&npcs, &grid, PLAYER, Some(Crimson), &CrowdConfig::default());
        assert!(report.in_crowd);
        assert!(report.in_wrong_crowd);
        assert_eq!(report.matching, 2);
        assert_eq!(report.composition.get(&Azure), Some(&3));
    }

    #[test]
    fn tie_is_not_wrong_crowd() {
        use MaskType::{Azure, Crimson};
        let (npcs, grid) = crowd(&[Crimson, Crimson, Crimson, Azure, Azure, Azure]);
        let report = detect_crowd(&npcs, &grid, PLAYER, Some(Crimson), &CrowdConfig::default());
        assert!(report.in_crowd);
        assert!(!report.in_wrong_crowd);
    }

    #[test]
    fn neutral_player_is_never_in_wrong_crowd() {
        let (npcs, grid) = crowd(&[MaskType::Violet; 8]);
        let report = detect_crowd(&npcs, &grid, PLAYER, None, &CrowdConfig::default());
        assert!(report.in_crowd);
        assert!(!report.in_wrong_crowd);
    }

    #[test]
    fn distant_npcs_do_not_count() {
        let (npcs, grid) = crowd(&[MaskType::Gold; 30]);
        let report = detect_crowd(&npcs, &grid, PLAYER, None, &CrowdConfig::default());
        // Spacing 0.5 along x; radius 8 covers indices 0..=15 at most.
        assert!(report.nearby <= 17);
        assert!(report.nearby >= 15);
    }
}
