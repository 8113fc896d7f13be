//! Scene collaborator interface.
//!
//! Rendering lives outside the simulation core. The core consumes only the
//! planet radius, the camera's right vector (for the player's tangent basis)
//! and a cosmetic background hook fired on mask changes.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;
use polarise_types::{MaskType, NEUTRAL_BACKGROUND_RGB};
use tracing::trace;

/// Hooks the simulation calls on the rendering side.
pub trait SceneHooks: core::fmt::Debug {
    /// Planet surface radius as rendered.
    fn planet_radius(&self) -> f32;

    /// World-space right vector of the active camera.
    fn camera_right(&self) -> Vec3;

    /// Recolour the background for the player's mask (`None` is neutral).
    fn set_background_from_mask(&self, mask: Option<MaskType>);
}

/// Shared handle stored in the service registry under
/// [`keys::SCENE`](crate::registry::keys::SCENE).
pub type SharedScene = Rc<dyn SceneHooks>;

/// Scene stand-in for headless runs and tests.
///
/// Remembers the last background colour and lets callers move the camera.
#[derive(Debug)]
pub struct HeadlessScene {
    planet_radius: f32,
    camera_right: Cell<Vec3>,
    background: Cell<u32>,
    background_changes: Cell<u32>,
}

impl HeadlessScene {
    /// Create a headless scene for a planet of `planet_radius`.
    pub const fn new(planet_radius: f32) -> Self {
        Self {
            planet_radius,
            camera_right: Cell::new(Vec3::X),
            background: Cell::new(NEUTRAL_BACKGROUND_RGB),
            background_changes: Cell::new(0),
        }
    }

    /// Point the camera's right vector somewhere else.
    pub fn set_camera_right(&self, right: Vec3) {
        self.camera_right.set(right);
    }

    /// Current background colour as `0xRRGGBB`.
    pub fn background(&self) -> u32 {
        self.background.get()
    }

    /// How many times the background was set.
    pub fn background_changes(&self) -> u32 {
        self.background_changes.get()
    }
}

impl SceneHooks for HeadlessScene {
    fn planet_radius(&self) -> f32 {
        self.planet_radius
    }

    fn camera_right(&self) -> Vec3 {
        self.camera_right.get()
    }

    fn set_background_from_mask(&self, mask: Option<MaskType>) {
        let rgb = mask.map_or(NEUTRAL_BACKGROUND_RGB, MaskType::background_rgb);
        trace!(?mask, rgb = format_args!("{rgb:06x}"), "background changed");
        self.background.set(rgb);
        self.background_changes
            .set(self.background_changes.get().saturating_add(1));
    }
}
