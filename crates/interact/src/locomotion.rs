use glam::{Vec2, Vec3};
use roomscale_common::NodeId;
use roomscale_input::{InputSampler, InputSource};
use roomscale_scene::Scene;
use std::time::Duration;

use crate::{InteractError, LocomotionConfig, LocomotionTiming};

/// Below this the flattened facing vector has no usable heading.
const MIN_HEADING_LENGTH_SQ: f32 = 1e-8;

/// Horizontal displacement for one tick of stick input.
///
/// `facing` is the avatar's world facing direction (local -Z). Returns `None`
/// when the stick is inside the dead zone on both axes or the avatar looks
/// straight up or down.
///
/// Forward stick is negative y and right stick is positive x. `right` below is
/// `up × forward`, which for a -Z facing points to the avatar's left, so both
/// terms are negated.
pub fn locomotion_step(facing: Vec3, stick: Vec2, dead_zone: f32, speed: f32) -> Option<Vec3> {
    if stick.x.abs() < dead_zone && stick.y.abs() < dead_zone {
        return None;
    }
    let flat = Vec3::new(facing.x, 0.0, facing.z);
    if flat.length_squared() < MIN_HEADING_LENGTH_SQ {
        return None;
    }
    let forward = flat.normalize();
    let right = Vec3::Y.cross(forward).normalize();
    Some(right * (-stick.x * speed) + forward * (-stick.y * speed))
}

/// Moves the avatar across the horizontal plane from one controller's stick.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: LocomotionConfig,
}

impl LocomotionController {
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Apply this tick's step to the avatar's position. Returns the step taken.
    ///
    /// The step is added to the avatar's local position with no collision or
    /// ground clamping; hosts keep the avatar rig directly under the root.
    pub fn update<S: InputSource>(
        &self,
        scene: &mut Scene,
        avatar: NodeId,
        input: &InputSampler<S>,
        dt: Duration,
    ) -> Result<Option<Vec3>, InteractError> {
        let stick = input.axis_pair(&self.config.stick)?;
        let speed = match self.config.timing {
            LocomotionTiming::PerFrame => self.config.speed,
            LocomotionTiming::PerSecond => self.config.speed * dt.as_secs_f32(),
        };
        let facing = scene.world_direction(avatar)?;
        let Some(step) = locomotion_step(facing, stick, self.config.dead_zone, speed) else {
            return Ok(None);
        };
        scene.translate(avatar, step)?;
        tracing::trace!(x = step.x, z = step.z, "locomotion step");
        Ok(Some(step))
    }
}
