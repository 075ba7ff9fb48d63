use glam::Vec3;
use roomscale_input::{ButtonThresholds, Handedness, controls};
use roomscale_tween::Ease;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level tuning for the interaction systems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractConfig {
    pub thresholds: ButtonThresholds,
    pub locomotion: LocomotionConfig,
    pub jump: JumpConfig,
    pub grab: GrabConfig,
}

/// Whether the locomotion speed is per tick or per second of elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocomotionTiming {
    /// Fixed step each tick; speed depends on frame rate.
    #[default]
    PerFrame,
    /// Step scaled by the tick's elapsed time.
    PerSecond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Hand whose controller drives movement.
    pub hand: Handedness,
    /// Axis pair read as the movement stick.
    pub stick: String,
    /// Below this on both axes the stick counts as centred.
    pub dead_zone: f32,
    /// World units per tick (or per second with `PerSecond` timing).
    pub speed: f32,
    pub timing: LocomotionTiming,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            hand: Handedness::Left,
            stick: controls::THUMBSTICK.to_string(),
            dead_zone: 0.15,
            speed: 0.01,
            timing: LocomotionTiming::PerFrame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub hand: Handedness,
    /// Button whose release edge starts a jump.
    pub button: String,
    pub height: f32,
    pub ascent_millis: u64,
    pub descent_millis: u64,
    pub ascent_ease: Ease,
    pub descent_ease: Ease,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            hand: Handedness::Right,
            button: controls::BUTTON_A.to_string(),
            height: 1.0,
            ascent_millis: 300,
            descent_millis: 400,
            ascent_ease: Ease::BackIn,
            descent_ease: Ease::QuadOut,
        }
    }
}

impl JumpConfig {
    pub fn ascent(&self) -> Duration {
        Duration::from_millis(self.ascent_millis)
    }

    pub fn descent(&self) -> Duration {
        Duration::from_millis(self.descent_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    pub button: String,
    /// Half extents of the box around a controller's attach point.
    pub hand_half_extents: Vec3,
    /// Pulse strength on pickup; 0 disables.
    pub haptic_intensity: f32,
    pub haptic_millis: u64,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            button: controls::SQUEEZE.to_string(),
            hand_half_extents: Vec3::splat(0.05),
            haptic_intensity: 0.5,
            haptic_millis: 40,
        }
    }
}

impl GrabConfig {
    pub fn haptic_duration(&self) -> Duration {
        Duration::from_millis(self.haptic_millis)
    }
}
