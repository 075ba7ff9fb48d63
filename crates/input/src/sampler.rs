use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ControlLayout, InputError, InputSource};

/// Pressure thresholds used to derive levels and edges from analog buttons.
///
/// "Down" fires on first actuation past `press_min`; "up" fires only after the
/// button reached `press_max` and then dropped below it, which models physical
/// trigger travel rather than a boolean toggle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonThresholds {
    /// A button is pressed while its value is strictly above this.
    pub press_min: f32,
    /// Falling edges require the prior frame to have reached this.
    pub press_max: f32,
    /// Stricter rising edge used for deliberate full-squeeze confirmation.
    pub click: f32,
}

impl Default for ButtonThresholds {
    fn default() -> Self {
        Self {
            press_min: 0.0,
            press_max: 1.0,
            click: 0.9,
        }
    }
}

/// One button's state for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ButtonState {
    pub value: f32,
    pub touched: bool,
}

/// Named, edge-aware view over a single physical controller.
///
/// Holds two snapshots per button. [`InputSampler::update`] must run at most
/// once per frame: a second call copies the fresh `current` over `previous`
/// and the frame's edges are lost.
#[derive(Debug)]
pub struct InputSampler<S> {
    source: S,
    layout: ControlLayout,
    thresholds: ButtonThresholds,
    /// `None` marks a slot the device does not expose.
    current: Vec<Option<ButtonState>>,
    previous: Vec<Option<ButtonState>>,
    axes: Vec<Option<f32>>,
    frames: u64,
}

impl<S: InputSource> InputSampler<S> {
    /// Bind a source to the layout it declares.
    pub fn new(source: S, thresholds: ButtonThresholds) -> Result<Self, InputError> {
        let layout = ControlLayout::from_mapping(source.layout_id())?;
        let mut thresholds = thresholds;
        if let Some(min) = source.press_minimum() {
            thresholds.press_min = thresholds.press_min.max(min);
        }
        tracing::debug!(
            %layout,
            handedness = ?source.handedness(),
            press_min = thresholds.press_min,
            press_max = thresholds.press_max,
            "bound input sampler"
        );
        Ok(Self {
            source,
            layout,
            thresholds,
            current: vec![None; layout.button_slots()],
            previous: vec![None; layout.button_slots()],
            axes: vec![None; layout.axis_slots()],
            frames: 0,
        })
    }

    /// Shift `current` into `previous`, then read the live device.
    pub fn update(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        let frame = self.source.sample();
        for (i, slot) in self.current.iter_mut().enumerate() {
            *slot = frame.buttons.get(i).map(|b| ButtonState {
                value: finite_or_zero(b.value).clamp(0.0, 1.0),
                touched: b.touched,
            });
        }
        for (i, slot) in self.axes.iter_mut().enumerate() {
            *slot = frame.axes.get(i).map(|a| finite_or_zero(a.value));
        }
        self.frames += 1;
    }

    pub fn layout(&self) -> ControlLayout {
        self.layout
    }

    pub fn thresholds(&self) -> &ButtonThresholds {
        &self.thresholds
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Number of completed updates.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    fn slots(&self, name: &str) -> Result<(f32, f32), InputError> {
        let i = self.layout.button_index(name)?;
        let value = |v: &[Option<ButtonState>]| v[i].map(|b| b.value).unwrap_or(0.0);
        Ok((value(&self.previous), value(&self.current)))
    }

    /// Whether the device exposes the named button this frame.
    pub fn has_button(&self, name: &str) -> Result<bool, InputError> {
        let i = self.layout.button_index(name)?;
        Ok(self.current[i].is_some())
    }

    /// Current pressure in [0, 1].
    pub fn button_value(&self, name: &str) -> Result<f32, InputError> {
        Ok(self.slots(name)?.1)
    }

    pub fn button_touched(&self, name: &str) -> Result<bool, InputError> {
        let i = self.layout.button_index(name)?;
        Ok(self.current[i].is_some_and(|b| b.touched))
    }

    /// Level: pressure above `press_min`.
    pub fn button(&self, name: &str) -> Result<bool, InputError> {
        Ok(self.slots(name)?.1 > self.thresholds.press_min)
    }

    /// Rising edge past `press_min`.
    pub fn button_down(&self, name: &str) -> Result<bool, InputError> {
        let (prev, cur) = self.slots(name)?;
        let min = self.thresholds.press_min;
        Ok(prev <= min && cur > min)
    }

    /// Falling edge from at-or-above `press_max` to below it.
    pub fn button_up(&self, name: &str) -> Result<bool, InputError> {
        let (prev, cur) = self.slots(name)?;
        let max = self.thresholds.press_max;
        Ok(prev >= max && cur < max)
    }

    /// Rising edge past the click threshold.
    pub fn button_click(&self, name: &str) -> Result<bool, InputError> {
        let (prev, cur) = self.slots(name)?;
        let click = self.thresholds.click;
        Ok(prev <= click && cur > click)
    }

    /// Axis value as reported; non-finite samples read as 0.
    pub fn axis(&self, name: &str) -> Result<f32, InputError> {
        let i = self.layout.axis_index(name)?;
        Ok(self.axes[i].unwrap_or(0.0))
    }

    /// Both components of a named axis pair.
    pub fn axis_pair(&self, name: &str) -> Result<Vec2, InputError> {
        let (x, y) = self.layout.axis_pair(name)?;
        Ok(Vec2::new(self.axes[x].unwrap_or(0.0), self.axes[y].unwrap_or(0.0)))
    }

    /// Signed angle of a pair: 0 with the stick pushed forward (negative y),
    /// increasing toward +x. NaN when the stick is exactly centred.
    pub fn input_angle_2d(&self, name: &str) -> Result<f32, InputError> {
        let v = self.axis_pair(name)?;
        if v.x == 0.0 && v.y == 0.0 {
            return Ok(f32::NAN);
        }
        Ok(v.x.atan2(-v.y))
    }

    /// Euclidean magnitude of a pair.
    pub fn input_value_2d(&self, name: &str) -> Result<f32, InputError> {
        Ok(self.axis_pair(name)?.length())
    }

    /// Handle to one of the device's haptic actuators.
    pub fn haptic_actuator(&mut self, index: usize) -> Result<HapticActuator<'_, S>, InputError> {
        let available = self.source.haptic_actuator_count();
        if index >= available {
            return Err(InputError::HapticActuatorNotFound { index, available });
        }
        Ok(HapticActuator {
            source: &mut self.source,
            index,
        })
    }
}

/// Borrowed handle to a single haptic actuator.
pub struct HapticActuator<'a, S> {
    source: &'a mut S,
    index: usize,
}

impl<S: InputSource> HapticActuator<'_, S> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Fire a pulse; intensity is clamped to [0, 1].
    pub fn pulse(&mut self, intensity: f32, duration: Duration) -> bool {
        self.source
            .pulse(self.index, intensity.clamp(0.0, 1.0), duration)
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
