use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// One button's raw reading for a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonSample {
    pub value: f32,
    pub touched: bool,
    pub pressed: bool,
}

impl ButtonSample {
    /// Reading for an analog pressure; any actuation counts as touched and pressed.
    pub fn from_value(value: f32) -> Self {
        Self {
            value,
            touched: value > 0.0,
            pressed: value > 0.0,
        }
    }
}

/// One axis's raw reading for a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSample {
    pub value: f32,
}

/// Everything a device reports in a single frame, indexed per its layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFrame {
    pub buttons: Vec<ButtonSample>,
    pub axes: Vec<AxisSample>,
}

impl DeviceFrame {
    /// Frame with `buttons` and `axes` slots, all at rest.
    pub fn at_rest(buttons: usize, axes: usize) -> Self {
        Self {
            buttons: vec![ButtonSample::default(); buttons],
            axes: vec![AxisSample::default(); axes],
        }
    }

    /// Set a button's value, growing the slot list if needed.
    pub fn with_button(mut self, index: usize, value: f32) -> Self {
        self.set_button(index, value);
        self
    }

    /// Set an axis value, growing the slot list if needed.
    pub fn with_axis(mut self, index: usize, value: f32) -> Self {
        self.set_axis(index, value);
        self
    }

    pub fn set_button(&mut self, index: usize, value: f32) {
        if self.buttons.len() <= index {
            self.buttons.resize(index + 1, ButtonSample::default());
        }
        self.buttons[index] = ButtonSample::from_value(value);
    }

    pub fn set_axis(&mut self, index: usize, value: f32) {
        if self.axes.len() <= index {
            self.axes.resize(index + 1, AxisSample::default());
        }
        self.axes[index] = AxisSample { value };
    }
}

/// Which hand a tracked controller is held in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    #[default]
    None,
    Left,
    Right,
}

/// A haptic request recorded by the in-memory sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HapticPulse {
    pub actuator: usize,
    pub intensity: f32,
    pub duration: Duration,
}

/// A physical controller (or a stand-in for one).
///
/// The sampler calls [`InputSource::sample`] exactly once per update.
pub trait InputSource {
    /// Declared layout id, e.g. `"xr-standard"`.
    fn layout_id(&self) -> &str;

    fn handedness(&self) -> Handedness {
        Handedness::None
    }

    /// Live read of the device for this frame.
    fn sample(&mut self) -> &DeviceFrame;

    /// Lowest pressure the device reports as an actuation, if it defines one.
    fn press_minimum(&self) -> Option<f32> {
        None
    }

    fn haptic_actuator_count(&self) -> usize {
        0
    }

    /// Fire a haptic pulse. Returns false if the device ignored it.
    fn pulse(&mut self, _actuator: usize, _intensity: f32, _duration: Duration) -> bool {
        false
    }
}

/// Source whose frame is written by the host (or a test) between updates.
#[derive(Debug, Clone)]
pub struct ManualSource {
    layout_id: String,
    handedness: Handedness,
    frame: DeviceFrame,
    press_minimum: Option<f32>,
    actuators: usize,
    pulses: Vec<HapticPulse>,
}

impl ManualSource {
    pub fn new(layout_id: impl Into<String>, handedness: Handedness) -> Self {
        Self {
            layout_id: layout_id.into(),
            handedness,
            frame: DeviceFrame::default(),
            press_minimum: None,
            actuators: 0,
            pulses: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: DeviceFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_press_minimum(mut self, minimum: f32) -> Self {
        self.press_minimum = Some(minimum);
        self
    }

    pub fn with_haptics(mut self, actuators: usize) -> Self {
        self.actuators = actuators;
        self
    }

    pub fn frame_mut(&mut self) -> &mut DeviceFrame {
        &mut self.frame
    }

    pub fn set_button(&mut self, index: usize, value: f32) {
        self.frame.set_button(index, value);
    }

    pub fn set_axis(&mut self, index: usize, value: f32) {
        self.frame.set_axis(index, value);
    }

    pub fn pulses(&self) -> &[HapticPulse] {
        &self.pulses
    }
}

impl InputSource for ManualSource {
    fn layout_id(&self) -> &str {
        &self.layout_id
    }

    fn handedness(&self) -> Handedness {
        self.handedness
    }

    fn sample(&mut self) -> &DeviceFrame {
        &self.frame
    }

    fn press_minimum(&self) -> Option<f32> {
        self.press_minimum
    }

    fn haptic_actuator_count(&self) -> usize {
        self.actuators
    }

    fn pulse(&mut self, actuator: usize, intensity: f32, duration: Duration) -> bool {
        if actuator >= self.actuators {
            return false;
        }
        self.pulses.push(HapticPulse {
            actuator,
            intensity,
            duration,
        });
        true
    }
}

/// Source that plays back a fixed sequence of frames, one per sample.
///
/// Once the script runs out the last frame repeats, so a held button stays held.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    layout_id: String,
    handedness: Handedness,
    pending: VecDeque<DeviceFrame>,
    current: DeviceFrame,
}

impl ScriptedSource {
    pub fn new(
        layout_id: impl Into<String>,
        handedness: Handedness,
        frames: impl IntoIterator<Item = DeviceFrame>,
    ) -> Self {
        Self {
            layout_id: layout_id.into(),
            handedness,
            pending: frames.into_iter().collect(),
            current: DeviceFrame::default(),
        }
    }

    /// Script a single button's pressure over consecutive frames.
    pub fn button_sequence(
        layout_id: impl Into<String>,
        handedness: Handedness,
        button: usize,
        values: &[f32],
    ) -> Self {
        let frames = values
            .iter()
            .map(|v| DeviceFrame::default().with_button(button, *v));
        Self::new(layout_id, handedness, frames)
    }

    /// Append frames to the end of the script.
    pub fn push_frames(&mut self, frames: impl IntoIterator<Item = DeviceFrame>) {
        self.pending.extend(frames);
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl InputSource for ScriptedSource {
    fn layout_id(&self) -> &str {
        &self.layout_id
    }

    fn handedness(&self) -> Handedness {
        self.handedness
    }

    fn sample(&mut self) -> &DeviceFrame {
        if let Some(next) = self.pending.pop_front() {
            self.current = next;
        }
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_builders_grow_slots() {
        let f = DeviceFrame::default().with_button(3, 0.5).with_axis(1, -1.0);
        assert_eq!(f.buttons.len(), 4);
        assert_eq!(f.buttons[3].value, 0.5);
        assert!(f.buttons[3].touched);
        assert!(!f.buttons[0].pressed);
        assert_eq!(f.axes[1].value, -1.0);
    }

    #[test]
    fn scripted_source_repeats_last_frame() {
        let mut s =
            ScriptedSource::button_sequence("xr-standard", Handedness::Left, 1, &[0.0, 1.0]);
        assert_eq!(s.sample().buttons[1].value, 0.0);
        assert_eq!(s.sample().buttons[1].value, 1.0);
        assert_eq!(s.sample().buttons[1].value, 1.0);
        assert_eq!(s.remaining(), 0);
        assert_eq!(s.handedness(), Handedness::Left);
    }

    #[test]
    fn manual_source_records_pulses_for_known_actuators() {
        let mut s = ManualSource::new("xr-standard", Handedness::Right).with_haptics(1);
        assert!(s.pulse(0, 0.5, Duration::from_millis(20)));
        assert!(!s.pulse(1, 0.5, Duration::from_millis(20)));
        assert_eq!(s.pulses().len(), 1);
    }
}
