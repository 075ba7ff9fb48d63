//! Controller input: declared control layouts, device sources, and per-frame
//! edge-aware sampling.
//!
//! # Invariants
//! - A sampler is bound to exactly one layout for its lifetime.
//! - Unknown symbolic names fail fast; controls a device lacks read as inert defaults.
//! - `previous` always holds the prior frame's `current` after `update`.

pub mod error;
pub mod layout;
pub mod sampler;
pub mod source;

pub use error::InputError;
pub use layout::{AxisPairDef, ControlKind, ControlLayout, controls};
pub use sampler::{ButtonState, ButtonThresholds, HapticActuator, InputSampler};
pub use source::{
    AxisSample, ButtonSample, DeviceFrame, Handedness, HapticPulse, InputSource, ManualSource,
    ScriptedSource,
};
