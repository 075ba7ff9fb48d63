use crate::layout::ControlKind;

/// Configuration errors raised by layout resolution and sampler queries.
///
/// None of these are recoverable at runtime: they mean the code asks for a
/// control the declared layout does not define.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("unknown control layout {0:?}")]
    UnknownLayout(String),
    #[error("{kind} {name:?} is not defined by the {layout} layout")]
    UnknownControl {
        layout: &'static str,
        kind: ControlKind,
        name: String,
    },
    #[error("haptic actuator {index} not found (device exposes {available})")]
    HapticActuatorNotFound { index: usize, available: usize },
}
