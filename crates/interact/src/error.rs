use roomscale_input::InputError;
use roomscale_scene::SceneError;
use roomscale_tween::TweenError;

/// Errors surfaced by the interaction systems.
///
/// Every variant is a configuration or wiring mistake; routine conditions
/// such as "nothing to grab" are not errors.
#[derive(Debug, thiserror::Error)]
pub enum InteractError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Tween(#[from] TweenError),
}
