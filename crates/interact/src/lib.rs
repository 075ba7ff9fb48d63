//! Interaction runtime: stick locomotion, eased jumps, and controller grabs.
//!
//! # Invariants
//! - Components never call each other; the host sequences them once per frame.
//! - Jump and grab state live on owned structs, never in statics.
//! - Locomotion writes the avatar's horizontal axes, the jump tween writes
//!   only the vertical one.
//! - At most one binding per controller, at most one holder per object.

pub mod config;
pub mod error;
pub mod grab;
pub mod jump;
pub mod locomotion;
pub mod session;

pub use config::{GrabConfig, InteractConfig, JumpConfig, LocomotionConfig, LocomotionTiming};
pub use error::InteractError;
pub use grab::{GrabBinding, GrabEvent, GrabSystem, HandController, InteractableRegistry};
pub use jump::{JumpController, JumpPhase};
pub use locomotion::{LocomotionController, locomotion_step};
pub use session::{FrameReport, RoomSession};
