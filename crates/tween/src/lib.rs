//! Tweens: animate a numeric node property toward a target over time.
//!
//! # Invariants
//! - Every tween completes at most once, and lands exactly on its target.
//! - Completion is reported as a returned event on the tick it happens,
//!   never through a callback.
//! - A tween writes only its own property; other components of the
//!   transform are left to their owners.

pub mod ease;
pub mod tweener;

pub use ease::Ease;
pub use tweener::{TweenCompleted, TweenError, TweenId, TweenProperty, TweenSpec, Tweener};
