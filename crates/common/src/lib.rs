//! Shared types for the roomscale runtime.
//!
//! # Invariants
//! - `Transform` round-trips through `Mat4` for affine, non-sheared matrices.
//! - `Aabb` always satisfies `min <= max` on every axis.

pub mod types;

pub use types::{Aabb, NodeId, Transform};
