//! Scene graph: parent-relative transforms, world pose queries, reparenting.
//!
//! # Invariants
//! - A root node always exists and is never removed or reparented.
//! - The parent chain is acyclic; every non-root node has exactly one parent.
//! - Iteration order is deterministic (BTreeMap keyed by `NodeId`).
//! - Every mutation records a `SceneEvent`.

pub mod graph;

pub use graph::{Node, Scene, SceneError, SceneEvent};
