//! Scene Kernel: authoritative object state shared by the interaction layer.
//!
//! # Invariants
//! - All visibility and transform changes flow through explicit operations.
//! - Every effective change is appended to the event log; no-op writes are not.

pub mod scene;

pub use scene::{Scene, SceneEvent, SceneObject, SharedScene};
