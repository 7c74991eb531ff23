//! Gaze input: hover events produced by the external ray system, and the
//! screen-space pointer events simulated for UI widgets.
//!
//! # Invariants
//! - The ray system delivers at most one active hover at a time.
//! - Interaction code consumes [`RayEvent`]s, never raw head poses.

pub mod pointer;
pub mod ray;

pub use pointer::{PointerEvent, PointerPhase, ScreenProjector};
pub use ray::RayEvent;
