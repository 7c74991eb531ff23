//! Shared types for the gazeland crates.

pub mod types;

pub use types::{EntityId, Transform, yaw_of};
