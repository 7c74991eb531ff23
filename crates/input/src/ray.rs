use glam::Vec3;
use gazeland_common::EntityId;
use serde::{Deserialize, Serialize};

/// What the gaze ray reports about the object under it.
///
/// The hit point is in world space. Exit carries no hit point: the ray has
/// already left the object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RayEvent {
    /// The ray started hitting `target`.
    HoverEnter { target: EntityId, hit: Vec3 },
    /// The ray stopped hitting `target`.
    HoverExit { target: EntityId },
    /// A direct pointer or click device activated `target`.
    Click { target: EntityId, hit: Vec3 },
}

impl RayEvent {
    pub fn target(&self) -> EntityId {
        match self {
            Self::HoverEnter { target, .. }
            | Self::HoverExit { target }
            | Self::Click { target, .. } => *target,
        }
    }

    pub fn hit(&self) -> Option<Vec3> {
        match self {
            Self::HoverEnter { hit, .. } | Self::Click { hit, .. } => Some(*hit),
            Self::HoverExit { .. } => None,
        }
    }
}
