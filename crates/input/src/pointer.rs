use glam::{Mat4, Quat, Vec2, Vec3};
use gazeland_common::EntityId;
use serde::{Deserialize, Serialize};

/// Phase of a simulated UI pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Up,
    Click,
}

/// A pointer event synthesized from gaze so that UI widgets react as if a
/// mouse had been used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub target: EntityId,
    /// Pixel position, origin bottom-left. `None` when the hit point is
    /// behind the camera or unknown.
    pub screen_position: Option<Vec2>,
}

/// Projects world-space hit points into viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProjector {
    view_proj: Mat4,
    viewport: Vec2,
    fov_y: f32,
}

impl ScreenProjector {
    /// Perspective camera at `eye` looking at `target`, Y up.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y: f32, viewport: Vec2) -> Self {
        let mut projector = Self {
            view_proj: Mat4::IDENTITY,
            viewport,
            fov_y,
        };
        projector.view_proj = projector.view_proj_for(eye, target);
        projector
    }

    /// Re-aim the camera at a head pose: `eye`, facing `yaw` radians around +Y.
    pub fn aim(&mut self, eye: Vec3, yaw: f32) {
        let forward = Quat::from_rotation_y(yaw) * Vec3::NEG_Z;
        self.view_proj = self.view_proj_for(eye, eye + forward);
    }

    fn view_proj_for(&self, eye: Vec3, target: Vec3) -> Mat4 {
        let aspect = if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        };
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, 0.05, 1000.0);
        proj * view
    }

    /// Pixel position of `world`, or `None` if it is behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.viewport.x,
            (ndc.y * 0.5 + 0.5) * self.viewport.y,
        ))
    }
}

impl Default for ScreenProjector {
    fn default() -> Self {
        Self::look_at(
            Vec3::ZERO,
            Vec3::NEG_Z,
            60f32.to_radians(),
            Vec2::new(1920.0, 1080.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ahead_projects_to_center() {
        let projector = ScreenProjector::default();
        let p = projector.project(Vec3::new(0.0, 0.0, -5.0)).unwrap();
        assert!((p - Vec2::new(960.0, 540.0)).length() < 1e-2);
    }

    #[test]
    fn point_behind_camera_is_none() {
        let projector = ScreenProjector::default();
        assert!(projector.project(Vec3::new(0.0, 0.0, 5.0)).is_none());
    }

    #[test]
    fn right_and_up_map_to_larger_pixels() {
        let projector = ScreenProjector::default();
        let p = projector.project(Vec3::new(1.0, 1.0, -5.0)).unwrap();
        assert!(p.x > 960.0);
        assert!(p.y > 540.0);
    }

    #[test]
    fn aim_turns_the_view() {
        let mut projector = ScreenProjector::default();
        projector.aim(Vec3::new(0.0, 0.0, -10.0), std::f32::consts::PI);
        // Facing +Z from z = -10: the origin is ahead, and +X is on the left.
        let center = projector.project(Vec3::ZERO).unwrap();
        assert!((center - Vec2::new(960.0, 540.0)).length() < 1e-2);
        let p = projector.project(Vec3::new(1.0, 0.0, -3.0)).unwrap();
        assert!(p.x < 960.0);
        assert!(projector.project(Vec3::new(0.0, 0.0, -20.0)).is_none());
    }
}
