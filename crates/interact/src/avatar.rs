use gazeland_common::{EntityId, Transform};
use gazeland_kernel::SharedScene;
use glam::{Quat, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

/// Avatar handle held by teleport targets.
pub type SharedAvatar = Rc<RefCell<dyn Avatar>>;

/// The surface of the player body that interaction code may touch.
///
/// `disable` suspends collision and locomotion together; `enable` resumes
/// both. Pose changes made while disabled never collide.
pub trait Avatar {
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
    fn transform(&self) -> Transform;
    /// Put the avatar at `position`, facing `yaw` radians, upright.
    fn set_pose(&mut self, position: Vec3, yaw: f32);
}

/// Default avatar: a character controller mirrored into the scene.
#[derive(Debug)]
pub struct PlayerRig {
    transform: Transform,
    collision_enabled: bool,
    locomotion_enabled: bool,
    free_walk: bool,
    speed: f32,
    scene: Option<(SharedScene, EntityId)>,
}

impl PlayerRig {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            collision_enabled: true,
            locomotion_enabled: true,
            free_walk: true,
            speed: 0.0,
            scene: None,
        }
    }

    /// Mirror pose changes onto scene object `id`.
    pub fn with_scene(mut self, scene: SharedScene, id: EntityId) -> Self {
        self.scene = Some((scene, id));
        self
    }

    pub fn shared(self) -> Rc<RefCell<PlayerRig>> {
        Rc::new(RefCell::new(self))
    }

    pub fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    pub fn locomotion_enabled(&self) -> bool {
        self.locomotion_enabled
    }

    /// Whether look-to-walk movement is allowed. Off in teleport-only mode.
    pub fn free_walk(&self) -> bool {
        self.free_walk
    }

    pub fn set_free_walk(&mut self, free_walk: bool) {
        if self.free_walk != free_walk {
            tracing::debug!(free_walk, "avatar movement mode changed");
        }
        self.free_walk = free_walk;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }
}

impl Avatar for PlayerRig {
    fn enable(&mut self) {
        self.collision_enabled = true;
        self.locomotion_enabled = true;
    }

    fn disable(&mut self) {
        self.collision_enabled = false;
        self.locomotion_enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.collision_enabled && self.locomotion_enabled
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_pose(&mut self, position: Vec3, yaw: f32) {
        self.transform.position = position;
        self.transform.rotation = Quat::from_rotation_y(yaw);
        if let Some((scene, id)) = &self.scene {
            scene.borrow_mut().set_transform(*id, self.transform);
        }
    }
}
