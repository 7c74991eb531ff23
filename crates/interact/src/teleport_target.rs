use crate::avatar::SharedAvatar;
use crate::error::InteractError;
use crate::router::GazeInteractive;
use gazeland_common::{EntityId, Transform};
use gazeland_dwell::{Channel, DwellCompletion, DwellMode, DwellTimer, SubscriptionId};
use gazeland_kernel::SharedScene;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type SharedTeleportTarget = Rc<RefCell<TeleportTarget>>;

/// Hover feedback emitted regardless of how the dwell ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverNotice {
    Entered(EntityId),
    Exited(EntityId),
}

/// One-shot teleport destination.
///
/// Hovering runs a teleport dwell; completing it moves the avatar here and
/// consumes the target for good.
pub struct TeleportTarget {
    id: EntityId,
    name: String,
    transform: Transform,
    dwell: DwellTimer,
    threshold: f32,
    avatar: Option<SharedAvatar>,
    scene: Option<SharedScene>,
    available: bool,
    consumed: bool,
    fault: Option<InteractError>,
    notices: Channel<HoverNotice>,
    subscription: Option<SubscriptionId>,
}

impl TeleportTarget {
    pub fn new(id: EntityId, name: impl Into<String>, transform: Transform, dwell: DwellTimer) -> Self {
        let threshold = dwell.threshold(DwellMode::Teleport);
        Self {
            id,
            name: name.into(),
            transform,
            dwell,
            threshold,
            avatar: None,
            scene: None,
            available: true,
            consumed: false,
            fault: None,
            notices: Channel::new(),
            subscription: None,
        }
    }

    pub fn with_threshold(mut self, seconds: f32) -> Self {
        self.threshold = seconds;
        self
    }

    pub fn with_avatar(mut self, avatar: SharedAvatar) -> Self {
        self.avatar = Some(avatar);
        self
    }

    /// Scene holding this target's own object, hidden once consumed.
    pub fn with_scene(mut self, scene: SharedScene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Subscribe to teleport completions and return the shared handle.
    pub fn attach(self) -> SharedTeleportTarget {
        let id = self.id;
        let dwell = self.dwell.clone();
        let shared = Rc::new(RefCell::new(self));
        let weak: Weak<RefCell<TeleportTarget>> = Rc::downgrade(&shared);
        let subscription = dwell.subscribe(DwellMode::Teleport, move |done: &DwellCompletion| {
            if done.holder != Some(id) {
                return;
            }
            if let Some(target) = weak.upgrade() {
                // Failure is recorded on the target and logged there.
                let _ = target.borrow_mut().on_activate();
            }
        });
        shared.borrow_mut().subscription = Some(subscription);
        shared
    }

    /// Entered/exited notices. Handlers run while the target is borrowed and
    /// must not reach back into it.
    pub fn notices(&self) -> &Channel<HoverNotice> {
        &self.notices
    }

    fn reachable(&self) -> bool {
        self.available && !self.consumed
    }

    pub fn on_hover_enter(&mut self) -> Result<(), InteractError> {
        if !self.reachable() {
            return Ok(());
        }
        self.notices.emit(&HoverNotice::Entered(self.id));
        self.dwell.claim(DwellMode::Teleport, self.id)?;
        self.dwell.configure(DwellMode::Teleport, self.threshold);
        tracing::debug!(object = %self.name, "teleport gaze entered");
        Ok(())
    }

    pub fn on_hover_exit(&mut self) {
        if !self.reachable() {
            return;
        }
        self.notices.emit(&HoverNotice::Exited(self.id));
        if self.dwell.release(DwellMode::Teleport, self.id) {
            tracing::debug!(object = %self.name, "teleport gaze left before dwell completed");
        }
    }

    /// Move the avatar here and consume the target.
    ///
    /// Returns `Ok(false)` if the target was already consumed. A missing
    /// avatar is a blocking fault: nothing moves, the target stays live and
    /// the error is kept in [`fault`](Self::fault).
    pub fn on_activate(&mut self) -> Result<bool, InteractError> {
        if self.consumed {
            tracing::debug!(object = %self.name, "teleport target already consumed");
            return Ok(false);
        }
        let Some(avatar) = &self.avatar else {
            let err = InteractError::MissingBinding {
                target: self.id,
                binding: "avatar",
            };
            tracing::error!(object = %self.name, %err, "cannot teleport");
            self.fault = Some(err.clone());
            return Err(err);
        };

        let yaw = self.transform.yaw();
        {
            let mut avatar = avatar.borrow_mut();
            let resume = avatar.is_enabled();
            avatar.disable();
            avatar.set_pose(self.transform.position, yaw);
            if resume {
                avatar.enable();
            }
        }
        tracing::info!(object = %self.name, position = ?self.transform.position, yaw, "teleported");

        self.consumed = true;
        self.fault = None;
        self.detach();
        if let Some(scene) = &self.scene {
            scene.borrow_mut().set_active(self.id, false);
        }
        Ok(true)
    }

    /// Gate the target on the teleport setting. Leaving the available state
    /// drops any dwell this target holds.
    pub fn set_available(&mut self, available: bool) {
        if self.available == available {
            return;
        }
        self.available = available;
        if !available {
            self.dwell.release(DwellMode::Teleport, self.id);
        }
        if !self.consumed {
            if let Some(scene) = &self.scene {
                scene.borrow_mut().set_active(self.id, available);
            }
        }
    }

    fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.dwell.unsubscribe(DwellMode::Teleport, subscription);
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// The blocking fault from the last failed activation, if any.
    pub fn fault(&self) -> Option<&InteractError> {
        self.fault.as_ref()
    }
}

impl GazeInteractive for TeleportTarget {
    fn id(&self) -> EntityId {
        self.id
    }

    fn on_hover_enter(&mut self) -> Result<(), InteractError> {
        TeleportTarget::on_hover_enter(self)
    }

    fn on_hover_exit(&mut self) {
        TeleportTarget::on_hover_exit(self);
    }

    fn on_click(&mut self) -> Result<(), InteractError> {
        if !self.reachable() {
            return Ok(());
        }
        self.dwell.release(DwellMode::Teleport, self.id);
        self.on_activate().map(|_| ())
    }
}

impl Drop for TeleportTarget {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for TeleportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeleportTarget")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("available", &self.available)
            .field("consumed", &self.consumed)
            .finish()
    }
}
