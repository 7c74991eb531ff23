use crate::error::InteractError;
use crate::router::GazeInteractive;
use gazeland_common::EntityId;
use gazeland_dwell::{DwellCompletion, DwellMode, DwellTimer, SubscriptionId};
use gazeland_kernel::SharedScene;
use gazeland_progress::SharedTracker;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type SharedGazeTarget = Rc<RefCell<GazeTarget>>;

/// Select threshold while hovered.
pub const HOVER_DWELL: f32 = 1.5;
/// Select threshold restored when the hover ends.
pub const DEFAULT_DWELL: f32 = 2.5;

/// A selectable object that reveals secondary content when activated.
///
/// Two independent pieces of state: `shown` flips on every activation and
/// drives the content's visibility; `contributed` becomes true the first time
/// the content is shown and is what the progress tracker counts.
pub struct GazeTarget {
    id: EntityId,
    name: String,
    dwell: DwellTimer,
    hover_dwell: f32,
    default_dwell: f32,
    shown: bool,
    contributed: bool,
    counts_toward_progress: bool,
    hovered: bool,
    content: Option<EntityId>,
    scene: Option<SharedScene>,
    tracker: Option<SharedTracker>,
    subscription: Option<SubscriptionId>,
}

impl GazeTarget {
    pub fn new(id: EntityId, name: impl Into<String>, dwell: DwellTimer) -> Self {
        Self {
            id,
            name: name.into(),
            dwell,
            hover_dwell: HOVER_DWELL,
            default_dwell: DEFAULT_DWELL,
            shown: false,
            contributed: false,
            counts_toward_progress: true,
            hovered: false,
            content: None,
            scene: None,
            tracker: None,
            subscription: None,
        }
    }

    /// Select thresholds used while hovered and after the hover ends.
    pub fn with_thresholds(mut self, hover: f32, default: f32) -> Self {
        self.hover_dwell = hover;
        self.default_dwell = default;
        self
    }

    /// Scene object shown and hidden by activation.
    pub fn with_content(mut self, scene: SharedScene, content: EntityId) -> Self {
        self.scene = Some(scene);
        self.content = Some(content);
        self
    }

    pub fn with_tracker(mut self, tracker: SharedTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Exclude this target from puzzle progress.
    pub fn uncounted(mut self) -> Self {
        self.counts_toward_progress = false;
        self
    }

    /// Subscribe to selection completions and return the shared handle.
    ///
    /// The handler holds only a weak reference, and it reacts only to dwells
    /// this target claimed.
    pub fn attach(self) -> SharedGazeTarget {
        let id = self.id;
        let dwell = self.dwell.clone();
        let shared = Rc::new(RefCell::new(self));
        let weak: Weak<RefCell<GazeTarget>> = Rc::downgrade(&shared);
        let subscription = dwell.subscribe(DwellMode::Select, move |done: &DwellCompletion| {
            if done.holder != Some(id) {
                return;
            }
            if let Some(target) = weak.upgrade() {
                target.borrow_mut().on_activate();
            }
        });
        shared.borrow_mut().subscription = Some(subscription);
        shared
    }

    /// Gaze arrived: shorten the select dwell and start it.
    pub fn on_hover_enter(&mut self) -> Result<(), InteractError> {
        // Claim first: a rejected hover must not retime the holder's dwell.
        self.dwell.claim(DwellMode::Select, self.id)?;
        self.hovered = true;
        self.dwell.configure(DwellMode::Select, self.hover_dwell);
        tracing::debug!(object = %self.name, "gaze entered");
        Ok(())
    }

    /// Gaze left: cancel our dwell and restore the default threshold, unless
    /// another target's select dwell is running.
    pub fn on_hover_exit(&mut self) {
        self.hovered = false;
        if self.dwell.release(DwellMode::Select, self.id) {
            tracing::debug!(object = %self.name, "gaze left before dwell completed");
        }
        if self.dwell.active_mode() != Some(DwellMode::Select) {
            self.dwell.configure(DwellMode::Select, self.default_dwell);
        }
    }

    /// Dwell completed on this target.
    pub fn on_activate(&mut self) {
        self.shown = !self.shown;
        tracing::debug!(object = %self.name, shown = self.shown, "gaze target toggled");
        self.apply_visibility();
        if self.shown {
            self.contribute();
        }
    }

    /// Direct click: same effect as a completed dwell. Any dwell this target
    /// was running is dropped so the activation is not applied twice.
    pub fn on_click(&mut self) {
        self.dwell.release(DwellMode::Select, self.id);
        self.on_activate();
    }

    fn apply_visibility(&self) {
        match (&self.scene, self.content) {
            (Some(scene), Some(content)) => {
                if !scene.borrow_mut().set_active(content, self.shown) {
                    tracing::warn!(object = %self.name, %content, "content object missing from scene");
                }
            }
            _ => tracing::debug!(object = %self.name, "no content bound; nothing to show"),
        }
    }

    fn contribute(&mut self) {
        if self.contributed || !self.counts_toward_progress {
            return;
        }
        let Some(tracker) = &self.tracker else {
            let err = InteractError::MissingBinding {
                target: self.id,
                binding: "progress tracker",
            };
            tracing::warn!(object = %self.name, %err, "progress not recorded");
            return;
        };
        tracker.borrow_mut().mark_resolved();
        self.contributed = true;
    }

    /// Drop the completion subscription. The target stops reacting to dwells.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.dwell.unsubscribe(DwellMode::Select, subscription);
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the secondary content is currently shown.
    pub fn is_toggled(&self) -> bool {
        self.shown
    }

    /// Whether this target has been counted toward progress.
    pub fn has_contributed(&self) -> bool {
        self.contributed
    }

    /// Whether this target is hovered and its select dwell was accepted.
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }
}

impl GazeInteractive for GazeTarget {
    fn id(&self) -> EntityId {
        self.id
    }

    fn on_hover_enter(&mut self) -> Result<(), InteractError> {
        GazeTarget::on_hover_enter(self)
    }

    fn on_hover_exit(&mut self) {
        GazeTarget::on_hover_exit(self);
    }

    fn on_click(&mut self) -> Result<(), InteractError> {
        GazeTarget::on_click(self);
        Ok(())
    }
}

impl Drop for GazeTarget {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for GazeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GazeTarget")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shown", &self.shown)
            .field("contributed", &self.contributed)
            .field("hovered", &self.hovered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazeland_common::Transform;
    use gazeland_kernel::Scene;
    use gazeland_progress::ProgressTracker;

    struct Rig {
        dwell: DwellTimer,
        scene: SharedScene,
        tracker: SharedTracker,
    }

    fn rig(total: u32) -> Rig {
        let scene = Scene::new().shared();
        let mut tracker = ProgressTracker::new().with_scene(Rc::clone(&scene));
        tracker.register(total);
        Rig {
            dwell: DwellTimer::new(),
            scene,
            tracker: tracker.shared(),
        }
    }

    fn target(rig: &Rig, name: &str) -> (SharedGazeTarget, EntityId) {
        let content = rig
            .scene
            .borrow_mut()
            .spawn(format!("{name}_info"), Transform::default(), false);
        let t = GazeTarget::new(EntityId::new(), name, rig.dwell.clone())
            .with_content(Rc::clone(&rig.scene), content)
            .with_tracker(Rc::clone(&rig.tracker))
            .attach();
        (t, content)
    }

    #[test]
    fn hover_enter_uses_short_dwell() {
        let r = rig(1);
        let (t, content) = target(&r, "chest");
        t.borrow_mut().on_hover_enter().unwrap();
        assert_eq!(r.dwell.threshold(DwellMode::Select), HOVER_DWELL);

        r.dwell.tick(1.0);
        assert!(!t.borrow().is_toggled());
        r.dwell.tick(0.5);
        assert!(t.borrow().is_toggled());
        assert!(r.scene.borrow().is_active(content));
        assert_eq!(r.tracker.borrow().resolved(), 1);
    }

    #[test]
    fn hover_exit_cancels_and_restores_default() {
        let r = rig(1);
        let (t, _) = target(&r, "chest");
        t.borrow_mut().on_hover_enter().unwrap();
        r.dwell.tick(1.0);
        t.borrow_mut().on_hover_exit();

        assert!(!r.dwell.indicator_visible());
        assert_eq!(r.dwell.threshold(DwellMode::Select), DEFAULT_DWELL);
        for _ in 0..5 {
            r.dwell.tick(1.0);
        }
        assert!(!t.borrow().is_toggled());
        assert_eq!(r.tracker.borrow().resolved(), 0);
    }

    #[test]
    fn toggle_is_reversible_but_progress_is_not() {
        let r = rig(2);
        let (t, content) = target(&r, "skull");

        t.borrow_mut().on_click();
        assert!(t.borrow().is_toggled());
        t.borrow_mut().on_click();
        assert!(!t.borrow().is_toggled());
        assert!(!r.scene.borrow().is_active(content));
        t.borrow_mut().on_click();

        assert!(t.borrow().has_contributed());
        assert_eq!(r.tracker.borrow().resolved(), 1);
    }

    #[test]
    fn only_the_holder_reacts_to_completion() {
        let r = rig(2);
        let (a, _) = target(&r, "a");
        let (b, _) = target(&r, "b");

        a.borrow_mut().on_hover_enter().unwrap();
        // b cannot steal a's dwell.
        assert!(b.borrow_mut().on_hover_enter().is_err());
        assert!(a.borrow().is_hovered());
        assert!(!b.borrow().is_hovered());
        b.borrow_mut().on_hover_exit();
        assert_eq!(r.dwell.holder(), Some(a.borrow().id()));

        r.dwell.tick(2.0);
        assert!(a.borrow().is_toggled());
        assert!(!b.borrow().is_toggled());
    }

    #[test]
    fn click_drops_running_dwell() {
        let r = rig(1);
        let (t, _) = target(&r, "lever");
        t.borrow_mut().on_hover_enter().unwrap();
        r.dwell.tick(1.0);
        t.borrow_mut().on_click();
        r.dwell.tick(5.0);
        assert!(t.borrow().is_toggled());
    }

    #[test]
    fn missing_tracker_still_toggles() {
        let dwell = DwellTimer::new();
        let t = GazeTarget::new(EntityId::new(), "loose", dwell.clone()).attach();
        t.borrow_mut().on_click();
        assert!(t.borrow().is_toggled());
        assert!(!t.borrow().has_contributed());
    }

    #[test]
    fn uncounted_target_never_reports() {
        let r = rig(1);
        let t = GazeTarget::new(EntityId::new(), "sign", r.dwell.clone())
            .with_tracker(Rc::clone(&r.tracker))
            .uncounted()
            .attach();
        t.borrow_mut().on_click();
        assert_eq!(r.tracker.borrow().resolved(), 0);
    }

    #[test]
    fn dropping_target_unsubscribes() {
        let r = rig(1);
        let (t, _) = target(&r, "temp");
        assert_eq!(r.dwell.completions(DwellMode::Select).len(), 1);
        drop(t);
        assert!(r.dwell.completions(DwellMode::Select).is_empty());
    }

    #[test]
    fn completion_and_progress_happen_in_same_tick() {
        let r = rig(3);
        let names = ["t1", "t2", "t3"];
        let targets: Vec<_> = names.iter().map(|n| target(&r, n).0).collect();
        let mut remaining = Vec::new();
        for t in &targets {
            t.borrow_mut().on_hover_enter().unwrap();
            r.dwell.tick(HOVER_DWELL);
            remaining.push(r.tracker.borrow().remaining());
            t.borrow_mut().on_hover_exit();
        }
        assert_eq!(remaining, vec![2, 1, 0]);
        assert!(r.tracker.borrow().is_unlocked());
    }
}
