//! Puzzle progress: how many distinct targets have been resolved, and the
//! one-time unlock once all of them are.
//!
//! # Invariants
//! - `0 <= resolved <= total`, and `resolved` never decreases.
//! - The unlock runs exactly once, the first time `resolved` reaches `total`.

use gazeland_common::EntityId;
use gazeland_kernel::SharedScene;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Tracker handle held by targets.
pub type SharedTracker = Rc<RefCell<ProgressTracker>>;

/// Published status after each change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStatus {
    pub resolved: u32,
    pub total: u32,
    pub remaining: u32,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Remaining objects: {}", self.remaining)
    }
}

/// Aggregates resolved targets and unlocks follow-on objects.
///
/// Unlock hooks run while the tracker is mutably borrowed; they must not
/// reach back into the tracker.
pub struct ProgressTracker {
    total: Option<u32>,
    resolved: u32,
    unlocked: bool,
    unlock_objects: Vec<EntityId>,
    scene: Option<SharedScene>,
    unlock_hooks: Vec<Box<dyn FnMut(&ProgressStatus)>>,
    status: ProgressStatus,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            total: None,
            resolved: 0,
            unlocked: false,
            unlock_objects: Vec::new(),
            scene: None,
            unlock_hooks: Vec::new(),
            status: ProgressStatus::default(),
        }
    }

    /// Wrap the tracker in a shareable handle.
    pub fn shared(self) -> SharedTracker {
        Rc::new(RefCell::new(self))
    }

    /// Scene whose objects are shown on unlock.
    pub fn with_scene(mut self, scene: SharedScene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Objects made visible when every target is resolved.
    pub fn with_unlocks(mut self, objects: impl IntoIterator<Item = EntityId>) -> Self {
        self.unlock_objects.extend(objects);
        self
    }

    /// Extra action to run on unlock.
    pub fn on_unlock(&mut self, hook: impl FnMut(&ProgressStatus) + 'static) {
        self.unlock_hooks.push(Box::new(hook));
    }

    /// Set the number of targets. Only the first call counts.
    pub fn register(&mut self, total: u32) {
        if let Some(existing) = self.total {
            tracing::warn!(existing, total, "progress tracker already registered; ignoring");
            return;
        }
        self.total = Some(total);
        self.status = ProgressStatus {
            resolved: self.resolved,
            total,
            remaining: total,
        };
        tracing::debug!(total, "progress tracker registered");
    }

    /// Count one more resolved target and publish the new status.
    pub fn mark_resolved(&mut self) -> ProgressStatus {
        let Some(total) = self.total else {
            tracing::warn!("progress tracker not registered; ignoring resolved target");
            return self.status;
        };
        if self.unlocked {
            return self.status;
        }

        self.resolved = (self.resolved + 1).min(total);
        self.status = ProgressStatus {
            resolved: self.resolved,
            total,
            remaining: total.saturating_sub(self.resolved),
        };
        tracing::info!(resolved = self.resolved, total, "{}", self.status);

        if self.resolved == total {
            self.unlock();
        }
        self.status
    }

    fn unlock(&mut self) {
        self.unlocked = true;
        match &self.scene {
            Some(scene) => {
                let mut scene = scene.borrow_mut();
                for id in &self.unlock_objects {
                    if !scene.set_active(*id, true) {
                        tracing::warn!(%id, "unlock object missing from scene");
                    }
                }
            }
            None if !self.unlock_objects.is_empty() => {
                tracing::warn!("no scene bound to progress tracker; unlock objects stay hidden");
            }
            None => {}
        }
        let status = self.status;
        for hook in &mut self.unlock_hooks {
            hook(&status);
        }
        tracing::info!(objects = self.unlock_objects.len(), "all targets resolved; unlocked");
    }

    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    pub fn resolved(&self) -> u32 {
        self.resolved
    }

    pub fn total(&self) -> Option<u32> {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.status.remaining
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("resolved", &self.resolved)
            .field("unlocked", &self.unlocked)
            .finish()
    }
}

pub fn crate_info() -> &'static str {
    "gazeland-progress v0.1.0"
}
