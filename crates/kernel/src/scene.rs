use gazeland_common::{EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Scene handle shared by targets and the progress tracker.
///
/// Updates run on one thread, one frame at a time, so a `RefCell` is enough.
pub type SharedScene = Rc<RefCell<Scene>>;

/// An event record produced by every effective mutation of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// Object was added with the given transform and initial visibility.
    Spawned {
        id: EntityId,
        name: String,
        transform: Transform,
        active: bool,
    },
    /// Object became visible.
    Shown { id: EntityId },
    /// Object was hidden.
    Hidden { id: EntityId },
    /// Object transform changed.
    Moved {
        id: EntityId,
        old: Transform,
        new: Transform,
    },
    /// One frame of the scene completed.
    Stepped { frame: u64 },
}

/// Per-object data stored in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub active: bool,
}

/// The authoritative set of scene objects.
///
/// Interaction code never owns renderable content; it flips visibility and
/// moves transforms here and the host derives everything else from the log.
/// BTreeMap keeps iteration order deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    objects: BTreeMap<EntityId, SceneObject>,
    frame: u64,
    #[serde(skip)]
    event_log: Vec<SceneEvent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the scene in a shareable handle.
    pub fn shared(self) -> SharedScene {
        Rc::new(RefCell::new(self))
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    pub fn objects(&self) -> &BTreeMap<EntityId, SceneObject> {
        &self.objects
    }

    /// Add a named object. Returns its id.
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform, active: bool) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, name, transform, active);
        id
    }

    /// Add an object with a specific id (used for replay).
    pub fn spawn_with_id(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
        transform: Transform,
        active: bool,
    ) {
        let name = name.into();
        tracing::trace!(%id, %name, active, "spawned scene object");
        self.objects.insert(
            id,
            SceneObject {
                name: name.clone(),
                transform,
                active,
            },
        );
        self.event_log.push(SceneEvent::Spawned {
            id,
            name,
            transform,
            active,
        });
    }

    pub fn get(&self, id: EntityId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Whether the object exists and is visible.
    pub fn is_active(&self, id: EntityId) -> bool {
        self.objects.get(&id).is_some_and(|obj| obj.active)
    }

    /// Show or hide an object. Returns false if the object does not exist.
    /// Writing the current value is accepted but not logged.
    pub fn set_active(&mut self, id: EntityId, active: bool) -> bool {
        let Some(obj) = self.objects.get_mut(&id) else {
            return false;
        };
        if obj.active != active {
            obj.active = active;
            self.event_log.push(if active {
                SceneEvent::Shown { id }
            } else {
                SceneEvent::Hidden { id }
            });
        }
        true
    }

    /// Update an object's transform and log the change.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> bool {
        if let Some(obj) = self.objects.get_mut(&id) {
            let old = obj.transform;
            obj.transform = new;
            self.event_log.push(SceneEvent::Moved { id, old, new });
            true
        } else {
            false
        }
    }

    /// Close the current frame.
    ///
    /// Runs of frames with no other change share one `Stepped` record, so an
    /// idle scene does not grow its log.
    pub fn step(&mut self) {
        self.frame += 1;
        match self.event_log.last_mut() {
            Some(SceneEvent::Stepped { frame }) => *frame = self.frame,
            _ => self.event_log.push(SceneEvent::Stepped { frame: self.frame }),
        }
    }

    /// Reconstruct scene state from a sequence of events.
    pub fn replay(events: &[SceneEvent]) -> Self {
        let mut scene = Self::new();
        for event in events {
            match event {
                SceneEvent::Spawned {
                    id,
                    name,
                    transform,
                    active,
                } => {
                    scene.objects.insert(
                        *id,
                        SceneObject {
                            name: name.clone(),
                            transform: *transform,
                            active: *active,
                        },
                    );
                }
                SceneEvent::Shown { id } => {
                    if let Some(obj) = scene.objects.get_mut(id) {
                        obj.active = true;
                    }
                }
                SceneEvent::Hidden { id } => {
                    if let Some(obj) = scene.objects.get_mut(id) {
                        obj.active = false;
                    }
                }
                SceneEvent::Moved { id, new, .. } => {
                    if let Some(obj) = scene.objects.get_mut(id) {
                        obj.transform = *new;
                    }
                }
                SceneEvent::Stepped { frame } => {
                    scene.frame = *frame;
                }
            }
        }
        scene
    }
}
