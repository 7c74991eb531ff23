use crate::error::InteractError;
use gazeland_common::EntityId;
use gazeland_input::{PointerEvent, PointerPhase, RayEvent, ScreenProjector};
use glam::Vec3;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Something the gaze ray can hover and click.
pub trait GazeInteractive {
    fn id(&self) -> EntityId;
    fn on_hover_enter(&mut self) -> Result<(), InteractError>;
    fn on_hover_exit(&mut self);
    fn on_click(&mut self) -> Result<(), InteractError>;
}

/// Routes ray events to registered targets and synthesizes UI pointer events
/// at the screen projection of the gaze hit point.
pub struct GazeRouter {
    targets: BTreeMap<EntityId, Rc<RefCell<dyn GazeInteractive>>>,
    projector: ScreenProjector,
    focus: Option<EntityId>,
    last_hit: Option<Vec3>,
    outbox: Vec<PointerEvent>,
}

impl GazeRouter {
    pub fn new(projector: ScreenProjector) -> Self {
        Self {
            targets: BTreeMap::new(),
            projector,
            focus: None,
            last_hit: None,
            outbox: Vec::new(),
        }
    }

    pub fn register(&mut self, target: Rc<RefCell<dyn GazeInteractive>>) {
        let id = target.borrow().id();
        self.targets.insert(id, target);
    }

    /// Target currently under the gaze that accepted the hover. A target
    /// whose hover was rejected because another dwell holds the timer is
    /// never focused.
    pub fn focus(&self) -> Option<EntityId> {
        self.focus
    }

    pub fn projector_mut(&mut self) -> &mut ScreenProjector {
        &mut self.projector
    }

    /// Deliver one ray event.
    ///
    /// Focus contention (another target already dwelling) is logged and
    /// absorbed. Binding failures are returned; check
    /// [`InteractError::is_blocking`] to decide whether to stop.
    pub fn handle(&mut self, event: RayEvent) -> Result<(), InteractError> {
        let id = event.target();
        let Some(target) = self.targets.get(&id).cloned() else {
            tracing::debug!(%id, "ray event for unregistered target ignored");
            return Ok(());
        };
        if let Some(hit) = event.hit() {
            self.last_hit = Some(hit);
        }

        let result = match event {
            RayEvent::HoverEnter { .. } => {
                self.push_pointer(PointerPhase::Down, id);
                let entered = target.borrow_mut().on_hover_enter();
                if entered.is_ok() {
                    self.focus = Some(id);
                }
                entered
            }
            RayEvent::HoverExit { .. } => {
                if self.focus == Some(id) {
                    self.focus = None;
                }
                self.push_pointer(PointerPhase::Up, id);
                target.borrow_mut().on_hover_exit();
                Ok(())
            }
            RayEvent::Click { .. } => {
                self.push_pointer(PointerPhase::Click, id);
                target.borrow_mut().on_click()
            }
        };

        match result {
            Err(InteractError::Dwell(err)) => {
                tracing::debug!(%id, %err, "gaze focus held by another dwell");
                Ok(())
            }
            other => other,
        }
    }

    fn push_pointer(&mut self, phase: PointerPhase, target: EntityId) {
        let screen_position = self.last_hit.and_then(|hit| self.projector.project(hit));
        self.outbox.push(PointerEvent {
            phase,
            target,
            screen_position,
        });
    }

    /// Take the pointer events synthesized since the last call.
    pub fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.outbox)
    }
}

impl Default for GazeRouter {
    fn default() -> Self {
        Self::new(ScreenProjector::default())
    }
}
