use crate::error::InteractError;
use crate::router::GazeInteractive;
use gazeland_common::EntityId;
use gazeland_config::answer_matches;
use gazeland_dwell::Channel;
use gazeland_kernel::SharedScene;
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedAnswerOption = Rc<RefCell<AnswerOption>>;

/// Outcome of picking an answer option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerStatus {
    Won { answer: String },
    KeepTrying,
}

impl std::fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Won { answer } => write!(f, "You won! The answer was: {answer}"),
            Self::KeepTrying => f.write_str("Keep trying!"),
        }
    }
}

/// One of the follow-on objects revealed by the progress unlock. Clicking it
/// submits its name as the puzzle answer.
///
/// The option is inert while its scene object is hidden.
pub struct AnswerOption {
    id: EntityId,
    name: String,
    answer: String,
    scene: SharedScene,
    verdicts: Channel<AnswerStatus>,
}

impl AnswerOption {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        answer: impl Into<String>,
        scene: SharedScene,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            answer: answer.into(),
            scene,
            verdicts: Channel::new(),
        }
    }

    pub fn shared(self) -> SharedAnswerOption {
        Rc::new(RefCell::new(self))
    }

    /// Status published on every accepted choice.
    pub fn verdicts(&self) -> &Channel<AnswerStatus> {
        &self.verdicts
    }

    /// Submit this option. Returns `None` while it is still locked.
    pub fn choose(&mut self) -> Option<AnswerStatus> {
        if !self.is_unlocked() {
            tracing::debug!(object = %self.name, "answer option still locked");
            return None;
        }
        let status = if answer_matches(&self.answer, &self.name) {
            AnswerStatus::Won {
                answer: self.name.clone(),
            }
        } else {
            AnswerStatus::KeepTrying
        };
        tracing::info!(object = %self.name, %status, "answer chosen");
        self.verdicts.emit(&status);
        Some(status)
    }

    pub fn is_unlocked(&self) -> bool {
        self.scene.borrow().is_active(self.id)
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl GazeInteractive for AnswerOption {
    fn id(&self) -> EntityId {
        self.id
    }

    fn on_hover_enter(&mut self) -> Result<(), InteractError> {
        Ok(())
    }

    fn on_hover_exit(&mut self) {}

    fn on_click(&mut self) -> Result<(), InteractError> {
        self.choose();
        Ok(())
    }
}

impl std::fmt::Debug for AnswerOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerOption")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazeland_common::Transform;
    use gazeland_kernel::Scene;

    fn option(scene: &SharedScene, name: &str, visible: bool) -> AnswerOption {
        let id = scene
            .borrow_mut()
            .spawn(name, Transform::default(), visible);
        AnswerOption::new(id, name, "Baul", Rc::clone(scene))
    }

    #[test]
    fn locked_option_does_nothing() {
        let scene = Scene::new().shared();
        let mut baul = option(&scene, "Baul", false);
        assert_eq!(baul.choose(), None);
    }

    #[test]
    fn right_and_wrong_choices() {
        let scene = Scene::new().shared();
        let mut baul = option(&scene, "baul", true);
        let mut mesa = option(&scene, "Mesa", true);

        assert_eq!(mesa.choose(), Some(AnswerStatus::KeepTrying));
        let won = baul.choose().unwrap();
        assert_eq!(
            won,
            AnswerStatus::Won {
                answer: "baul".into()
            }
        );
        assert_eq!(won.to_string(), "You won! The answer was: baul");
    }

    #[test]
    fn click_publishes_verdict() {
        let scene = Scene::new().shared();
        let mut mesa = option(&scene, "Mesa", true);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        mesa.verdicts()
            .subscribe(move |v: &AnswerStatus| s.borrow_mut().push(v.clone()));

        GazeInteractive::on_click(&mut mesa).unwrap();
        assert_eq!(*seen.borrow(), vec![AnswerStatus::KeepTrying]);
    }
}
