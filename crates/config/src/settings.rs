use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Settings record shared between the menu (writer) and the session (reader).
pub type SharedSettings = Rc<RefCell<GameSettings>>;

/// Player-facing options chosen in the start menu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Free-walk speed in metres per second.
    pub player_speed: f32,
    /// Teleport-only movement instead of free walking.
    pub teleportation_activated: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            player_speed: SpeedOption::Medium.speed(),
            teleportation_activated: false,
        }
    }
}

impl GameSettings {
    pub fn shared(self) -> SharedSettings {
        Rc::new(RefCell::new(self))
    }

    /// Apply the movement toggle named `name` ("Free" or "Teleport").
    pub fn select_movement(&mut self, name: &str) -> Result<(), ConfigError> {
        let option = MovementOption::from_name(name).ok_or_else(|| ConfigError::UnknownOption {
            group: "movement",
            name: name.to_string(),
        })?;
        self.teleportation_activated = option == MovementOption::Teleport;
        tracing::debug!(?option, "movement selected");
        Ok(())
    }

    /// Apply the speed toggle named `name` ("Slow", "Medium" or "Fast").
    pub fn select_speed(&mut self, name: &str) -> Result<(), ConfigError> {
        let option = SpeedOption::from_name(name).ok_or_else(|| ConfigError::UnknownOption {
            group: "speed",
            name: name.to_string(),
        })?;
        self.player_speed = option.speed();
        tracing::debug!(?option, speed = self.player_speed, "speed selected");
        Ok(())
    }
}

/// Movement toggle in the start menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementOption {
    Free,
    Teleport,
}

impl MovementOption {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Free" => Some(Self::Free),
            "Teleport" => Some(Self::Teleport),
            _ => None,
        }
    }
}

/// Speed toggle in the start menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedOption {
    Slow,
    Medium,
    Fast,
}

impl SpeedOption {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Slow" => Some(Self::Slow),
            "Medium" => Some(Self::Medium),
            "Fast" => Some(Self::Fast),
            _ => None,
        }
    }

    pub fn speed(self) -> f32 {
        match self {
            Self::Slow => 2.0,
            Self::Medium => 5.0,
            Self::Fast => 10.0,
        }
    }
}
