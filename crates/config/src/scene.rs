use crate::{ConfigError, GameSettings};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Dwell durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellConfig {
    /// Select threshold applied while a gaze target is hovered.
    pub select_hover: f32,
    /// Select threshold restored when the hover ends.
    pub select_default: f32,
    /// Teleport threshold.
    pub teleport: f32,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            select_hover: 1.5,
            select_default: 2.5,
            teleport: 2.5,
        }
    }
}

/// A selectable object that reveals `content` when activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeTargetConfig {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    /// Name of the hidden object toggled by this target.
    #[serde(default)]
    pub content: Option<String>,
    /// Whether activating this target counts toward puzzle progress.
    #[serde(default = "default_true")]
    pub counts_toward_progress: bool,
}

/// A one-shot teleport destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeleportTargetConfig {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub yaw_degrees: f32,
}

/// Where the player starts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub position: Vec3,
    pub yaw_degrees: f32,
}

/// One step of a scripted gaze session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Gaze lands on `target`.
    Enter { target: String },
    /// Gaze leaves `target`.
    Exit { target: String },
    /// Direct click on `target`.
    Click { target: String },
    /// Let time pass.
    Wait { seconds: f32 },
}

/// Everything needed to build an interactive scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub dwell: DwellConfig,
    pub settings: GameSettings,
    pub avatar: AvatarConfig,
    pub gaze_targets: Vec<GazeTargetConfig>,
    pub teleport_targets: Vec<TeleportTargetConfig>,
    /// Objects revealed once every counted gaze target is resolved.
    pub unlocks: Vec<String>,
    /// The unlock that solves the puzzle. When set, every unlock becomes a
    /// clickable answer option.
    pub answer: Option<String>,
    pub script: Vec<ScriptStep>,
}

impl SceneConfig {
    /// Read and validate a YAML scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(
            path = %path.display(),
            gaze_targets = config.gaze_targets.len(),
            teleport_targets = config.teleport_targets.len(),
            "scene config loaded"
        );
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Number of gaze targets that count toward progress.
    pub fn counted_targets(&self) -> u32 {
        self.gaze_targets
            .iter()
            .filter(|t| t.counts_toward_progress)
            .count() as u32
    }

    /// Check names are unique and the script only refers to known targets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        let target_names = self
            .gaze_targets
            .iter()
            .map(|t| &t.name)
            .chain(self.teleport_targets.iter().map(|t| &t.name));
        let content_names = self
            .gaze_targets
            .iter()
            .filter_map(|t| t.content.as_ref())
            .chain(self.unlocks.iter());
        for name in target_names.clone().chain(content_names) {
            if !names.insert(name.as_str()) {
                return Err(ConfigError::DuplicateName(name.clone()));
            }
        }

        if let Some(answer) = &self.answer {
            if !self.unlocks.iter().any(|u| answer_matches(answer, u)) {
                return Err(ConfigError::UnknownAnswer(answer.clone()));
            }
        }

        let mut targets: BTreeSet<&str> = target_names.map(String::as_str).collect();
        if self.answer.is_some() {
            targets.extend(self.unlocks.iter().map(String::as_str));
        }
        for (step, entry) in self.script.iter().enumerate() {
            match entry {
                ScriptStep::Enter { target }
                | ScriptStep::Exit { target }
                | ScriptStep::Click { target } => {
                    if !targets.contains(target.as_str()) {
                        return Err(ConfigError::UnknownTarget {
                            step,
                            name: target.clone(),
                        });
                    }
                }
                ScriptStep::Wait { seconds } => {
                    if !seconds.is_finite() || *seconds < 0.0 {
                        return Err(ConfigError::InvalidWait {
                            step,
                            seconds: *seconds,
                        });
                    }
                }
            }
        }

        let dwell = &self.dwell;
        for (field, value) in [
            ("select_hover", dwell.select_hover),
            ("select_default", dwell.select_default),
            ("teleport", dwell.teleport),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold {
                    field,
                    seconds: value,
                });
            }
            if value == 0.0 {
                tracing::warn!(field, "zero dwell threshold completes on the next tick");
            }
        }
        Ok(())
    }
}

/// Case-insensitive comparison of a chosen option against the answer.
pub fn answer_matches(answer: &str, choice: &str) -> bool {
    answer.trim().to_lowercase() == choice.trim().to_lowercase()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DUNGEON: &str = r#"
dwell:
  select_hover: 1.5
  select_default: 2.5
  teleport: 2.0
settings:
  player_speed: 2.0
  teleportation_activated: true
gaze_targets:
  - name: chest
    position: [1.0, 0.0, -3.0]
    content: chest_info
  - name: skull
    position: [-2.0, 1.0, -4.0]
    content: skull_info
  - name: exit_sign
    counts_toward_progress: false
teleport_targets:
  - name: pad_a
    position: [0.0, 0.0, -8.0]
    yaw_degrees: 90.0
unlocks: [option1, option2, option3]
script:
  - action: enter
    target: chest
  - action: wait
    seconds: 2.0
  - action: exit
    target: chest
"#;

    #[test]
    fn parses_full_scene() {
        let config = SceneConfig::from_yaml(DUNGEON).unwrap();
        assert_eq!(config.dwell.teleport, 2.0);
        assert!(config.settings.teleportation_activated);
        assert_eq!(config.gaze_targets.len(), 3);
        assert_eq!(config.gaze_targets[0].position, Vec3::new(1.0, 0.0, -3.0));
        assert_eq!(config.counted_targets(), 2);
        assert_eq!(config.teleport_targets[0].yaw_degrees, 90.0);
        assert_eq!(config.unlocks.len(), 3);
        assert_eq!(config.script[1], ScriptStep::Wait { seconds: 2.0 });
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = SceneConfig::from_yaml("{}").unwrap();
        assert_eq!(config.dwell, DwellConfig::default());
        assert_eq!(config.settings, GameSettings::default());
        assert!(config.gaze_targets.is_empty());
    }

    #[test]
    fn duplicate_names_rejected() {
        let yaml = r#"
gaze_targets:
  - name: chest
teleport_targets:
  - name: chest
"#;
        let err = SceneConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(name) if name == "chest"));
    }

    #[test]
    fn script_must_reference_known_targets() {
        let yaml = r#"
script:
  - action: click
    target: ghost
"#;
        let err = SceneConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTarget { step: 0, .. }));
    }

    #[test]
    fn negative_wait_rejected() {
        let yaml = r#"
script:
  - action: wait
    seconds: -1.0
"#;
        assert!(matches!(
            SceneConfig::from_yaml(yaml),
            Err(ConfigError::InvalidWait { step: 0, .. })
        ));
    }

    #[test]
    fn zero_threshold_is_accepted() {
        let config = SceneConfig::from_yaml("dwell: { teleport: 0.0 }").unwrap();
        assert_eq!(config.dwell.teleport, 0.0);
        assert_eq!(config.dwell.select_hover, 1.5);
    }

    #[test]
    fn negative_threshold_rejected() {
        let err = SceneConfig::from_yaml("dwell: { select_hover: -0.5 }").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidThreshold {
                field: "select_hover",
                ..
            }
        ));
    }

    #[test]
    fn answer_must_name_an_unlock() {
        let yaml = "unlocks: [Baul, Mesa]\nanswer: cofre\n";
        assert!(matches!(
            SceneConfig::from_yaml(yaml),
            Err(ConfigError::UnknownAnswer(a)) if a == "cofre"
        ));
        let config = SceneConfig::from_yaml("unlocks: [Baul, Mesa]\nanswer: baul\n").unwrap();
        assert_eq!(config.answer.as_deref(), Some("baul"));
    }

    #[test]
    fn answer_options_are_script_targets() {
        let yaml = r#"
unlocks: [Baul, Mesa]
answer: Baul
script:
  - action: click
    target: Mesa
"#;
        assert!(SceneConfig::from_yaml(yaml).is_ok());

        let without_answer = "unlocks: [Baul]\nscript:\n  - action: click\n    target: Baul\n";
        assert!(matches!(
            SceneConfig::from_yaml(without_answer),
            Err(ConfigError::UnknownTarget { step: 0, .. })
        ));
    }

    #[test]
    fn answer_comparison_ignores_case() {
        assert!(answer_matches("Baul", "BAUL"));
        assert!(answer_matches("Baul", " baul "));
        assert!(!answer_matches("Baul", "Mesa"));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUNGEON.as_bytes()).unwrap();
        let config = SceneConfig::load(file.path()).unwrap();
        assert_eq!(config.gaze_targets[1].name, "skull");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn yaml_round_trip_preserves_scene() {
        let config = SceneConfig::from_yaml(DUNGEON).unwrap();
        let again = SceneConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(config, again);
    }
}
