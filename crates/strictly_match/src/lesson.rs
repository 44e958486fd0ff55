//! Lesson plans: a starting position plus objectives, loaded from TOML.

use std::path::Path;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strictly_chess::{
    Color, Difficulty, MatchMode, RulesEngine, SessionConfig, StructuredObjective,
};
use tracing::{debug, info, instrument};

use crate::config::ConfigError;

/// A guided lesson.
///
/// ```toml
/// title = "Back-rank basics"
/// starting_fen = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1"
///
/// [[objectives]]
/// kind = "terminal_reached"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct LessonPlan {
    /// Short title shown to the player.
    title: String,
    /// Longer explanation.
    #[serde(default)]
    description: String,
    /// Starting position; the standard start when absent.
    #[serde(default)]
    starting_fen: Option<String>,
    /// Side the human plays.
    #[serde(default = "default_lesson_color")]
    human_color: Color,
    /// Bot strength.
    #[serde(default)]
    difficulty: Difficulty,
    /// Goals that complete the lesson.
    #[serde(default)]
    objectives: Vec<StructuredObjective>,
}

fn default_lesson_color() -> Color {
    Color::White
}

impl LessonPlan {
    /// Loads a lesson from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read lesson file: {}", e)))?;
        let plan = Self::from_toml(&content)?;
        info!(title = %plan.title, objectives = plan.objectives.len(), "Lesson loaded");
        Ok(plan)
    }

    /// Parses a lesson from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not a valid lesson.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse lesson: {}", e)))
    }

    /// Session settings for this lesson under `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the starting position does not decode.
    #[instrument(skip(self, rules), fields(title = %self.title))]
    pub fn session_config<R: RulesEngine>(
        &self,
        rules: &R,
    ) -> Result<SessionConfig<R::Position>, ConfigError> {
        let mut config = SessionConfig::new(self.human_color)
            .with_difficulty(self.difficulty)
            .with_mode(MatchMode::Lesson {
                objectives: self.objectives.clone(),
            });
        if let Some(fen) = &self.starting_fen {
            let start = rules
                .decode_position(fen)
                .map_err(|e| ConfigError::new(format!("Invalid lesson position: {}", e)))?;
            config = config.with_starting_position(start);
        }
        debug!("Lesson session config built");
        Ok(config)
    }
}
