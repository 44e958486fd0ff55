//! Configuration for a new match.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::objective::StructuredObjective;
use crate::types::{Color, Difficulty};

/// What kind of match this is.
///
/// Free play, lessons and imported positions all run through the same session;
/// the mode only decides how the match is started and whether objectives apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchMode {
    /// Ordinary game from the configured start.
    #[default]
    FreePlay,
    /// Guided lesson with completion objectives.
    Lesson {
        /// All must be met for the lesson to be complete.
        objectives: Vec<StructuredObjective>,
    },
    /// Position supplied from outside, e.g. board recognition.
    Imported,
}

/// Settings a match is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig<P> {
    human_color: Color,
    difficulty: Difficulty,
    starting_position: Option<P>,
    mode: MatchMode,
}

impl<P> SessionConfig<P> {
    /// Free play from the standard start at the default difficulty.
    #[instrument]
    pub fn new(human_color: Color) -> Self {
        Self {
            human_color,
            difficulty: Difficulty::default(),
            starting_position: None,
            mode: MatchMode::FreePlay,
        }
    }

    /// Sets the bot difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Starts from `position` instead of the standard start.
    pub fn with_starting_position(mut self, position: P) -> Self {
        self.starting_position = Some(position);
        self
    }

    /// Sets the match mode.
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Side the human plays.
    pub fn human_color(&self) -> Color {
        self.human_color
    }

    /// Side the bot plays.
    pub fn bot_color(&self) -> Color {
        self.human_color.opponent()
    }

    /// Requested bot strength.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Custom starting position, if any.
    pub fn starting_position(&self) -> Option<&P> {
        self.starting_position.as_ref()
    }

    /// Match mode.
    pub fn mode(&self) -> &MatchMode {
        &self.mode
    }

    /// The parts of this config that outlive the starting position.
    pub fn meta(&self) -> SessionMeta {
        SessionMeta {
            human_color: self.human_color,
            difficulty: self.difficulty,
            mode: self.mode.clone(),
        }
    }
}

/// Stored form of a [`SessionConfig`].
///
/// The starting position is not kept: a restored session takes it from ply 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Side the human plays.
    pub human_color: Color,
    /// Requested bot strength.
    pub difficulty: Difficulty,
    /// Free play, lesson or imported.
    pub mode: MatchMode,
}

impl SessionMeta {
    /// Rebuilds the config a restored session runs with.
    pub fn into_config<P>(self) -> SessionConfig<P> {
        SessionConfig::new(self.human_color)
            .with_difficulty(self.difficulty)
            .with_mode(self.mode)
    }
}
