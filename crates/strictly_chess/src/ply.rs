//! Plies: the recorded half-moves of a match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Color, MoveDescriptor};

/// One half-move: the position after the move plus what produced it.
///
/// Ply 0 is the starting position and has neither a move nor a mover.
#[derive(Debug, Clone, PartialEq)]
pub struct Ply<P> {
    index: usize,
    resulting_position: P,
    mv: Option<MoveDescriptor>,
    mover: Option<Color>,
    notation: String,
    created_at: DateTime<Utc>,
}

impl<P> Ply<P> {
    /// The initial ply of a match.
    pub fn initial(position: P) -> Self {
        Self {
            index: 0,
            resulting_position: position,
            mv: None,
            mover: None,
            notation: String::new(),
            created_at: Utc::now(),
        }
    }

    /// A ply produced by `mover` playing `mv`.
    pub fn after_move(
        index: usize,
        position: P,
        mv: MoveDescriptor,
        mover: Color,
        notation: String,
    ) -> Self {
        Self {
            index,
            resulting_position: position,
            mv: Some(mv),
            mover: Some(mover),
            notation,
            created_at: Utc::now(),
        }
    }

    /// Position of this ply in the match, 0 for the start.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position after this ply.
    pub fn resulting_position(&self) -> &P {
        &self.resulting_position
    }

    /// The move that produced this ply.
    pub fn mv(&self) -> Option<MoveDescriptor> {
        self.mv
    }

    /// Who played this ply.
    pub fn mover(&self) -> Option<Color> {
        self.mover
    }

    /// Notation of the move, empty for ply 0.
    pub fn notation(&self) -> &str {
        &self.notation
    }

    /// When the ply was recorded.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this ply was played by `color`.
    pub fn was_played_by(&self, color: Color) -> bool {
        self.mover == Some(color)
    }

    /// Converts to the stored form using `encode` for the position.
    pub fn to_stored(&self, encode: impl FnOnce(&P) -> String) -> StoredPly {
        StoredPly {
            index: self.index,
            position: encode(&self.resulting_position),
            mv: self.mv.map(|mv| mv.to_string()),
            mover: self.mover,
            notation: self.notation.clone(),
            created_at: self.created_at,
        }
    }

    /// Rebuilds a ply from its stored form, decoding position and move.
    pub(crate) fn from_parts(
        stored: &StoredPly,
        position: P,
        mv: Option<MoveDescriptor>,
    ) -> Self {
        Self {
            index: stored.index,
            resulting_position: position,
            mv,
            mover: stored.mover,
            notation: stored.notation.clone(),
            created_at: stored.created_at,
        }
    }
}

/// Persistable form of a [`Ply`] with the position encoded as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPly {
    /// Ply index, contiguous from 0.
    pub index: usize,
    /// Encoded resulting position.
    pub position: String,
    /// Long algebraic move, absent for ply 0.
    #[serde(rename = "move")]
    pub mv: Option<String>,
    /// Who moved, absent for ply 0.
    pub mover: Option<Color>,
    /// Display notation.
    pub notation: String,
    /// When the ply was recorded.
    pub created_at: DateTime<Utc>,
}
