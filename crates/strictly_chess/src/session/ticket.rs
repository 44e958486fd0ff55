//! Tokens identifying an outstanding bot move request.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use crate::types::{Color, Difficulty};

/// Snapshot taken when a bot request is issued.
///
/// The completion of the request carries this ticket back to the session, which
/// applies it only if the session still matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct BotTicket {
    /// Session the request belongs to.
    session_id: String,
    /// Session generation when the request was issued.
    generation: u64,
    /// Side the bot plays.
    bot_color: Color,
    /// Encoded position the bot should move from.
    position: String,
    /// Notation of the last ply, empty at the start.
    last_move: String,
    /// Requested strength.
    difficulty: Difficulty,
    /// Number of plies when the request was issued.
    ply_count: usize,
}

impl BotTicket {
    pub(crate) fn new(
        session_id: String,
        generation: u64,
        bot_color: Color,
        position: String,
        last_move: String,
        difficulty: Difficulty,
        ply_count: usize,
    ) -> Self {
        Self {
            session_id,
            generation,
            bot_color,
            position,
            last_move,
            difficulty,
            ply_count,
        }
    }
}
