//! Lesson objectives and their evaluation against a session.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::rules::RulesEngine;
use crate::session::MatchSession;

/// A machine-checkable lesson goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StructuredObjective {
    /// The human has played at least this many moves.
    #[display("Play at least {} moves", _0)]
    MoveCountAtLeast(usize),
    /// The bot has fewer than this many pieces left, king included.
    #[display("Reduce the opponent to fewer than {} pieces", _0)]
    MaterialBelow(usize),
    /// The match has ended by checkmate, stalemate or draw.
    #[display("Finish the game")]
    TerminalReached,
}

/// Outcome of evaluating objectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveProgress {
    /// Objective met.
    Completed,
    /// Objective not met yet.
    InProgress,
}

impl ObjectiveProgress {
    fn from_met(met: bool) -> Self {
        if met { Self::Completed } else { Self::InProgress }
    }
}

/// Evaluates one objective against the session's current state.
#[instrument(skip(session), fields(session_id = %session.id()))]
pub fn evaluate<R: RulesEngine>(
    session: &MatchSession<R>,
    objective: &StructuredObjective,
) -> ObjectiveProgress {
    let met = match objective {
        StructuredObjective::MoveCountAtLeast(n) => session.human_move_count() >= *n,
        StructuredObjective::MaterialBelow(n) => {
            session
                .rules()
                .piece_count(session.current_position(), session.bot_color())
                < *n
        }
        StructuredObjective::TerminalReached => session.status().is_terminal(),
    };
    debug!(met, "Objective evaluated");
    ObjectiveProgress::from_met(met)
}

/// Completed only when the list is non-empty and every objective is met.
pub fn evaluate_all<R: RulesEngine>(
    session: &MatchSession<R>,
    objectives: &[StructuredObjective],
) -> ObjectiveProgress {
    ObjectiveProgress::from_met(
        !objectives.is_empty()
            && objectives
                .iter()
                .all(|o| evaluate(session, o) == ObjectiveProgress::Completed),
    )
}
