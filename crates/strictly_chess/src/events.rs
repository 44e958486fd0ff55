//! Notifications emitted to the presentation layer.

use crate::ply::Ply;
use crate::promotion::PendingPromotion;
use crate::session::SessionError;
use crate::types::MatchStatus;

/// Something observable happened to the match.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent<P> {
    /// A new session became current.
    MatchStarted {
        /// Identifier of the new session.
        session_id: String,
    },
    /// A ply was appended.
    MoveApplied(Ply<P>),
    /// The human must pick a promotion piece.
    PromotionRequired(PendingPromotion),
    /// The pending promotion was dropped.
    PromotionCancelled,
    /// History was truncated by undo.
    RolledBack {
        /// Index of the new last ply.
        last_index: usize,
    },
    /// The match status changed.
    StatusChanged(MatchStatus),
    /// The bot started or stopped thinking.
    BotThinking(bool),
    /// Every lesson objective is met.
    LessonCompleted,
    /// A command or bot request failed.
    Error {
        /// Machine-readable kind.
        kind: &'static str,
        /// Human-readable detail.
        detail: String,
    },
}

impl<P> MatchEvent<P> {
    /// Error event for a rejected session command.
    pub fn rejected(err: &SessionError) -> Self {
        Self::Error {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}
