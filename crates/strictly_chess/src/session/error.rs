//! Rejections returned synchronously by session commands.

use crate::promotion::PendingPromotion;
use crate::rules::RulesError;
use crate::types::{Color, MatchStatus, MoveDescriptor, PieceKind};

/// Why a session command was rejected. A rejected command never mutates the session.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// The rules engine refused the move.
    #[display("Illegal move {}", _0)]
    IllegalMove(MoveDescriptor),

    /// The human has no move left to take back.
    #[display("Nothing to undo")]
    NothingToUndo,

    /// A promotion choice arrived with no promotion outstanding.
    #[display("No promotion is pending")]
    NoPendingPromotion,

    /// A promotion choice is still outstanding.
    #[display("Promotion {}{} is awaiting a piece choice", _0.from, _0.to)]
    PromotionPending(PendingPromotion),

    /// The piece cannot be promoted to.
    #[display("Cannot promote to {}", _0)]
    InvalidPromotionPiece(PieceKind),

    /// The match has already ended.
    #[display("Match is over ({})", _0)]
    MatchOver(MatchStatus),

    /// A bot move request is outstanding.
    #[display("Waiting for the bot to move")]
    BotThinking,

    /// It is the other side's turn.
    #[display("It's not your turn ({} to move)", _0)]
    NotYourTurn(Color),

    /// A bot request was made while the human is to move.
    #[display("It's not the bot's turn")]
    NotBotsTurn,

    /// A bot completion no longer matches the session.
    #[display("Bot response is stale")]
    StaleTicket,

    /// Stored history could not be turned back into a session.
    #[display("Cannot restore session: {}", _0)]
    InvalidHistory(String),

    /// Any other rules engine failure.
    #[display("Rules engine error: {}", _0)]
    Rules(RulesError),
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Short machine-readable name for event streams.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IllegalMove(_) => "illegal_move",
            Self::NothingToUndo => "nothing_to_undo",
            Self::NoPendingPromotion => "no_pending_promotion",
            Self::PromotionPending(_) => "promotion_pending",
            Self::InvalidPromotionPiece(_) => "invalid_promotion_piece",
            Self::MatchOver(_) => "match_over",
            Self::BotThinking => "bot_thinking",
            Self::NotYourTurn(_) => "not_your_turn",
            Self::NotBotsTurn => "not_bots_turn",
            Self::StaleTicket => "stale_ticket",
            Self::InvalidHistory(_) => "invalid_history",
            Self::Rules(_) => "rules",
        }
    }
}

impl From<RulesError> for SessionError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::IllegalMove(mv) => Self::IllegalMove(mv),
            other => Self::Rules(other),
        }
    }
}
