//! The rules capability consumed by the match session.
//!
//! The session never inspects or mutates a position itself. Everything it needs
//! to know about legality, move application and termination goes through
//! [`RulesEngine`]. [`StandardRules`] adapts the `shakmaty` crate.

mod standard;

pub use standard::{StandardPosition, StandardRules};

use crate::types::{Color, MoveDescriptor, PieceKind, Square};

/// Errors reported by a rules engine.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RulesError {
    /// The move is not legal in the given position.
    #[display("Illegal move {}", _0)]
    IllegalMove(MoveDescriptor),

    /// An encoded position could not be decoded.
    #[display("Invalid position '{}': {}", encoded, reason)]
    InvalidPosition {
        /// The text that failed to decode.
        encoded: String,
        /// Why it failed.
        reason: String,
    },
}

impl std::error::Error for RulesError {}

/// Chess legality, move application and termination checks.
///
/// Positions are opaque to callers: they are produced by [`RulesEngine::standard_start`],
/// [`RulesEngine::decode_position`] or [`RulesEngine::apply_move`] and are only ever
/// inspected through the methods below.
pub trait RulesEngine: std::fmt::Debug + Send + Sync + 'static {
    /// Opaque board state, including side to move.
    type Position: Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static;

    /// The standard starting position.
    fn standard_start(&self) -> Self::Position;

    /// Side whose turn it is.
    fn side_to_move(&self, position: &Self::Position) -> Color;

    /// Whether the side to move is in check.
    fn is_check(&self, position: &Self::Position) -> bool;

    /// Color of the piece on `square`, if any.
    fn piece_color_at(&self, position: &Self::Position, square: Square) -> Option<Color>;

    /// Number of pieces `color` has on the board, king included.
    fn piece_count(&self, position: &Self::Position, color: Color) -> usize;

    /// Applies a move, returning the resulting position.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::IllegalMove`] if the move is not legal, including a
    /// promotion-eligible pawn move submitted without a promotion piece.
    fn apply_move(
        &self,
        position: &Self::Position,
        mv: &MoveDescriptor,
    ) -> Result<Self::Position, RulesError>;

    /// All legal moves for the side to move.
    fn legal_moves(&self, position: &Self::Position) -> Vec<MoveDescriptor>;

    /// Whether the side to move is checkmated.
    fn is_checkmate(&self, position: &Self::Position) -> bool;

    /// Whether the side to move is stalemated.
    fn is_stalemate(&self, position: &Self::Position) -> bool;

    /// Whether the position is drawn by rule.
    fn is_draw(&self, position: &Self::Position) -> bool;

    /// Whether `from -> to` is a legal pawn move onto the last rank that needs a
    /// promotion choice.
    fn is_promotion_move(&self, position: &Self::Position, from: Square, to: Square) -> bool;

    /// Text form of a move for history and the bot wire.
    fn to_notation(&self, mv: &MoveDescriptor) -> String {
        mv.to_string()
    }

    /// Encodes a position as text.
    fn encode_position(&self, position: &Self::Position) -> String;

    /// Decodes a position from text.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidPosition`] if the text is not a valid position.
    fn decode_position(&self, encoded: &str) -> Result<Self::Position, RulesError>;
}

/// Promotion pieces offered to a player, strongest first.
pub const PROMOTION_CHOICES: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];
