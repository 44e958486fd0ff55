//! Core domain vocabulary for a chess match.
//!
//! These types are shared by the rules capability, the match session and the
//! outer runtime. They carry no board state; positions belong to the rules engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Side of the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Color {
    /// White moves first from the standard start.
    White,
    /// Black.
    Black,
}

impl Color {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Single-letter form used in compact displays (`w` / `b`).
    pub fn letter(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

/// Kind of chess piece.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PieceKind {
    /// Pawn.
    Pawn,
    /// Knight.
    Knight,
    /// Bishop.
    Bishop,
    /// Rook.
    Rook,
    /// Queen.
    Queen,
    /// King.
    King,
}

impl PieceKind {
    /// Lowercase letter used in long algebraic promotion suffixes.
    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Parses a piece letter, either case.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Whether a pawn may promote to this kind.
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }
}

/// Error parsing squares and moves from text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum NotationError {
    /// Not a square in `a1`..`h8`.
    #[display("Invalid square '{}'", _0)]
    InvalidSquare(String),

    /// Not a long algebraic move such as `e2e4` or `e7e8q`.
    #[display("Invalid move notation '{}'", _0)]
    InvalidMove(String),

    /// Promotion suffix names a piece a pawn cannot become.
    #[display("Invalid promotion piece '{}'", _0)]
    InvalidPromotion(char),
}

impl std::error::Error for NotationError {}

/// A board square, file `a`..`h` and rank `1`..`8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Creates a square from zero-based file and rank. Returns `None` off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// Zero-based file (0 = `a`).
    pub fn file(self) -> u8 {
        self.file
    }

    /// Zero-based rank (0 = rank 1).
    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Whether this square is the last rank for a pawn of `color`.
    pub fn is_promotion_rank_for(self, color: Color) -> bool {
        match color {
            Color::White => self.rank == 7,
            Color::Black => self.rank == 0,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(NotationError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| NotationError::InvalidSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = NotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// A move as the core sees it: origin, destination and an optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveDescriptor {
    /// Origin square.
    pub from: Square,
    /// Destination square. For castling this is the king's destination.
    pub to: Square,
    /// Piece chosen for a pawn reaching the last rank.
    pub promotion: Option<PieceKind>,
}

impl MoveDescriptor {
    /// Creates a non-promoting move.
    #[instrument]
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a move with a promotion choice.
    #[instrument]
    pub fn with_promotion(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(piece),
        }
    }
}

impl fmt::Display for MoveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for MoveDescriptor {
    type Err = NotationError;

    /// Parses long algebraic notation: `e2e4`, `e7e8q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if !text.is_ascii() || !(text.len() == 4 || text.len() == 5) {
            return Err(NotationError::InvalidMove(s.to_string()));
        }
        let from: Square = text[0..2]
            .parse()
            .map_err(|_| NotationError::InvalidMove(s.to_string()))?;
        let to: Square = text[2..4]
            .parse()
            .map_err(|_| NotationError::InvalidMove(s.to_string()))?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => {
                let piece = PieceKind::from_char(c)
                    .filter(|p| p.is_promotion_target())
                    .ok_or(NotationError::InvalidPromotion(c))?;
                Some(piece)
            }
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// Strength requested from the remote move service.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// Weakest setting.
    Easy,
    /// Default setting.
    #[default]
    Medium,
    /// Strongest setting.
    Hard,
}

/// Status of a match, derived from the latest position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
    /// Moves can still be played.
    Active,
    /// The side to move is checkmated.
    Checkmate,
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Drawn by rule (insufficient material, fifty-move clock).
    Draw,
}

impl MatchStatus {
    /// Whether the match has ended.
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_text_form() {
        let square: Square = "e4".parse().unwrap();
        assert_eq!(square.file(), 4);
        assert_eq!(square.rank(), 3);
        assert_eq!(square.to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("e".parse::<Square>().is_err());
    }

    #[test]
    fn test_move_with_promotion_suffix() {
        let mv: MoveDescriptor = "e7e8q".parse().unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
    }

    #[test]
    fn test_move_rejects_king_promotion() {
        let result = "e7e8k".parse::<MoveDescriptor>();
        assert_eq!(result, Err(NotationError::InvalidPromotion('k')));
    }

    #[test]
    fn test_promotion_rank_depends_on_color() {
        let e8: Square = "e8".parse().unwrap();
        let e1: Square = "e1".parse().unwrap();
        assert!(e8.is_promotion_rank_for(Color::White));
        assert!(!e8.is_promotion_rank_for(Color::Black));
        assert!(e1.is_promotion_rank_for(Color::Black));
    }

    #[test]
    fn test_difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(Difficulty::default().to_string(), "medium");
    }
}
