//! Standard chess rules backed by `shakmaty`.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Rank, Role};
use std::fmt;
use tracing::{debug, instrument};

use super::{RulesEngine, RulesError};
use crate::types::{Color, MoveDescriptor, PieceKind, Square};

/// A standard chess position.
///
/// Equality compares the full FEN, so two positions are equal when board,
/// side to move, castling rights, en passant square and clocks agree.
#[derive(Debug, Clone)]
pub struct StandardPosition {
    chess: Chess,
}

impl StandardPosition {
    /// FEN text for this position.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.chess, EnPassantMode::Legal).to_string()
    }
}

impl PartialEq for StandardPosition {
    fn eq(&self, other: &Self) -> bool {
        self.fen() == other.fen()
    }
}

impl fmt::Display for StandardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen())
    }
}

/// Orthodox chess rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    /// Creates the rules engine.
    #[instrument]
    pub fn new() -> Self {
        Self
    }

    /// Finds the legal `shakmaty` move matching a descriptor.
    fn find_move(&self, chess: &Chess, mv: &MoveDescriptor) -> Option<Move> {
        let from = to_shakmaty_square(mv.from);
        let to = to_shakmaty_square(mv.to);
        let promotion = mv.promotion.map(to_role);
        chess
            .legal_moves()
            .into_iter()
            .find(|m| endpoints(m) == Some((from, to)) && m.promotion() == promotion)
    }
}

impl RulesEngine for StandardRules {
    type Position = StandardPosition;

    fn standard_start(&self) -> StandardPosition {
        StandardPosition {
            chess: Chess::default(),
        }
    }

    fn side_to_move(&self, position: &StandardPosition) -> Color {
        from_shakmaty_color(position.chess.turn())
    }

    fn is_check(&self, position: &StandardPosition) -> bool {
        position.chess.is_check()
    }

    fn piece_color_at(&self, position: &StandardPosition, square: Square) -> Option<Color> {
        position
            .chess
            .board()
            .piece_at(to_shakmaty_square(square))
            .map(|piece| from_shakmaty_color(piece.color))
    }

    fn piece_count(&self, position: &StandardPosition, color: Color) -> usize {
        position
            .chess
            .board()
            .by_color(to_shakmaty_color(color))
            .count()
    }

    #[instrument(skip(self, position), fields(mv = %mv))]
    fn apply_move(
        &self,
        position: &StandardPosition,
        mv: &MoveDescriptor,
    ) -> Result<StandardPosition, RulesError> {
        let Some(found) = self.find_move(&position.chess, mv) else {
            debug!("No legal move matches descriptor");
            return Err(RulesError::IllegalMove(*mv));
        };
        let chess = position
            .chess
            .clone()
            .play(found)
            .map_err(|_| RulesError::IllegalMove(*mv))?;
        Ok(StandardPosition { chess })
    }

    fn legal_moves(&self, position: &StandardPosition) -> Vec<MoveDescriptor> {
        position
            .chess
            .legal_moves()
            .iter()
            .filter_map(|m| {
                let (from, to) = endpoints(m)?;
                Some(MoveDescriptor {
                    from: from_shakmaty_square(from)?,
                    to: from_shakmaty_square(to)?,
                    promotion: m.promotion().map(from_role),
                })
            })
            .collect()
    }

    fn is_checkmate(&self, position: &StandardPosition) -> bool {
        position.chess.is_checkmate()
    }

    fn is_stalemate(&self, position: &StandardPosition) -> bool {
        position.chess.is_stalemate()
    }

    fn is_draw(&self, position: &StandardPosition) -> bool {
        position.chess.is_insufficient_material() || position.chess.halfmoves() >= 100
    }

    fn is_promotion_move(&self, position: &StandardPosition, from: Square, to: Square) -> bool {
        let from = to_shakmaty_square(from);
        let to = to_shakmaty_square(to);
        position
            .chess
            .legal_moves()
            .iter()
            .any(|m| endpoints(m) == Some((from, to)) && m.promotion().is_some())
    }

    fn encode_position(&self, position: &StandardPosition) -> String {
        position.fen()
    }

    #[instrument(skip(self))]
    fn decode_position(&self, encoded: &str) -> Result<StandardPosition, RulesError> {
        let invalid = |reason: String| RulesError::InvalidPosition {
            encoded: encoded.to_string(),
            reason,
        };
        let fen: Fen = encoded.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
        let chess: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{}", e)))?;
        Ok(StandardPosition { chess })
    }
}

/// Origin and destination of a move as a player drags it.
///
/// Castling is reported as the king's two-square step rather than the
/// king-takes-rook form `shakmaty` uses internally.
fn endpoints(m: &Move) -> Option<(shakmaty::Square, shakmaty::Square)> {
    match m {
        Move::Normal { from, to, .. } => Some((*from, *to)),
        Move::EnPassant { from, to } => Some((*from, *to)),
        Move::Castle { king, rook } => {
            let file = if rook.file().char() > king.file().char() {
                File::G
            } else {
                File::C
            };
            Some((*king, shakmaty::Square::from_coords(file, king.rank())))
        }
        Move::Put { .. } => None,
    }
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(square.file())),
        Rank::new(u32::from(square.rank())),
    )
}

fn from_shakmaty_square(square: shakmaty::Square) -> Option<Square> {
    let file = (square.file().char() as u8).checked_sub(b'a')?;
    let rank = (square.rank().char() as u8).checked_sub(b'1')?;
    Square::new(file, rank)
}

fn to_shakmaty_color(color: Color) -> shakmaty::Color {
    match color {
        Color::White => shakmaty::Color::White,
        Color::Black => shakmaty::Color::Black,
    }
}

fn from_shakmaty_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn to_role(piece: PieceKind) -> Role {
    match piece {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_standard_start_has_twenty_moves() {
        let rules = StandardRules::new();
        let start = rules.standard_start();
        assert_eq!(rules.legal_moves(&start).len(), 20);
        assert_eq!(rules.side_to_move(&start), Color::White);
        assert_eq!(rules.piece_count(&start, Color::Black), 16);
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let rules = StandardRules::new();
        let position = rules
            .decode_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .unwrap();
        let after = rules
            .apply_move(&position, &MoveDescriptor::new(sq("e1"), sq("g1")))
            .unwrap();
        assert_eq!(rules.piece_color_at(&after, sq("g1")), Some(Color::White));
        assert_eq!(rules.piece_color_at(&after, sq("f1")), Some(Color::White));
        assert_eq!(rules.piece_color_at(&after, sq("h1")), None);
    }

    #[test]
    fn test_promotion_without_piece_is_illegal() {
        let rules = StandardRules::new();
        let position = rules.decode_position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(rules.is_promotion_move(&position, sq("e7"), sq("e8")));
        let result = rules.apply_move(&position, &MoveDescriptor::new(sq("e7"), sq("e8")));
        assert!(matches!(result, Err(RulesError::IllegalMove(_))));
    }

    #[test]
    fn test_encode_decode_preserves_position() {
        let rules = StandardRules::new();
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let position = rules.decode_position(fen).unwrap();
        assert_eq!(rules.encode_position(&position), fen);
    }

    #[test]
    fn test_fen_omits_unusable_en_passant_square() {
        let rules = StandardRules::new();
        let start = rules.standard_start();
        assert_eq!(
            start.fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );

        // No black pawn can capture on e3, so no en passant square is written.
        let after = rules
            .apply_move(&start, &MoveDescriptor::new(sq("e2"), sq("e4")))
            .unwrap();
        assert_eq!(
            after.to_string(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let rules = StandardRules::new();
        let result = rules.decode_position("not a position");
        assert!(matches!(result, Err(RulesError::InvalidPosition { .. })));
    }
}
