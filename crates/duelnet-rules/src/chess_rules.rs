//! [`RulesEngine`] backed by the `chess` crate.
//!
//! Side A plays White. Squares map one to one: both sides of the adapter
//! index `a1` as 0 and `h8` as 63.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, File, MoveGen, Rank};
use duelnet_protocol::{Move, PromotionPiece, Side, Square};
use tracing::debug;

use crate::{Piece, PieceKind, RulesEngine, RulesError};

/// Standard chess rules on a `chess::Board`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChessRules {
    board: Board,
}

impl ChessRules {
    /// The standard starting position.
    pub fn new() -> Self {
        Self {
            board: Board::default(),
        }
    }

    /// Loads a position from FEN.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board =
            Board::from_str(fen).map_err(|_| RulesError::InvalidPosition(fen.to_string()))?;
        Ok(Self { board })
    }

    /// The underlying board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    fn to_chess_move(mv: Move) -> ChessMove {
        ChessMove::new(
            to_chess_square(mv.from),
            to_chess_square(mv.to),
            mv.promotion.map(to_chess_promotion),
        )
    }
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesEngine for ChessRules {
    fn side_to_move(&self) -> Side {
        from_color(self.board.side_to_move())
    }

    fn legal_moves(&self) -> Vec<Move> {
        MoveGen::new_legal(&self.board)
            .filter_map(from_chess_move)
            .collect()
    }

    fn apply_move(&mut self, mv: Move) -> Result<(), RulesError> {
        let candidate = Self::to_chess_move(mv);
        if !MoveGen::new_legal(&self.board).any(|m| m == candidate) {
            debug!(%mv, "rejected illegal move");
            return Err(RulesError::IllegalMove(mv.to_notation()));
        }
        self.board = self.board.make_move_new(candidate);
        Ok(())
    }

    fn is_check(&self) -> bool {
        self.board.checkers().popcnt() > 0
    }

    fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        let sq = to_chess_square(square);
        let kind = self.board.piece_on(sq)?;
        let color = self.board.color_on(sq)?;
        Some(Piece::new(from_color(color), from_chess_piece(kind)))
    }

    fn occupied_squares(&self) -> Vec<(Square, Piece)> {
        Square::all()
            .filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn from_color(color: Color) -> Side {
    match color {
        Color::White => Side::A,
        Color::Black => Side::B,
    }
}

fn to_chess_square(square: Square) -> chess::Square {
    chess::Square::make_square(
        Rank::from_index(usize::from(square.rank())),
        File::from_index(usize::from(square.file())),
    )
}

fn from_chess_square(square: chess::Square) -> Option<Square> {
    let file = u8::try_from(square.get_file().to_index()).ok()?;
    let rank = u8::try_from(square.get_rank().to_index()).ok()?;
    Square::new(file, rank)
}

fn from_chess_piece(piece: chess::Piece) -> PieceKind {
    match piece {
        chess::Piece::Pawn => PieceKind::Pawn,
        chess::Piece::Knight => PieceKind::Knight,
        chess::Piece::Bishop => PieceKind::Bishop,
        chess::Piece::Rook => PieceKind::Rook,
        chess::Piece::Queen => PieceKind::Queen,
        chess::Piece::King => PieceKind::King,
    }
}

fn to_chess_promotion(piece: PromotionPiece) -> chess::Piece {
    match piece {
        PromotionPiece::Knight => chess::Piece::Knight,
        PromotionPiece::Bishop => chess::Piece::Bishop,
        PromotionPiece::Rook => chess::Piece::Rook,
        PromotionPiece::Queen => chess::Piece::Queen,
    }
}

fn from_chess_move(mv: ChessMove) -> Option<Move> {
    let from = from_chess_square(mv.get_source())?;
    let to = from_chess_square(mv.get_dest())?;
    let promotion = match mv.get_promotion() {
        None => None,
        Some(chess::Piece::Knight) => Some(PromotionPiece::Knight),
        Some(chess::Piece::Bishop) => Some(PromotionPiece::Bishop),
        Some(chess::Piece::Rook) => Some(PromotionPiece::Rook),
        Some(chess::Piece::Queen) => Some(PromotionPiece::Queen),
        Some(_) => return None,
    };
    Some(Move {
        from,
        to,
        promotion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(notation: &str) -> Move {
        notation.parse().unwrap()
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_square_mapping_round_trips() {
        for square in Square::all() {
            let back = from_chess_square(to_chess_square(square));
            assert_eq!(back, Some(square));
            assert_eq!(to_chess_square(square).to_index(), usize::from(square.index()));
        }
    }

    #[test]
    fn test_start_position_has_twenty_moves() {
        let rules = ChessRules::new();
        assert_eq!(rules.side_to_move(), Side::A);
        assert_eq!(rules.legal_moves().len(), 20);
        assert_eq!(rules.occupied_squares().len(), 32);
    }

    #[test]
    fn test_apply_flips_side_to_move() {
        let mut rules = ChessRules::new();
        rules.apply_move(mv("e2e4")).unwrap();
        assert_eq!(rules.side_to_move(), Side::B);
        assert_eq!(
            rules.piece_at(sq("e4")),
            Some(Piece::new(Side::A, PieceKind::Pawn))
        );
        assert_eq!(rules.piece_at(sq("e2")), None);
    }

    #[test]
    fn test_illegal_move_leaves_position_untouched() {
        let mut rules = ChessRules::new();
        let before = rules;
        let err = rules.apply_move(mv("e2e5")).unwrap_err();
        assert!(matches!(err, RulesError::IllegalMove(n) if n == "e2e5"));
        assert_eq!(rules, before);
    }

    #[test]
    fn test_moving_the_wrong_side_is_illegal() {
        let mut rules = ChessRules::new();
        assert!(rules.apply_move(mv("e7e5")).is_err());
    }

    #[test]
    fn test_promotion_requires_a_piece() {
        let rules = ChessRules::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(rules.needs_promotion(sq("e7"), sq("e8")));
        assert!(!rules.is_legal(mv("e7e8")));
        assert!(rules.is_legal(mv("e7e8q")));
        assert!(rules.is_legal(mv("e7e8n")));
        assert_eq!(rules.legal_targets(sq("e7")), vec![sq("e8")]);
    }

    #[test]
    fn test_fools_mate_is_checkmate_for_side_b() {
        let mut rules = ChessRules::new();
        for m in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            rules.apply_move(mv(m)).unwrap();
        }
        assert!(rules.is_check());
        assert!(rules.is_checkmate());
        assert_eq!(
            rules.terminal(),
            Some(crate::Terminal::checkmate(Side::B))
        );
    }

    #[test]
    fn test_stalemate_detected() {
        // Black king a8 boxed in by the queen on b6; black to move.
        let rules = ChessRules::from_fen("k7/8/1Q6/8/8/8/8/2K5 b - - 0 1").unwrap();
        assert!(rules.is_stalemate());
        assert!(!rules.is_check());
        assert_eq!(rules.terminal(), Some(crate::Terminal::stalemate()));
    }

    #[test]
    fn test_bad_fen_is_invalid_position() {
        assert!(matches!(
            ChessRules::from_fen("not a position"),
            Err(RulesError::InvalidPosition(_))
        ));
    }
}
