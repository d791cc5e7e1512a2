//! Holds Position struct, the reference implementation of `Rules`.
//! Position represents a chess position.

use std::fmt::{self, Display};

use crate::coretypes::{Castling, Color, Move, MoveCount, Piece, Square};
use crate::coretypes::{Color::*, PieceKind::*};
use crate::fen::Fen;
use crate::mailbox::Mailbox;
use crate::movegen as mg;
use crate::movelist::MoveList;
use crate::rules::Rules;

/// struct Position
/// A complete data set that can represent any chess position.
/// # Members:
/// * mailbox - a square-centric container of all chess pieces.
/// * side_to_move - Color of player whose turn it is.
/// * castling - Castling rights for both players.
/// * en_passant - Square a pawn may capture onto en passant, if any.
/// * halfmoves - Tracker for 50 move draw rule. Resets after capture/pawn move.
/// * fullmoves - Starts at 1, increments after each black player's move.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Position {
    pub(crate) mailbox: Mailbox,
    pub(crate) side_to_move: Color,
    pub(crate) castling: Castling,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmoves: MoveCount,
    pub(crate) fullmoves: MoveCount,
}

impl Position {
    /// Standard chess start position.
    pub fn start_position() -> Self {
        Self {
            mailbox: Mailbox::start_position(),
            side_to_move: Color::White,
            castling: Castling::start_position(),
            en_passant: None,
            halfmoves: 0,
            fullmoves: 1,
        }
    }

    /// Const getters.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }
    pub fn castling(&self) -> &Castling {
        &self.castling
    }
    pub fn en_passant(&self) -> &Option<Square> {
        &self.en_passant
    }
    pub fn halfmoves(&self) -> &MoveCount {
        &self.halfmoves
    }
    pub fn fullmoves(&self) -> &MoveCount {
        &self.fullmoves
    }

    /// Apply a move to self, in place.
    /// `do_move` does not check if the move is legal or not,
    /// it simply executes it while assuming legality.
    /// Does nothing if there is no piece on the `from` square.
    /// A pawn reaching the last rank without a promotion becomes a Queen.
    pub fn do_move(&mut self, move_: Move) {
        let active_piece = match self.mailbox[move_.from] {
            Some(piece) => piece,
            None => return,
        };
        let is_pawn_move = active_piece.piece_kind == Pawn;
        let file_delta = move_.to.file_u8() as i8 - move_.from.file_u8() as i8;
        let mut is_capture = self.mailbox[move_.to].is_some();

        // En passant removes the pawn beside the moving pawn, not the one on `to`.
        if is_pawn_move && file_delta != 0 && !is_capture {
            let captured = Square::from((move_.to.file(), move_.from.rank()));
            self.mailbox[captured] = None;
            is_capture = true;
        }

        // Castling relocates the rook to the square the king passed over.
        if active_piece.piece_kind == King && file_delta.abs() == 2 {
            let (rook_from_file, rook_step) = if file_delta > 0 { (7, -1) } else { (0, 1) };
            let rank = move_.from.rank_u8() as i8;
            let rook_from = Square::from_u8((rank * 8 + rook_from_file) as u8);
            let rook_to = move_.to.offset(rook_step, 0);
            if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
                self.mailbox[rook_to] = self.mailbox[rook_from].take();
            }
        }

        self.en_passant = match is_pawn_move {
            true if (move_.to.rank_u8() as i8 - move_.from.rank_u8() as i8).abs() == 2 => {
                let passed_rank = (move_.to.rank_u8() + move_.from.rank_u8()) / 2;
                Square::from_u8(passed_rank * 8 + move_.from.file_u8())
            }
            _ => None,
        };

        self.castling.clear(Castling::revoked_by(move_.from));
        self.castling.clear(Castling::revoked_by(move_.to));

        // Clocks read from FEN may already sit at MoveCount::MAX.
        if is_pawn_move || is_capture {
            self.halfmoves = 0;
        } else {
            self.halfmoves = self.halfmoves.saturating_add(1);
        }
        if self.side_to_move == Black {
            self.fullmoves = self.fullmoves.saturating_add(1);
        }

        let promotion = match move_.promotion {
            Some(piece_kind) => Some(piece_kind),
            None if is_pawn_move && move_.to.rank() == active_piece.color.promotion_rank() => {
                Some(Queen)
            }
            None => None,
        };
        self.mailbox[move_.to] = Some(match promotion {
            Some(piece_kind) => Piece::new(active_piece.color, piece_kind),
            None => active_piece,
        });
        self.mailbox[move_.from] = None;
        self.side_to_move = !self.side_to_move;
    }

    /// Returns true if `square` is attacked by any piece of color `by`.
    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        mg::is_attacked(&self.mailbox, square, by)
    }

    /// Returns true if the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.is_in_check() && self.legal_moves().is_empty()
    }

    /// Returns true if the side to move has no legal moves but is not in check.
    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check() && self.legal_moves().is_empty()
    }
}

impl Rules for Position {
    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square]
    }

    fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    fn legal_moves(&self) -> MoveList {
        mg::legal_moves(self)
    }

    /// Generates a new Position from applying move on current Position.
    fn make_move(&self, move_: Move) -> Self {
        let mut position_clone: Position = *self;
        position_clone.do_move(move_);
        position_clone
    }

    /// A position without a king for the side to move is never in check.
    fn is_in_check(&self) -> bool {
        self.mailbox
            .find_king(self.side_to_move)
            .map_or(false, |king| self.is_attacked(king, !self.side_to_move))
    }
}

/// Defaults to standard chess start position.
impl Default for Position {
    fn default() -> Self {
        Self::start_position()
    }
}

/// Displays pretty-printed chess board and Fen string representing Position.
impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n Fen: {}\n", self.mailbox, self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coretypes::Square::*;

    #[test]
    fn pretty_print_position() {
        let start_pos = Position::start_position();
        let printed = start_pos.to_string();
        assert!(printed.contains("Fen: rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"));
    }

    #[test]
    fn do_move_with_legal_move() {
        let mut position = Position::start_position();
        position.do_move(Move::new(E2, E4, None));
        assert_eq!(position.mailbox[E4], Some(Piece::new(White, Pawn)));
        assert_eq!(position.mailbox[E2], None);
        assert_eq!(position.en_passant, Some(E3));
        assert_eq!(position.side_to_move, Black);
        assert_eq!(position.halfmoves, 0);
        assert_eq!(position.fullmoves, 1);

        position.do_move(Move::new(G8, F6, None));
        assert_eq!(position.en_passant, None);
        assert_eq!(position.halfmoves, 1);
        assert_eq!(position.fullmoves, 2);
    }

    #[test]
    fn do_move_castles_rook() {
        let pos = Position::parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let short = pos.make_move(Move::new(E1, G1, None));
        assert_eq!(short.mailbox[F1], Some(Piece::new(White, Rook)));
        assert_eq!(short.mailbox[H1], None);
        assert!(!short.castling.has(Castling::W_KING));
        assert!(!short.castling.has(Castling::W_QUEEN));
        assert!(short.castling.has(Castling::B_SIDE));

        let long = short.make_move(Move::new(E8, C8, None));
        assert_eq!(long.mailbox[D8], Some(Piece::new(Black, Rook)));
        assert_eq!(long.mailbox[A8], None);
        assert!(long.castling.is_none());
    }

    #[test]
    fn do_move_en_passant_removes_pawn() {
        let pos = Position::parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let after = pos.make_move(Move::new(E5, D6, None));
        assert_eq!(after.mailbox[D6], Some(Piece::new(White, Pawn)));
        assert_eq!(after.mailbox[D5], None);
    }

    #[test]
    fn do_move_promotes() {
        let pos = Position::parse_fen("7k/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let knight = pos.make_move(Move::new(E7, E8, Some(Knight)));
        assert_eq!(knight.mailbox[E8], Some(Piece::new(White, Knight)));
        let queen = pos.make_move(Move::new(E7, E8, None));
        assert_eq!(queen.mailbox[E8], Some(Piece::new(White, Queen)));
    }

    #[test]
    fn do_move_saturates_move_counters() {
        let pos = Position::parse_fen("4k3/8/8/8/8/8/8/4K1N1 w - - 65535 1").unwrap();
        let after = pos.make_move(Move::new(G1, F3, None));
        assert_eq!(after.halfmoves, MoveCount::MAX);
        assert_eq!(after.fullmoves, 1);

        let pos = Position::parse_fen("4k3/8/8/8/8/8/8/4K1N1 b - - 0 65535").unwrap();
        let after = pos.make_move(Move::new(E8, D8, None));
        assert_eq!(after.halfmoves, 1);
        assert_eq!(after.fullmoves, MoveCount::MAX);
    }

    #[test]
    fn capturing_rook_revokes_castling() {
        let pos = Position::parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let after = pos.make_move(Move::new(A1, A8, None));
        assert!(!after.castling.has(Castling::W_QUEEN));
        assert!(!after.castling.has(Castling::B_QUEEN));
        assert!(after.castling.has(Castling::B_KING));
    }

    #[test]
    fn check_mate_stalemate() {
        let check = Position::parse_fen("8/8/8/8/3K3r/8/8/8 w - - 0 1").unwrap();
        assert!(check.is_in_check());
        assert!(!check.is_checkmate());

        let mate = Position::parse_fen("k7/1r6/8/8/4B3/8/1q6/K7 w - - 0 1").unwrap();
        assert!(mate.is_checkmate());

        let stalemate = Position::parse_fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1").unwrap();
        assert!(stalemate.is_stalemate());
        assert!(!stalemate.is_checkmate());
    }
}
