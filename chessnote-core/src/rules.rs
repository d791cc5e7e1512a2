//! The rules of chess as seen by the notation converter.
//!
//! Notation needs three services it does not implement itself: legal move
//! generation, move application and check detection. They are gathered in the
//! `Rules` trait so any position type can drive `san::parse` and `san::format`.
//! `Position` is the implementation shipped with this crate.

use crate::coretypes::{Color, Move, Piece, Square};
use crate::movelist::MoveList;

/// A chess position together with the rules needed to move through it.
///
/// Implementors must be immutable values: every method answers for `self`
/// alone, and `make_move` returns a new position rather than changing `self`.
pub trait Rules: Sized {
    /// Piece standing on `square`, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Color of the player whose turn it is.
    fn side_to_move(&self) -> Color;

    /// All legal moves for the side to move, in a deterministic order.
    /// A promoting pawn move appears once per promotion piece kind.
    fn legal_moves(&self) -> MoveList;

    /// Position after applying `move_`, which is assumed legal.
    /// Captures, en passant, promotion and the castling rook are all applied.
    fn make_move(&self, move_: Move) -> Self;

    /// Returns true if the side to move is in check.
    fn is_in_check(&self) -> bool;
}
