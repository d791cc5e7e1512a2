//! A [mailbox](https://www.chessprogramming.org/Mailbox) is a square-centric
//! representation of a chess board.
//!
//! A Mailbox is an array of size Files x Ranks where each index may contain a
//! chess piece or be empty.

use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};

use crate::coretypes::{Color, Piece, PieceKind, Square, NUM_FILES, NUM_RANKS, NUM_SQUARES};

/// Classic 8x8 square board representation of Chess board.
/// Index starts at A1.
/// A1 = idx 0
/// B1 = idx 1
/// A2 = idx 8
/// H8 = idx 63
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Mailbox {
    board: [Option<Piece>; NUM_SQUARES],
}

impl Mailbox {
    /// Creates an empty Mailbox, where all squares are None.
    pub const fn new() -> Self {
        Mailbox {
            board: [None; NUM_SQUARES],
        }
    }

    /// Create Mailbox with pieces arranged in starting chess position.
    pub fn start_position() -> Self {
        use Color::*;
        use PieceKind::*;
        const BACK_RANK: [PieceKind; NUM_FILES] =
            [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut mb = Self::new();

        for (file, piece_kind) in BACK_RANK.into_iter().enumerate() {
            mb.board[file] = Some(Piece::new(White, piece_kind));
            mb.board[file + NUM_FILES] = Some(Piece::new(White, Pawn));
            mb.board[file + 6 * NUM_FILES] = Some(Piece::new(Black, Pawn));
            mb.board[file + 7 * NUM_FILES] = Some(Piece::new(Black, piece_kind));
        }

        mb
    }

    pub fn board(&self) -> &[Option<Piece>; NUM_SQUARES] {
        &self.board
    }

    /// Iterates over every occupied square and its piece, from A1 to H8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(move |square| self[square].map(|piece| (square, piece)))
    }

    /// Square of the king of given color, if one is on the board.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        self.pieces()
            .find(|&(_, piece)| piece == king)
            .map(|(square, _)| square)
    }

    /// Returns pretty-printed chess board representation of Self.
    /// The chess board has borders and file/rank indicators.
    pub fn pretty(&self) -> String {
        const RANK_SEP: &str = "+---+---+---+---+---+---+---+---+\n";
        let mut pretty = String::with_capacity(626);

        pretty.push_str(RANK_SEP);
        for rank in (0..NUM_RANKS).rev() {
            pretty.push_str("| ");

            for file in 0..NUM_FILES {
                pretty.push(match self.board[rank * NUM_FILES + file] {
                    Some(piece) => char::from(piece),
                    None => ' ',
                });
                pretty.push_str(" | ");
            }
            pretty.push_str(&(rank + 1).to_string());
            pretty.push('\n');
            pretty.push_str(RANK_SEP);
        }
        pretty.push_str("  a   b   c   d   e   f   g   h\n");

        pretty
    }
}

impl Index<Square> for Mailbox {
    type Output = Option<Piece>;
    fn index(&self, square: Square) -> &Self::Output {
        &self.board[square.idx()]
    }
}

impl IndexMut<Square> for Mailbox {
    fn index_mut(&mut self, square: Square) -> &mut Self::Output {
        &mut self.board[square.idx()]
    }
}

/// Default value is that of a standard starting chess position.
impl Default for Mailbox {
    fn default() -> Self {
        Mailbox::start_position()
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Square::*;

    #[test]
    fn start_position_placement() {
        let mb = Mailbox::start_position();
        assert_eq!(mb[E1], Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(mb[D8], Some(Piece::new(Color::Black, PieceKind::Queen)));
        assert_eq!(mb[G7], Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert_eq!(mb[E4], None);
        assert_eq!(mb.pieces().count(), 32);
        assert_eq!(mb.find_king(Color::Black), Some(E8));
        assert_eq!(Mailbox::new().find_king(Color::White), None);
    }

    #[test]
    fn display_start_position_mailbox() {
        let mb = Mailbox::start_position();
        let pretty = mb.pretty();
        assert!(pretty.starts_with("+---+"));
        assert!(pretty.contains("| r | n | b | q | k | b | n | r | 8"));
        assert!(pretty.ends_with("  a   b   c   d   e   f   g   h\n"));
    }
}
