//! Forsyth-Edwards Notation, a standard notation for describing a chess position.
//! <https://en.wikipedia.org/wiki/Forsyth%E2%80%93Edwards_Notation>
//!
//! Example:
//! Starting Chess FEN = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"

use std::convert::TryFrom;
use std::fmt::{self, Display};

use crate::coretypes::{Castling, Color, MoveCount, Piece, PieceKind, Rank, Square};
use crate::coretypes::{NUM_FILES, NUM_RANKS};
use crate::error;
use crate::mailbox::Mailbox;
use crate::position::Position;

/// FEN of the standard chess start position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The field of a FEN string that failed to parse.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParseFenError {
    /// FEN does not have exactly six space separated fields.
    IllFormed,
    Placement,
    SideToMove,
    Castling,
    EnPassant,
    HalfMoveClock,
    FullMoveNumber,
}

impl ParseFenError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseFenError::IllFormed => "ill formed",
            ParseFenError::Placement => "placement",
            ParseFenError::SideToMove => "side to move",
            ParseFenError::Castling => "castling",
            ParseFenError::EnPassant => "en passant",
            ParseFenError::HalfMoveClock => "halfmove clock",
            ParseFenError::FullMoveNumber => "fullmove number",
        }
    }
}

impl Display for ParseFenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fen {} malformed", self.as_str())
    }
}

impl std::error::Error for ParseFenError {}

/// Conversion of a type to and from FEN strings.
pub trait Fen: Sized {
    fn parse_fen(fen: &str) -> error::Result<Self>;
    fn to_fen(&self) -> String;
}

impl Fen for Position {
    fn parse_fen(fen: &str) -> error::Result<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let [placement, side, castling, en_passant, halfmoves, fullmoves] = fields[..] else {
            return Err(ParseFenError::IllFormed.into());
        };

        let mailbox = parse_placement(placement)?;

        let side_to_move = match side.chars().collect::<Vec<_>>()[..] {
            [ch] => Color::try_from(ch).map_err(|_| ParseFenError::SideToMove)?,
            _ => return Err(ParseFenError::SideToMove.into()),
        };

        let castling: Castling = castling.parse().map_err(|_| ParseFenError::Castling)?;

        let en_passant: Option<Square> = match en_passant {
            "-" => None,
            square => {
                let square: Square = square.parse().map_err(|_| ParseFenError::EnPassant)?;
                if !is_en_passant_target(&mailbox, square, side_to_move) {
                    return Err(ParseFenError::EnPassant.into());
                }
                Some(square)
            }
        };

        let halfmoves: MoveCount = halfmoves
            .parse()
            .map_err(|_| ParseFenError::HalfMoveClock)?;
        let fullmoves: MoveCount = fullmoves
            .parse()
            .map_err(|_| ParseFenError::FullMoveNumber)?;

        Ok(Position {
            mailbox,
            side_to_move,
            castling,
            en_passant,
            halfmoves,
            fullmoves,
        })
    }

    fn to_fen(&self) -> String {
        let en_passant = match self.en_passant {
            Some(square) => square.to_string(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {} {}",
            placement_to_string(&self.mailbox),
            self.side_to_move,
            self.castling,
            en_passant,
            self.halfmoves,
            self.fullmoves
        )
    }
}

/// Placement ::= 8 ranks from 8 to 1, separated by '/'.
/// Each rank is a mix of piece chars and digits counting empty squares.
fn parse_placement(placement: &str) -> Result<Mailbox, ParseFenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != NUM_RANKS {
        return Err(ParseFenError::Placement);
    }

    let mut mailbox = Mailbox::new();
    for (rank_idx, rank_str) in ranks.into_iter().rev().enumerate() {
        let mut file_idx = 0usize;
        for ch in rank_str.chars() {
            if let Some(empty) = ch.to_digit(10) {
                if !(1..=NUM_FILES as u32).contains(&empty) {
                    return Err(ParseFenError::Placement);
                }
                file_idx += empty as usize;
            } else {
                let piece = Piece::try_from(ch).map_err(|_| ParseFenError::Placement)?;
                let square = (file_idx < NUM_FILES)
                    .then(|| Square::from_u8((rank_idx * NUM_FILES + file_idx) as u8))
                    .flatten()
                    .ok_or(ParseFenError::Placement)?;
                mailbox[square] = Some(piece);
                file_idx += 1;
            }
        }
        if file_idx != NUM_FILES {
            return Err(ParseFenError::Placement);
        }
    }

    Ok(mailbox)
}

/// An en passant target is the empty square a pawn of the side not to move
/// just passed over: rank 6 with White to move, rank 3 with Black to move.
fn is_en_passant_target(mailbox: &Mailbox, square: Square, side_to_move: Color) -> bool {
    let (target_rank, pushed_to) = match side_to_move {
        Color::White => (Rank::R6, square.offset(0, -1)),
        Color::Black => (Rank::R3, square.offset(0, 1)),
    };
    let pushed_pawn = Some(Piece::new(!side_to_move, PieceKind::Pawn));

    square.rank() == target_rank
        && mailbox[square].is_none()
        && pushed_to.map_or(false, |pushed_to| mailbox[pushed_to] == pushed_pawn)
}

fn placement_to_string(mailbox: &Mailbox) -> String {
    let mut placement = String::with_capacity(72);

    for rank in (0..NUM_RANKS).rev() {
        let mut empty = 0;
        for file in 0..NUM_FILES {
            match mailbox.board()[rank * NUM_FILES + file] {
                Some(piece) => {
                    if empty > 0 {
                        placement.push_str(&empty.to_string());
                        empty = 0;
                    }
                    placement.push(char::from(piece));
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            placement.push_str(&empty.to_string());
        }
        if rank > 0 {
            placement.push('/');
        }
    }

    placement
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coretypes::Square::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_start_position() {
        let pos = Position::parse_fen(START_FEN).unwrap();
        assert_eq!(pos, Position::start_position());
        assert_eq!(pos.to_fen(), START_FEN);
    }

    #[test]
    fn parse_fen_fields() {
        let fen = "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R w Kq c6 1 2";
        let pos = Position::parse_fen(fen).unwrap();
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.castling, Castling::W_KING | Castling::B_QUEEN);
        assert_eq!(pos.en_passant, Some(C6));
        assert_eq!(pos.halfmoves, 1);
        assert_eq!(pos.fullmoves, 2);
        assert_eq!(
            pos.mailbox[F3],
            Some(Piece::new(Color::White, PieceKind::Knight))
        );
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn parse_fen_en_passant_targets() {
        let white = Position::parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(white.en_passant, Some(D6));
        let black = Position::parse_fen("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1").unwrap();
        assert_eq!(black.en_passant, Some(D3));
    }

    #[test]
    fn parse_fen_rejects_malformed_fields() {
        let cases = [
            ("", ParseFenError::IllFormed),
            ("8/8/8/8/8/8/8/8 w - - 0", ParseFenError::IllFormed),
            ("8/8/8/8/8/8/8 w - - 0 1", ParseFenError::Placement),
            ("9/8/8/8/8/8/8/8 w - - 0 1", ParseFenError::Placement),
            ("ppppppppp/8/8/8/8/8/8/8 w - - 0 1", ParseFenError::Placement),
            ("7x/8/8/8/8/8/8/8 w - - 0 1", ParseFenError::Placement),
            ("8/8/8/8/8/8/8/8 x - - 0 1", ParseFenError::SideToMove),
            ("8/8/8/8/8/8/8/8 w KX - 0 1", ParseFenError::Castling),
            ("8/8/8/8/8/8/8/8 w - e9 0 1", ParseFenError::EnPassant),
            // Wrong rank for the side to move.
            ("4k3/8/8/3pP3/8/8/8/4K3 b - d6 0 1", ParseFenError::EnPassant),
            ("4k3/8/8/8/3Pp3/8/8/4K3 w - d3 0 1", ParseFenError::EnPassant),
            // No pawn of the side not to move in front of the target.
            ("4k3/8/8/3PP3/8/8/8/4K3 w - d6 0 1", ParseFenError::EnPassant),
            ("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1", ParseFenError::EnPassant),
            // Target square occupied.
            ("4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1", ParseFenError::EnPassant),
            ("8/8/8/8/8/8/8/8 w - - a 1", ParseFenError::HalfMoveClock),
            ("8/8/8/8/8/8/8/8 w - - 0 -1", ParseFenError::FullMoveNumber),
        ];

        for (fen, expected) in cases {
            let error = Position::parse_fen(fen).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Fen);
            assert_eq!(
                error.to_string(),
                format!("fen, error: {}", expected),
                "fen: {fen:?}"
            );
        }
    }
}
