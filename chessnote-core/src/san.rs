//! Standard Algebraic Notation (SAN)
//!
//! Converts a single move in a given position to and from its algebraic
//! notation token, eg `Nf3`, `exd5`, `O-O`, `e8=Q+` or `Qh4#`.
//!
//! Both directions lean on a `Rules` implementation: the legal moves of the
//! position decide which disambiguation a token needs and which move a token
//! refers to, and the position after the move decides the check suffix.
//!
//! Token grammar accepted by `parse`:
//! ```text
//! token      ::= castling [suffix] | piece-move [suffix]
//! castling   ::= "O-O" | "O-O-O"
//! piece-move ::= [piece] [file] [rank] ["x"] square ["=" promo]
//! piece      ::= "N" | "B" | "R" | "Q" | "K"
//! promo      ::= "N" | "B" | "R" | "Q"
//! suffix     ::= "+" | "#"
//! ```

use std::fmt::{self, Display, Write};
use std::str::FromStr;

use log::{debug, trace};

use crate::coretypes::{Color, File, Move, Piece, PieceKind, Rank, Square};
use crate::coretypes::{Color::*, PieceKind::*, Square::*};
use crate::error::{self, ErrorKind};
use crate::rules::Rules;

pub const CASTLE_KING_SIDE: &str = "O-O";
pub const CASTLE_QUEEN_SIDE: &str = "O-O-O";

/// Castling tokens and the king move each one stands for, by side to move.
const SPECIAL_MOVES: [(&str, Color, Move); 4] = [
    (CASTLE_KING_SIDE, White, Move::new(E1, G1, None)),
    (CASTLE_KING_SIDE, Black, Move::new(E8, G8, None)),
    (CASTLE_QUEEN_SIDE, White, Move::new(E1, C1, None)),
    (CASTLE_QUEEN_SIDE, Black, Move::new(E8, C8, None)),
];

/// Looks up the king move of a castling token for a side to move.
fn special_move(token: &str, side_to_move: Color) -> Option<Move> {
    SPECIAL_MOVES
        .iter()
        .find(|(special, side, _)| *special == token && *side == side_to_move)
        .map(|&(_, _, move_)| move_)
}

/// Removes a single trailing check or checkmate marker.
fn strip_check_suffix(token: &str) -> &str {
    token
        .strip_suffix('+')
        .or_else(|| token.strip_suffix('#'))
        .unwrap_or(token)
}

/// A king moving two files is castling, which only has the castling tokens.
fn is_castling(piece_kind: PieceKind, move_: &Move) -> bool {
    piece_kind == King && (move_.to.idx() as i8 - move_.from.idx() as i8).abs() == 2
}

/// A pawn reaching the last rank with no promotion given promotes to a Queen.
fn with_default_promotion(piece: Piece, move_: Move) -> Move {
    let reaches_last_rank = move_.to.rank() == piece.color.promotion_rank();
    match (piece.piece_kind, move_.promotion) {
        (Pawn, None) if reaches_last_rank => Move::new(move_.from, move_.to, Some(Queen)),
        _ => move_,
    }
}

/// A decoded non-castling token. Check suffixes are dropped while decoding.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct SanMove {
    piece_kind: PieceKind,
    file: Option<File>,
    rank: Option<Rank>,
    capture: bool,
    to: Square,
    promotion: Option<PieceKind>,
}

impl SanMove {
    /// Returns true if `move_` in `position` is a move this token may refer to.
    /// The capture marker is not authoritative and is not checked.
    fn matches<R: Rules>(&self, position: &R, move_: &Move) -> bool {
        let piece_matches = position
            .piece_at(move_.from)
            .map_or(false, |piece| piece.piece_kind == self.piece_kind);
        let promotion_matches = match move_.promotion {
            None => self.promotion.is_none(),
            Some(piece_kind) => piece_kind == self.promotion.unwrap_or(Queen),
        };

        move_.to == self.to
            && piece_matches
            && !is_castling(self.piece_kind, move_)
            && self.file.map_or(true, |file| move_.from.file() == file)
            && self.rank.map_or(true, |rank| move_.from.rank() == rank)
            && promotion_matches
    }
}

impl FromStr for SanMove {
    type Err = error::Error;
    fn from_str(token: &str) -> error::Result<Self> {
        let malformed = || error::Error::from((ErrorKind::SanMalformedToken, token));
        let body = strip_check_suffix(token);
        if !body.is_ascii() {
            return Err(malformed());
        }

        // Piece letter, absent for pawns.
        let (piece_kind, body) = match body.chars().next() {
            Some(ch) if ch.is_ascii_uppercase() => {
                let piece_kind = PieceKind::from_char(ch)
                    .filter(|&piece_kind| piece_kind != Pawn)
                    .ok_or_else(malformed)?;
                (piece_kind, &body[1..])
            }
            Some(_) => (Pawn, body),
            None => return Err(malformed()),
        };

        // Promotion suffix, only for pawns.
        let (body, promotion) = match body.split_once('=') {
            Some((head, promo)) => {
                let promotion = match promo.chars().collect::<Vec<_>>()[..] {
                    [ch] => PieceKind::from_char(ch)
                        .filter(|piece_kind| PieceKind::PROMOTIONS.contains(piece_kind)),
                    _ => None,
                };
                match promotion {
                    Some(promotion) if piece_kind == Pawn => (head, Some(promotion)),
                    _ => return Err(malformed()),
                }
            }
            None => (body, None),
        };

        // Destination is always the last two characters.
        if body.len() < 2 {
            return Err(malformed());
        }
        let (head, destination) = body.split_at(body.len() - 2);
        let to: Square = destination.parse().map_err(|_| malformed())?;

        let (head, capture) = match head.strip_suffix('x') {
            Some(head) => (head, true),
            None => (head, false),
        };

        // Optional disambiguation, file first then rank.
        let mut hints = head.chars().peekable();
        let file = hints.peek().and_then(|&ch| File::try_from(ch).ok());
        if file.is_some() {
            hints.next();
        }
        let rank = hints.peek().and_then(|&ch| Rank::try_from(ch).ok());
        if rank.is_some() {
            hints.next();
        }
        if hints.next().is_some() {
            return Err(malformed());
        }

        Ok(SanMove {
            piece_kind,
            file,
            rank,
            capture,
            to,
            promotion,
        })
    }
}

/// Canonical spelling of the decoded token, without check suffix.
impl Display for SanMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.piece_kind != Pawn {
            f.write_char(self.piece_kind.to_char())?;
        }
        if let Some(file) = self.file {
            f.write_char(file.to_char())?;
        }
        if let Some(rank) = self.rank {
            f.write_char(rank.to_char())?;
        }
        if self.capture {
            f.write_char('x')?;
        }
        write!(f, "{}", self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "={}", promotion)?;
        }
        Ok(())
    }
}

/// Resolve an algebraic notation token to the move it names in `position`.
///
/// Castling tokens are decoded from the side to move alone, without looking at
/// the board. Any other token must match exactly one legal move: none is
/// `SanUnresolvedToken`, several is `SanAmbiguousToken`.
///
/// # Example
/// ```
/// use chessnote_core::coretypes::{Move, Square::*};
/// use chessnote_core::{san, Position};
///
/// let position = Position::start_position();
/// assert_eq!(san::parse(&position, "Nf3").unwrap(), Move::new(G1, F3, None));
/// ```
pub fn parse<R: Rules>(position: &R, token: &str) -> error::Result<Move> {
    if let Some(move_) = special_move(strip_check_suffix(token), position.side_to_move()) {
        trace!("parsed castling token {token} as {move_}");
        return Ok(move_);
    }

    let san_move: SanMove = token.parse()?;
    let mut candidates = position
        .legal_moves()
        .into_iter()
        .filter(|move_| san_move.matches(position, move_));

    match (candidates.next(), candidates.next()) {
        (Some(move_), None) => {
            trace!("parsed {token} as {move_}");
            Ok(move_)
        }
        (None, _) => {
            debug!("no legal move matches {san_move}");
            Err((ErrorKind::SanUnresolvedToken, token).into())
        }
        (Some(first), Some(second)) => {
            debug!("{san_move} matches both {first} and {second}");
            Err((
                ErrorKind::SanAmbiguousToken,
                format!("{token} matches {first}, {second}"),
            )
                .into())
        }
    }
}

/// Produce the algebraic notation token of a legal `move_` in `position`.
///
/// A pawn move to the last rank with no promotion piece is written as a Queen
/// promotion. Moves that are not legal in `position` fail with
/// `SanIllegalMove` instead of producing a token.
///
/// # Example
/// ```
/// use chessnote_core::coretypes::{Move, Square::*};
/// use chessnote_core::{san, Position};
///
/// let position = Position::start_position();
/// assert_eq!(san::format(&position, Move::new(B1, C3, None)).unwrap(), "Nc3");
/// ```
pub fn format<R: Rules>(position: &R, move_: Move) -> error::Result<String> {
    let illegal = || {
        debug!("rejected {move_}, not a legal move");
        error::Error::from((ErrorKind::SanIllegalMove, move_))
    };

    let piece = position
        .piece_at(move_.from)
        .filter(|piece| piece.color == position.side_to_move())
        .ok_or_else(illegal)?;
    let move_ = with_default_promotion(piece, move_);
    let legal_moves = position.legal_moves();
    if !legal_moves.contains(&move_) {
        return Err(illegal());
    }

    let mut san = String::with_capacity(8);
    let is_pawn = piece.piece_kind == Pawn;
    if !is_pawn {
        san.push(piece.piece_kind.to_char());
    }

    // Castling is fully described by its token.
    if is_castling(piece.piece_kind, &move_) {
        let castle = match move_.to > move_.from {
            true => CASTLE_KING_SIDE,
            false => CASTLE_QUEEN_SIDE,
        };
        trace!("formatted {move_} as {castle}");
        return Ok(castle.to_string());
    }

    // Disambiguation by file, else by rank, else by full square.
    let mut sources: Vec<Square> = Vec::new();
    for legal_move in &legal_moves {
        let same_kind = position
            .piece_at(legal_move.from)
            .map_or(false, |other| other.piece_kind == piece.piece_kind);
        if legal_move.to == move_.to && same_kind && !sources.contains(&legal_move.from) {
            sources.push(legal_move.from);
        }
    }
    if sources.len() > 1 {
        let from = move_.from;
        let shared_file = sources.iter().filter(|sq| sq.file() == from.file()).count();
        let shared_rank = sources.iter().filter(|sq| sq.rank() == from.rank()).count();

        if shared_file == 1 {
            san.push(from.file().to_char());
        } else if shared_rank == 1 {
            san.push(from.rank().to_char());
        } else {
            san.push_str(&from.to_string());
        }
    }

    // Diagonal pawn moves capture even onto an empty square (en passant).
    let file_delta = move_.to.file_u8() as i8 - move_.from.file_u8() as i8;
    if position.piece_at(move_.to).is_some() || (is_pawn && file_delta != 0) {
        if is_pawn && san.is_empty() {
            san.push(move_.from.file().to_char());
        }
        san.push('x');
    }

    san.push_str(&move_.to.to_string());

    if is_pawn && (move_.to.idx() < 8 || move_.to.idx() > 55) {
        san.push('=');
        san.push(move_.promotion.unwrap_or(Queen).to_char());
    }

    let next_position = position.make_move(move_);
    if next_position.is_in_check() {
        match next_position.legal_moves().is_empty() {
            true => san.push('#'),
            false => san.push('+'),
        }
    }

    trace!("formatted {move_} as {san}");
    Ok(san)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;
    use crate::position::Position;

    fn decode(token: &str) -> SanMove {
        token.parse().unwrap()
    }

    #[test]
    fn special_move_table() {
        assert_eq!(
            special_move(CASTLE_KING_SIDE, White),
            Some(Move::new(E1, G1, None))
        );
        assert_eq!(
            special_move(CASTLE_QUEEN_SIDE, Black),
            Some(Move::new(E8, C8, None))
        );
        assert_eq!(special_move("O-O-O-O", White), None);
    }

    #[test]
    fn strips_one_suffix() {
        assert_eq!(strip_check_suffix("Qh4#"), "Qh4");
        assert_eq!(strip_check_suffix("e8=Q+"), "e8=Q");
        assert_eq!(strip_check_suffix("Nf3"), "Nf3");
        assert_eq!(strip_check_suffix("Nf3+#"), "Nf3+");
    }

    #[test]
    fn decode_piece_moves() {
        let knight = decode("Nbd7");
        assert_eq!(knight.piece_kind, Knight);
        assert_eq!(knight.file, Some(File::B));
        assert_eq!(knight.rank, None);
        assert_eq!(knight.to, D7);
        assert!(!knight.capture);

        let rook = decode("R1xa3+");
        assert_eq!(rook.piece_kind, Rook);
        assert_eq!(rook.file, None);
        assert_eq!(rook.rank, Some(Rank::R1));
        assert!(rook.capture);
        assert_eq!(rook.to, A3);

        let queen = decode("Qh4e1#");
        assert_eq!(queen.file, Some(File::H));
        assert_eq!(queen.rank, Some(Rank::R4));
        assert_eq!(queen.to, E1);
    }

    #[test]
    fn decode_pawn_moves() {
        let push = decode("e4");
        assert_eq!(push.piece_kind, Pawn);
        assert_eq!(push.to, E4);
        assert_eq!(push.file, None);

        let capture = decode("exd5");
        assert_eq!(capture.piece_kind, Pawn);
        assert_eq!(capture.file, Some(File::E));
        assert!(capture.capture);

        let promotion = decode("fxe8=N#");
        assert_eq!(promotion.to, E8);
        assert_eq!(promotion.promotion, Some(Knight));
        assert_eq!(promotion.to_string(), "fxe8=N");
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        for token in [
            "", "+", "N", "Nf", "Zf3", "Pe4", "e9", "i4", "Nf3=Q", "e8=K", "e8=", "e8=QQ",
            "Nbb1d2", "Nxxd2", "e4 ", "é4", "xd5x", "O-O-O-O",
        ] {
            let error = token.parse::<SanMove>().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::SanMalformedToken, "token: {token:?}");
        }
    }

    #[test]
    fn castling_token_is_table_driven() {
        // No king on e1 at all, the token still decodes.
        let pos = Position::parse_fen("8/8/8/8/8/8/8/k6K w - - 0 1").unwrap();
        assert_eq!(parse(&pos, "O-O").unwrap(), Move::new(E1, G1, None));
        assert_eq!(parse(&pos, "O-O-O+").unwrap(), Move::new(E1, C1, None));
    }

    #[test]
    fn king_token_does_not_name_castling() {
        let pos = Position::parse_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let error = parse(&pos, "Kg1").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SanUnresolvedToken);
    }

    #[test]
    fn format_rejects_illegal_moves() {
        let pos = Position::start_position();
        for move_ in ["e2e5", "e7e5", "e4e5", "e1g1"] {
            let error = format(&pos, move_.parse().unwrap()).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::SanIllegalMove, "move: {move_}");
        }
    }

    #[test]
    fn format_with_move_counters_at_limit() {
        let quiet = Position::parse_fen("4k3/8/8/8/8/8/8/4K1N1 w - - 65535 1").unwrap();
        assert_eq!(format(&quiet, Move::new(G1, F3, None)).unwrap(), "Nf3");

        let black = Position::parse_fen("4k3/8/8/8/8/8/8/4K1N1 b - - 0 65535").unwrap();
        assert_eq!(format(&black, Move::new(E8, D8, None)).unwrap(), "Kd8");
        assert_eq!(parse(&black, "Kd8").unwrap(), Move::new(E8, D8, None));
    }

    #[test]
    fn format_defaults_promotion_to_queen() {
        let pos = Position::parse_fen("8/4P1k1/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(format(&pos, Move::new(E7, E8, None)).unwrap(), "e8=Q");
        assert_eq!(format(&pos, Move::new(E7, E8, Some(Rook))).unwrap(), "e8=R");
        assert_eq!(parse(&pos, "e8").unwrap(), Move::new(E7, E8, Some(Queen)));
        assert_eq!(parse(&pos, "e8=N").unwrap(), Move::new(E7, E8, Some(Knight)));
    }
}
