//! Move Generation
//!
//! Square-by-square generation over a `Mailbox`. Pseudo-legal moves are
//! produced from offset tables, then each is played on a copy of the position
//! and kept only if it does not leave the mover's king attacked.

use crate::coretypes::{Castling, Color, Move, Piece, PieceKind, Rank, Square};
use crate::coretypes::{Color::*, PieceKind::*, Square::*};
use crate::mailbox::Mailbox;
use crate::movelist::MoveList;
use crate::position::Position;

/// (file, rank) steps of a knight.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// (file, rank) steps of a king, also the union of all sliding directions.
const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Rank direction pawns of a color advance in.
const fn pawn_direction(color: Color) -> i8 {
    match color {
        White => 1,
        Black => -1,
    }
}

/// Rank from which pawns of a color may double push.
const fn pawn_start_rank(color: Color) -> Rank {
    match color {
        White => Rank::R2,
        Black => Rank::R7,
    }
}

/// Returns true if any piece of color `attacker` attacks `square`.
/// Pieces of either color block sliding attacks.
pub fn is_attacked(mailbox: &Mailbox, square: Square, attacker: Color) -> bool {
    let holds = |maybe_square: Option<Square>, kinds: &[PieceKind]| {
        maybe_square
            .and_then(|sq| mailbox[sq])
            .map_or(false, |piece| {
                piece.color == attacker && kinds.contains(&piece.piece_kind)
            })
    };

    // An attacking pawn sits one rank behind the square, from its own point of view.
    let behind = -pawn_direction(attacker);
    if holds(square.offset(-1, behind), &[Pawn]) || holds(square.offset(1, behind), &[Pawn]) {
        return true;
    }

    if KNIGHT_OFFSETS
        .iter()
        .any(|&(df, dr)| holds(square.offset(df, dr), &[Knight]))
    {
        return true;
    }

    if KING_OFFSETS
        .iter()
        .any(|&(df, dr)| holds(square.offset(df, dr), &[King]))
    {
        return true;
    }

    let slides = |directions: &[(i8, i8)], kinds: &[PieceKind]| {
        directions
            .iter()
            .any(|&(df, dr)| holds(first_occupied(mailbox, square, df, dr), kinds))
    };

    slides(&ROOK_DIRECTIONS, &[Rook, Queen]) || slides(&BISHOP_DIRECTIONS, &[Bishop, Queen])
}

/// First occupied square from `square` (exclusive) walking in direction (df, dr).
fn first_occupied(mailbox: &Mailbox, square: Square, df: i8, dr: i8) -> Option<Square> {
    let mut current = square;
    while let Some(next) = current.offset(df, dr) {
        if mailbox[next].is_some() {
            return Some(next);
        }
        current = next;
    }
    None
}

/// Generate all legal moves for the side to move of `position`.
pub fn legal_moves(position: &Position) -> MoveList {
    let mut legal_moves = MoveList::new();
    let active_player = position.side_to_move;

    let mut push_if_legal = |move_: Move| {
        let mut after = *position;
        after.do_move(move_);
        let king_safe = after
            .mailbox
            .find_king(active_player)
            .map_or(true, |king| !is_attacked(&after.mailbox, king, !active_player));
        if king_safe {
            legal_moves.push(move_);
        }
    };

    for (from, piece) in position.mailbox.pieces() {
        if piece.color != active_player {
            continue;
        }
        match piece.piece_kind {
            Pawn => pawn_moves(position, from, &mut push_if_legal),
            Knight => step_moves(position, from, &KNIGHT_OFFSETS, &mut push_if_legal),
            Bishop => slide_moves(position, from, &BISHOP_DIRECTIONS, &mut push_if_legal),
            Rook => slide_moves(position, from, &ROOK_DIRECTIONS, &mut push_if_legal),
            Queen => slide_moves(position, from, &KING_OFFSETS, &mut push_if_legal),
            King => {
                step_moves(position, from, &KING_OFFSETS, &mut push_if_legal);
                castling_moves(position, from, &mut push_if_legal);
            }
        }
    }

    legal_moves
}

/// True if `square` is empty or holds an enemy piece of `color`.
fn is_enterable(mailbox: &Mailbox, square: Square, color: Color) -> bool {
    mailbox[square].map_or(true, |piece| piece.color != color)
}

fn step_moves<F: FnMut(Move)>(position: &Position, from: Square, offsets: &[(i8, i8)], push: &mut F) {
    let color = position.side_to_move;
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr) {
            if is_enterable(&position.mailbox, to, color) {
                push(Move::new(from, to, None));
            }
        }
    }
}

fn slide_moves<F: FnMut(Move)>(
    position: &Position,
    from: Square,
    directions: &[(i8, i8)],
    push: &mut F,
) {
    let color = position.side_to_move;
    for &(df, dr) in directions {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match position.mailbox[to] {
                None => push(Move::new(from, to, None)),
                Some(piece) => {
                    if piece.color != color {
                        push(Move::new(from, to, None));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

fn pawn_moves<F: FnMut(Move)>(position: &Position, from: Square, push: &mut F) {
    let color = position.side_to_move;
    let direction = pawn_direction(color);
    let mut push_pawn = |to: Square| {
        if to.rank() == color.promotion_rank() {
            for promotion in PieceKind::PROMOTIONS {
                push(Move::new(from, to, Some(promotion)));
            }
        } else {
            push(Move::new(from, to, None));
        }
    };

    // Pushes.
    if let Some(single) = from.offset(0, direction) {
        if position.mailbox[single].is_none() {
            push_pawn(single);

            if from.rank() == pawn_start_rank(color) {
                if let Some(double) = single.offset(0, direction) {
                    if position.mailbox[double].is_none() {
                        push_pawn(double);
                    }
                }
            }
        }
    }

    // Captures, including en passant onto the empty target square.
    for file_delta in [-1, 1] {
        if let Some(to) = from.offset(file_delta, direction) {
            let is_capture = position.mailbox[to].map_or(false, |piece| piece.color != color);
            if is_capture || position.en_passant == Some(to) {
                push_pawn(to);
            }
        }
    }
}

/// Castling: the right must remain, the rook must be home, squares between
/// king and rook must be empty, and the king may not start in, pass through
/// or land on an attacked square.
fn castling_moves<F: FnMut(Move)>(position: &Position, from: Square, push: &mut F) {
    let color = position.side_to_move;
    let (home, king_side, queen_side) = match color {
        White => (E1, Castling::W_KING, Castling::W_QUEEN),
        Black => (E8, Castling::B_KING, Castling::B_QUEEN),
    };
    if from != home {
        return;
    }

    let mailbox = &position.mailbox;
    let rook = Some(Piece::new(color, Rook));
    let safe = |square: Square| !is_attacked(mailbox, square, !color);
    let empty = |squares: &[Square]| squares.iter().all(|&sq| mailbox[sq].is_none());
    if !safe(home) {
        return;
    }

    // King side: king moves two files toward the h-file rook.
    if position.castling.has(king_side) {
        let (rook_from, f_sq, g_sq) = match color {
            White => (H1, F1, G1),
            Black => (H8, F8, G8),
        };
        if mailbox[rook_from] == rook && empty(&[f_sq, g_sq]) && safe(f_sq) && safe(g_sq) {
            push(Move::new(home, g_sq, None));
        }
    }

    // Queen side: king moves two files toward the a-file rook, b-file only needs to be empty.
    if position.castling.has(queen_side) {
        let (rook_from, b_sq, c_sq, d_sq) = match color {
            White => (A1, B1, C1, D1),
            Black => (A8, B8, C8, D8),
        };
        if mailbox[rook_from] == rook && empty(&[b_sq, c_sq, d_sq]) && safe(d_sq) && safe(c_sq) {
            push(Move::new(home, c_sq, None));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;

    fn contains(moves: &MoveList, move_: &str) -> bool {
        moves.contains(&move_.parse::<Move>().unwrap())
    }

    #[test]
    fn start_position_moves() {
        let moves = legal_moves(&Position::start_position());
        assert_eq!(moves.len(), 20);
        assert!(contains(&moves, "e2e4"));
        assert!(contains(&moves, "g1f3"));
        assert!(!contains(&moves, "e1e2"));
    }

    #[test]
    fn attacked_squares() {
        let pos = Position::parse_fen("4k3/8/8/3p4/8/8/8/R3K3 w - - 0 1").unwrap();
        let mb = &pos.mailbox;
        assert!(is_attacked(mb, A8, White));
        assert!(is_attacked(mb, D1, White));
        // The king on e1 blocks the rook.
        assert!(!is_attacked(mb, H1, White));
        assert!(!is_attacked(mb, B2, White));
        // Black pawn on d5 attacks c4 and e4, not d4.
        assert!(is_attacked(mb, C4, Black));
        assert!(is_attacked(mb, E4, Black));
        assert!(!is_attacked(mb, D4, Black));
        // King attacks adjacent squares.
        assert!(is_attacked(mb, D7, Black));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        // Knight on e2 is pinned to the king by the rook on e8.
        let pos = Position::parse_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        let moves = legal_moves(&pos);
        assert!(moves.iter().all(|move_| move_.from != E2));
    }

    #[test]
    fn castling_through_attack_is_illegal() {
        // Bishop on c4 attacks f1, so king side castling is not allowed.
        let pos = Position::parse_fen("r3k2r/8/8/8/2b5/8/8/R3K2R w KQkq - 0 1").unwrap();
        let moves = legal_moves(&pos);
        assert!(!contains(&moves, "e1g1"));
        assert!(contains(&moves, "e1c1"));
    }

    #[test]
    fn castling_needs_rights_and_empty_squares() {
        let pos = Position::parse_fen("r3k2r/8/8/8/8/8/8/RN2K2R w Kkq - 0 1").unwrap();
        let moves = legal_moves(&pos);
        assert!(contains(&moves, "e1g1"));
        assert!(!contains(&moves, "e1c1"));

        let black = Position::parse_fen("r3k2r/8/8/8/8/8/8/R3K2R b kq - 0 1").unwrap();
        let moves = legal_moves(&black);
        assert!(contains(&moves, "e8g8"));
        assert!(contains(&moves, "e8c8"));
    }

    #[test]
    fn promotions_are_generated_for_each_kind() {
        let pos = Position::parse_fen("7k/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves = legal_moves(&pos);
        let promotions: Vec<_> = moves.iter().filter(|move_| move_.from == E7).collect();
        assert_eq!(promotions.len(), 4);
        assert!(contains(&moves, "e7e8q"));
        assert!(contains(&moves, "e7e8n"));
    }

    #[test]
    fn en_passant_capture_is_generated() {
        let pos = Position::parse_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert!(contains(&legal_moves(&pos), "e5d6"));
    }
}
