//! Performance Test
//!
//! [Perft](https://www.chessprogramming.org/Perft)
//!
//! A simple debugging and testing function used to count
//! the number of nodes at a specific depth.
//! Any implementation of `Rules` can be checked against published results.

use std::ops::{Add, AddAssign};

use crate::rules::Rules;

/// Debugging information about results of perft test.
/// nodes: Number of nodes at lowest depth of perft.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PerftInfo {
    pub nodes: u64,
}

impl PerftInfo {
    fn new(nodes: u64) -> Self {
        PerftInfo { nodes }
    }
}

impl Add for PerftInfo {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        PerftInfo {
            nodes: self.nodes + rhs.nodes,
        }
    }
}

impl AddAssign for PerftInfo {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
    }
}

/// Count the number of nodes at a certain depth.
/// This ignores higher terminal nodes.
/// In other words, it counts the number of paths to the given depth.
pub fn perft<R: Rules>(position: &R, ply: u8) -> PerftInfo {
    match ply {
        // Ever only 1 position at 0 ply.
        0 => PerftInfo::new(1),
        1 => PerftInfo::new(position.legal_moves().len() as u64),
        _ => position
            .legal_moves()
            .into_iter()
            .map(|move_| perft(&position.make_move(move_), ply - 1))
            .fold(PerftInfo::default(), |total, info| total + info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;
    use crate::position::Position;

    #[test]
    fn perft_shallow_start_position() {
        let start = Position::start_position();
        assert_eq!(perft(&start, 0).nodes, 1);
        assert_eq!(perft(&start, 1).nodes, 20);
        assert_eq!(perft(&start, 2).nodes, 400);
    }

    #[test]
    fn perft_no_moves() {
        let mate = Position::parse_fen("k7/1r6/8/8/4B3/8/1q6/K7 w - - 0 1").unwrap();
        assert_eq!(perft(&mate, 1).nodes, 0);
        assert_eq!(perft(&mate, 3).nodes, 0);
    }

    #[test]
    fn perft_info_adds() {
        let mut info = PerftInfo::new(3) + PerftInfo::new(4);
        info += PerftInfo::new(1);
        assert_eq!(info, PerftInfo::new(8));
    }
}
