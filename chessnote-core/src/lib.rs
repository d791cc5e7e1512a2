//! Chess move notation.
//!
//! `san::parse` reads an algebraic notation token such as `Nbd7` or `exd6` in a
//! given position, and `san::format` writes one for a legal move. Both work
//! with any type implementing `Rules`, and `Position` is a ready made one.

pub mod coretypes;
pub mod error;
pub mod fen;
pub mod mailbox;
pub(crate) mod movegen;
pub mod movelist;
pub mod perft;
pub mod position;
pub mod rules;
pub mod san;

pub use fen::Fen;
pub use position::Position;
pub use rules::Rules;
