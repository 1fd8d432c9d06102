//! `Position` to setup-string generator.

use crate::game_state::game_types::{squares, Side};
use crate::game_state::position::Position;
use crate::utils::algebraic::square_to_algebraic;
use crate::utils::setup_parser::SETUP_HEADER;

/// Canonical setup string: White pawns then Black pawns, ascending squares.
pub fn generate_setup(position: &Position) -> String {
    let mut out = String::from(SETUP_HEADER);
    for (side, letter) in [(Side::White, 'W'), (Side::Black, 'B')] {
        for sq in squares(position.pawns(side)) {
            out.push(' ');
            out.push(letter);
            out.push_str(&square_to_algebraic(sq));
        }
    }
    out
}
