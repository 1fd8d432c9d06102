//! Square conversions for the relay's coordinate notation.
//!
//! Converts between human-readable coordinates (e.g., `f7`) and internal
//! square indices used by move strings, setup strings and board rendering.

use crate::errors::ParseError;
use crate::game_state::game_types::{make_square, square_file, square_rank, Square};

/// Convert a coordinate (for example: "e4") to a square index.
#[inline]
pub fn algebraic_to_square(square: &str) -> Result<Square, ParseError> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(ParseError::InvalidSquare(square.to_owned()));
    }

    let file = bytes[0].to_ascii_lowercase();
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(ParseError::InvalidSquare(square.to_owned()));
    }

    Ok(make_square(file - b'a', rank - b'1'))
}

/// Convert a square index (`0..=63`) to a coordinate (for example: "e4").
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    debug_assert!(square < 64, "square index out of bounds: {square}");
    let file_char = char::from(b'a' + square_file(square));
    let rank_char = char::from(b'1' + square_rank(square));
    format!("{file_char}{rank_char}")
}
