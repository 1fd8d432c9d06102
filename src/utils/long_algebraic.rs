//! Four-character move strings exchanged with the relay (`f7f5`).

use crate::errors::ParseError;
use crate::game_state::game_types::{make_square, Square};
use crate::move_generation::pawn_move::PawnMove;

/// Parse a move string into origin/destination squares.
///
/// Only the shape is checked here; whether the move is legal in a given
/// position is the move generator's call.
pub fn parse_move(text: &str) -> Result<PawnMove, ParseError> {
    let trimmed = text.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() != 4 {
        return Err(ParseError::InvalidMoveLength(trimmed.to_owned()));
    }

    let from = parse_coordinate(trimmed, chars[0], chars[1])?;
    let to = parse_coordinate(trimmed, chars[2], chars[3])?;
    Ok(PawnMove::new(from, to))
}

fn parse_coordinate(mv: &str, file: char, rank: char) -> Result<Square, ParseError> {
    let file = file.to_ascii_lowercase();
    if !('a'..='h').contains(&file) {
        return Err(ParseError::InvalidFile {
            mv: mv.to_owned(),
            ch: file,
        });
    }
    if !('1'..='8').contains(&rank) {
        return Err(ParseError::InvalidRank {
            mv: mv.to_owned(),
            ch: rank,
        });
    }
    Ok(make_square(file as u8 - b'a', rank as u8 - b'1'))
}
