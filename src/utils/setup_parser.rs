//! Setup-string to `Position` parser.
//!
//! The relay sends a custom starting arrangement as
//! `Setup Wa2 Wb2 ... Ba7 ...`: a header token followed by one token per
//! pawn, side letter then square. White always moves first.

use crate::errors::ParseError;
use crate::game_state::game_types::{Bitboard, Side};
use crate::game_state::position::Position;
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

pub const SETUP_HEADER: &str = "Setup";
pub const MAX_PAWNS_PER_SIDE: u32 = 8;
pub const DEFAULT_SETUP: &str =
    "Setup Wa2 Wb2 Wc2 Wd2 We2 Wf2 Wg2 Wh2 Ba7 Bb7 Bc7 Bd7 Be7 Bf7 Bg7 Bh7";

pub fn parse_setup(setup: &str) -> Result<Position, ParseError> {
    let mut tokens = setup.split_whitespace();

    let header = tokens.next().ok_or(ParseError::MissingSetupHeader)?;
    if !header.eq_ignore_ascii_case(SETUP_HEADER) {
        return Err(ParseError::MissingSetupHeader);
    }

    let mut grids: [Bitboard; 2] = [0, 0];

    for token in tokens {
        let (side, square) = parse_token(token)?;
        let mask = 1u64 << square;
        let name = square_to_algebraic(square);

        if grids[side.index()] & mask != 0 {
            return Err(ParseError::DuplicatePawn(name));
        }
        if grids[side.opposite().index()] & mask != 0 {
            return Err(ParseError::OverlappingPawns(name));
        }
        if side.promotion_rank() & mask != 0 {
            return Err(ParseError::PawnOnPromotionRank(name));
        }
        grids[side.index()] |= mask;
    }

    for side in [Side::White, Side::Black] {
        let count = grids[side.index()].count_ones();
        if count == 0 || count > MAX_PAWNS_PER_SIDE {
            return Err(ParseError::WrongPawnCount {
                side: side.name(),
                count,
                max: MAX_PAWNS_PER_SIDE,
            });
        }
    }

    Position::from_bitboards(grids[0], grids[1], Side::White)
        .ok_or_else(|| ParseError::MalformedSetupToken(setup.to_owned()))
}

fn parse_token(token: &str) -> Result<(Side, u8), ParseError> {
    if token.len() != 3 || !token.is_ascii() {
        return Err(ParseError::MalformedSetupToken(token.to_owned()));
    }

    let side_char = char::from(token.as_bytes()[0]);
    let side = match side_char.to_ascii_uppercase() {
        'W' => Side::White,
        'B' => Side::Black,
        _ => return Err(ParseError::UnknownSide(side_char)),
    };

    let square = algebraic_to_square(&token[1..])?;
    Ok((side, square))
}
