//! Zobrist fingerprints for transposition-table keys.
//!
//! One random key per (side, square) plus a side-to-move key. The keys come
//! from a fixed-seed `StdRng` so fingerprints are identical across runs and
//! across the foreground and pondering searches.

use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::game_state::game_types::{squares, Side, Square};
use crate::game_state::position::Position;

const ZOBRIST_SEED: u64 = 0x7F4A_7C15_9E37_79B9;

#[derive(Debug)]
struct ZobristTables {
    pawn_square: [[u64; 64]; 2],
    black_to_move: u64,
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    let mut pawn_square = [[0u64; 64]; 2];
    for side in &mut pawn_square {
        for key in side.iter_mut() {
            *key = rng.next_u64();
        }
    }

    ZobristTables {
        pawn_square,
        black_to_move: rng.next_u64(),
    }
}

/// Key contribution of a pawn of `side` standing on `square`.
#[inline]
pub fn pawn_square_key(side: Side, square: Square) -> u64 {
    tables().pawn_square[side.index()][square as usize]
}

/// Toggle key, xored in while Black is to move.
#[inline]
pub fn side_to_move_key() -> u64 {
    tables().black_to_move
}

/// Compute the fingerprint of a position from scratch.
pub fn compute_fingerprint(position: &Position) -> u64 {
    fingerprint_of(
        position.pawns(Side::White),
        position.pawns(Side::Black),
        position.side_to_move(),
    )
}

pub(crate) fn fingerprint_of(white: u64, black: u64, side_to_move: Side) -> u64 {
    let mut key = 0u64;
    for sq in squares(white) {
        key ^= pawn_square_key(Side::White, sq);
    }
    for sq in squares(black) {
        key ^= pawn_square_key(Side::Black, sq);
    }
    if side_to_move == Side::Black {
        key ^= side_to_move_key();
    }
    key
}
