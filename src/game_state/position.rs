//! Position value type: both pawn occupancy grids plus side to move.
//!
//! `Position` is `Copy`; applying a move returns a new value, so search
//! branches never share in-progress mutation. The Zobrist fingerprint is
//! carried along and updated incrementally.

use crate::errors::ParseError;
use crate::game_state::game_types::*;
use crate::move_generation::pawn_move::PawnMove;
use crate::search::zobrist::{fingerprint_of, pawn_square_key, side_to_move_key};
use crate::utils::render_position::render_position;
use crate::utils::setup_generator::generate_setup;
use crate::utils::setup_parser::parse_setup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    // [side] -> occupied squares
    pawns: [Bitboard; 2],
    side_to_move: Side,
    fingerprint: u64,
}

impl Position {
    /// Full rank 2 for White, full rank 7 for Black, White to move.
    pub fn new_game() -> Self {
        Self::from_parts(RANK_2, RANK_7, Side::White)
    }

    #[inline]
    pub fn from_setup(setup: &str) -> Result<Self, ParseError> {
        parse_setup(setup)
    }

    /// Build a position from raw grids. Returns `None` if any square is
    /// claimed by both sides, or if both sides already have a pawn on their
    /// promotion rank (play ends at the first promotion).
    pub fn from_bitboards(white: Bitboard, black: Bitboard, side_to_move: Side) -> Option<Self> {
        if white & black != 0 {
            return None;
        }
        if white & Side::White.promotion_rank() != 0 && black & Side::Black.promotion_rank() != 0 {
            return None;
        }
        Some(Self::from_parts(white, black, side_to_move))
    }

    fn from_parts(white: Bitboard, black: Bitboard, side_to_move: Side) -> Self {
        debug_assert_eq!(white & black, 0, "overlapping occupancy grids");
        Self {
            pawns: [white, black],
            side_to_move,
            fingerprint: fingerprint_of(white, black, side_to_move),
        }
    }

    #[inline]
    pub fn pawns(&self, side: Side) -> Bitboard {
        self.pawns[side.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    #[inline]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    #[inline]
    pub fn occupancy(&self) -> Bitboard {
        self.pawns[0] | self.pawns[1]
    }

    #[inline]
    pub fn empty_squares(&self) -> Bitboard {
        !self.occupancy()
    }

    #[inline]
    pub fn pawn_count(&self, side: Side) -> u32 {
        self.pawns[side.index()].count_ones()
    }

    /// Which side, if any, owns the pawn at `square`.
    pub fn side_at(&self, square: Square) -> Option<Side> {
        let mask = 1u64 << square;
        if self.pawns[Side::White.index()] & mask != 0 {
            Some(Side::White)
        } else if self.pawns[Side::Black.index()] & mask != 0 {
            Some(Side::Black)
        } else {
            None
        }
    }

    /// Side that already has a pawn on its promotion rank.
    pub fn promoted_side(&self) -> Option<Side> {
        if self.pawns(Side::White) & Side::White.promotion_rank() != 0 {
            Some(Side::White)
        } else if self.pawns(Side::Black) & Side::Black.promotion_rank() != 0 {
            Some(Side::Black)
        } else {
            None
        }
    }

    pub fn with_side_to_move(&self, side_to_move: Side) -> Self {
        Self::from_parts(self.pawns[0], self.pawns[1], side_to_move)
    }

    /// Colour-flipped copy: sides swap grids, ranks are mirrored and the
    /// side to move flips.
    pub fn mirrored(&self) -> Self {
        Self::from_parts(
            self.pawns(Side::Black).swap_bytes(),
            self.pawns(Side::White).swap_bytes(),
            self.side_to_move.opposite(),
        )
    }

    /// Apply a move for the side to move. The move is assumed legal; callers
    /// validating external input go through the move generator first.
    pub fn apply_move(&self, mv: PawnMove) -> Self {
        let us = self.side_to_move;
        let them = us.opposite();
        let from_bb = 1u64 << mv.from();
        let to_bb = 1u64 << mv.to();

        let mut next = *self;
        next.pawns[us.index()] = (next.pawns[us.index()] & !from_bb) | to_bb;
        next.fingerprint ^= pawn_square_key(us, mv.from()) ^ pawn_square_key(us, mv.to());

        if next.pawns[them.index()] & to_bb != 0 {
            next.pawns[them.index()] &= !to_bb;
            next.fingerprint ^= pawn_square_key(them, mv.to());
        }

        next.side_to_move = them;
        next.fingerprint ^= side_to_move_key();
        next
    }

    #[inline]
    pub fn to_setup_string(&self) -> String {
        generate_setup(self)
    }

    #[inline]
    pub fn render(&self) -> String {
        render_position(self)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new_game()
    }
}
