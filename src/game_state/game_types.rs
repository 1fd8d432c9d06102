/// Core board types for the pawn-only game.
///
/// Squares are indexed `rank * 8 + file` with `0 == a1` and `63 == h8`, the
/// same layout the bitboards use.

/// Board square index (`0..=63`).
pub type Square = u8;

/// One bit per square.
pub type Bitboard = u64;

pub const BOARD_FILES: u8 = 8;
pub const BOARD_RANKS: u8 = 8;

pub const FILE_A: Bitboard = 0x0101_0101_0101_0101;
pub const FILE_H: Bitboard = FILE_A << 7;

pub const RANK_1: Bitboard = 0xFF;
pub const RANK_2: Bitboard = RANK_1 << 8;
pub const RANK_3: Bitboard = RANK_1 << 16;
pub const RANK_6: Bitboard = RANK_1 << 40;
pub const RANK_7: Bitboard = RANK_1 << 48;
pub const RANK_8: Bitboard = RANK_1 << 56;

/// Side to move. White moves first and advances toward rank 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Rank the side's pawns start on, and may double-step from.
    #[inline]
    pub const fn start_rank(self) -> Bitboard {
        match self {
            Side::White => RANK_2,
            Side::Black => RANK_7,
        }
    }

    /// Rank that wins the game when a pawn of this side lands on it.
    #[inline]
    pub const fn promotion_rank(self) -> Bitboard {
        match self {
            Side::White => RANK_8,
            Side::Black => RANK_1,
        }
    }

    /// Rank one forward step short of promotion.
    #[inline]
    pub const fn pre_promotion_rank(self) -> Bitboard {
        match self {
            Side::White => RANK_7,
            Side::Black => RANK_2,
        }
    }

    /// Signed square delta of one forward step.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Side::White => 8,
            Side::Black => -8,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("white") || name.eq_ignore_ascii_case("w") {
            Some(Side::White)
        } else if name.eq_ignore_ascii_case("black") || name.eq_ignore_ascii_case("b") {
            Some(Side::Black)
        } else {
            None
        }
    }
}

#[inline]
pub const fn square_file(square: Square) -> u8 {
    square % BOARD_FILES
}

#[inline]
pub const fn square_rank(square: Square) -> u8 {
    square / BOARD_FILES
}

#[inline]
pub const fn make_square(file: u8, rank: u8) -> Square {
    rank * BOARD_FILES + file
}

/// Mirror a square across the horizontal midline (a1 <-> a8).
#[inline]
pub const fn mirror_square(square: Square) -> Square {
    square ^ 56
}

/// Iterate the set squares of a bitboard from low to high.
#[inline]
pub fn squares(mut bitboard: Bitboard) -> impl Iterator<Item = Square> {
    std::iter::from_fn(move || {
        if bitboard == 0 {
            return None;
        }
        let sq = bitboard.trailing_zeros() as Square;
        bitboard &= bitboard - 1;
        Some(sq)
    })
}
