//! Compact pawn move with derived flags.

use std::fmt;

use crate::game_state::game_types::Square;
use crate::utils::algebraic::square_to_algebraic;

pub const FLAG_CAPTURE: u8 = 1 << 0;
pub const FLAG_DOUBLE_STEP: u8 = 1 << 1;
pub const FLAG_PROMOTION: u8 = 1 << 2;

/// Origin, destination and flags derived from the position it was generated
/// in. Equality only looks at the squares: a move parsed from the relay and
/// the same move produced by the generator compare equal.
#[derive(Debug, Clone, Copy)]
pub struct PawnMove {
    from: Square,
    to: Square,
    flags: u8,
}

impl PawnMove {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to, flags: 0 }
    }

    #[inline]
    pub const fn with_flags(from: Square, to: Square, flags: u8) -> Self {
        Self { from, to, flags }
    }

    #[inline]
    pub const fn from(self) -> Square {
        self.from
    }

    #[inline]
    pub const fn to(self) -> Square {
        self.to
    }

    #[inline]
    pub const fn flags(self) -> u8 {
        self.flags
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.flags & FLAG_CAPTURE != 0
    }

    #[inline]
    pub const fn is_double_step(self) -> bool {
        self.flags & FLAG_DOUBLE_STEP != 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.flags & FLAG_PROMOTION != 0
    }

    /// Four-character relay encoding, e.g. `f7f5`.
    pub fn to_long_algebraic(self) -> String {
        let mut out = square_to_algebraic(self.from);
        out.push_str(&square_to_algebraic(self.to));
        out
    }
}

impl PartialEq for PawnMove {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for PawnMove {}

impl fmt::Display for PawnMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_long_algebraic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_do_not_affect_equality() {
        let parsed = PawnMove::new(53, 37);
        let generated = PawnMove::with_flags(53, 37, FLAG_DOUBLE_STEP);
        assert_eq!(parsed, generated);
        assert!(generated.is_double_step());
        assert!(!generated.is_capture());
        assert_eq!(generated.to_string(), "f7f5");
    }
}
