//! Static evaluation of pawn positions.
//!
//! Scores are absolute: positive favours Black (the second mover), negative
//! favours White. Search converts to the side-to-move convention with
//! `score_for_side_to_move`.
//!
//! Terminal positions are checked first and score exactly `±win_score`.
//! Otherwise the score is a weighted sum of material, advancement,
//! promotion-imminent and passed-pawn terms.

use std::sync::OnceLock;

use crate::game_state::game_types::*;
use crate::game_state::position::Position;
use crate::move_generation::move_generator::has_legal_move;
use crate::search::weights::Weights;

#[derive(Debug)]
struct PassedMasks {
    // [side][square] -> enemy squares that can block or capture the pawn
    front_span: [[Bitboard; 64]; 2],
}

static PASSED_MASKS: OnceLock<PassedMasks> = OnceLock::new();

fn passed_masks() -> &'static PassedMasks {
    PASSED_MASKS.get_or_init(build_passed_masks)
}

fn build_passed_masks() -> PassedMasks {
    let mut front_span = [[0u64; 64]; 2];

    for sq in 0..64u8 {
        let file = square_file(sq);
        let rank = square_rank(sq);
        let lo = file.saturating_sub(1);
        let hi = (file + 1).min(BOARD_FILES - 1);

        for f in lo..=hi {
            for r in (rank + 1)..BOARD_RANKS {
                front_span[Side::White.index()][sq as usize] |= 1u64 << make_square(f, r);
            }
            for r in 0..rank {
                front_span[Side::Black.index()][sq as usize] |= 1u64 << make_square(f, r);
            }
        }
    }

    PassedMasks { front_span }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluator {
    weights: Weights,
}

impl Evaluator {
    pub const fn new(weights: Weights) -> Self {
        Self { weights }
    }

    #[inline]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    #[inline]
    pub fn win_score(&self) -> i32 {
        self.weights.win_score
    }

    /// `Some(±win_score)` when the game is over, from Black's perspective.
    pub fn terminal_score(&self, position: &Position) -> Option<i32> {
        let win = self.weights.win_score;
        if position.pawns(Side::White) & Side::White.promotion_rank() != 0 {
            return Some(-win);
        }
        if position.pawns(Side::Black) & Side::Black.promotion_rank() != 0 {
            return Some(win);
        }
        if !has_legal_move(position) {
            return Some(match position.side_to_move() {
                Side::White => win,
                Side::Black => -win,
            });
        }
        None
    }

    /// Absolute score, positive favouring Black.
    pub fn evaluate(&self, position: &Position) -> i32 {
        match self.terminal_score(position) {
            Some(score) => score,
            None => self.positional_score(position),
        }
    }

    /// Score from the perspective of the side to move.
    #[inline]
    pub fn score_for_side_to_move(&self, position: &Position) -> i32 {
        to_side_to_move(self.evaluate(position), position.side_to_move())
    }

    /// Weighted sum of the non-terminal terms, Black-positive.
    pub fn positional_score(&self, position: &Position) -> i32 {
        let w = &self.weights;
        let white = position.pawns(Side::White);
        let black = position.pawns(Side::Black);

        let material = (black.count_ones() as i32 - white.count_ones() as i32) * w.material;

        let advancement = advancement_sum(black, Side::Black) * w.advancement_black
            - advancement_sum(white, Side::White) * w.advancement_white;

        let imminent = ((black & Side::Black.pre_promotion_rank()).count_ones() as i32
            - (white & Side::White.pre_promotion_rank()).count_ones() as i32)
            * w.promotion_bonus;

        let passed = passed_count(black, white, Side::Black) * w.passed_pawn_black
            - passed_count(white, black, Side::White) * w.passed_pawn_white;

        material + advancement + imminent + passed
    }
}

/// Convert an absolute (Black-positive) score to the given side's view.
#[inline]
pub fn to_side_to_move(absolute: i32, side: Side) -> i32 {
    match side {
        Side::Black => absolute,
        Side::White => -absolute,
    }
}

/// Sum of ranks travelled from the side's own back rank.
fn advancement_sum(pawns: Bitboard, side: Side) -> i32 {
    squares(pawns)
        .map(|sq| {
            let rank = i32::from(square_rank(sq));
            match side {
                Side::White => rank,
                Side::Black => 7 - rank,
            }
        })
        .sum()
}

fn passed_count(own: Bitboard, enemy: Bitboard, side: Side) -> i32 {
    let spans = &passed_masks().front_span[side.index()];
    squares(own)
        .filter(|&sq| spans[sq as usize] & enemy == 0)
        .count() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::weights::DEFAULT_WEIGHTS;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_live_position(rng: &mut StdRng) -> Position {
        let mut white = 0u64;
        let mut black = 0u64;
        for sq in 8..56u8 {
            match rng.random_range(0..12) {
                0 | 1 => white |= 1u64 << sq,
                2 | 3 => black |= 1u64 << sq,
                _ => {}
            }
        }
        let side = if rng.random_bool(0.5) {
            Side::White
        } else {
            Side::Black
        };
        Position::from_bitboards(white, black, side).expect("grids are disjoint")
    }

    #[test]
    fn colour_flip_negates_score_exactly() {
        let evaluator = Evaluator::default();
        let mut rng = StdRng::seed_from_u64(0xF1A6);
        for _ in 0..2_000 {
            let pos = random_live_position(&mut rng);
            assert_eq!(
                evaluator.evaluate(&pos.mirrored()),
                -evaluator.evaluate(&pos),
                "\n{}",
                pos.render()
            );
        }
    }

    #[test]
    fn start_position_is_balanced() {
        let evaluator = Evaluator::default();
        let start = Position::new_game();
        assert_eq!(evaluator.evaluate(&start), 0);
        assert_eq!(evaluator.score_for_side_to_move(&start), 0);
    }

    #[test]
    fn promoted_pawn_scores_exact_win_regardless_of_board() {
        let evaluator = Evaluator::default();
        let win = DEFAULT_WEIGHTS.win_score;
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let base = random_live_position(&mut rng);
            let white = base.pawns(Side::White) | (1u64 << make_square(3, 7));
            let black = base.pawns(Side::Black);
            let pos = Position::from_bitboards(white, black, base.side_to_move())
                .expect("rank 8 is free of black pawns");
            assert_eq!(evaluator.evaluate(&pos), -win);

            let black = base.pawns(Side::Black) | (1u64 << make_square(6, 0));
            let pos = Position::from_bitboards(base.pawns(Side::White), black, base.side_to_move())
                .expect("rank 1 is free of white pawns");
            assert_eq!(evaluator.evaluate(&pos), win);
        }
    }

    #[test]
    fn side_without_moves_has_lost() {
        let evaluator = Evaluator::default();
        let blocked = Position::from_setup("Setup Wa4 Ba5").expect("setup should parse");
        assert_eq!(evaluator.evaluate(&blocked), DEFAULT_WEIGHTS.win_score);
        assert_eq!(
            evaluator.score_for_side_to_move(&blocked),
            -DEFAULT_WEIGHTS.win_score
        );
    }

    #[test]
    fn weighted_terms_add_up() {
        let evaluator = Evaluator::default();
        let pos = Position::from_setup("Setup Wa2 Wh6 Bb3 Bd7").expect("setup should parse");
        let w = DEFAULT_WEIGHTS;

        let material = 0;
        // Black: b3 -> 7-2 = 5, d7 -> 7-6 = 1. White: a2 -> 1, h6 -> 5.
        let advancement = (5 + 1) * w.advancement_black - (1 + 5) * w.advancement_white;
        let imminent = 0;
        // b3 is held by a2 and a2 by b3; d7 and h6 are both passed.
        let passed = w.passed_pawn_black - w.passed_pawn_white;

        assert_eq!(
            evaluator.evaluate(&pos),
            material + advancement + imminent + passed
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let evaluator = Evaluator::default();
        let pos = Position::from_setup("Setup Wf4 Wg4 Bf6 Bf7 Bh6").expect("setup should parse");
        assert_eq!(evaluator.evaluate(&pos), evaluator.evaluate(&pos));
    }
}
