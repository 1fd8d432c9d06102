//! Perft node counting over the pawn move generator.
//!
//! Finished games (a pawn on its promotion rank) are leaves: no moves are
//! generated below them.

use crate::game_state::position::Position;
use crate::move_generation::move_generator::generate_legal_moves;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: usize,
    pub captures: usize,
    pub double_steps: usize,
    pub promotions: usize,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.double_steps += rhs.double_steps;
        self.promotions += rhs.promotions;
    }
}

pub fn perft(position: &Position, depth: u8) -> PerftCounts {
    if depth == 0 {
        return PerftCounts {
            nodes: 1,
            ..PerftCounts::default()
        };
    }

    let mut total = PerftCounts::default();
    if position.promoted_side().is_some() {
        return total;
    }

    for mv in generate_legal_moves(position) {
        let next = position.apply_move(mv);
        if depth == 1 {
            total.nodes += 1;
            total.captures += usize::from(mv.is_capture());
            total.double_steps += usize::from(mv.is_double_step());
            total.promotions += usize::from(mv.is_promotion());
        } else {
            total.merge(perft(&next, depth - 1));
        }
    }

    total
}
