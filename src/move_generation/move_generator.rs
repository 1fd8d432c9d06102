//! Legal move generation for pawn-only positions.
//!
//! Per pawn of the side to move: one step forward onto an empty square, two
//! steps from the start rank when both squares are empty, and a diagonal
//! forward capture onto an enemy pawn. Output order is deterministic: pawns
//! in ascending square order, and per pawn single step, double step, capture
//! toward the a-file, capture toward the h-file.

use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_types::*;
use crate::game_state::position::Position;
use crate::move_generation::pawn_move::{
    PawnMove, FLAG_CAPTURE, FLAG_DOUBLE_STEP, FLAG_PROMOTION,
};

/// Enumerate every legal move for the side to move.
pub fn generate_legal_moves(position: &Position) -> Vec<PawnMove> {
    let us = position.side_to_move();
    let them = us.opposite();
    let own = position.pawns(us);
    let enemy = position.pawns(them);
    let empty = position.empty_squares();
    let promotion = us.promotion_rank();
    let forward = us.forward();

    let mut moves = Vec::with_capacity(own.count_ones() as usize * 2);

    for from in squares(own) {
        let Some(one) = offset(from, forward) else {
            continue;
        };
        let file = square_file(from);
        let promo_flag = |to: Square| {
            if promotion & (1u64 << to) != 0 {
                FLAG_PROMOTION
            } else {
                0
            }
        };

        if empty & (1u64 << one) != 0 {
            moves.push(PawnMove::with_flags(from, one, promo_flag(one)));

            if us.start_rank() & (1u64 << from) != 0 {
                if let Some(two) = offset(one, forward) {
                    if empty & (1u64 << two) != 0 {
                        moves.push(PawnMove::with_flags(
                            from,
                            two,
                            FLAG_DOUBLE_STEP | promo_flag(two),
                        ));
                    }
                }
            }
        }

        if file > 0 {
            let to = one - 1;
            if enemy & (1u64 << to) != 0 {
                moves.push(PawnMove::with_flags(from, to, FLAG_CAPTURE | promo_flag(to)));
            }
        }
        if file < BOARD_FILES - 1 {
            let to = one + 1;
            if enemy & (1u64 << to) != 0 {
                moves.push(PawnMove::with_flags(from, to, FLAG_CAPTURE | promo_flag(to)));
            }
        }
    }

    moves
}

/// Whether the side to move has at least one legal move, without building
/// the move list.
pub fn has_legal_move(position: &Position) -> bool {
    let us = position.side_to_move();
    let own = position.pawns(us);
    let enemy = position.pawns(us.opposite());
    let empty = position.empty_squares();

    let (pushes, captures) = match us {
        Side::White => (
            (own << 8) & empty,
            (((own & !FILE_A) << 7) | ((own & !FILE_H) << 9)) & enemy,
        ),
        Side::Black => (
            (own >> 8) & empty,
            (((own & !FILE_A) >> 9) | ((own & !FILE_H) >> 7)) & enemy,
        ),
    };

    pushes | captures != 0
}

/// Winner of a finished game, if the game is over.
///
/// A pawn on its promotion rank wins outright. Otherwise a side to move with
/// no legal moves has lost.
pub fn winner(position: &Position) -> Option<Side> {
    if let Some(side) = position.promoted_side() {
        return Some(side);
    }
    if !has_legal_move(position) {
        return Some(position.side_to_move().opposite());
    }
    None
}

/// Resolve an externally supplied move against the legal move list.
///
/// Returns the generated move (with its flags) or an `IllegalMove` error
/// naming why the move was refused.
pub fn validate_move(position: &Position, mv: PawnMove) -> EngineResult<PawnMove> {
    if let Some(found) = generate_legal_moves(position)
        .into_iter()
        .find(|legal| *legal == mv)
    {
        return Ok(found);
    }

    Err(EngineError::IllegalMove {
        mv: mv.to_long_algebraic(),
        reason: illegal_reason(position, mv).to_owned(),
    })
}

fn illegal_reason(position: &Position, mv: PawnMove) -> &'static str {
    let us = position.side_to_move();
    if position.side_at(mv.from()) != Some(us) {
        return "no pawn of the side to move on the origin square";
    }

    let rank_delta = i16::from(square_rank(mv.to())) - i16::from(square_rank(mv.from()));
    let file_delta = i16::from(square_file(mv.to())) - i16::from(square_file(mv.from()));
    let forward_rank = match us {
        Side::White => 1,
        Side::Black => -1,
    };

    if rank_delta.signum() != forward_rank {
        return "pawns only move forward";
    }
    match (file_delta.abs(), rank_delta.abs()) {
        (0, 1) => "destination is occupied",
        (0, 2) if us.start_rank() & (1u64 << mv.from()) == 0 => {
            "two-square move allowed only from the starting rank"
        }
        (0, 2) => "path is blocked",
        (1, 1) => "diagonal move allowed only when capturing",
        _ => "unsupported movement pattern",
    }
}

#[inline]
fn offset(square: Square, delta: i8) -> Option<Square> {
    let target = i16::from(square) + i16::from(delta);
    if (0..64).contains(&target) {
        Some(target as Square)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::long_algebraic::parse_move;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn texts(moves: &[PawnMove]) -> Vec<String> {
        moves.iter().map(|m| m.to_long_algebraic()).collect()
    }

    fn random_position(rng: &mut StdRng) -> Position {
        // Pawns only on ranks 2..=7 so nobody has promoted yet.
        let mut white = 0u64;
        let mut black = 0u64;
        for sq in 8..56u8 {
            match rng.random_range(0..10) {
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
    fn start_position_has_sixteen_moves_each_side() {
        let pos = Position::new_game();
        let moves = generate_legal_moves(&pos);
        assert_eq!(moves.len(), 16);
        assert_eq!(&texts(&moves)[0..2], ["a2a3", "a2a4"]);
        assert!(moves[1].is_double_step());

        let black = pos.with_side_to_move(Side::Black);
        assert_eq!(generate_legal_moves(&black).len(), 16);
    }

    #[test]
    fn captures_and_promotions_are_flagged() {
        let pos = Position::from_setup("Setup Wb7 Wd4 Bc5 Be5 Bh3")
            .expect("setup should parse");
        let moves = generate_legal_moves(&pos);
        assert_eq!(texts(&moves), ["d4d5", "d4c5", "d4e5", "b7b8"]);
        assert!(!moves[0].is_capture());
        assert!(moves[1].is_capture() && moves[2].is_capture());
        assert!(moves[3].is_promotion());
    }

    #[test]
    fn blocked_pawns_cannot_double_step() {
        let pos = Position::from_setup("Setup We2 Wg2 Be3 Bg4").expect("setup should parse");
        assert_eq!(texts(&generate_legal_moves(&pos)), ["g2g3"]);
    }

    #[test]
    fn black_moves_toward_rank_one() {
        let pos = Position::from_setup("Setup Wa3 Wc3 Bb4 Bh7")
            .expect("setup should parse")
            .with_side_to_move(Side::Black);
        assert_eq!(texts(&generate_legal_moves(&pos)), ["b4b3", "b4a3", "b4c3", "h7h6", "h7h5"]);
    }

    #[test]
    fn generated_moves_respect_pawn_rules_on_random_positions() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let pos = random_position(&mut rng);
            let us = pos.side_to_move();
            let moves = generate_legal_moves(&pos);
            assert_eq!(has_legal_move(&pos), !moves.is_empty());

            for mv in moves {
                assert_eq!(pos.side_at(mv.from()), Some(us), "origin must be our pawn");
                assert!(mv.to() < 64);
                let diagonal = square_file(mv.from()) != square_file(mv.to());
                let target = pos.side_at(mv.to());
                if diagonal {
                    assert_eq!(target, Some(us.opposite()), "diagonal must capture");
                    assert!(mv.is_capture());
                } else {
                    assert_eq!(target, None, "forward move must land on empty square");
                }

                let next = pos.apply_move(mv);
                assert_ne!(next, pos);
                assert_ne!(
                    (next.pawns(Side::White), next.pawns(Side::Black)),
                    (pos.pawns(Side::White), pos.pawns(Side::Black))
                );
                assert_eq!(next.pawns(Side::White) & next.pawns(Side::Black), 0);
            }
        }
    }

    #[test]
    fn validate_move_explains_rejections() {
        let pos = Position::from_setup("Setup We2 Wd3 Be3 Bh7").expect("setup should parse");

        let legal = validate_move(&pos, parse_move("d3d4").expect("parse"))
            .expect("d3d4 is legal");
        assert!(!legal.is_capture());

        let cases = [
            ("a2a3", "no pawn of the side to move on the origin square"),
            ("d3d2", "pawns only move forward"),
            ("e2e3", "destination is occupied"),
            ("d3d5", "two-square move allowed only from the starting rank"),
            ("e2e4", "path is blocked"),
            ("d3c4", "diagonal move allowed only when capturing"),
        ];
        for (text, expected) in cases {
            let err = validate_move(&pos, parse_move(text).expect("parse"))
                .expect_err("move should be illegal");
            match err {
                EngineError::IllegalMove { mv, reason } => {
                    assert_eq!(mv, text);
                    assert_eq!(reason, expected, "{text}");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn winner_detects_promotion_and_stalemated_side() {
        let promoted = Position::from_bitboards(1u64 << 60, 1u64 << 40, Side::Black)
            .expect("disjoint");
        assert_eq!(winner(&promoted), Some(Side::White));

        // White pawn blocked head-on with nothing to capture.
        let blocked = Position::from_setup("Setup Wa4 Ba5").expect("setup should parse");
        assert_eq!(winner(&blocked), Some(Side::Black));
        assert_eq!(winner(&Position::new_game()), None);
    }
}
