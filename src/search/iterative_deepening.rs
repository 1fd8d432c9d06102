//! Iterative deepening search with negamax alpha-beta pruning.
//!
//! Runs depth 1, 2, 3, ... against a shared transposition table until the
//! time budget, node cap, stop request or maximum depth ends it, or a forced
//! win or loss is proven at the root. An interrupted iteration is discarded
//! and the last completed depth is reported. If not even depth 1 completes,
//! a cheap heuristic move is returned instead of no move.
//!
//! Scores inside the search are relative to the side to move. Wins found at
//! ply `p` score `win_score - p`, so shorter wins are preferred; the table
//! stores them ply-normalized.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::game_state::game_types::*;
use crate::game_state::position::Position;
use crate::move_generation::move_generator::{generate_legal_moves, validate_move};
use crate::move_generation::pawn_move::PawnMove;
use crate::search::board_scoring::{to_side_to_move, Evaluator};
use crate::search::threading::SearchControl;
use crate::search::transposition_table::{Bound, TTStats, TranspositionTable};

pub const MAX_PLY: u8 = 128;
pub const DEFAULT_MAX_DEPTH: u8 = 64;
const INFINITY: i32 = i32::MAX / 2;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_depth: u8,
    pub movetime_ms: Option<u64>,
    pub max_nodes: Option<u64>,
    pub control: Option<Arc<SearchControl>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            movetime_ms: None,
            max_nodes: None,
            control: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<PawnMove>,
    /// Score of `best_move` for the side to move at the root.
    pub score: i32,
    pub side_to_move: Side,
    pub reached_depth: u8,
    pub nodes: u64,
    pub tt_hits: u64,
    pub elapsed_ms: u64,
    /// True when no iteration completed and `best_move` is the heuristic pick.
    pub fallback: bool,
    /// True when a time, node or stop limit ended the search before the depth
    /// cap or a proven result.
    pub stopped_early: bool,
    pub principal_variation: Vec<PawnMove>,
    pub tt_stats: TTStats,
}

impl SearchResult {
    fn empty(side_to_move: Side) -> Self {
        Self {
            best_move: None,
            score: 0,
            side_to_move,
            reached_depth: 0,
            nodes: 0,
            tt_hits: 0,
            elapsed_ms: 0,
            fallback: false,
            stopped_early: false,
            principal_variation: Vec::new(),
            tt_stats: TTStats::default(),
        }
    }

    /// Score in the evaluator's absolute convention (positive favours Black).
    #[inline]
    pub fn absolute_score(&self) -> i32 {
        to_side_to_move(self.score, self.side_to_move)
    }

    #[inline]
    pub fn is_decisive(&self, win_score: i32) -> bool {
        is_decisive(self.score, win_score)
    }

    pub fn nps(&self) -> u64 {
        if self.elapsed_ms == 0 {
            0
        } else {
            self.nodes.saturating_mul(1000) / self.elapsed_ms
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchEngine {
    evaluator: Evaluator,
}

struct SearchContext<'a> {
    tt: &'a TranspositionTable,
    deadline: Option<Instant>,
    max_nodes: Option<u64>,
    control: Option<&'a SearchControl>,
    nodes: u64,
    tt_hits: u64,
}

impl SearchContext<'_> {
    #[inline]
    fn should_abort(&self) -> bool {
        if let Some(cap) = self.max_nodes {
            if self.nodes >= cap {
                return true;
            }
        }
        if let Some(limit) = self.deadline {
            if Instant::now() >= limit {
                return true;
            }
        }
        if let Some(control) = self.control {
            if control.should_abort() {
                return true;
            }
        }
        false
    }
}

impl SearchEngine {
    pub const fn new(evaluator: Evaluator) -> Self {
        Self { evaluator }
    }

    #[inline]
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn search(
        &self,
        root: &Position,
        config: &SearchConfig,
        tt: &TranspositionTable,
    ) -> SearchResult {
        let started_at = Instant::now();
        let win = self.evaluator.win_score();
        let mut result = SearchResult::empty(root.side_to_move());

        tt.new_generation();
        let mut ctx = SearchContext {
            tt,
            deadline: config
                .movetime_ms
                .map(|ms| started_at + Duration::from_millis(ms)),
            max_nodes: config.max_nodes.filter(|n| *n > 0),
            control: config.control.as_deref(),
            nodes: 0,
            tt_hits: 0,
        };

        if let Some(absolute) = self.evaluator.terminal_score(root) {
            result.score = to_side_to_move(absolute, root.side_to_move());
            result.nodes = 1;
            result.elapsed_ms = started_at.elapsed().as_millis() as u64;
            result.tt_stats = tt.stats();
            return result;
        }

        for depth in 1..=config.max_depth.clamp(1, MAX_PLY - 1) {
            if ctx.should_abort() {
                result.stopped_early = true;
                break;
            }
            let Some((best_move, score)) = self.search_root(&mut ctx, root, depth) else {
                debug!(depth, nodes = ctx.nodes, "iteration interrupted; discarded");
                result.stopped_early = true;
                break;
            };

            result.best_move = Some(best_move);
            result.score = score;
            result.reached_depth = depth;
            debug!(
                depth,
                score,
                best = %best_move,
                nodes = ctx.nodes,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "iteration complete"
            );

            if is_decisive(score, win) {
                break;
            }
        }

        if result.best_move.is_none() {
            if let Some(mv) = fallback_move(root) {
                result.best_move = Some(mv);
                result.score = -self.evaluator.score_for_side_to_move(&root.apply_move(mv));
                result.fallback = true;
                debug!(best = %mv, "no iteration completed; using fallback move");
            }
        }

        if let Some(best_move) = result.best_move {
            result.principal_variation.push(best_move);
            result.principal_variation.extend(principal_variation_from_tt(
                &root.apply_move(best_move),
                tt,
                usize::from(result.reached_depth.saturating_sub(1)),
            ));
        }

        result.nodes = ctx.nodes;
        result.tt_hits = ctx.tt_hits;
        result.elapsed_ms = started_at.elapsed().as_millis() as u64;
        result.tt_stats = tt.stats();
        result
    }

    fn search_root(
        &self,
        ctx: &mut SearchContext<'_>,
        root: &Position,
        depth: u8,
    ) -> Option<(PawnMove, i32)> {
        let key = root.fingerprint();
        let mut moves = generate_legal_moves(root);
        order_moves(&mut moves, ctx.tt.best_move(key), root.side_to_move());
        ctx.nodes += 1;

        let mut alpha = -INFINITY;
        let mut best: Option<(PawnMove, i32)> = None;

        for mv in moves {
            let child = root.apply_move(mv);
            let score = -self.negamax(ctx, &child, depth - 1, -INFINITY, -alpha, 1)?;
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((mv, score)),
            }
            alpha = alpha.max(score);
        }

        let (best_move, best_score) = best?;
        ctx.tt.store(
            key,
            depth,
            score_to_storage(best_score, 0, self.evaluator.win_score()),
            Bound::Exact,
            Some(best_move),
        );
        Some((best_move, best_score))
    }

    /// `None` means the search was aborted and the value is unusable.
    fn negamax(
        &self,
        ctx: &mut SearchContext<'_>,
        position: &Position,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
        ply: u8,
    ) -> Option<i32> {
        if ctx.should_abort() {
            return None;
        }
        ctx.nodes += 1;

        let win = self.evaluator.win_score();
        let us = position.side_to_move();

        if let Some(absolute) = self.evaluator.terminal_score(position) {
            return Some(terminal_score(to_side_to_move(absolute, us), ply));
        }
        if depth == 0 || ply >= MAX_PLY {
            return Some(to_side_to_move(self.evaluator.positional_score(position), us));
        }

        let key = position.fingerprint();
        let tt_move = ctx.tt.best_move(key);

        if let Some(entry) = ctx.tt.lookup(key, depth) {
            ctx.tt_hits += 1;
            let score = score_from_storage(entry.score, ply, win);
            match entry.bound {
                Bound::Exact => return Some(score),
                Bound::Lower => alpha = alpha.max(score),
                Bound::Upper => beta = beta.min(score),
            }
            if alpha >= beta {
                return Some(score);
            }
        }

        // Bounds are classified against the window the children actually saw.
        let alpha_orig = alpha;
        let mut moves = generate_legal_moves(position);
        order_moves(&mut moves, tt_move, us);

        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in moves {
            let child = position.apply_move(mv);
            let score = -self.negamax(ctx, &child, depth - 1, -beta, -alpha, ply + 1)?;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score <= alpha_orig {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        ctx.tt.store(
            key,
            depth,
            score_to_storage(best_score, ply, win),
            bound,
            best_move,
        );

        Some(best_score)
    }
}

/// Follow best moves recorded in the table, starting at `position`.
///
/// Every move is checked against the legal move list, so a colliding or
/// stale entry ends the line instead of corrupting it.
pub fn principal_variation_from_tt(
    position: &Position,
    tt: &TranspositionTable,
    max_len: usize,
) -> Vec<PawnMove> {
    let mut line = Vec::new();
    let mut current = *position;

    while line.len() < max_len && current.promoted_side().is_none() {
        let Some(suggested) = tt.best_move(current.fingerprint()) else {
            break;
        };
        let Ok(mv) = validate_move(&current, suggested) else {
            break;
        };
        line.push(mv);
        current = current.apply_move(mv);
    }

    line
}

/// Cheap pick when no search iteration completed: promotion, then capture,
/// then the most advanced step.
pub fn fallback_move(position: &Position) -> Option<PawnMove> {
    let mut moves = generate_legal_moves(position);
    order_moves(&mut moves, None, position.side_to_move());
    moves.first().copied()
}

/// Stable sort, so ties keep generator order.
fn order_moves(moves: &mut [PawnMove], tt_move: Option<PawnMove>, side: Side) {
    moves.sort_by_key(|mv| std::cmp::Reverse(move_order_score(*mv, tt_move, side)));
}

fn move_order_score(mv: PawnMove, tt_move: Option<PawnMove>, side: Side) -> i32 {
    if tt_move == Some(mv) {
        return 1_000_000;
    }
    let progress = match side {
        Side::White => i32::from(square_rank(mv.to())),
        Side::Black => 7 - i32::from(square_rank(mv.to())),
    };
    let mut score = progress;
    if mv.is_promotion() {
        score += 100_000;
    }
    if mv.is_capture() {
        score += 10_000;
    }
    score
}

#[inline]
fn is_decisive(score: i32, win_score: i32) -> bool {
    score.abs() >= win_score - i32::from(MAX_PLY)
}

#[inline]
fn terminal_score(relative: i32, ply: u8) -> i32 {
    if relative > 0 {
        relative - i32::from(ply)
    } else {
        relative + i32::from(ply)
    }
}

#[inline]
fn score_to_storage(score: i32, ply: u8, win_score: i32) -> i32 {
    if score >= win_score - i32::from(MAX_PLY) {
        score.saturating_add(i32::from(ply))
    } else if score <= -(win_score - i32::from(MAX_PLY)) {
        score.saturating_sub(i32::from(ply))
    } else {
        score
    }
}

#[inline]
fn score_from_storage(score: i32, ply: u8, win_score: i32) -> i32 {
    if score >= win_score - i32::from(MAX_PLY) {
        score.saturating_sub(i32::from(ply))
    } else if score <= -(win_score - i32::from(MAX_PLY)) {
        score.saturating_add(i32::from(ply))
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::weights::DEFAULT_WEIGHTS;

    fn engine() -> SearchEngine {
        SearchEngine::default()
    }

    fn setup(text: &str, side: Side) -> Position {
        Position::from_setup(text)
            .expect("setup should parse")
            .with_side_to_move(side)
    }

    #[test]
    fn tiny_budget_still_returns_a_legal_move() {
        let tt = TranspositionTable::new_with_mb(1);
        let start = Position::new_game();
        let legal = generate_legal_moves(&start);

        for config in [
            SearchConfig {
                movetime_ms: Some(0),
                ..SearchConfig::default()
            },
            SearchConfig {
                max_nodes: Some(1),
                ..SearchConfig::default()
            },
        ] {
            let result = engine().search(&start, &config, &tt);
            let mv = result.best_move.expect("a move must be returned");
            assert!(legal.contains(&mv));
            assert!(result.fallback);
            assert_eq!(result.reached_depth, 0);
            assert!(result.stopped_early);
        }
    }

    #[test]
    fn stop_request_before_search_uses_fallback() {
        let tt = TranspositionTable::new_with_mb(1);
        let control = SearchControl::new();
        control.request_stop();
        let pos = setup("Setup Wa2 Wd4 Bc5 Bh7", Side::White);

        let result = engine().search(
            &pos,
            &SearchConfig {
                control: Some(control),
                ..SearchConfig::default()
            },
            &tt,
        );
        // Capture beats the quiet moves in the fallback ordering.
        assert_eq!(result.best_move, Some(PawnMove::new(27, 34)));
        assert!(result.fallback);
        assert!(result.stopped_early);
    }

    #[test]
    fn single_pawn_one_step_from_promotion_promotes() {
        let tt = TranspositionTable::new_with_mb(1);
        let pos = setup("Setup Wa2 Bd2", Side::Black);

        for max_depth in 1..=4 {
            let result = engine().search(
                &pos,
                &SearchConfig {
                    max_depth,
                    ..SearchConfig::default()
                },
                &tt,
            );
            assert_eq!(
                result.best_move.map(|m| m.to_long_algebraic()).as_deref(),
                Some("d2d1")
            );
            assert!(result.score >= DEFAULT_WEIGHTS.win_score - 100);
            assert!(result.absolute_score() > 0, "Black is winning");
            assert!(!result.fallback);
            assert!(!result.stopped_early, "a proven win ends the search");
        }
    }

    #[test]
    fn finds_the_f6f5_sacrifice() {
        let tt = TranspositionTable::new_with_mb(8);
        let pos = setup("Setup Wf4 Wg4 Bf6 Bf7 Bh6", Side::Black);

        let result = engine().search(
            &pos,
            &SearchConfig {
                max_depth: 10,
                movetime_ms: Some(30_000),
                ..SearchConfig::default()
            },
            &tt,
        );

        assert_eq!(
            result.best_move.map(|m| m.to_long_algebraic()).as_deref(),
            Some("f6f5")
        );
        assert!(result.is_decisive(DEFAULT_WEIGHTS.win_score));
        assert!(result.score > 0);
        // Proven win stops deepening before the depth cap.
        assert!(result.reached_depth < 10);
    }

    #[test]
    fn second_search_reuses_the_table() {
        let tt = TranspositionTable::new_with_mb(4);
        let pos = setup("Setup Wb2 Wc3 We4 Bb6 Bd6 Bg7", Side::White);
        let config = SearchConfig {
            max_depth: 5,
            ..SearchConfig::default()
        };

        let first = engine().search(&pos, &config, &tt);
        let second = engine().search(&pos, &config, &tt);

        assert!(first.best_move.is_some() && second.best_move.is_some());
        assert!(second.tt_hits > 0);
        assert!(second.nodes < first.nodes);
    }

    #[test]
    fn principal_variation_is_a_legal_line() {
        let tt = TranspositionTable::new_with_mb(4);
        let start = Position::new_game();
        let result = engine().search(
            &start,
            &SearchConfig {
                max_depth: 4,
                ..SearchConfig::default()
            },
            &tt,
        );

        assert_eq!(result.reached_depth, 4);
        assert_eq!(result.principal_variation.first().copied(), result.best_move);
        let mut pos = start;
        for mv in &result.principal_variation {
            let mv = validate_move(&pos, *mv).expect("pv move should be legal");
            pos = pos.apply_move(mv);
        }
    }

    #[test]
    fn finished_game_returns_no_move() {
        let tt = TranspositionTable::new_with_mb(1);
        let pos = Position::from_bitboards(1u64 << 60, 1u64 << 40, Side::Black)
            .expect("disjoint");
        let result = engine().search(&pos, &SearchConfig::default(), &tt);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, -DEFAULT_WEIGHTS.win_score);
        assert_eq!(result.absolute_score(), -DEFAULT_WEIGHTS.win_score);
    }

    #[test]
    fn fail_low_inside_a_table_raised_window_is_an_upper_bound() {
        let tt = TranspositionTable::new_with_mb(1);
        let start = Position::new_game();
        let key = start.fingerprint();
        // A lower bound far above anything the quiet start position can reach.
        tt.store(key, 1, 5_000, Bound::Lower, None);

        let mut ctx = SearchContext {
            tt: &tt,
            deadline: None,
            max_nodes: None,
            control: None,
            nodes: 0,
            tt_hits: 0,
        };
        let score = engine()
            .negamax(&mut ctx, &start, 1, -INFINITY, INFINITY, 1)
            .expect("unbounded search completes");
        assert!(score < 5_000);

        let entry = tt.probe(key).expect("result is stored");
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.bound, Bound::Upper);
        assert_eq!(entry.score, score);
    }

    #[test]
    fn win_scores_round_trip_through_storage() {
        let win = DEFAULT_WEIGHTS.win_score;
        let ply = 7u8;
        for score in [win - 12, -(win - 12), 345, -345] {
            let stored = score_to_storage(score, ply, win);
            assert_eq!(score_from_storage(stored, ply, win), score);
        }
        assert_eq!(score_to_storage(win - 12, ply, win), win - 5);
    }
}
