//! Background search on the opponent's time.
//!
//! After our move is sent, the ponder thread searches the position that
//! follows the opponent's predicted reply. It shares the engine's
//! transposition table, so whatever it finds warms the cache for the next
//! real search. When the real reply arrives, a hit hands the running search
//! the real move budget and uses its result. A miss stops it at the next node
//! boundary and joins it before the fresh search starts. A hit that arrives
//! after the soft allowance already ended the search only leaves a warm table
//! behind; the caller searches again with the real budget.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::errors::EngineResult;
use crate::game_state::position::Position;
use crate::move_generation::move_generator::validate_move;
use crate::move_generation::pawn_move::PawnMove;
use crate::search::iterative_deepening::{fallback_move, SearchConfig, SearchEngine, SearchResult};
use crate::search::threading::SearchControl;
use crate::search::transposition_table::TranspositionTable;

#[derive(Debug)]
pub enum PonderOutcome {
    /// The opponent played the predicted move; the result searched the real root.
    Hit(SearchResult),
    /// The prediction was right, but the allowance ran out before the reply
    /// arrived; the table is warm, the result is too shallow to play.
    Expired,
    /// The prediction was wrong, or the ponder thread failed.
    Miss,
}

#[derive(Debug)]
pub struct Ponderer {
    predicted: PawnMove,
    root: Position,
    control: Arc<SearchControl>,
    handle: Option<JoinHandle<SearchResult>>,
}

/// Most likely opponent reply in `position`: the table's best move if it is
/// legal there, otherwise the heuristic pick.
pub fn predict_reply(position: &Position, tt: &TranspositionTable) -> Option<PawnMove> {
    if position.promoted_side().is_some() {
        return None;
    }
    tt.best_move(position.fingerprint())
        .and_then(|mv| validate_move(position, mv).ok())
        .or_else(|| fallback_move(position))
}

impl Ponderer {
    /// Start pondering on the position after our own move.
    ///
    /// `prediction` overrides the table's guess (for example the second move
    /// of our principal variation). Returns `Ok(None)` when there is nothing
    /// to ponder because the game is over.
    pub fn start(
        engine: SearchEngine,
        after_own_move: &Position,
        prediction: Option<PawnMove>,
        tt: Arc<TranspositionTable>,
        max_depth: u8,
        soft_allowance_ms: Option<u64>,
    ) -> EngineResult<Option<Self>> {
        let predicted = match prediction.and_then(|mv| validate_move(after_own_move, mv).ok()) {
            Some(mv) => mv,
            None => match predict_reply(after_own_move, &tt) {
                Some(mv) => mv,
                None => return Ok(None),
            },
        };

        let root = after_own_move.apply_move(predicted);
        if root.promoted_side().is_some() {
            return Ok(None);
        }

        let control = SearchControl::with_time_budget_ms(soft_allowance_ms);
        let config = SearchConfig {
            max_depth,
            movetime_ms: None,
            max_nodes: None,
            control: Some(Arc::clone(&control)),
        };

        let handle = thread::Builder::new()
            .name("ponder".to_owned())
            .spawn(move || engine.search(&root, &config, &tt))?;

        info!(predicted = %predicted, "pondering started");
        Ok(Some(Self {
            predicted,
            root,
            control,
            handle: Some(handle),
        }))
    }

    #[inline]
    pub fn predicted_move(&self) -> PawnMove {
        self.predicted
    }

    /// Root the ponder search is working on.
    #[inline]
    pub fn root(&self) -> &Position {
        &self.root
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Reconcile with the opponent's actual move.
    ///
    /// On a hit the search continues for `movetime_ms` more (unbounded when
    /// `None`, ending at its depth cap) and its result is returned, unless
    /// the search had already stopped on its own allowance.
    pub fn resolve(mut self, actual: PawnMove, movetime_ms: Option<u64>) -> PonderOutcome {
        if actual != self.predicted {
            debug!(predicted = %self.predicted, actual = %actual, "ponder miss");
            self.control.request_stop();
            self.join();
            return PonderOutcome::Miss;
        }

        match movetime_ms {
            Some(ms) => self.control.extend_time_budget_ms(ms),
            None => self.control.set_time_budget_ms(None),
        }
        match self.join() {
            Some(result)
                if result.stopped_early
                    && !self.control.should_stop()
                    && !self.control.time_budget_exceeded() =>
            {
                info!(
                    predicted = %self.predicted,
                    depth = result.reached_depth,
                    "ponder hit after the allowance ran out"
                );
                PonderOutcome::Expired
            }
            Some(result) => {
                info!(
                    predicted = %self.predicted,
                    depth = result.reached_depth,
                    nodes = result.nodes,
                    "ponder hit"
                );
                PonderOutcome::Hit(result)
            }
            None => PonderOutcome::Miss,
        }
    }

    /// Stop the search and wait for the thread to exit.
    pub fn cancel(mut self) {
        self.control.request_stop();
        self.join();
    }

    fn join(&mut self) -> Option<SearchResult> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(result) => Some(result),
            Err(_) => {
                warn!("ponder thread panicked");
                None
            }
        }
    }
}

impl Drop for Ponderer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.control.request_stop();
            self.join();
        }
    }
}
