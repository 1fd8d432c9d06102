//! Iterative deepening engine with a game-long transposition table and
//! background pondering.

use std::sync::Arc;

use tracing::debug;

use crate::engines::engine_trait::{Engine, EngineOutput, GoParams};
use crate::engines::time_management::{resolve_go_params, TimeManagementStrategy};
use crate::errors::{ConfigError, EngineResult};
use crate::game_state::position::Position;
use crate::move_generation::pawn_move::PawnMove;
use crate::search::board_scoring::Evaluator;
use crate::search::iterative_deepening::{
    SearchConfig, SearchEngine, SearchResult, DEFAULT_MAX_DEPTH,
};
use crate::search::ponder::{PonderOutcome, Ponderer};
use crate::search::transposition_table::TranspositionTable;
use crate::search::weights::Weights;

pub const DEFAULT_HASH_MB: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub weights: Weights,
    pub max_depth: u8,
    pub hash_mb: usize,
    pub ponder: bool,
    /// Soft cap on a ponder search; `None` ponders until stopped.
    pub ponder_ms: Option<u64>,
    pub time_strategy: TimeManagementStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            hash_mb: DEFAULT_HASH_MB,
            ponder: true,
            ponder_ms: None,
            time_strategy: TimeManagementStrategy::default(),
        }
    }
}

pub struct IterativeEngine {
    config: EngineConfig,
    search: SearchEngine,
    tt: Arc<TranspositionTable>,
    ponderer: Option<Ponderer>,
}

impl IterativeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            search: SearchEngine::new(Evaluator::new(config.weights)),
            tt: Arc::new(TranspositionTable::new_with_mb(config.hash_mb)),
            ponderer: None,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn transposition_table(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// Reply the running ponder search is betting on, if any.
    pub fn pondering_on(&self) -> Option<PawnMove> {
        self.ponderer.as_ref().map(Ponderer::predicted_move)
    }

    /// Take the ponder result when the ponder search sits on `position`.
    fn take_ponder_result(
        &mut self,
        position: &Position,
        movetime_ms: Option<u64>,
    ) -> Option<SearchResult> {
        let ponderer = self.ponderer.take()?;
        if ponderer.root() != position {
            ponderer.cancel();
            return None;
        }
        let predicted = ponderer.predicted_move();
        match ponderer.resolve(predicted, movetime_ms) {
            PonderOutcome::Hit(result) if result.best_move.is_some() && !result.fallback => {
                Some(result)
            }
            PonderOutcome::Expired => {
                debug!("ponder allowance ran out; searching the warm table again");
                None
            }
            _ => None,
        }
    }
}

impl Default for IterativeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        name: name.to_owned(),
        value: value.to_owned(),
    })
}

impl Engine for IterativeEngine {
    fn name(&self) -> &str {
        "TwoFlags Iterative"
    }

    fn new_game(&mut self) {
        self.stop_pondering();
        self.tt.clear();
    }

    fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        if name.eq_ignore_ascii_case("Hash") {
            let parsed: usize = parse_number(name, value)?;
            self.stop_pondering();
            self.config.hash_mb = parsed.max(1);
            self.tt = Arc::new(TranspositionTable::new_with_mb(self.config.hash_mb));
            return Ok(());
        }
        if name.eq_ignore_ascii_case("MaxDepth") {
            let parsed: u8 = parse_number(name, value)?;
            self.config.max_depth = parsed.max(1);
            return Ok(());
        }
        if name.eq_ignore_ascii_case("Ponder") {
            self.config.ponder = parse_bool(name, value)?;
            if !self.config.ponder {
                self.stop_pondering();
            }
            return Ok(());
        }
        if name.eq_ignore_ascii_case("PonderMs") {
            let parsed: u64 = parse_number(name, value)?;
            self.config.ponder_ms = (parsed > 0).then_some(parsed);
            return Ok(());
        }
        if name.eq_ignore_ascii_case("TimeStrategy") {
            self.config.time_strategy = value.parse()?;
            return Ok(());
        }

        self.config.weights = self.config.weights.with_override(name, value)?;
        self.search = SearchEngine::new(Evaluator::new(self.config.weights));
        Ok(())
    }

    fn choose_move(
        &mut self,
        position: &Position,
        params: &GoParams,
    ) -> EngineResult<EngineOutput> {
        let resolved = resolve_go_params(params, self.config.time_strategy);
        let depth = resolved.depth.unwrap_or(self.config.max_depth).max(1);

        let pondered = self.take_ponder_result(position, resolved.movetime_ms);
        let ponder_hit = pondered.is_some();
        let result = match pondered {
            Some(result) => result,
            None => self.search.search(
                position,
                &SearchConfig {
                    max_depth: depth,
                    movetime_ms: resolved.movetime_ms,
                    max_nodes: None,
                    control: None,
                },
                &self.tt,
            ),
        };

        let pv = result
            .principal_variation
            .iter()
            .map(|mv| mv.to_long_algebraic())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(depth = result.reached_depth, score = result.score, pv = %pv, "search finished");

        let mut out = EngineOutput {
            best_move: result.best_move,
            score: result.score,
            depth: result.reached_depth,
            ponder_move: result.principal_variation.get(1).copied(),
            info_lines: Vec::new(),
        };
        out.info_lines.push(format!(
            "info depth {} score {} nodes {} time {} nps {} pv {}",
            result.reached_depth,
            result.score,
            result.nodes,
            result.elapsed_ms,
            result.nps(),
            pv
        ));
        out.info_lines.push(format!(
            "info string iterative_engine tt_hits {} tt_probes {} tt_stores {}",
            result.tt_hits, result.tt_stats.probes, result.tt_stats.stores
        ));
        out.info_lines.push(format!(
            "info string iterative_engine ponder_hit {ponder_hit}"
        ));
        if result.fallback {
            out.info_lines
                .push("info string iterative_engine fallback_move".to_owned());
        }
        if let Some(budget) = resolved.movetime_ms {
            out.info_lines
                .push(format!("info string iterative_engine movetime_ms {budget}"));
        }

        Ok(out)
    }

    fn start_pondering(
        &mut self,
        position: &Position,
        prediction: Option<PawnMove>,
    ) -> EngineResult<()> {
        self.stop_pondering();
        if !self.config.ponder {
            return Ok(());
        }
        self.ponderer = Ponderer::start(
            self.search,
            position,
            prediction,
            Arc::clone(&self.tt),
            self.config.max_depth,
            self.config.ponder_ms,
        )?;
        Ok(())
    }

    fn opponent_moved(&mut self, mv: PawnMove) {
        let missed = self
            .ponderer
            .as_ref()
            .is_some_and(|p| p.predicted_move() != mv);
        if missed {
            if let Some(ponderer) = self.ponderer.take() {
                // Stops and joins the now irrelevant search.
                let _ = ponderer.resolve(mv, None);
            }
        }
    }

    fn stop_pondering(&mut self) {
        if let Some(ponderer) = self.ponderer.take() {
            ponderer.cancel();
        }
    }
}
