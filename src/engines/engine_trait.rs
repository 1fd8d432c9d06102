//! Engine abstraction layer used by the relay session.
//!
//! Defines common input parameters and output payloads so different engine
//! strategies can sit behind a single trait interface.

use crate::errors::EngineResult;
use crate::game_state::position::Position;
use crate::move_generation::pawn_move::PawnMove;

#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime_ms: Option<u64>,
    /// Our remaining clock, if the session tracks one.
    pub time_left_ms: Option<u64>,
    /// Half-moves played so far in the game.
    pub ply: u32,
}

#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub best_move: Option<PawnMove>,
    /// Score for the side that moved, positive when it is better off.
    pub score: i32,
    pub depth: u8,
    /// Expected opponent reply, used to seed pondering.
    pub ponder_move: Option<PawnMove>,
    pub info_lines: Vec<String>,
}

pub trait Engine: Send {
    fn name(&self) -> &str;

    fn new_game(&mut self) {}

    fn set_option(&mut self, _name: &str, _value: &str) -> EngineResult<()> {
        Ok(())
    }

    fn choose_move(&mut self, position: &Position, params: &GoParams)
        -> EngineResult<EngineOutput>;

    /// Begin searching on the opponent's time. `position` is the position
    /// after our own move; `prediction` is the reply we expect.
    fn start_pondering(
        &mut self,
        _position: &Position,
        _prediction: Option<PawnMove>,
    ) -> EngineResult<()> {
        Ok(())
    }

    /// The opponent's actual move has arrived.
    fn opponent_moved(&mut self, _mv: PawnMove) {}

    fn stop_pondering(&mut self) {}
}
