//! Crate root module declarations for the Two Flags engine project.
//!
//! This file exposes all top-level subsystems (game state, move generation,
//! search, engines, relay protocol handling, and utility helpers) so the
//! binary, benchmarks, and tests can import stable module paths.

pub mod errors;

pub mod game_state {
    pub mod game_types;
    pub mod position;
}

pub mod move_generation {
    pub mod move_generator;
    pub mod pawn_move;
    pub mod perft;
}

pub mod search {
    pub mod board_scoring;
    pub mod iterative_deepening;
    pub mod ponder;
    pub mod threading;
    pub mod transposition_table;
    pub mod weights;
    pub mod zobrist;
}

pub mod engines {
    pub mod engine_iterative;
    pub mod engine_trait;
    pub mod time_management;
}

pub mod relay {
    pub mod protocol;
    pub mod relay_session;
}

pub mod utils {
    pub mod algebraic;
    pub mod long_algebraic;
    pub mod render_position;
    pub mod setup_generator;
    pub mod setup_parser;
}
