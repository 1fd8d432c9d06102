//! Error types shared across the engine.
//!
//! Parsing failures, illegal external moves, configuration mistakes and relay
//! I/O problems each get a distinct variant so callers (the relay session or
//! the binary) can decide whether to resign, ask for a resend, or abort.
//! Running out of search time is never an error.

use std::io;

use thiserror::Error;

/// Malformed text coming from the relay or from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("invalid move string '{0}': expected four characters like f7f5")]
    InvalidMoveLength(String),

    #[error("invalid file '{ch}' in move string '{mv}'")]
    InvalidFile { mv: String, ch: char },

    #[error("invalid rank '{ch}' in move string '{mv}'")]
    InvalidRank { mv: String, ch: char },

    #[error("setup string must start with 'Setup'")]
    MissingSetupHeader,

    #[error("malformed setup token '{0}'")]
    MalformedSetupToken(String),

    #[error("unknown side letter '{0}' in setup")]
    UnknownSide(char),

    #[error("pawn listed twice on {0}")]
    DuplicatePawn(String),

    #[error("both sides have a pawn on {0}")]
    OverlappingPawns(String),

    #[error("pawn pre-placed on its promotion rank at {0}")]
    PawnOnPromotionRank(String),

    #[error("{side} has {count} pawns; expected 1..={max}")]
    WrongPawnCount {
        side: &'static str,
        count: u32,
        max: u32,
    },

    #[error("malformed relay message '{0}'")]
    MalformedMessage(String),
}

/// Invalid engine configuration (weights or named options).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("relay i/o failed: {0}")]
    Io(#[from] io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
