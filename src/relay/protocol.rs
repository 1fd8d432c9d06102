//! Relay wire messages.
//!
//! Every message is one newline-terminated line. The server drives a short
//! handshake (`Connected...`, `Setup ...`, `Time <minutes>`, `Begin`,
//! `Role White|Black`) and then forwards four-character moves until either
//! side sends `exit` or the server sends `gameover`.

use crate::errors::ParseError;
use crate::game_state::game_types::Side;
use crate::game_state::position::Position;
use crate::move_generation::pawn_move::PawnMove;
use crate::utils::long_algebraic::parse_move;
use crate::utils::setup_parser::{parse_setup, SETUP_HEADER};

pub const OK: &str = "OK";
pub const EXIT: &str = "exit";
pub const GAME_OVER: &str = "gameover";

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Connected(String),
    Setup(Position),
    Time { minutes: u64 },
    Begin,
    Role(Side),
    Move(PawnMove),
    Exit,
    GameOver,
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "Connected",
            Self::Setup(_) => "Setup",
            Self::Time { .. } => "Time",
            Self::Begin => "Begin",
            Self::Role(_) => "Role",
            Self::Move(_) => "move",
            Self::Exit => EXIT,
            Self::GameOver => GAME_OVER,
        }
    }
}

pub fn parse_server_message(line: &str) -> Result<ServerMessage, ParseError> {
    let text = line.trim();
    let malformed = || ParseError::MalformedMessage(text.to_owned());

    if text.eq_ignore_ascii_case(EXIT) {
        return Ok(ServerMessage::Exit);
    }
    if text.eq_ignore_ascii_case(GAME_OVER) {
        return Ok(ServerMessage::GameOver);
    }
    if text.starts_with("Connected") {
        return Ok(ServerMessage::Connected(text.to_owned()));
    }
    if text.starts_with(SETUP_HEADER) {
        return parse_setup(text).map(ServerMessage::Setup);
    }
    if text == "Begin" {
        return Ok(ServerMessage::Begin);
    }

    let mut tokens = text.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some("Time"), Some(minutes), None) => minutes
            .parse::<u64>()
            .map(|minutes| ServerMessage::Time { minutes })
            .map_err(|_| malformed()),
        (Some("Role"), Some(side), None) => Side::from_name(side)
            .map(ServerMessage::Role)
            .ok_or_else(malformed),
        (Some(token), None, None) if token.len() == 4 => parse_move(token).map(ServerMessage::Move),
        _ => Err(malformed()),
    }
}
