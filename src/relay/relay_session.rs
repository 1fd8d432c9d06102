//! One game against the relay server.
//!
//! The session owns the engine and the connection halves, performs the
//! handshake, then alternates between searching on our turn and waiting for
//! the opponent's move. Pondering runs while we wait. Time spent on our own
//! moves is charged against the clock announced in the `Time` message.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::engines::engine_trait::{Engine, GoParams};
use crate::errors::{EngineError, EngineResult};
use crate::game_state::game_types::Side;
use crate::game_state::position::Position;
use crate::move_generation::move_generator::{has_legal_move, validate_move, winner};
use crate::relay::protocol::{parse_server_message, ServerMessage, EXIT, OK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Won,
    Lost,
    /// The relay ended the game (exit, gameover or disconnect) before a result on the board.
    Ended,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub role: Side,
    pub outcome: SessionOutcome,
    pub winner: Option<Side>,
    pub moves_played: u32,
    pub elapsed: Duration,
    pub time_left_ms: Option<u64>,
    pub final_position: Position,
}

pub struct RelaySession<E: Engine, R: BufRead, W: Write> {
    engine: E,
    reader: R,
    writer: W,
}

/// Open a TCP connection to the relay and split it into reader and writer.
pub fn connect(host: &str, port: u16) -> EngineResult<(BufReader<TcpStream>, TcpStream)> {
    let stream = TcpStream::connect((host, port))?;
    stream.set_nodelay(true)?;
    let reader = BufReader::new(stream.try_clone()?);
    info!(host, port, "connected to relay");
    Ok((reader, stream))
}

impl<E: Engine> RelaySession<E, BufReader<TcpStream>, TcpStream> {
    pub fn connect(engine: E, host: &str, port: u16) -> EngineResult<Self> {
        let (reader, writer) = connect(host, port)?;
        Ok(Self::new(engine, reader, writer))
    }
}

struct Handshake {
    position: Position,
    role: Side,
    time_left_ms: Option<u64>,
}

impl<E: Engine, R: BufRead, W: Write> RelaySession<E, R, W> {
    pub fn new(engine: E, reader: R, writer: W) -> Self {
        Self {
            engine,
            reader,
            writer,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_parts(self) -> (E, R, W) {
        (self.engine, self.reader, self.writer)
    }

    /// Play one full game. Malformed or illegal relay input is an error.
    pub fn run(&mut self) -> EngineResult<SessionSummary> {
        let result = self.handshake().and_then(|hs| self.play(hs));
        self.engine.stop_pondering();
        result
    }

    fn send(&mut self, message: &str) -> EngineResult<()> {
        writeln!(self.writer, "{message}")?;
        self.writer.flush()?;
        debug!(line = message, "sent");
        Ok(())
    }

    /// Next non-blank message, `None` at end of stream.
    fn read_message(&mut self) -> EngineResult<Option<ServerMessage>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if line.trim().is_empty() {
                continue;
            }
            debug!(line = line.trim(), "received");
            return Ok(Some(parse_server_message(&line)?));
        }
    }

    fn expect_message(&mut self, stage: &str) -> EngineResult<ServerMessage> {
        self.read_message()?.ok_or_else(|| {
            EngineError::Protocol(format!("connection closed while waiting for {stage}"))
        })
    }

    fn handshake(&mut self) -> EngineResult<Handshake> {
        match self.expect_message("greeting")? {
            ServerMessage::Connected(text) => info!(greeting = %text, "server greeting"),
            other => warn!(kind = other.kind(), "unexpected greeting"),
        }
        self.send(OK)?;

        let position = match self.expect_message("setup")? {
            ServerMessage::Setup(position) => position,
            other => {
                return Err(EngineError::Protocol(format!(
                    "expected Setup, got {}",
                    other.kind()
                )))
            }
        };
        debug!(board = %position.render(), "initial position");
        self.send(OK)?;

        let time_left_ms = match self.expect_message("time")? {
            ServerMessage::Time { minutes } => Some(minutes.saturating_mul(60_000)),
            other => {
                warn!(kind = other.kind(), "expected Time; playing without a clock");
                None
            }
        };
        self.send(OK)?;

        match self.expect_message("begin")? {
            ServerMessage::Begin => {}
            other => warn!(kind = other.kind(), "expected Begin"),
        }

        let role = match self.expect_message("role")? {
            ServerMessage::Role(side) => side,
            other => {
                return Err(EngineError::Protocol(format!(
                    "expected Role, got {}",
                    other.kind()
                )))
            }
        };
        info!(role = role.name(), time_left_ms, "game starting");

        Ok(Handshake {
            position,
            role,
            time_left_ms,
        })
    }

    fn play(&mut self, handshake: Handshake) -> EngineResult<SessionSummary> {
        let Handshake {
            mut position,
            role,
            mut time_left_ms,
        } = handshake;
        let started_at = Instant::now();
        let mut moves_played = 0u32;
        self.engine.new_game();

        let summary = |position: Position, moves_played: u32, time_left_ms: Option<u64>| {
            let winner = winner(&position);
            let outcome = match winner {
                Some(side) if side == role => SessionOutcome::Won,
                Some(_) => SessionOutcome::Lost,
                None => SessionOutcome::Ended,
            };
            let summary = SessionSummary {
                role,
                outcome,
                winner,
                moves_played,
                elapsed: started_at.elapsed(),
                time_left_ms,
                final_position: position,
            };
            info!(
                outcome = ?summary.outcome,
                moves_played,
                elapsed_s = summary.elapsed.as_secs(),
                "session ended"
            );
            summary
        };

        loop {
            if position.side_to_move() == role {
                if position.promoted_side().is_some() {
                    return Ok(summary(position, moves_played, time_left_ms));
                }
                if !has_legal_move(&position) {
                    info!(role = role.name(), "no legal moves; resigning");
                    self.send(EXIT)?;
                    return Ok(summary(position, moves_played, time_left_ms));
                }

                let move_started = Instant::now();
                let params = GoParams {
                    time_left_ms,
                    ply: moves_played,
                    ..GoParams::default()
                };
                let output = self.engine.choose_move(&position, &params)?;
                let chosen = output.best_move.ok_or_else(|| {
                    EngineError::Protocol("engine returned no move for a live position".to_owned())
                })?;
                let chosen = validate_move(&position, chosen)?;

                self.send(&chosen.to_long_algebraic())?;
                let spent_ms = move_started.elapsed().as_millis() as u64;
                time_left_ms = time_left_ms.map(|left| left.saturating_sub(spent_ms));
                for line in &output.info_lines {
                    debug!("{line}");
                }
                info!(
                    side = role.name(),
                    mv = %chosen,
                    depth = output.depth,
                    score = output.score,
                    spent_ms,
                    remaining_ms = time_left_ms,
                    "move played"
                );

                position = position.apply_move(chosen);
                moves_played += 1;

                if winner(&position).is_some() {
                    self.send(EXIT)?;
                    return Ok(summary(position, moves_played, time_left_ms));
                }
                if let Err(err) = self.engine.start_pondering(&position, output.ponder_move) {
                    warn!(error = %err, "could not start pondering");
                }
            } else {
                match self.read_message()? {
                    None => {
                        info!("relay closed the connection");
                        return Ok(summary(position, moves_played, time_left_ms));
                    }
                    Some(ServerMessage::Exit) | Some(ServerMessage::GameOver) => {
                        return Ok(summary(position, moves_played, time_left_ms));
                    }
                    Some(ServerMessage::Move(mv)) => {
                        let mv = validate_move(&position, mv)?;
                        self.engine.opponent_moved(mv);
                        info!(side = role.opposite().name(), mv = %mv, "opponent moved");
                        position = position.apply_move(mv);
                        moves_played += 1;
                    }
                    Some(other) => {
                        return Err(EngineError::Protocol(format!(
                            "unexpected {} message during the game",
                            other.kind()
                        )));
                    }
                }
            }
        }
    }
}
