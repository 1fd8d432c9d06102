use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use two_flags::engines::engine_iterative::{EngineConfig, IterativeEngine, DEFAULT_HASH_MB};
use two_flags::engines::engine_trait::Engine;
use two_flags::engines::time_management::TimeManagementStrategy;
use two_flags::errors::EngineResult;
use two_flags::relay::relay_session::RelaySession;
use two_flags::search::iterative_deepening::DEFAULT_MAX_DEPTH;
use two_flags::search::weights::Weights;

#[derive(Parser, Debug)]
#[command(name = "two_flags")]
#[command(about = "Two Flags pawn engine: connects to a relay server and plays one game", long_about = None)]
struct Args {
    /// Relay server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Relay server port
    #[arg(short, long, default_value_t = 9999)]
    port: u16,

    /// Maximum search depth in plies
    #[arg(short = 'd', long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u8,

    /// Transposition table size in MiB
    #[arg(long, default_value_t = DEFAULT_HASH_MB)]
    hash_mb: usize,

    /// Do not search on the opponent's time
    #[arg(long)]
    no_ponder: bool,

    /// Soft cap for one ponder search in milliseconds (0 = until the reply arrives)
    #[arg(long, default_value_t = 0)]
    ponder_ms: u64,

    /// Evaluation weight override, e.g. `--weight passed_pawn=55` (repeatable)
    #[arg(short, long = "weight", value_name = "NAME=VALUE")]
    weights: Vec<String>,

    /// Per-move time strategy: adaptive or fraction20
    #[arg(long, default_value = "adaptive")]
    time_strategy: TimeManagementStrategy,

    /// Log filter, e.g. `info` or `two_flags=debug` (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn engine_config(args: &Args) -> EngineResult<EngineConfig> {
    let weights = args
        .weights
        .iter()
        .try_fold(Weights::default(), |w, assignment| w.with_assignment(assignment))?;

    Ok(EngineConfig {
        weights,
        max_depth: args.max_depth.max(1),
        hash_mb: args.hash_mb.max(1),
        ponder: !args.no_ponder,
        ponder_ms: (args.ponder_ms > 0).then_some(args.ponder_ms),
        time_strategy: args.time_strategy,
    })
}

fn run(args: &Args) -> EngineResult<()> {
    let config = engine_config(args)?;
    if !config.weights.is_symmetric() {
        info!("asymmetric weights: evaluation is no longer colour-symmetric");
    }
    let engine = IterativeEngine::new(config);
    info!(
        engine = engine.name(),
        max_depth = engine.config().max_depth,
        hash_mb = engine.config().hash_mb,
        ponder = engine.config().ponder,
        "engine ready"
    );

    let mut session = RelaySession::connect(engine, &args.host, args.port)?;
    let summary = session.run()?;
    info!(
        role = summary.role.name(),
        outcome = ?summary.outcome,
        moves = summary.moves_played,
        elapsed_s = summary.elapsed.as_secs(),
        "final position\n{}",
        summary.final_position.render()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log.as_deref());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "session failed");
            ExitCode::FAILURE
        }
    }
}
