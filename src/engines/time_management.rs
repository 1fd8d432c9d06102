//! Reusable time-management strategies for engine move budgeting.
//!
//! The relay session passes raw clock data (`time_left_ms`, `movetime_ms`)
//! and the engine decides the final per-move allocation from its strategy.

use std::str::FromStr;

use crate::engines::engine_trait::GoParams;
use crate::errors::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeManagementStrategy {
    /// Fixed rule: spend 1/20th of the remaining clock.
    Fraction20,
    /// Adaptive rule using clock, game phase, reserve and panic margins.
    #[default]
    Adaptive,
}

impl FromStr for TimeManagementStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "adaptive" => Ok(Self::Adaptive),
            "fraction20" | "legacy" | "simple" => Ok(Self::Fraction20),
            _ => Err(ConfigError::InvalidValue {
                name: "TimeStrategy".to_owned(),
                value: value.to_owned(),
            }),
        }
    }
}

pub fn resolve_go_params(params: &GoParams, strategy: TimeManagementStrategy) -> GoParams {
    if params.movetime_ms.is_some() {
        return params.clone();
    }

    let mut resolved = params.clone();
    if let Some(remaining) = params.time_left_ms {
        resolved.movetime_ms = Some(match strategy {
            TimeManagementStrategy::Fraction20 => (remaining / 20).max(1),
            TimeManagementStrategy::Adaptive => adaptive_budget_ms(params.ply, remaining),
        });
    }

    resolved
}

fn adaptive_budget_ms(ply: u32, remaining_ms: u64) -> u64 {
    // Pawn games are short; most are decided within forty plies.
    let expected_moves_left: u64 = if ply < 10 {
        20
    } else if ply < 30 {
        14
    } else {
        8
    };

    let reserve = (remaining_ms / 25).clamp(100, remaining_ms.saturating_sub(1).max(100));
    let usable = remaining_ms.saturating_sub(reserve);
    let base = usable / expected_moves_left;
    let panic = if remaining_ms < 2_000 {
        remaining_ms / 12
    } else {
        0
    };
    let target = base.saturating_add(panic);

    let min_budget = if remaining_ms < 1_000 { 5 } else { 15 };
    let max_budget = (remaining_ms / 4).max(1);
    target.clamp(min_budget.min(max_budget), max_budget).max(1)
}
