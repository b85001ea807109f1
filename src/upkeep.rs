//! Upkeep evaluation
//!
//! Decides whether a draw should start. The predicate is pure: it reads the
//! round and a timestamp and never mutates anything, so automation agents may
//! poll it as often as they like.

use crate::types::{LotteryState, Wei};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four sub-conditions of the upkeep predicate, plus the values they were
/// computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepDiagnostics {
    pub time_passed: bool,
    pub is_open: bool,
    pub has_balance: bool,
    pub has_players: bool,
    pub pool_balance: Wei,
    pub num_players: usize,
    pub state: LotteryState,
}

impl UpkeepDiagnostics {
    pub fn all_hold(&self) -> bool {
        self.time_passed && self.is_open && self.has_balance && self.has_players
    }
}

impl fmt::Display for UpkeepDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "time_passed={} is_open={} has_balance={} has_players={} (balance={}, players={}, state={})",
            self.time_passed,
            self.is_open,
            self.has_balance,
            self.has_players,
            self.pool_balance,
            self.num_players,
            self.state.code()
        )
    }
}

/// Result of an upkeep check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepCheck {
    pub needed: bool,
    pub diagnostics: UpkeepDiagnostics,
    /// Opaque data handed back to the trigger for `perform_upkeep`
    pub perform_data: Vec<u8>,
}

/// Inputs to the upkeep predicate
#[derive(Debug, Clone, Copy)]
pub struct UpkeepInputs {
    pub now: u64,
    pub last_draw_timestamp: u64,
    pub interval_secs: u64,
    pub state: LotteryState,
    pub pool_balance: Wei,
    pub num_players: usize,
}

/// needed = time_passed && is_open && has_balance && has_players
pub fn evaluate(inputs: &UpkeepInputs) -> UpkeepDiagnostics {
    UpkeepDiagnostics {
        time_passed: inputs.now.saturating_sub(inputs.last_draw_timestamp) >= inputs.interval_secs,
        is_open: inputs.state == LotteryState::Open,
        has_balance: inputs.pool_balance > 0,
        has_players: inputs.num_players > 0,
        pool_balance: inputs.pool_balance,
        num_players: inputs.num_players,
        state: inputs.state,
    }
}
