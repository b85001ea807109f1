//! The raffle engine
//!
//! [`Lottery`] owns the live round and drives it through
//! open -> calculating -> open:
//!
//! 1. [`Lottery::enter`] appends paid entrants while the round is open.
//! 2. [`Lottery::perform_upkeep`] starts a draw once [`Lottery::check_upkeep`]
//!    holds, asking the oracle for randomness.
//! 3. [`Lottery::fulfill_random_words`] accepts the oracle's answer for the
//!    pending request only, pays the whole pool to the winner and resets.
//!
//! Every operation either applies all of its changes or none. There is no
//! path out of calculating other than a valid fulfillment: if the oracle never
//! answers, the round stays closed.

use crate::clock::Clock;
use crate::config::{ConfigLoader, LotteryConfig};
use crate::errors::{LotteryError, LotteryResult};
use crate::events::{EventLog, LotteryEvent};
use crate::ledger::EntryLedger;
use crate::oracle::{PendingRequest, RandomWordsConsumer, RandomnessOracle, RandomnessRequest, RoundRef};
use crate::transfer::FundsTransfer;
use crate::types::{Address, LotteryState, RandomWord, RequestId, Wei};
use crate::upkeep::{self, UpkeepCheck, UpkeepInputs};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What a successful fulfillment did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub request_id: RequestId,
    pub winner: Address,
    pub winner_index: usize,
    pub payout: Wei,
}

/// Read model of the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotterySnapshot {
    pub state: LotteryState,
    pub entrance_fee: Wei,
    pub interval_secs: u64,
    pub entrants: Vec<Address>,
    pub pool_balance: Wei,
    pub recent_winner: Option<Address>,
    pub last_timestamp: u64,
    pub round_number: u64,
    pub pending: PendingRequest,
}

/// External collaborators the engine calls into
#[derive(Clone)]
pub struct Collaborators {
    pub oracle: Arc<dyn RandomnessOracle>,
    pub funds: Arc<dyn FundsTransfer>,
    pub clock: Arc<dyn Clock>,
}

pub struct Lottery {
    entrance_fee: Wei,
    interval_secs: u64,
    randomness: RandomnessRequest,
    ledger: EntryLedger,
    // Calculating exactly while a request is pending
    pending: PendingRequest,
    last_timestamp: u64,
    round_number: u64,
    recent_winner: Option<Address>,
    events: EventLog,
    oracle: Arc<dyn RandomnessOracle>,
    funds: Arc<dyn FundsTransfer>,
    clock: Arc<dyn Clock>,
}

impl Lottery {
    /// Create an open lottery with an empty first round
    pub fn new(config: &LotteryConfig, collaborators: Collaborators) -> LotteryResult<Self> {
        ConfigLoader::validate(config)?;
        let randomness = config.randomness.to_request()?;
        let last_timestamp = collaborators.clock.now();

        tracing::info!(
            entrance_fee = config.entrance_fee,
            interval_secs = config.interval_secs,
            subscription_id = randomness.subscription_id,
            "Lottery initialized"
        );

        Ok(Self {
            entrance_fee: config.entrance_fee,
            interval_secs: config.interval_secs,
            randomness,
            ledger: EntryLedger::new(),
            pending: PendingRequest::NoRequestPending,
            last_timestamp,
            round_number: 0,
            recent_winner: None,
            events: EventLog::new(),
            oracle: collaborators.oracle,
            funds: collaborators.funds,
            clock: collaborators.clock,
        })
    }

    /// Enter the current round by paying at least the entrance fee
    pub fn enter(&mut self, caller: Address, amount_paid: Wei) -> LotteryResult<()> {
        if self.state() != LotteryState::Open {
            tracing::debug!(entrant = %caller, "Entry rejected: round not open");
            return Err(LotteryError::RoundNotOpen);
        }
        if amount_paid < self.entrance_fee {
            tracing::debug!(entrant = %caller, amount_paid, "Entry rejected: insufficient payment");
            return Err(LotteryError::InsufficientPayment {
                required: self.entrance_fee,
                paid: amount_paid,
            });
        }

        self.ledger.record(caller, amount_paid)?;
        self.events.push(LotteryEvent::EntryRecorded { entrant: caller });
        tracing::info!(
            entrant = %caller,
            amount_paid,
            players = self.ledger.len(),
            pool_balance = self.ledger.pool_balance(),
            "Entry recorded"
        );
        Ok(())
    }

    /// Decide whether a draw should start now. Read-only.
    pub fn check_upkeep(&self, check_data: &[u8]) -> UpkeepCheck {
        let diagnostics = upkeep::evaluate(&UpkeepInputs {
            now: self.clock.now(),
            last_draw_timestamp: self.last_timestamp,
            interval_secs: self.interval_secs,
            state: self.state(),
            pool_balance: self.ledger.pool_balance(),
            num_players: self.ledger.len(),
        });

        UpkeepCheck {
            needed: diagnostics.all_hold(),
            diagnostics,
            perform_data: check_data.to_vec(),
        }
    }

    /// Close the round and request randomness for the draw
    pub fn perform_upkeep(&mut self, perform_data: &[u8]) -> LotteryResult<RequestId> {
        let check = self.check_upkeep(perform_data);
        if !check.needed {
            tracing::debug!(diagnostics = %check.diagnostics, "Upkeep not needed");
            return Err(LotteryError::UpkeepNotNeeded(check.diagnostics));
        }

        let request_id = self.oracle.request_random_words(&self.randomness).map_err(|e| {
            tracing::warn!(error = %e, "Randomness request failed");
            LotteryError::OracleUnavailable(e)
        })?;

        self.pending = PendingRequest::Pending {
            request_id,
            issued_at: RoundRef {
                round_number: self.round_number,
                num_players: self.ledger.len(),
            },
        };
        self.events.push(LotteryEvent::DrawRequested { request_id });
        tracing::info!(
            %request_id,
            round = self.round_number,
            players = self.ledger.len(),
            "Draw requested"
        );
        Ok(request_id)
    }

    /// Resolve the pending request: pick a winner, pay the pool, reset
    ///
    /// The round is only reset once the payout has been accepted, so a
    /// rejected transfer leaves the engine exactly as it was.
    pub fn fulfill_random_words(
        &mut self,
        request_id: RequestId,
        random_words: &[RandomWord],
    ) -> LotteryResult<DrawOutcome> {
        if !self.pending.matches(request_id) {
            tracing::warn!(%request_id, pending = ?self.pending.request_id(), "Fulfillment for unknown request");
            return Err(LotteryError::UnknownRequest(request_id));
        }
        let word = random_words
            .first()
            .copied()
            .ok_or(LotteryError::MissingRandomWords(request_id))?;

        let num_players = self.ledger.len();
        let winner_index = word
            .checked_rem(num_players as RandomWord)
            .ok_or(LotteryError::IndexOutOfRange { index: 0, len: 0 })? as usize;
        let winner = self.ledger.player_at(winner_index)?;
        let payout = self.ledger.pool_balance();

        self.funds
            .transfer(&winner, payout)
            .map_err(|source| LotteryError::PayoutFailed {
                winner,
                amount: payout,
                source,
            })?;

        self.ledger.clear();
        self.pending = PendingRequest::NoRequestPending;
        self.last_timestamp = self.clock.now();
        self.round_number += 1;
        self.recent_winner = Some(winner);
        self.events.push(LotteryEvent::WinnerPicked { winner });

        tracing::info!(%request_id, %winner, winner_index, payout, "Winner picked");
        Ok(DrawOutcome {
            request_id,
            winner,
            winner_index,
            payout,
        })
    }

    pub fn state(&self) -> LotteryState {
        if self.pending.is_pending() {
            LotteryState::Calculating
        } else {
            LotteryState::Open
        }
    }

    pub fn entrance_fee(&self) -> Wei {
        self.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.interval_secs
    }

    pub fn player_at(&self, index: usize) -> LotteryResult<Address> {
        self.ledger.player_at(index)
    }

    pub fn number_of_players(&self) -> usize {
        self.ledger.len()
    }

    pub fn entrants(&self) -> &[Address] {
        self.ledger.entrants()
    }

    pub fn pool_balance(&self) -> Wei {
        self.ledger.pool_balance()
    }

    pub fn recent_winner(&self) -> Option<Address> {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn pending_request(&self) -> PendingRequest {
        self.pending
    }

    pub fn num_words(&self) -> u32 {
        self.randomness.num_words
    }

    pub fn request_confirmations(&self) -> u16 {
        self.randomness.request_confirmations
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn snapshot(&self) -> LotterySnapshot {
        LotterySnapshot {
            state: self.state(),
            entrance_fee: self.entrance_fee,
            interval_secs: self.interval_secs,
            entrants: self.ledger.entrants().to_vec(),
            pool_balance: self.ledger.pool_balance(),
            recent_winner: self.recent_winner,
            last_timestamp: self.last_timestamp,
            round_number: self.round_number,
            pending: self.pending,
        }
    }
}

impl RandomWordsConsumer for Lottery {
    fn raw_fulfill_random_words(
        &mut self,
        request_id: RequestId,
        random_words: &[RandomWord],
    ) -> LotteryResult<()> {
        self.fulfill_random_words(request_id, random_words).map(|_| ())
    }
}
