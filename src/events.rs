//! Lottery events and the append-only log that records them

use crate::types::{Address, RequestId};
use serde::{Deserialize, Serialize};

/// Observable lottery event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LotteryEvent {
    /// A paid entry was accepted
    EntryRecorded { entrant: Address },
    /// Upkeep moved the round to calculating and asked for randomness
    DrawRequested { request_id: RequestId },
    /// Randomness arrived, the winner was paid and the round reset
    WinnerPicked { winner: Address },
}

impl LotteryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LotteryEvent::EntryRecorded { .. } => "EntryRecorded",
            LotteryEvent::DrawRequested { .. } => "DrawRequested",
            LotteryEvent::WinnerPicked { .. } => "WinnerPicked",
        }
    }
}

/// Append-only log of emitted events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LotteryEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: LotteryEvent) {
        self.entries.push(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&LotteryEvent> {
        self.entries.get(position)
    }

    pub fn last(&self) -> Option<&LotteryEvent> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LotteryEvent> {
        self.entries.iter()
    }

    /// Events appended at or after `position`
    pub fn since(&self, position: usize) -> &[LotteryEvent] {
        self.entries.get(position..).unwrap_or(&[])
    }

    /// Request id of the most recent draw request
    pub fn last_request_id(&self) -> Option<RequestId> {
        self.entries.iter().rev().find_map(|event| match event {
            LotteryEvent::DrawRequested { request_id } => Some(*request_id),
            _ => None,
        })
    }
}
