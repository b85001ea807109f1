//! Randomness oracle boundary
//!
//! The oracle works in two phases: [`RandomnessOracle::request_random_words`]
//! returns an id immediately, and the words arrive later through
//! [`RandomWordsConsumer::raw_fulfill_random_words`]. Between the two the
//! engine holds a [`PendingRequest`] marker.

pub mod mock;

pub use mock::MockVrfCoordinator;

use crate::errors::{LotteryResult, OracleError};
use crate::types::{RandomWord, RequestId};
use serde::{Deserialize, Serialize};

/// Subscription/config descriptor sent with every randomness request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomnessRequest {
    /// Gas lane identifying the max gas price the requester will pay
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Outbound side of the oracle: accepts a request, returns its id synchronously
pub trait RandomnessOracle: Send + Sync {
    fn request_random_words(&self, request: &RandomnessRequest) -> Result<RequestId, OracleError>;
}

/// Inbound side of the oracle: receives the words for a previously issued request
pub trait RandomWordsConsumer {
    fn raw_fulfill_random_words(
        &mut self,
        request_id: RequestId,
        random_words: &[RandomWord],
    ) -> LotteryResult<()>;
}

/// Round the request was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRef {
    pub round_number: u64,
    pub num_players: usize,
}

/// Outstanding randomness request, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PendingRequest {
    #[default]
    NoRequestPending,
    Pending { request_id: RequestId, issued_at: RoundRef },
}

impl PendingRequest {
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            PendingRequest::NoRequestPending => None,
            PendingRequest::Pending { request_id, .. } => Some(*request_id),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PendingRequest::Pending { .. })
    }

    /// True only if `request_id` is the one currently outstanding
    pub fn matches(&self, request_id: RequestId) -> bool {
        self.request_id() == Some(request_id)
    }
}
