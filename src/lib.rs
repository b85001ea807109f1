//! Lottery Engine - automated raffle driven by upkeep checks and oracle randomness
//!
//! Players pay an entrance fee to join the current round. Once the draw
//! interval has elapsed and the round has players, an automation agent's
//! upkeep call closes the round and asks a randomness oracle for a word. When
//! the oracle answers, the word picks the winner, the whole pool is paid out
//! and the next round opens.
//!
//! [`Lottery`] is the engine itself; [`LotteryService`] runs it as a single
//! actor for callers that are not already serialized.

pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod lottery;
pub mod oracle;
pub mod service;
pub mod transfer;
pub mod types;
pub mod upkeep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigLoader, LotteryConfig, RandomnessConfig};
pub use errors::{ConfigurationError, LotteryError, LotteryResult, OracleError, TransferError};
pub use events::{EventLog, LotteryEvent};
pub use lottery::{Collaborators, DrawOutcome, Lottery, LotterySnapshot};
pub use oracle::{
    MockVrfCoordinator, PendingRequest, RandomWordsConsumer, RandomnessOracle, RandomnessRequest,
};
pub use service::{LotteryHandle, LotteryService};
pub use transfer::{FundsTransfer, InMemoryBank};
pub use types::{Address, LotteryState, RandomWord, RequestId, Wei};
pub use upkeep::{UpkeepCheck, UpkeepDiagnostics};
